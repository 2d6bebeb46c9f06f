use std::io;
use std::io::IsTerminal;

use clap::{CommandFactory, FromArgMatches};
use clap_complete::generate;
use cli_table::ColorChoice;

use pbscheck::client::commands::interactive::command_interactive;
use pbscheck::client::commands::resources::command_resources;
use pbscheck::client::commands::{EXIT_FAILURE, EXIT_SUCCESS};
use pbscheck::client::globalsettings::GlobalSettings;
use pbscheck::client::output::cli::CliOutput;
use pbscheck::client::output::json::JsonOutput;
use pbscheck::client::output::outputs::{Output, Outputs};
use pbscheck::client::output::quiet::Quiet;
use pbscheck::common::cli::{ColorPolicy, CommonOpts, GenerateCompletionOpts, RootOptions, SubCommand};
use pbscheck::common::setup::setup_logging;
use pbscheck::config::load_config;
use pbscheck::pbs::client::SystemPbsClient;

fn make_printer(opts: &CommonOpts) -> Box<dyn Output> {
    let color_policy = match opts.colors {
        ColorPolicy::Always => ColorChoice::AlwaysAnsi,
        ColorPolicy::Auto => {
            if io::stdout().is_terminal() {
                ColorChoice::Auto
            } else {
                ColorChoice::Never
            }
        }
        ColorPolicy::Never => ColorChoice::Never,
    };

    match opts.output_mode {
        Outputs::CLI => {
            // Set colored public for CLI
            match color_policy {
                ColorChoice::Always | ColorChoice::AlwaysAnsi => {
                    colored::control::set_override(true)
                }
                ColorChoice::Never => colored::control::set_override(false),
                _ => {}
            }

            Box::new(CliOutput::new(color_policy))
        }
        Outputs::JSON => Box::<JsonOutput>::default(),
        Outputs::Quiet => Box::<Quiet>::default(),
    }
}

fn generate_completion(opts: GenerateCompletionOpts) -> anyhow::Result<i32> {
    let generator = opts.shell;

    let mut app = RootOptions::command();
    eprintln!("Generating completion file for {generator}...");
    generate(generator, &mut app, "pbscheck".to_string(), &mut io::stdout());
    Ok(EXIT_SUCCESS)
}

fn main() {
    let matches = RootOptions::command().get_matches();
    let top_opts = match RootOptions::from_arg_matches(&matches) {
        Ok(opts) => opts,
        Err(error) => error.exit(),
    };

    setup_logging(top_opts.common.debug);

    let printer = make_printer(&top_opts.common);
    let config = match load_config(top_opts.common.config.as_deref()) {
        Ok(config) => config,
        Err(error) => {
            printer.print_error(error.into());
            std::process::exit(EXIT_FAILURE);
        }
    };
    let gsettings = GlobalSettings::new(config, printer);
    let client = SystemPbsClient::default();

    let result = match top_opts.subcmd {
        SubCommand::Interactive(opts) => command_interactive(&gsettings, &client, opts),
        SubCommand::Resources(opts) => command_resources(&gsettings, &client, opts),
        SubCommand::GenerateCompletion(opts) => generate_completion(opts),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            gsettings.printer().print_error(e);
            std::process::exit(EXIT_FAILURE);
        }
    }
}
