use clap::Parser;

use crate::check::request::ResourceRequest;
use crate::check::{Action, Availability, CheckConfig, check_node_availability};
use crate::client::commands::{EXIT_FAILURE, EXIT_SUCCESS, EXIT_WILL_QUEUE};
use crate::client::globalsettings::GlobalSettings;
use crate::common::error::PbsCheckError;
use crate::common::utils::time::ExtendedArgDuration;
use crate::pbs::client::PbsClient;
use crate::pbs::memory::MemorySize;

#[derive(Parser)]
pub struct InteractiveOpts {
    /// Number of cores the job will request
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub cores: u32,

    /// Memory the job will request, e.g. `8gb`
    #[arg(long)]
    pub mem: Option<MemorySize>,

    /// Walltime the job will request
    ///
    /// Use either `HH:MM:SS` or humantime format (e.g. `2h 30m`).
    #[arg(long)]
    pub walltime: Option<ExtendedArgDuration>,

    /// Interactive node to check
    ///
    /// When not set, the node is taken from the configuration or discovered from `pbsnodes`.
    #[arg(long)]
    pub node: Option<String>,

    /// User whose interactive jobs are looked up
    #[arg(long, env = "USER")]
    pub user: Option<String>,
}

pub fn exit_code(action: Action) -> i32 {
    match action {
        Action::SubmitNow => EXIT_SUCCESS,
        Action::ConfirmQueue => EXIT_WILL_QUEUE,
        Action::Abort => EXIT_FAILURE,
    }
}

/// Runs the interactive availability check and returns the process exit code.
pub fn command_interactive(
    gsettings: &GlobalSettings,
    client: &dyn PbsClient,
    opts: InteractiveOpts,
) -> anyhow::Result<i32> {
    let InteractiveOpts {
        cores,
        mem,
        walltime,
        node,
        user,
    } = opts;

    let request = ResourceRequest {
        cores,
        memory: mem,
        walltime: walltime.map(|walltime| walltime.unpack()),
    };
    let config = CheckConfig::resolve(
        client,
        &gsettings.config().interactive,
        &request,
        user,
        node,
    )?;

    let check = check_node_availability(client, &config);
    if check.availability == Availability::AlreadyRunning {
        return Err(PbsCheckError::InteractiveJobRunning {
            user: config.user.clone().unwrap_or_default(),
            queue: config.queue.clone(),
        }
        .into());
    }

    gsettings
        .printer()
        .print_interactive_check(&config, &request, &check);
    Ok(exit_code(check.availability.action()))
}
