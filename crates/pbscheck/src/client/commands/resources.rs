use clap::Parser;

use crate::client::commands::{EXIT_FAILURE, EXIT_SUCCESS};
use crate::client::globalsettings::GlobalSettings;
use crate::pbs::client::PbsClient;
use crate::search::{SearchRequest, search_resources};

#[derive(Parser)]
pub struct ResourcesOpts {
    /// Number of cores
    ///
    /// When omitted, the largest count that fits into the auto-size queue is used.
    pub cores: Option<u32>,

    /// Memory in GB
    ///
    /// When omitted, it is computed as `cores * mem-per-core + mem-overhead`.
    pub memory: Option<f64>,

    /// Memory in GB needed per core
    #[arg(long)]
    pub mem_per_core: Option<f64>,

    /// Memory in GB needed on top of the per-core memory
    #[arg(long)]
    pub mem_overhead: Option<f64>,
}

/// Searches the cluster for nodes that can run the request and returns the process exit code.
pub fn command_resources(
    gsettings: &GlobalSettings,
    client: &dyn PbsClient,
    opts: ResourcesOpts,
) -> anyhow::Result<i32> {
    let config = &gsettings.config().search;
    let request = SearchRequest::new(
        config,
        opts.cores,
        opts.memory,
        opts.mem_per_core.unwrap_or(config.mem_per_core_gb),
        opts.mem_overhead.unwrap_or(config.mem_overhead_gb),
    )?;

    let result = search_resources(client, config, request)?;
    gsettings.printer().print_resource_search(&result);
    Ok(if result.is_available() {
        EXIT_SUCCESS
    } else {
        EXIT_FAILURE
    })
}
