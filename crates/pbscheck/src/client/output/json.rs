use anyhow::Error;
use serde_json::json;

use crate::check::request::ResourceRequest;
use crate::check::status::NodeStatus;
use crate::check::{AvailabilityCheck, CheckConfig};
use crate::client::output::outputs::Output;
use crate::common::utils::time::format_hms_duration;
use crate::search::SearchResult;

#[derive(Default)]
pub struct JsonOutput;

impl JsonOutput {
    fn print(&self, data: serde_json::Value) {
        println!(
            "{}",
            serde_json::to_string_pretty(&data).expect("Could not format JSON")
        );
    }
}

fn format_node_status(status: &NodeStatus) -> serde_json::Value {
    json!({
        "name": status.name,
        "state": status.state,
        "cores": {
            "total": status.total_cores,
            "assigned": status.assigned_cores,
            "free": status.free_cores(),
        },
        "memory_gb": {
            "total": status.total_memory_gb(),
            "assigned": status.assigned_memory.gb(),
            "free": status.free_memory_gb(),
        },
        "jobs": status.jobs,
    })
}

pub fn format_interactive_check(
    config: &CheckConfig,
    request: &ResourceRequest,
    check: &AvailabilityCheck,
) -> serde_json::Value {
    json!({
        "queue": config.queue,
        "node": config.node,
        "limits": config.limits,
        "request": {
            "cores": request.cores,
            "memory": request.memory,
            "walltime": request.walltime.as_ref().map(format_hms_duration),
        },
        "availability": check.availability,
        "action": check.availability.action(),
        "status": check.status.as_ref().map(format_node_status),
    })
}

impl Output for JsonOutput {
    fn print_interactive_check(
        &self,
        config: &CheckConfig,
        request: &ResourceRequest,
        check: &AvailabilityCheck,
    ) {
        self.print(format_interactive_check(config, request, check));
    }

    fn print_resource_search(&self, result: &SearchResult) {
        self.print(json!(result));
    }

    fn print_error(&self, error: Error) {
        eprintln!(
            "{}",
            json!({
                "error": format!("{error:?}"),
            })
        );
    }
}
