use anyhow::Error;

use crate::check::request::ResourceRequest;
use crate::check::{AvailabilityCheck, CheckConfig};
use crate::client::output::outputs::Output;
use crate::search::SearchResult;

/// Prints only the result, for use in scripts.
#[derive(Default)]
pub struct Quiet;

impl Output for Quiet {
    fn print_interactive_check(
        &self,
        _config: &CheckConfig,
        _request: &ResourceRequest,
        check: &AvailabilityCheck,
    ) {
        println!("{}", check.availability.as_str());
    }

    fn print_resource_search(&self, result: &SearchResult) {
        for node in &result.available {
            println!("{}", node.name);
        }
    }

    fn print_error(&self, error: Error) {
        eprintln!("{error:?}");
    }
}
