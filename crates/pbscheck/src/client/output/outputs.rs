use anyhow::Error;

use crate::check::request::ResourceRequest;
use crate::check::{AvailabilityCheck, CheckConfig};
use crate::search::SearchResult;

#[derive(clap::ValueEnum, Clone)]
pub enum Outputs {
    CLI,
    JSON,
    Quiet,
}

pub trait Output {
    // Interactive queue
    fn print_interactive_check(
        &self,
        config: &CheckConfig,
        request: &ResourceRequest,
        check: &AvailabilityCheck,
    );

    // Batch queues
    fn print_resource_search(&self, result: &SearchResult);

    // Errors
    fn print_error(&self, error: Error);
}
