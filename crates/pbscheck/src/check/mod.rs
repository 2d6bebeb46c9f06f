//! Availability check of the interactive node.

pub mod request;
pub mod status;

use serde::Serialize;

use crate::check::request::ResourceRequest;
use crate::check::status::NodeStatus;
use crate::config::InteractiveConfig;
use crate::pbs::client::PbsClient;
use crate::pbs::discovery::discover_interactive_node;
use crate::pbs::jobs::user_has_queue_job;
use crate::pbs::nodeinfo::parse_key_values;
use crate::pbs::queue::{QueueLimits, resolve_queue_limits};

/// Outcome of the availability check.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Availability {
    /// The user already holds an interactive job
    AlreadyRunning,
    AvailableImmediate,
    BusyWillQueue,
    DownWillQueue,
    UncertainWillQueue,
    /// The node could not be queried, submission goes ahead anyway
    UnknownProceed,
}

/// What the caller should do with the submission.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    SubmitNow,
    ConfirmQueue,
    Abort,
}

impl Availability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::AlreadyRunning => "ALREADY_RUNNING",
            Availability::AvailableImmediate => "AVAILABLE_IMMEDIATE",
            Availability::BusyWillQueue => "BUSY_WILL_QUEUE",
            Availability::DownWillQueue => "DOWN_WILL_QUEUE",
            Availability::UncertainWillQueue => "UNCERTAIN_WILL_QUEUE",
            Availability::UnknownProceed => "UNKNOWN_PROCEED",
        }
    }

    pub fn action(&self) -> Action {
        match self {
            Availability::AvailableImmediate | Availability::UnknownProceed => Action::SubmitNow,
            Availability::BusyWillQueue
            | Availability::DownWillQueue
            | Availability::UncertainWillQueue => Action::ConfirmQueue,
            Availability::AlreadyRunning => Action::Abort,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Availability::AlreadyRunning => "An interactive job of yours is already running",
            Availability::AvailableImmediate => {
                "Resources are available, the job should start immediately"
            }
            Availability::BusyWillQueue => {
                "The node is fully allocated, the job will wait in the queue"
            }
            Availability::DownWillQueue => {
                "The node is down or offline, the job will wait until it returns"
            }
            Availability::UncertainWillQueue => {
                "The node has too few free cores, the job will probably wait in the queue"
            }
            Availability::UnknownProceed => {
                "The node status is unknown, the job will be submitted anyway"
            }
        }
    }
}

/// Everything the check needs, resolved once before the node is queried.
#[derive(Debug, Clone, Serialize)]
pub struct CheckConfig {
    pub queue: String,
    pub node: String,
    pub user: Option<String>,
    pub limits: QueueLimits,
    pub shared_core_threshold: u32,
}

impl CheckConfig {
    /// Resolves the queue limits, validates `request` against them and then
    /// finds the interactive node. `node` skips the discovery.
    pub fn resolve(
        client: &dyn PbsClient,
        config: &InteractiveConfig,
        request: &ResourceRequest,
        user: Option<String>,
        node: Option<String>,
    ) -> crate::Result<Self> {
        let limits = resolve_queue_limits(client, &config.queue, &config.default_limits);
        request.validate(&config.queue, &limits)?;

        let node = node.or_else(|| config.node.clone()).unwrap_or_else(|| {
            discover_interactive_node(client, &config.node_marker, &config.fallback_node)
        });

        Ok(Self {
            queue: config.queue.clone(),
            node,
            user,
            limits,
            shared_core_threshold: config.shared_core_threshold,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityCheck {
    pub availability: Availability,
    /// Present whenever the node was queried successfully
    pub status: Option<NodeStatus>,
}

/// Maps a node status to its availability. The first matching rule wins.
pub fn classify(status: &NodeStatus, shared_core_threshold: u32) -> Availability {
    let free_cores = status.free_cores();
    if status.is_free() && status.jobs.is_empty() {
        Availability::AvailableImmediate
    } else if status.is_free() && free_cores.is_some_and(|cores| cores >= shared_core_threshold) {
        Availability::AvailableImmediate
    } else if status.is_job_exclusive() {
        Availability::BusyWillQueue
    } else if status.is_down_or_offline() {
        Availability::DownWillQueue
    } else {
        Availability::UncertainWillQueue
    }
}

/// Checks whether an interactive job submitted now would start immediately.
///
/// Never fails: scheduler errors are logged and degrade to
/// [`Availability::UnknownProceed`].
pub fn check_node_availability(client: &dyn PbsClient, config: &CheckConfig) -> AvailabilityCheck {
    match &config.user {
        Some(user) => {
            if user_has_queue_job(client, user, &config.queue) {
                return AvailabilityCheck {
                    availability: Availability::AlreadyRunning,
                    status: None,
                };
            }
        }
        None => log::warn!("Unknown user, skipping the check for running interactive jobs"),
    }

    let attributes = match client.node_info(&config.node) {
        Ok(output) => parse_key_values(&output),
        Err(error) => {
            log::warn!("Could not query node {}: {error:#}", config.node);
            return AvailabilityCheck {
                availability: Availability::UnknownProceed,
                status: None,
            };
        }
    };
    if attributes.is_empty() {
        log::warn!("pbsnodes returned no attributes for node {}", config.node);
        return AvailabilityCheck {
            availability: Availability::UnknownProceed,
            status: None,
        };
    }

    let status = NodeStatus::from_attributes(&config.node, &attributes);
    let availability = classify(&status, config.shared_core_threshold);
    log::debug!("Node {} classified as {}", config.node, availability.as_str());
    AvailabilityCheck {
        availability,
        status: Some(status),
    }
}
