use std::collections::BTreeSet;

use serde::Serialize;

use crate::pbs::memory::{MemorySize, parse_memory_size};
use crate::pbs::nodeinfo::{NodeAttributes, parse_job_list};

pub const ATTR_STATE: &str = "state";
pub const ATTR_TOTAL_CORES: &str = "resources_available.ncpus";
pub const ATTR_ASSIGNED_CORES: &str = "resources_assigned.ncpus";
pub const ATTR_TOTAL_MEMORY: &str = "resources_available.mem";
pub const ATTR_ASSIGNED_MEMORY: &str = "resources_assigned.mem";
pub const ATTR_JOBS: &str = "jobs";

/// Live state of a single node, built from `pbsnodes` output.
///
/// Totals that could not be read are `None`. Free capacity derived from an
/// unknown total is unknown as well, never zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeStatus {
    pub name: String,
    pub state: String,
    pub total_cores: Option<u32>,
    pub assigned_cores: u32,
    pub total_memory: Option<MemorySize>,
    pub assigned_memory: MemorySize,
    pub jobs: BTreeSet<String>,
}

impl NodeStatus {
    pub fn from_attributes(name: &str, attributes: &NodeAttributes) -> Self {
        let get = |key: &str| attributes.get(key).map(|value| value.as_str());

        let state = get(ATTR_STATE).unwrap_or_else(|| {
            log::warn!("Node {name}: state is not reported");
            "unknown"
        });

        let total_cores = get(ATTR_TOTAL_CORES).and_then(|value| value.parse::<u32>().ok());
        if total_cores.is_none() {
            log::warn!(
                "Node {name}: total core count is unknown ({})",
                get(ATTR_TOTAL_CORES).unwrap_or("not reported")
            );
        }
        let assigned_cores = match get(ATTR_ASSIGNED_CORES) {
            Some(value) => value.parse::<u32>().unwrap_or_else(|_| {
                log::warn!(
                    "Node {name}: cannot parse assigned core count `{value}`, assuming 0"
                );
                0
            }),
            None => 0,
        };

        let total_memory = get(ATTR_TOTAL_MEMORY).and_then(|value| parse_memory_size(value).ok());
        if total_memory.is_none() {
            log::warn!(
                "Node {name}: total memory is unknown ({})",
                get(ATTR_TOTAL_MEMORY).unwrap_or("not reported")
            );
        }
        let assigned_memory = match get(ATTR_ASSIGNED_MEMORY) {
            Some(value) => parse_memory_size(value).unwrap_or_else(|error| {
                log::warn!(
                    "Node {name}: cannot parse assigned memory `{value}`, assuming 0: {error}"
                );
                MemorySize::ZERO
            }),
            None => MemorySize::ZERO,
        };

        let jobs = get(ATTR_JOBS).map(parse_job_list).unwrap_or_default();

        Self {
            name: name.to_string(),
            state: state.to_string(),
            total_cores,
            assigned_cores,
            total_memory,
            assigned_memory,
            jobs,
        }
    }

    pub fn free_cores(&self) -> Option<u32> {
        self.total_cores
            .map(|total| total.saturating_sub(self.assigned_cores))
    }

    pub fn total_memory_gb(&self) -> Option<u64> {
        self.total_memory.map(|memory| memory.gb())
    }

    pub fn free_memory_gb(&self) -> Option<u64> {
        self.total_memory_gb()
            .map(|total| total.saturating_sub(self.assigned_memory.gb()))
    }

    pub fn is_free(&self) -> bool {
        self.state == "free"
    }

    pub fn is_job_exclusive(&self) -> bool {
        self.state.contains("job-exclusive")
    }

    pub fn is_down_or_offline(&self) -> bool {
        self.state.contains("down") || self.state.contains("offline")
    }
}
