use serde::Serialize;

use crate::pbs::memory::{MemorySize, parse_memory_size};
use crate::pbs::nodeinfo::NodeRecord;

const EXCLUDED_STATES: [&str; 3] = ["offline", "unknown", "down"];
const COMPUTE_VNODE: &str = "compute_vnode";

/// Free and total capacity of a compute node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeCapacity {
    pub name: String,
    pub state: String,
    pub free_cores: u32,
    pub total_cores: u32,
    pub free_memory: MemorySize,
    pub total_memory: MemorySize,
}

fn serves_queue(node: &NodeRecord, queues: &[&str]) -> bool {
    node.get("resources_available.Qlist")
        .map(|qlist| {
            qlist
                .split(',')
                .map(|queue| queue.trim())
                .any(|queue| queues.contains(&queue))
        })
        .unwrap_or(false)
}

fn is_usable(node: &NodeRecord, queues: &[&str]) -> bool {
    let state = node.get("state").unwrap_or("").to_lowercase();
    if EXCLUDED_STATES.iter().any(|excluded| state.contains(excluded)) {
        return false;
    }
    if node.get("resources_available.vntype") != Some(COMPUTE_VNODE) {
        return false;
    }
    serves_queue(node, queues)
}

/// Capacity of a node, `None` when its totals cannot be read.
pub fn node_capacity(node: &NodeRecord) -> Option<NodeCapacity> {
    let total_cores = node.get("resources_available.ncpus")?.parse::<u32>().ok()?;
    let total_memory = parse_memory_size(node.get("resources_available.mem")?).ok()?;
    let assigned_cores = match node.get("resources_assigned.ncpus") {
        Some(value) => value.parse::<u32>().unwrap_or_else(|_| {
            log::warn!("Node {}: cannot parse assigned core count `{value}`", node.name);
            0
        }),
        None => 0,
    };
    let assigned_memory = match node.get("resources_assigned.mem") {
        Some(value) => parse_memory_size(value).unwrap_or_else(|error| {
            log::warn!("Node {}: cannot parse assigned memory: {error}", node.name);
            MemorySize::ZERO
        }),
        None => MemorySize::ZERO,
    };

    Some(NodeCapacity {
        name: node.name.clone(),
        state: node.get("state").unwrap_or("unknown").to_string(),
        free_cores: total_cores.saturating_sub(assigned_cores),
        total_cores,
        free_memory: total_memory.saturating_sub(assigned_memory),
        total_memory,
    })
}

/// Up compute nodes that serve at least one of `queues`.
pub fn eligible_nodes(nodes: &[NodeRecord], queues: &[&str]) -> Vec<NodeCapacity> {
    nodes
        .iter()
        .filter(|node| is_usable(node, queues))
        .filter_map(|node| {
            let capacity = node_capacity(node);
            if capacity.is_none() {
                log::debug!("Skipping node {}, its capacity cannot be read", node.name);
            }
            capacity
        })
        .collect()
}
