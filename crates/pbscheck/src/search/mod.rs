//! Cluster-wide search for nodes that can run a batch job of a given size.

pub mod nodes;
pub mod queues;

use anyhow::Context;
use serde::Serialize;

use crate::config::{QueueDefinition, SearchConfig};
use crate::pbs::client::PbsClient;
use crate::pbs::memory::MemorySize;
use crate::pbs::nodeinfo::parse_node_listing;
use crate::search::nodes::{NodeCapacity, eligible_nodes};
use crate::search::queues::{QueueRecommendation, eligible_queues, recommend_queues};

/// Nodes with less free memory than this are not worth suggesting, unless no node has more.
const USEFUL_MEMORY_GB: [u64; 2] = [5, 2];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRequest {
    pub cores: u32,
    pub memory_gb: f64,
    pub mem_per_core_gb: f64,
    pub mem_overhead_gb: f64,
    /// Core count derived from the limits of the auto-size queue
    pub auto_calculated: bool,
}

impl SearchRequest {
    /// Completes a partial request. Missing memory is `cores * mem_per_core + overhead`,
    /// missing cores is the largest count that fits into the auto-size queue.
    pub fn new(
        config: &SearchConfig,
        cores: Option<u32>,
        memory_gb: Option<f64>,
        mem_per_core_gb: f64,
        mem_overhead_gb: f64,
    ) -> anyhow::Result<Self> {
        if mem_per_core_gb <= 0.0 {
            anyhow::bail!("Memory per core has to be positive, got {mem_per_core_gb}");
        }
        let (cores, auto_calculated) = match cores {
            Some(cores) => (cores, false),
            None => {
                let queue = config.queue(&config.auto_size_queue).ok_or_else(|| {
                    anyhow::anyhow!(
                        "Cannot derive the core count, queue {} is not configured",
                        config.auto_size_queue
                    )
                })?;
                (
                    auto_size_cores(queue, mem_per_core_gb, mem_overhead_gb),
                    true,
                )
            }
        };
        if cores == 0 {
            anyhow::bail!("The request has to ask for at least one core");
        }
        let memory_gb =
            memory_gb.unwrap_or(cores as f64 * mem_per_core_gb + mem_overhead_gb);

        Ok(Self {
            cores,
            memory_gb,
            mem_per_core_gb,
            mem_overhead_gb,
            auto_calculated,
        })
    }

    pub fn memory(&self) -> MemorySize {
        MemorySize::from_gb_f64(self.memory_gb)
    }
}

fn auto_size_cores(queue: &QueueDefinition, mem_per_core_gb: f64, mem_overhead_gb: f64) -> u32 {
    let by_memory = ((queue.max_memory_gb - mem_overhead_gb) / mem_per_core_gb).max(0.0);
    (by_memory as u32).min(queue.max_cores)
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LimitingFactor {
    Cores,
    Memory,
    Both,
}

/// A node that cannot run the full request, with what it could run instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alternative {
    pub node: NodeCapacity,
    /// Cores that fit into the free memory using the request's memory formula
    pub practical_cores: u32,
    pub practical_memory_gb: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub request: SearchRequest,
    pub queues: QueueRecommendation,
    /// Nodes that can run the request now, most free cores first
    pub available: Vec<NodeCapacity>,
    pub limiting_factor: Option<LimitingFactor>,
    pub alternatives: Vec<Alternative>,
}

impl SearchResult {
    pub fn is_available(&self) -> bool {
        !self.available.is_empty()
    }
}

pub fn find_available_nodes(nodes: &[NodeCapacity], request: &SearchRequest) -> Vec<NodeCapacity> {
    let memory = request.memory();
    let mut available: Vec<NodeCapacity> = nodes
        .iter()
        .filter(|node| node.free_cores >= request.cores && node.free_memory >= memory)
        .cloned()
        .collect();
    available.sort_by(|a, b| b.free_cores.cmp(&a.free_cores));
    available
}

pub fn limiting_factor(nodes: &[NodeCapacity], request: &SearchRequest) -> Option<LimitingFactor> {
    let memory = request.memory();
    let enough_cores = nodes.iter().any(|node| node.free_cores >= request.cores);
    let enough_memory = nodes.iter().any(|node| node.free_memory >= memory);
    match (enough_cores, enough_memory) {
        (true, false) => Some(LimitingFactor::Memory),
        (false, true) => Some(LimitingFactor::Cores),
        (false, false) => Some(LimitingFactor::Both),
        (true, true) => None,
    }
}

fn practical_allocation(node: &NodeCapacity, request: &SearchRequest) -> (u32, u64) {
    let free_gb = node.free_memory.gb() as f64;
    let by_memory = ((free_gb - request.mem_overhead_gb) / request.mem_per_core_gb).max(0.0);
    let cores = node.free_cores.min(by_memory as u32);
    if cores == 0 {
        return (0, 0);
    }
    let memory = cores as f64 * request.mem_per_core_gb + request.mem_overhead_gb;
    (cores, memory as u64)
}

/// Picks the nodes that could run the largest useful part of the request.
pub fn best_alternatives(
    nodes: &[NodeCapacity],
    request: &SearchRequest,
    max_options: usize,
) -> Vec<Alternative> {
    let mut viable: Vec<&NodeCapacity> = vec![];
    for threshold in USEFUL_MEMORY_GB {
        let minimum = MemorySize::from_gb(threshold);
        viable = nodes
            .iter()
            .filter(|node| node.free_cores > 0 && node.free_memory >= minimum)
            .collect();
        if !viable.is_empty() {
            break;
        }
    }

    let score = |node: &NodeCapacity| {
        let core_fraction = (node.free_cores as f64 / request.cores as f64).min(1.0);
        let memory_fraction = if request.memory_gb > 0.0 {
            (node.free_memory.mb() as f64 / 1024.0 / request.memory_gb).min(1.0)
        } else {
            1.0
        };
        core_fraction.min(memory_fraction) * 1000.0 + node.free_cores as f64
    };
    viable.sort_by(|a, b| score(b).total_cmp(&score(a)));

    viable
        .into_iter()
        .take(max_options)
        .map(|node| {
            let (practical_cores, practical_memory_gb) = practical_allocation(node, request);
            Alternative {
                node: node.clone(),
                practical_cores,
                practical_memory_gb,
            }
        })
        .collect()
}

/// Searches the `pbsnodes -a` listing for nodes that can run `request`.
pub fn search_resources(
    client: &dyn PbsClient,
    config: &SearchConfig,
    request: SearchRequest,
) -> anyhow::Result<SearchResult> {
    let eligible = eligible_queues(config, request.cores, request.memory_gb);
    if eligible.is_empty() {
        anyhow::bail!(
            "Resource request ({} cores, {} GB) exceeds all queue limits",
            request.cores,
            request.memory_gb as u64
        );
    }
    let queues = recommend_queues(&eligible);

    let listing = client.node_list().context("Cannot list cluster nodes")?;
    let names: Vec<&str> = eligible.iter().map(|queue| queue.name.as_str()).collect();
    let nodes = eligible_nodes(&parse_node_listing(&listing), &names);
    if nodes.is_empty() {
        anyhow::bail!(
            "No compute nodes found supporting eligible queues: {}",
            eligible
                .iter()
                .map(|queue| queue.short_name())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    let available = find_available_nodes(&nodes, &request);
    let (limiting_factor, alternatives) = if available.is_empty() {
        (
            limiting_factor(&nodes, &request),
            best_alternatives(&nodes, &request, config.max_alternatives),
        )
    } else {
        (None, vec![])
    };

    Ok(SearchResult {
        request,
        queues,
        available,
        limiting_factor,
        alternatives,
    })
}
