use serde::Serialize;

use crate::config::{QueueDefinition, SearchConfig};

pub fn eligible_queues(config: &SearchConfig, cores: u32, memory_gb: f64) -> Vec<&QueueDefinition> {
    config
        .queues
        .iter()
        .filter(|queue| queue.accepts(cores, memory_gb))
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueueRecommendation {
    pub eligible: Vec<String>,
    /// Regular queue with the highest priority
    pub preferred: Option<QueueDefinition>,
    pub express: Option<QueueDefinition>,
}

pub fn recommend_queues(eligible: &[&QueueDefinition]) -> QueueRecommendation {
    let preferred = eligible
        .iter()
        .filter(|queue| !queue.express && queue.priority > 0)
        .max_by_key(|queue| queue.priority)
        .map(|&queue| queue.clone());
    let express = eligible
        .iter()
        .find(|queue| queue.express)
        .map(|&queue| queue.clone());
    QueueRecommendation {
        eligible: eligible.iter().map(|queue| queue.name.clone()).collect(),
        preferred,
        express,
    }
}
