//! Configuration file of `pbscheck`.
//!
//! Every value has a built-in default, so the file is optional. Example:
//!
//! ```toml
//! [interactive]
//! queue = "interactq"
//! fallback_node = "asax-int1"
//! shared_core_threshold = 4
//!
//! [interactive.default_limits]
//! max_cores = 4
//! max_memory = "16gb"
//! max_walltime = "12:00:00"
//! max_jobs_per_user = 1
//!
//! [[search.queues]]
//! name = "smallq"
//! max_cores = 8
//! max_memory_gb = 4
//! priority = 4
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::pbs::queue::QueueLimits;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ConfigFile {
    pub interactive: InteractiveConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct InteractiveConfig {
    /// Queue used for interactive jobs
    pub queue: String,
    /// Node serving the interactive queue. Skips node discovery when set.
    pub node: Option<String>,
    /// Text that identifies the interactive node in `pbsnodes -a -F json`
    pub node_marker: String,
    /// Node used when discovery fails
    pub fallback_node: String,
    /// Minimum number of free cores on a partially used node to report it as available
    pub shared_core_threshold: u32,
    /// Limits used when the queue cannot be queried
    pub default_limits: QueueLimits,
}

impl Default for InteractiveConfig {
    fn default() -> Self {
        Self {
            queue: "interactq".to_string(),
            node: None,
            node_marker: "interactive".to_string(),
            fallback_node: "asax-int1".to_string(),
            shared_core_threshold: 4,
            default_limits: QueueLimits::default(),
        }
    }
}

/// A batch queue that the resource search can recommend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueueDefinition {
    pub name: String,
    pub max_cores: u32,
    #[serde(default)]
    pub min_memory_gb: f64,
    pub max_memory_gb: f64,
    /// Higher priority queues are preferred when several fit. Queues with
    /// priority 0 are never the preferred regular queue.
    #[serde(default)]
    pub priority: u32,
    /// Express queues are recommended in addition to the regular queue
    #[serde(default)]
    pub express: bool,
    /// Short note shown next to the queue, e.g. its walltime limit
    #[serde(default)]
    pub note: Option<String>,
}

impl QueueDefinition {
    fn new(name: &str, max_cores: u32, max_memory_gb: f64, priority: u32) -> Self {
        Self {
            name: name.to_string(),
            max_cores,
            min_memory_gb: 0.0,
            max_memory_gb,
            priority,
            express: false,
            note: None,
        }
    }

    /// Queue name without the trailing `q`, e.g. `small` for `smallq`.
    pub fn short_name(&self) -> &str {
        self.name.strip_suffix('q').unwrap_or(&self.name)
    }

    pub fn accepts(&self, cores: u32, memory_gb: f64) -> bool {
        cores <= self.max_cores
            && memory_gb >= self.min_memory_gb
            && memory_gb <= self.max_memory_gb
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SearchConfig {
    pub queues: Vec<QueueDefinition>,
    /// Queue whose limits bound the request when no core count is given
    pub auto_size_queue: String,
    pub mem_per_core_gb: f64,
    pub mem_overhead_gb: f64,
    pub max_alternatives: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            queues: vec![
                QueueDefinition {
                    express: true,
                    note: Some("4hr limit".to_string()),
                    ..QueueDefinition::new("expressq", 4, 16.0, 0)
                },
                QueueDefinition::new("smallq", 8, 4.0, 4),
                QueueDefinition::new("mediumq", 16, 16.0, 3),
                QueueDefinition::new("largeq", 128, 120.0, 2),
                QueueDefinition {
                    min_memory_gb: 130.0,
                    ..QueueDefinition::new("bigmemq", 32, 500.0, 1)
                },
            ],
            auto_size_queue: "largeq".to_string(),
            mem_per_core_gb: 1.5,
            mem_overhead_gb: 4.0,
            max_alternatives: 5,
        }
    }
}

impl SearchConfig {
    pub fn queue(&self, name: &str) -> Option<&QueueDefinition> {
        self.queues.iter().find(|queue| queue.name == name)
    }
}

pub fn parse_config(text: &str) -> crate::Result<ConfigFile> {
    Ok(toml::from_str(text)?)
}

/// Loads the configuration file, or the built-in defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> crate::Result<ConfigFile> {
    match path {
        Some(path) => {
            log::debug!("Loading configuration from {}", path.display());
            let text = std::fs::read_to_string(path).map_err(|error| {
                crate::Error::GenericError(format!(
                    "Cannot read configuration file {}: {error}",
                    path.display()
                ))
            })?;
            parse_config(&text)
        }
        None => Ok(ConfigFile::default()),
    }
}
