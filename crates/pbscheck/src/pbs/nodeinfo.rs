//! Parsing of the line-oriented `pbsnodes` text output.
//!
//! ```text
//! node01
//!      Mom = node01.cluster
//!      state = free
//!      resources_available.ncpus = 20
//!      jobs = 1234.pbs01/0, 1234.pbs01/1
//! ```

use std::collections::{BTreeMap, BTreeSet};

pub type NodeAttributes = BTreeMap<String, String>;

/// A single node from a `pbsnodes -a` listing.
#[derive(Debug, Clone)]
pub struct NodeRecord {
    pub name: String,
    pub attributes: NodeAttributes,
}

impl NodeRecord {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(|v| v.as_str())
    }
}

fn split_key_value(line: &str) -> Option<(String, String)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), value.trim().to_string()))
}

/// Collects every `key = value` line of `text`, ignoring lines without `=`.
/// When a key repeats, the last value wins.
pub fn parse_key_values(text: &str) -> NodeAttributes {
    text.lines().filter_map(split_key_value).collect()
}

/// Splits a multi-node listing into records. An unindented line starts a new
/// node, indented lines are attributes of the current one. Attribute lines
/// before the first node header are dropped.
pub fn parse_node_listing(text: &str) -> Vec<NodeRecord> {
    let mut nodes = Vec::new();
    let mut current: Option<NodeRecord> = None;

    for line in text.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            continue;
        }
        if !line.starts_with(' ') && !line.starts_with('\t') {
            if let Some(node) = current.take() {
                nodes.push(node);
            }
            current = Some(NodeRecord {
                name: line.trim().to_string(),
                attributes: Default::default(),
            });
        } else if let Some(node) = current.as_mut() {
            if let Some((key, value)) = split_key_value(line) {
                node.attributes.insert(key, value);
            }
        }
    }
    nodes.extend(current);
    nodes
}

/// Parses the `jobs` attribute (`<job-id>/<slot>, ...`) into unique job ids.
pub fn parse_job_list(jobs: &str) -> BTreeSet<String> {
    jobs.split(',')
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once('/') {
            Some((job_id, _slot)) => job_id.trim().to_string(),
            None => entry.to_string(),
        })
        .collect()
}
