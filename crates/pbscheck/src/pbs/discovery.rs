use serde_json::Value;

use crate::pbs::client::PbsClient;

/// Finds the first node (by name) whose `pbsnodes -a -F json` description mentions `marker`.
pub fn find_marked_node(data: &str, marker: &str) -> anyhow::Result<Option<String>> {
    let data: Value = serde_json::from_str(data)?;
    let nodes = data["nodes"]
        .as_object()
        .ok_or_else(|| anyhow::anyhow!("pbsnodes output does not contain a node list"))?;

    let marker = marker.to_lowercase();
    let mut names: Vec<&String> = nodes
        .iter()
        .filter(|(_, description)| description.to_string().to_lowercase().contains(&marker))
        .map(|(name, _)| name)
        .collect();
    names.sort();
    Ok(names.first().map(|name| name.to_string()))
}

/// Resolves the node that serves interactive jobs, falling back to `fallback`
/// when the scheduler cannot be asked or no node matches.
pub fn discover_interactive_node(client: &dyn PbsClient, marker: &str, fallback: &str) -> String {
    match client
        .node_list_json()
        .and_then(|output| find_marked_node(&output, marker))
    {
        Ok(Some(node)) => {
            log::debug!("Discovered interactive node {node}");
            node
        }
        Ok(None) => {
            log::warn!("No node mentions `{marker}`, using {fallback} as the interactive node");
            fallback.to_string()
        }
        Err(error) => {
            log::warn!(
                "Could not discover the interactive node, using {fallback}: {error:#}"
            );
            fallback.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{discover_interactive_node, find_marked_node};
    use crate::tests::utils::{MockPbs, PBSNODES_JSON};

    #[test]
    fn marker_in_description() {
        assert_eq!(
            find_marked_node(PBSNODES_JSON, "interactive").unwrap(),
            Some("node100".to_string())
        );
    }

    #[test]
    fn marker_is_case_insensitive() {
        assert_eq!(
            find_marked_node(PBSNODES_JSON, "DEDICATED").unwrap(),
            Some("node100".to_string())
        );
    }

    #[test]
    fn first_match_by_name() {
        assert_eq!(
            find_marked_node(PBSNODES_JSON, "free").unwrap(),
            Some("node001".to_string())
        );
    }

    #[test]
    fn no_match() {
        assert_eq!(find_marked_node(PBSNODES_JSON, "gpu").unwrap(), None);
        assert!(find_marked_node("{}", "interactive").is_err());
    }

    #[test]
    fn fallback_on_failure() {
        let pbs = MockPbs::default();
        assert_eq!(
            discover_interactive_node(&pbs, "interactive", "fallback01"),
            "fallback01"
        );

        let pbs = MockPbs {
            node_list_json: Some(PBSNODES_JSON.to_string()),
            ..Default::default()
        };
        assert_eq!(
            discover_interactive_node(&pbs, "nothing-like-this", "fallback01"),
            "fallback01"
        );
        assert_eq!(
            discover_interactive_node(&pbs, "interactive", "fallback01"),
            "node100"
        );
    }
}
