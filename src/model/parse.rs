use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct RawDocument {
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub year: Option<u16>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RawNode {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    pub category: String,
    #[serde(default = "default_frequency")]
    pub frequency: u32,
    #[serde(default)]
    pub documents: Vec<RawDocument>,
    #[serde(default)]
    pub x: Option<f32>,
    #[serde(default)]
    pub y: Option<f32>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RawEdge {
    pub source: String,
    pub target: String,
    #[serde(default = "default_weight")]
    pub weight: f32,
}

/// Untrusted payload as handed over by the graph collaborator.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawGraph {
    pub nodes: Vec<RawNode>,
    pub edges: Vec<RawEdge>,
}

fn default_frequency() -> u32 {
    1
}

fn default_weight() -> f32 {
    1.0
}

/// Parses a `{nodes, edges}` JSON payload.
///
/// Individual entries that fail to deserialize are skipped with a warning; only
/// a payload that is not a graph object at all is an error.
pub fn parse_graph_payload(raw: &str) -> Result<RawGraph> {
    let parsed: Value = serde_json::from_str(raw).context("invalid JSON graph payload")?;
    let object = parsed
        .as_object()
        .ok_or_else(|| anyhow!("graph payload must be a JSON object"))?;

    let node_values = object
        .get("nodes")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("graph payload has no `nodes` array"))?;

    let mut nodes = Vec::with_capacity(node_values.len());
    for (position, value) in node_values.iter().enumerate() {
        match RawNode::deserialize(value) {
            Ok(node) => nodes.push(node),
            Err(error) => warn!(position, %error, "skipping malformed node entry"),
        }
    }

    let mut edges = Vec::new();
    if let Some(edge_values) = object.get("edges").and_then(Value::as_array) {
        edges.reserve(edge_values.len());
        for (position, value) in edge_values.iter().enumerate() {
            match RawEdge::deserialize(value) {
                Ok(edge) => edges.push(edge),
                Err(error) => warn!(position, %error, "skipping malformed edge entry"),
            }
        }
    }

    Ok(RawGraph { nodes, edges })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_payload() {
        let raw = r#"{
            "nodes": [
                {"id": "arabidopsis", "label": "Arabidopsis", "category": "sample", "frequency": 12},
                {"id": "microgravity", "category": "condition"}
            ],
            "edges": [{"source": "arabidopsis", "target": "microgravity", "weight": 4}]
        }"#;

        let graph = parse_graph_payload(raw).unwrap();
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.nodes[1].frequency, 1);
        assert_eq!(graph.nodes[1].label, None);
        assert_eq!(graph.edges[0].weight, 4.0);
    }

    #[test]
    fn skips_malformed_entries() {
        let raw = r#"{
            "nodes": [{"id": "a", "category": "sample"}, {"label": "no id"}],
            "edges": [{"source": "a"}]
        }"#;

        let graph = parse_graph_payload(raw).unwrap();
        assert_eq!(graph.nodes.len(), 1);
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn missing_edges_is_an_empty_list() {
        let graph = parse_graph_payload(r#"{"nodes": []}"#).unwrap();
        assert!(graph.nodes.is_empty());
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn rejects_non_graph_payloads() {
        assert!(parse_graph_payload("[1, 2, 3]").is_err());
        assert!(parse_graph_payload(r#"{"edges": []}"#).is_err());
        assert!(parse_graph_payload("not json").is_err());
    }
}
