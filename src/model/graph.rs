use std::collections::HashMap;

use eframe::egui::{Vec2, vec2};
use tracing::{debug, warn};

use super::category::Category;
use super::parse::{RawGraph, RawNode};

/// Upper bound on source references kept per node.
pub const MAX_DOCUMENTS: usize = 25;

#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub title: String,
    pub url: Option<String>,
    pub year: Option<u16>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub category: Category,
    /// Number of source documents mentioning the entity, at least 1.
    pub frequency: u32,
    pub documents: Vec<Document>,
    /// Seed position supplied by the collaborator, if any.
    pub initial_position: Option<Vec2>,
}

/// Undirected weighted relationship between two node indices.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge {
    pub source: usize,
    pub target: usize,
    pub weight: f32,
}

impl Edge {
    pub fn other(&self, index: usize) -> Option<usize> {
        if self.source == index {
            Some(self.target)
        } else if self.target == index {
            Some(self.source)
        } else {
            None
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

/// Immutable input of one layout run.
///
/// Node ids are unique and every edge refers to nodes of this snapshot; edge
/// ids are positions in [`GraphSnapshot::edges`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphSnapshot {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    index_by_id: HashMap<String, usize>,
}

impl GraphSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Validates an untrusted payload, dropping whatever cannot be laid out.
    pub fn ingest(raw: RawGraph) -> Self {
        let mut nodes = Vec::with_capacity(raw.nodes.len());
        let mut index_by_id = HashMap::with_capacity(raw.nodes.len());

        for raw_node in raw.nodes {
            if index_by_id.contains_key(&raw_node.id) {
                warn!(id = %raw_node.id, "dropping duplicate node id");
                continue;
            }

            let Some(node) = Self::ingest_node(raw_node) else {
                continue;
            };
            index_by_id.insert(node.id.clone(), nodes.len());
            nodes.push(node);
        }

        let mut edges = Vec::with_capacity(raw.edges.len());
        let mut dangling = 0usize;
        for raw_edge in raw.edges {
            let (Some(&source), Some(&target)) = (
                index_by_id.get(&raw_edge.source),
                index_by_id.get(&raw_edge.target),
            ) else {
                dangling += 1;
                continue;
            };

            if !raw_edge.weight.is_finite() || raw_edge.weight <= 0.0 {
                warn!(
                    source = %raw_edge.source,
                    target = %raw_edge.target,
                    weight = raw_edge.weight,
                    "dropping edge with non-positive weight"
                );
                continue;
            }

            edges.push(Edge {
                source,
                target,
                weight: raw_edge.weight,
            });
        }

        if dangling > 0 {
            warn!(dangling, "dropped edges referencing unknown nodes");
        }
        debug!(nodes = nodes.len(), edges = edges.len(), "ingested graph snapshot");

        Self {
            nodes,
            edges,
            index_by_id,
        }
    }

    fn ingest_node(raw: RawNode) -> Option<Node> {
        let category = match raw.category.parse::<Category>() {
            Ok(category) => category,
            Err(error) => {
                warn!(id = %raw.id, %error, "dropping node");
                return None;
            }
        };

        let initial_position = match (raw.x, raw.y) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Some(vec2(x, y)),
            _ => None,
        };

        let documents = raw
            .documents
            .into_iter()
            .take(MAX_DOCUMENTS)
            .map(|document| Document {
                title: document.title,
                url: document.url,
                year: document.year,
            })
            .collect();

        let label = raw
            .label
            .filter(|label| !label.trim().is_empty())
            .unwrap_or_else(|| raw.id.clone());

        Some(Node {
            id: raw.id,
            label,
            category,
            frequency: raw.frequency.max(1),
            documents,
            initial_position,
        })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn edge(&self, edge_id: usize) -> Option<&Edge> {
        self.edges.get(edge_id)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn node_by_id(&self, id: &str) -> Option<&Node> {
        self.index_of(id).and_then(|index| self.nodes.get(index))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::super::parse::{RawDocument, RawEdge};
    use super::*;

    fn raw_node(id: &str, category: &str) -> RawNode {
        RawNode {
            id: id.to_owned(),
            label: None,
            category: category.to_owned(),
            frequency: 3,
            documents: Vec::new(),
            x: None,
            y: None,
        }
    }

    fn raw_edge(source: &str, target: &str, weight: f32) -> RawEdge {
        RawEdge {
            source: source.to_owned(),
            target: target.to_owned(),
            weight,
        }
    }

    #[test]
    fn drops_dangling_edges() {
        let snapshot = GraphSnapshot::ingest(RawGraph {
            nodes: vec![raw_node("a", "sample"), raw_node("b", "condition")],
            edges: vec![
                raw_edge("a", "b", 2.0),
                raw_edge("a", "ghost", 1.0),
                raw_edge("ghost", "b", 1.0),
            ],
        });

        assert_eq!(snapshot.edge_count(), 1);
        assert_eq!(
            snapshot.edges()[0],
            Edge {
                source: 0,
                target: 1,
                weight: 2.0
            }
        );
    }

    #[test]
    fn keeps_parallel_edges() {
        let snapshot = GraphSnapshot::ingest(RawGraph {
            nodes: vec![raw_node("a", "sample"), raw_node("b", "condition")],
            edges: vec![raw_edge("a", "b", 1.0), raw_edge("b", "a", 1.0)],
        });

        assert_eq!(snapshot.edge_count(), 2);
    }

    #[test]
    fn drops_unknown_categories_and_duplicate_ids() {
        let mut duplicate = raw_node("a", "condition");
        duplicate.label = Some("second".to_owned());
        let snapshot = GraphSnapshot::ingest(RawGraph {
            nodes: vec![raw_node("a", "sample"), raw_node("x", "planet"), duplicate],
            edges: vec![raw_edge("a", "x", 1.0)],
        });

        assert_eq!(snapshot.node_count(), 1);
        assert_eq!(snapshot.nodes()[0].category, Category::Sample);
        assert_eq!(snapshot.edge_count(), 0);
    }

    #[test]
    fn drops_non_positive_weights() {
        let snapshot = GraphSnapshot::ingest(RawGraph {
            nodes: vec![raw_node("a", "sample"), raw_node("b", "sample")],
            edges: vec![
                raw_edge("a", "b", 0.0),
                raw_edge("a", "b", -2.0),
                raw_edge("a", "b", f32::NAN),
            ],
        });

        assert_eq!(snapshot.edge_count(), 0);
    }

    #[test]
    fn normalizes_node_fields() {
        let mut node = raw_node("rna-seq", "result");
        node.frequency = 0;
        node.label = Some("   ".to_owned());
        node.x = Some(4.0);
        node.y = Some(-2.0);
        node.documents = (0..40)
            .map(|index| RawDocument {
                title: format!("paper {index}"),
                url: None,
                year: Some(2020),
            })
            .collect();

        let snapshot = GraphSnapshot::ingest(RawGraph {
            nodes: vec![node],
            edges: Vec::new(),
        });
        let node = &snapshot.nodes()[0];

        assert_eq!(node.frequency, 1);
        assert_eq!(node.label, "rna-seq");
        assert_eq!(node.initial_position, Some(vec2(4.0, -2.0)));
        assert_eq!(node.documents.len(), MAX_DOCUMENTS);
        assert_eq!(snapshot.index_of("rna-seq"), Some(0));
    }

    #[test]
    fn empty_payload_is_a_valid_snapshot() {
        let snapshot = GraphSnapshot::ingest(RawGraph::default());
        assert!(snapshot.is_empty());
        assert_eq!(snapshot, GraphSnapshot::empty());
    }
}
