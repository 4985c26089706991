use std::collections::BTreeSet;

use crate::adjacency::AdjacencyIndex;

use super::InteractionState;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FocusSource {
    Hover,
    Selection,
}

/// Which nodes and edges stay at full opacity.
///
/// Hover wins over selection; without either, nothing is dimmed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Highlight {
    focus: Option<(usize, FocusSource)>,
    nodes: BTreeSet<usize>,
    edges: BTreeSet<usize>,
}

impl Highlight {
    pub fn resolve(state: &InteractionState, adjacency: &AdjacencyIndex) -> Self {
        let focus = state
            .hovered
            .map(|node| (node, FocusSource::Hover))
            .or_else(|| state.selected.map(|node| (node, FocusSource::Selection)))
            .filter(|(node, _)| *node < adjacency.node_count());

        let Some((node, source)) = focus else {
            return Self::default();
        };

        let mut nodes = adjacency.neighbors(node).clone();
        nodes.insert(node);

        Self {
            focus: Some((node, source)),
            nodes,
            edges: adjacency.incident_edges(node).clone(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.focus.is_some()
    }

    pub fn focus(&self) -> Option<usize> {
        self.focus.map(|(node, _)| node)
    }

    pub fn source(&self) -> Option<FocusSource> {
        self.focus.map(|(_, source)| source)
    }

    pub fn is_focus(&self, node: usize) -> bool {
        self.focus() == Some(node)
    }

    pub fn node_dimmed(&self, node: usize) -> bool {
        self.is_active() && !self.nodes.contains(&node)
    }

    pub fn edge_dimmed(&self, edge_id: usize) -> bool {
        self.is_active() && !self.edges.contains(&edge_id)
    }

    pub fn nodes(&self) -> &BTreeSet<usize> {
        &self.nodes
    }

    pub fn edges(&self) -> &BTreeSet<usize> {
        &self.edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GraphSnapshot, RawEdge, RawGraph, RawNode};

    fn chain() -> AdjacencyIndex {
        let node = |id: &str| RawNode {
            id: id.to_owned(),
            label: None,
            category: "sample".to_owned(),
            frequency: 1,
            documents: Vec::new(),
            x: None,
            y: None,
        };
        let edge = |source: &str, target: &str| RawEdge {
            source: source.to_owned(),
            target: target.to_owned(),
            weight: 1.0,
        };
        let snapshot = GraphSnapshot::ingest(RawGraph {
            nodes: vec![node("a"), node("b"), node("c"), node("d")],
            edges: vec![edge("a", "b"), edge("b", "c"), edge("c", "d")],
        });
        AdjacencyIndex::build(&snapshot)
    }

    #[test]
    fn idle_state_dims_nothing() {
        let highlight = Highlight::resolve(&InteractionState::default(), &chain());
        assert!(!highlight.is_active());
        assert!(!highlight.node_dimmed(0));
        assert!(!highlight.edge_dimmed(0));
    }

    #[test]
    fn hover_keeps_neighborhood_lit() {
        let adjacency = chain();
        let state = InteractionState::default().on_hover_enter(1).state;
        let highlight = Highlight::resolve(&state, &adjacency);

        assert_eq!(highlight.nodes(), &BTreeSet::from([0, 1, 2]));
        assert!(highlight.node_dimmed(3));
        assert!(!highlight.edge_dimmed(0));
        assert!(!highlight.edge_dimmed(1));
        assert!(highlight.edge_dimmed(2));
    }

    #[test]
    fn rapid_reentry_leaves_no_stale_dimming() {
        let adjacency = chain();
        let state = InteractionState::default()
            .on_hover_enter(0)
            .state
            .on_hover_enter(3)
            .state;
        let highlight = Highlight::resolve(&state, &adjacency);

        assert_eq!(highlight.nodes(), &BTreeSet::from([2, 3]));
        assert!(highlight.node_dimmed(0));
    }

    #[test]
    fn hover_takes_precedence_over_selection() {
        let adjacency = chain();
        let state = InteractionState::default()
            .on_click(super::super::PointerTarget::Node(0))
            .state
            .on_hover_enter(3)
            .state;

        let highlight = Highlight::resolve(&state, &adjacency);
        assert_eq!(highlight.focus(), Some(3));
        assert_eq!(highlight.source(), Some(FocusSource::Hover));

        let state = state.on_hover_leave().state;
        let highlight = Highlight::resolve(&state, &adjacency);
        assert_eq!(highlight.focus(), Some(0));
        assert_eq!(highlight.source(), Some(FocusSource::Selection));
    }
}
