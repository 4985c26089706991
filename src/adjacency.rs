//! Neighbor and incident-edge lookups for one snapshot.

use std::collections::BTreeSet;

use crate::model::GraphSnapshot;

static EMPTY: BTreeSet<usize> = BTreeSet::new();

/// Precomputed adjacency of a [`GraphSnapshot`], immutable once built.
///
/// Rebuild it together with the snapshot; an index never outlives the
/// snapshot it was derived from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AdjacencyIndex {
    neighbors: Vec<BTreeSet<usize>>,
    incident: Vec<BTreeSet<usize>>,
    endpoints: Vec<(usize, usize)>,
}

impl AdjacencyIndex {
    pub fn build(snapshot: &GraphSnapshot) -> Self {
        let node_count = snapshot.node_count();
        let mut neighbors = vec![BTreeSet::new(); node_count];
        let mut incident = vec![BTreeSet::new(); node_count];
        let endpoints = snapshot
            .edges()
            .iter()
            .map(|edge| (edge.source, edge.target))
            .collect();

        for (edge_id, edge) in snapshot.edges().iter().enumerate() {
            if edge.source >= node_count || edge.target >= node_count {
                continue;
            }

            incident[edge.source].insert(edge_id);
            incident[edge.target].insert(edge_id);
            if !edge.is_self_loop() {
                neighbors[edge.source].insert(edge.target);
                neighbors[edge.target].insert(edge.source);
            }
        }

        Self {
            neighbors,
            incident,
            endpoints,
        }
    }

    /// Nodes sharing at least one edge with `index`. Empty for isolated or
    /// unknown nodes.
    pub fn neighbors(&self, index: usize) -> &BTreeSet<usize> {
        self.neighbors.get(index).unwrap_or(&EMPTY)
    }

    /// Ids of every edge touching `index`, parallel duplicates included.
    pub fn incident_edges(&self, index: usize) -> &BTreeSet<usize> {
        self.incident.get(index).unwrap_or(&EMPTY)
    }

    pub fn edge_endpoints(&self, edge_id: usize) -> Option<(usize, usize)> {
        self.endpoints.get(edge_id).copied()
    }

    pub fn degree(&self, index: usize) -> usize {
        self.neighbors(index).len()
    }

    pub fn node_count(&self) -> usize {
        self.neighbors.len()
    }
}
