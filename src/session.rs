//! One filter selection's lifetime: snapshot, adjacency, engine and
//! interaction state, created and replaced together.

use std::collections::BTreeSet;
use std::sync::Arc;

use eframe::egui::{Pos2, Vec2};
use tracing::debug;

use crate::adjacency::AdjacencyIndex;
use crate::config::{ExplorerConfig, ViewportConfig};
use crate::interaction::{
    Effect, Highlight, InteractionState, PointerTarget, Transition, ViewportTransform,
};
use crate::layout::LayoutEngine;
use crate::model::{GraphSnapshot, Node};
use crate::render::{hit_test, node_radius};

/// Selection after a transition, reported only when it changed.
pub type SelectionChange = Option<usize>;

pub struct GraphSession {
    key: String,
    snapshot: Arc<GraphSnapshot>,
    adjacency: AdjacencyIndex,
    engine: LayoutEngine,
    interaction: InteractionState,
    viewport_bounds: ViewportConfig,
    hit_radii: Vec<f32>,
}

impl GraphSession {
    /// Builds adjacency and seeds the layout for `snapshot`.
    pub fn initialize(
        key: &str,
        snapshot: Arc<GraphSnapshot>,
        viewport_size: Vec2,
        config: &ExplorerConfig,
    ) -> Self {
        let adjacency = AdjacencyIndex::build(&snapshot);
        let engine = LayoutEngine::new(&snapshot, viewport_size, config.layout);
        let hit_radii = snapshot
            .nodes()
            .iter()
            .map(|node| node_radius(node.frequency))
            .collect();
        debug!(key, nodes = snapshot.node_count(), "session initialized");

        Self {
            key: key.to_owned(),
            snapshot,
            adjacency,
            engine,
            interaction: InteractionState::default(),
            viewport_bounds: config.viewport,
            hit_radii,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn snapshot(&self) -> &Arc<GraphSnapshot> {
        &self.snapshot
    }

    pub fn adjacency(&self) -> &AdjacencyIndex {
        &self.adjacency
    }

    pub fn engine(&self) -> &LayoutEngine {
        &self.engine
    }

    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    pub fn viewport(&self) -> ViewportTransform {
        self.interaction.viewport
    }

    pub fn viewport_bounds(&self) -> &ViewportConfig {
        &self.viewport_bounds
    }

    pub fn highlight(&self) -> Highlight {
        Highlight::resolve(&self.interaction, &self.adjacency)
    }

    pub fn selected_node(&self) -> Option<&Node> {
        self.interaction
            .selected
            .and_then(|index| self.snapshot.node(index))
    }

    pub fn tick(&mut self) -> &[Vec2] {
        self.engine.tick()
    }

    pub fn positions(&self) -> &[Vec2] {
        self.engine.positions()
    }

    pub fn resize(&mut self, viewport_size: Vec2) {
        self.engine.resize(viewport_size);
    }

    /// Anchors the node with `id`, or releases it with `None`. Returns `false`
    /// for an unknown id.
    pub fn set_pinned(&mut self, id: &str, position: Option<Vec2>) -> bool {
        let Some(index) = self.snapshot.index_of(id) else {
            debug!(id, "ignoring pin for unknown node");
            return false;
        };

        match position {
            Some(position) if position.is_finite() => {
                self.interaction.pinned.insert(index, position);
                self.apply_effects(&[Effect::Pin {
                    node: index,
                    position,
                }]);
                self.engine.reheat(self.engine.config().drag_alpha_target);
            }
            Some(_) => return false,
            None => {
                self.interact(|state| state.on_release_pin(index));
            }
        }
        true
    }

    pub fn set_viewport_transform(&mut self, transform: ViewportTransform) {
        let bounds = self.viewport_bounds;
        self.interact(|state| state.on_viewport(transform, &bounds));
    }

    /// Ids of the nodes adjacent to `id`; empty for isolated or unknown ids.
    pub fn neighbors(&self, id: &str) -> BTreeSet<&str> {
        self.snapshot
            .index_of(id)
            .map(|index| {
                self.adjacency
                    .neighbors(index)
                    .iter()
                    .filter_map(|&neighbor| self.snapshot.node(neighbor))
                    .map(|node| node.id.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Edge ids touching `id`.
    pub fn incident_edges(&self, id: &str) -> BTreeSet<usize> {
        self.snapshot
            .index_of(id)
            .map(|index| self.adjacency.incident_edges(index).clone())
            .unwrap_or_default()
    }

    /// Hover by id. An unknown id behaves like leaving the hovered node.
    pub fn on_hover(&mut self, id: Option<&str>) {
        match id.and_then(|id| self.snapshot.index_of(id)) {
            Some(index) => self.interact(|state| state.on_hover_enter(index)),
            None => self.interact(InteractionState::on_hover_leave),
        };
    }

    /// Select by id; `None` or an unknown id clears the selection.
    pub fn on_select(&mut self, id: Option<&str>) -> Option<SelectionChange> {
        let target = id
            .and_then(|id| self.snapshot.index_of(id))
            .map_or(PointerTarget::Canvas, PointerTarget::Node);
        self.interact(|state| state.on_click(target))
    }

    /// Node under `screen`, using the current viewport.
    pub fn node_at(&self, screen: Pos2) -> Option<usize> {
        let world = self.interaction.viewport.to_world(screen);
        hit_test(self.engine.positions(), &self.hit_radii, world)
    }

    /// Runs one interaction transition and applies its effects to the engine.
    /// Returns the new selection if it changed.
    pub fn interact(
        &mut self,
        handler: impl FnOnce(InteractionState) -> Transition,
    ) -> Option<SelectionChange> {
        let Transition { state, effects } = handler(std::mem::take(&mut self.interaction));
        self.interaction = state;
        self.apply_effects(&effects)
    }

    fn apply_effects(&mut self, effects: &[Effect]) -> Option<SelectionChange> {
        let drag_alpha = self.engine.config().drag_alpha_target;
        let mut selection = None;

        for effect in effects {
            match *effect {
                Effect::Pin { node, position } => {
                    self.engine.set_pinned(node, Some(position));
                }
                Effect::Unpin { node } => {
                    self.engine.set_pinned(node, None);
                    self.engine.reheat(drag_alpha);
                }
                Effect::Reheat => {
                    self.engine.reheat(drag_alpha);
                    self.engine.set_alpha_target(drag_alpha);
                }
                Effect::Cool => self.engine.set_alpha_target(0.0),
                Effect::SelectionChanged(selected) => selection = Some(selected),
            }
        }

        selection
    }
}
