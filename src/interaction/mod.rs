//! Pointer-driven interaction as explicit state transitions.
//!
//! Every handler consumes the current [`InteractionState`] and returns the next
//! one together with the [`Effect`]s the host must apply to the layout engine
//! and the detail panel. Handlers never reach into the engine themselves.

use std::collections::BTreeMap;

use eframe::egui::{Pos2, Vec2};

use crate::config::ViewportConfig;

mod highlight;
mod viewport;

pub use highlight::{FocusSource, Highlight};
pub use viewport::ViewportTransform;

/// What a pointer event landed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerTarget {
    Node(usize),
    Canvas,
}

/// In-flight drag gesture.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Gesture {
    #[default]
    Idle,
    /// Dragging a node; `grab_offset` keeps the node from jumping to the cursor.
    Node { node: usize, grab_offset: Vec2 },
    Pan { last: Pos2 },
}

/// Side effect requested by a transition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Effect {
    Pin { node: usize, position: Vec2 },
    Unpin { node: usize },
    /// Keep the simulation warm while a drag is in progress.
    Reheat,
    /// Let the simulation cool down again.
    Cool,
    SelectionChanged(Option<usize>),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct InteractionState {
    pub hovered: Option<usize>,
    pub selected: Option<usize>,
    pub pinned: BTreeMap<usize, Vec2>,
    pub viewport: ViewportTransform,
    pub gesture: Gesture,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub state: InteractionState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn quiet(state: InteractionState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }
}

impl InteractionState {
    pub fn is_pinned(&self, node: usize) -> bool {
        self.pinned.contains_key(&node)
    }

    pub fn dragged_node(&self) -> Option<usize> {
        match self.gesture {
            Gesture::Node { node, .. } => Some(node),
            _ => None,
        }
    }

    /// Replaces any previous hover; highlight is derived from scratch so a
    /// rapid re-entry cannot leave stale dimming behind.
    pub fn on_hover_enter(mut self, node: usize) -> Transition {
        self.hovered = Some(node);
        Transition::quiet(self)
    }

    pub fn on_hover_leave(mut self) -> Transition {
        self.hovered = None;
        Transition::quiet(self)
    }

    pub fn on_click(mut self, target: PointerTarget) -> Transition {
        let selected = match target {
            PointerTarget::Node(node) => Some(node),
            PointerTarget::Canvas => None,
        };

        if selected == self.selected {
            return Transition::quiet(self);
        }

        self.selected = selected;
        Transition {
            state: self,
            effects: vec![Effect::SelectionChanged(selected)],
        }
    }

    /// Pins `node` where it currently is and warms the simulation.
    pub fn on_drag_start(mut self, node: usize, node_position: Vec2, pointer: Pos2) -> Transition {
        let grab_offset = node_position - self.viewport.to_world(pointer);
        self.gesture = Gesture::Node { node, grab_offset };
        self.pinned.insert(node, node_position);

        Transition {
            state: self,
            effects: vec![
                Effect::Pin {
                    node,
                    position: node_position,
                },
                Effect::Reheat,
            ],
        }
    }

    pub fn on_pan_start(mut self, pointer: Pos2) -> Transition {
        self.gesture = Gesture::Pan { last: pointer };
        Transition::quiet(self)
    }

    /// `pointer` is in screen space; node drags are inverse-transformed into
    /// simulation space.
    pub fn on_drag_move(mut self, pointer: Pos2) -> Transition {
        match self.gesture {
            Gesture::Node { node, grab_offset } => {
                let position = self.viewport.to_world(pointer) + grab_offset;
                self.pinned.insert(node, position);
                Transition {
                    state: self,
                    effects: vec![Effect::Pin { node, position }],
                }
            }
            Gesture::Pan { last } => {
                self.viewport.pan_by(pointer - last);
                self.gesture = Gesture::Pan { last: pointer };
                Transition::quiet(self)
            }
            Gesture::Idle => Transition::quiet(self),
        }
    }

    /// Ends the gesture. A dragged node stays pinned where it was dropped.
    pub fn on_drag_end(mut self) -> Transition {
        let was_node = matches!(self.gesture, Gesture::Node { .. });
        self.gesture = Gesture::Idle;

        if was_node {
            Transition {
                state: self,
                effects: vec![Effect::Cool],
            }
        } else {
            Transition::quiet(self)
        }
    }

    /// Translates the view by a screen-space delta, e.g. from a scroll gesture.
    pub fn on_pan(mut self, delta: Vec2) -> Transition {
        self.viewport.pan_by(delta);
        Transition::quiet(self)
    }

    pub fn on_zoom(mut self, anchor: Pos2, factor: f32, bounds: &ViewportConfig) -> Transition {
        self.viewport.zoom_at(anchor, factor, bounds);
        Transition::quiet(self)
    }

    pub fn on_viewport(mut self, transform: ViewportTransform, bounds: &ViewportConfig) -> Transition {
        self.viewport = transform.clamped(bounds);
        Transition::quiet(self)
    }

    pub fn on_release_pin(mut self, node: usize) -> Transition {
        if self.pinned.remove(&node).is_none() {
            return Transition::quiet(self);
        }
        let mut effects = vec![Effect::Unpin { node }];
        if self.dragged_node() == Some(node) {
            self.gesture = Gesture::Idle;
            effects.push(Effect::Cool);
        }

        Transition {
            state: self,
            effects,
        }
    }

    pub fn on_release_all_pins(mut self) -> Transition {
        let mut effects = std::mem::take(&mut self.pinned)
            .into_keys()
            .map(|node| Effect::Unpin { node })
            .collect::<Vec<_>>();
        if matches!(self.gesture, Gesture::Node { .. }) {
            self.gesture = Gesture::Idle;
            effects.push(Effect::Cool);
        }

        Transition {
            state: self,
            effects,
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use eframe::egui::{pos2, vec2};

    use super::*;

    #[test]
    fn hover_replaces_previous_node() {
        let state = InteractionState::default()
            .on_hover_enter(3)
            .state
            .on_hover_enter(5)
            .state;
        assert_eq!(state.hovered, Some(5));

        let state = state.on_hover_leave().state;
        assert_eq!(state.hovered, None);
    }

    #[test]
    fn click_selects_and_canvas_clears() {
        let transition = InteractionState::default().on_click(PointerTarget::Node(2));
        assert_eq!(transition.state.selected, Some(2));
        assert_eq!(transition.effects, vec![Effect::SelectionChanged(Some(2))]);

        let again = transition.state.on_click(PointerTarget::Node(2));
        assert!(again.effects.is_empty());

        let cleared = again.state.on_click(PointerTarget::Canvas);
        assert_eq!(cleared.state.selected, None);
        assert_eq!(cleared.effects, vec![Effect::SelectionChanged(None)]);
    }

    #[test]
    fn selection_and_hover_are_independent() {
        let state = InteractionState::default()
            .on_click(PointerTarget::Node(1))
            .state
            .on_hover_enter(4)
            .state
            .on_hover_leave()
            .state;
        assert_eq!(state.selected, Some(1));
        assert_eq!(state.hovered, None);
    }

    #[test]
    fn drag_pins_in_simulation_space_and_stays_pinned() {
        let mut state = InteractionState::default();
        state.viewport = ViewportTransform {
            translate: vec2(100.0, 50.0),
            scale: 2.0,
        };

        // Node at world (10, 10) is drawn at screen (120, 70).
        let start = state.on_drag_start(7, vec2(10.0, 10.0), pos2(120.0, 70.0));
        assert_eq!(
            start.effects,
            vec![
                Effect::Pin {
                    node: 7,
                    position: vec2(10.0, 10.0)
                },
                Effect::Reheat
            ]
        );

        let moved = start.state.on_drag_move(pos2(140.0, 90.0));
        let pinned = moved.state.pinned[&7];
        assert_abs_diff_eq!(pinned.x, 20.0, epsilon = 1e-4);
        assert_abs_diff_eq!(pinned.y, 20.0, epsilon = 1e-4);

        let ended = moved.state.on_drag_end();
        assert_eq!(ended.effects, vec![Effect::Cool]);
        assert_eq!(ended.state.gesture, Gesture::Idle);
        assert_eq!(ended.state.pinned.get(&7), Some(&pinned));
    }

    #[test]
    fn grab_offset_prevents_jump() {
        let start = InteractionState::default().on_drag_start(0, vec2(5.0, 5.0), pos2(8.0, 5.0));
        let moved = start.state.on_drag_move(pos2(8.0, 5.0));
        assert_eq!(moved.state.pinned[&0], vec2(5.0, 5.0));
    }

    #[test]
    fn pan_translates_viewport_only() {
        let state = InteractionState::default()
            .on_pan_start(pos2(10.0, 10.0))
            .state
            .on_drag_move(pos2(25.0, 5.0))
            .state
            .on_drag_move(pos2(30.0, 0.0))
            .state;
        assert_eq!(state.viewport.translate, vec2(20.0, -10.0));
        assert!(state.pinned.is_empty());

        let ended = state.on_drag_end();
        assert!(ended.effects.is_empty());
    }

    #[test]
    fn release_pin_emits_unpin() {
        let state = InteractionState::default()
            .on_drag_start(1, vec2(0.0, 0.0), pos2(0.0, 0.0))
            .state
            .on_drag_end()
            .state;

        let released = state.on_release_pin(1);
        assert_eq!(released.effects, vec![Effect::Unpin { node: 1 }]);
        assert!(!released.state.is_pinned(1));

        let noop = released.state.on_release_pin(1);
        assert!(noop.effects.is_empty());
    }

    #[test]
    fn releasing_the_dragged_node_cools_the_simulation() {
        let dragging = InteractionState::default()
            .on_drag_start(4, vec2(3.0, 3.0), pos2(3.0, 3.0))
            .state;

        let released = dragging.clone().on_release_pin(4);
        assert_eq!(
            released.effects,
            vec![Effect::Unpin { node: 4 }, Effect::Cool]
        );
        assert_eq!(released.state.gesture, Gesture::Idle);
        assert!(released.state.on_drag_end().effects.is_empty());

        let all = dragging.on_release_all_pins();
        assert_eq!(all.effects, vec![Effect::Unpin { node: 4 }, Effect::Cool]);
        assert_eq!(all.state.gesture, Gesture::Idle);
    }

    #[test]
    fn releasing_a_resting_pin_leaves_the_drag_alone() {
        let state = InteractionState::default()
            .on_drag_start(1, vec2(0.0, 0.0), pos2(0.0, 0.0))
            .state
            .on_drag_end()
            .state
            .on_drag_start(2, vec2(9.0, 9.0), pos2(9.0, 9.0))
            .state;

        let released = state.on_release_pin(1);
        assert_eq!(released.effects, vec![Effect::Unpin { node: 1 }]);
        assert_eq!(released.state.dragged_node(), Some(2));
    }

    #[test]
    fn pan_by_delta_moves_only_the_viewport() {
        let state = InteractionState::default()
            .on_drag_start(3, vec2(1.0, 1.0), pos2(1.0, 1.0))
            .state;
        let panned = state.on_pan(vec2(12.0, -4.0));
        assert!(panned.effects.is_empty());
        assert_eq!(panned.state.viewport.translate, vec2(12.0, -4.0));
        assert_eq!(panned.state.pinned[&3], vec2(1.0, 1.0));
        assert_eq!(panned.state.dragged_node(), Some(3));
    }

    #[test]
    fn viewport_override_is_clamped() {
        let bounds = ViewportConfig::default();
        let state = InteractionState::default()
            .on_viewport(
                ViewportTransform {
                    translate: vec2(1.0, 2.0),
                    scale: 40.0,
                },
                &bounds,
            )
            .state;
        assert_eq!(state.viewport.scale, bounds.max_scale);
        assert_eq!(state.viewport.translate, vec2(1.0, 2.0));
    }
}
