use eframe::egui::{self, CursorIcon, PointerButton, Pos2, Rect, Ui};
use spacebio_graph::explorer::Explorer;
use spacebio_graph::interaction::{InteractionState, PointerTarget, ViewportTransform};

use super::super::ViewModel;
use super::super::render_utils::to_local;

fn node_under(explorer: &Explorer, local: Pos2) -> Option<usize> {
    explorer.session().and_then(|session| session.node_at(local))
}

impl ViewModel {
    /// Turns this frame's pointer input into interaction transitions.
    pub(in crate::app) fn handle_pointer(
        &self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
        explorer: &mut Explorer,
    ) {
        let Some(session) = explorer.session() else {
            return;
        };
        let bounds = *session.viewport_bounds();
        let current_hover = session.interaction().hovered;
        let dragging_node = session.interaction().dragged_node().is_some();
        let pointer = response.hover_pos().map(|pointer| to_local(rect, pointer));

        // A dragged node keeps its hover so the highlight does not flicker.
        let hovered = if dragging_node {
            current_hover
        } else {
            pointer.and_then(|pointer| node_under(explorer, pointer))
        };
        if hovered != current_hover {
            explorer.interact(|state| match hovered {
                Some(node) => state.on_hover_enter(node),
                None => state.on_hover_leave(),
            });
        }

        if response.hovered() {
            let (scroll, shift) =
                ui.input(|input| (input.raw_scroll_delta, input.modifiers.shift));
            // Shift or a sideways trackpad swipe pans; a plain wheel zooms.
            if shift || scroll.x.abs() > f32::EPSILON {
                if scroll.length_sq() > f32::EPSILON {
                    explorer.interact(|state| state.on_pan(scroll));
                }
            } else if scroll.y.abs() > f32::EPSILON {
                let anchor = pointer.unwrap_or_else(|| to_local(rect, rect.center()));
                let factor = ViewportTransform::wheel_factor(scroll.y, &bounds);
                explorer.interact(|state| state.on_zoom(anchor, factor, &bounds));
            }
        }

        if response.drag_started() {
            let origin = ui
                .input(|input| input.pointer.press_origin())
                .map(|origin| to_local(rect, origin));
            if let Some(origin) = origin {
                let grabbed = if response.drag_started_by(PointerButton::Primary) {
                    node_under(explorer, origin).and_then(|node| {
                        let position = explorer.session()?.engine().position(node)?;
                        Some((node, position))
                    })
                } else {
                    None
                };

                match grabbed {
                    Some((node, position)) => {
                        explorer.interact(|state| state.on_drag_start(node, position, origin));
                    }
                    None => explorer.interact(|state| state.on_pan_start(origin)),
                }
            }
        }

        if response.dragged()
            && let Some(pointer) = response.interact_pointer_pos()
        {
            let pointer = to_local(rect, pointer);
            explorer.interact(|state| state.on_drag_move(pointer));
        }

        if response.drag_stopped() {
            explorer.interact(InteractionState::on_drag_end);
        }

        if response.double_clicked() {
            if let Some(node) = pointer.and_then(|pointer| node_under(explorer, pointer)) {
                explorer.interact(|state| state.on_release_pin(node));
            }
        } else if response.clicked_by(PointerButton::Primary) {
            let target = pointer
                .and_then(|pointer| node_under(explorer, pointer))
                .map_or(PointerTarget::Canvas, PointerTarget::Node);
            explorer.interact(|state| state.on_click(target));
        }

        let cursor = if explorer
            .session()
            .is_some_and(|session| session.interaction().dragged_node().is_some())
        {
            Some(CursorIcon::Grabbing)
        } else if hovered.is_some() {
            Some(CursorIcon::PointingHand)
        } else {
            None
        };
        if let Some(cursor) = cursor {
            ui.output_mut(|output| {
                output.cursor_icon = cursor;
            });
        }
    }
}
