use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::{Align2, Color32, FontId, Sense, Stroke, Ui, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use spacebio_graph::explorer::Explorer;
use spacebio_graph::render::{
    NodeFlags, circle_visible, edge_visual, node_visual, segment_visible, with_opacity,
};

use super::super::render_utils::{draw_background, to_window};
use super::super::{SearchMatchCache, ViewModel};

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

impl ViewModel {
    fn cached_search_matches(&mut self, explorer: &Explorer) -> Option<Arc<HashSet<usize>>> {
        let query = self.search.trim();
        if query.is_empty() {
            return None;
        }
        let snapshot = explorer.session()?.snapshot();

        if let Some(cached) = &self.search_match_cache
            && Arc::ptr_eq(&cached.snapshot, snapshot)
            && cached.query == query
        {
            return Some(Arc::clone(&cached.matches));
        }

        let matcher = SkimMatcherV2::default();
        let matches = snapshot
            .nodes()
            .iter()
            .enumerate()
            .filter(|(_, node)| {
                fuzzy_match_score(&matcher, &node.label, query).is_some()
                    || fuzzy_match_score(&matcher, &node.id, query).is_some()
            })
            .map(|(index, _)| index)
            .collect::<HashSet<_>>();
        let matches = Arc::new(matches);

        self.search_match_cache = Some(SearchMatchCache {
            query: query.to_owned(),
            snapshot: Arc::clone(snapshot),
            matches: Arc::clone(&matches),
        });

        Some(matches)
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui, explorer: &mut Explorer) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        explorer.resize(rect.size());
        let painter = ui.painter_at(rect);

        let viewport = explorer
            .session()
            .map(|session| session.viewport())
            .unwrap_or_default();
        draw_background(&painter, rect, &viewport);

        if explorer.session().is_none() {
            self.visible_node_count = 0;
            self.visible_edge_count = 0;
            let message = if explorer.is_loading() {
                "Loading knowledge graph..."
            } else {
                "No graph loaded."
            };
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                message,
                FontId::proportional(18.0),
                Color32::from_gray(200),
            );
            return;
        }

        self.handle_pointer(ui, rect, &response, explorer);
        let search_matches = self.cached_search_matches(explorer);
        explorer.tick();

        let Some(session) = explorer.session() else {
            return;
        };
        if !session.engine().is_converged() || response.dragged() {
            ui.ctx().request_repaint();
        }

        let viewport = session.viewport();
        let highlight = session.highlight();
        let snapshot = session.snapshot();
        let positions = session.positions();
        let interaction = session.interaction();

        let mut visible_edge_count = 0usize;
        for (edge_id, edge) in snapshot.edges().iter().enumerate() {
            if edge.is_self_loop() {
                continue;
            }
            let visual = edge_visual(
                edge_id,
                edge.weight,
                positions[edge.source],
                positions[edge.target],
                &highlight,
                &viewport,
            );
            let from = to_window(rect, visual.from);
            let to = to_window(rect, visual.to);
            if !segment_visible(rect, from, to) {
                continue;
            }

            painter.line_segment([from, to], Stroke::new(visual.width, visual.color));
            visible_edge_count += 1;
        }
        self.visible_edge_count = visible_edge_count;

        // Dimmed nodes first, then by size, so the focus neighborhood sits on top.
        let mut draw_order = (0..snapshot.node_count()).collect::<Vec<_>>();
        draw_order.sort_by_key(|&index| {
            (
                !highlight.node_dimmed(index),
                snapshot.nodes()[index].frequency,
            )
        });

        let mut visible_node_count = 0usize;
        for index in draw_order {
            let node = &snapshot.nodes()[index];
            let flags = NodeFlags {
                selected: interaction.selected == Some(index),
                pinned: interaction.is_pinned(index),
                search_hit: search_matches
                    .as_ref()
                    .is_some_and(|matches| matches.contains(&index)),
            };
            let visual = node_visual(
                index,
                node.category,
                node.frequency,
                positions[index],
                flags,
                &highlight,
                &viewport,
            );
            let center = to_window(rect, visual.center);
            if !circle_visible(rect, center, visual.radius) {
                continue;
            }
            visible_node_count += 1;

            let dimmed = highlight.node_dimmed(index);
            painter.circle_filled(center, visual.radius, visual.fill);

            let outline = if flags.selected {
                Color32::from_rgb(245, 206, 93)
            } else if flags.pinned {
                Color32::from_gray(235)
            } else {
                Color32::from_rgba_unmultiplied(10, 12, 16, 190)
            };
            let outline = if dimmed {
                with_opacity(outline, 0.3)
            } else {
                outline
            };
            painter.circle_stroke(center, visual.radius, Stroke::new(visual.stroke_width, outline));

            if flags.pinned {
                painter.circle_filled(
                    center + vec2(visual.radius * 0.7, -visual.radius * 0.7),
                    2.5,
                    outline,
                );
            }

            if visual.show_label || (flags.search_hit && viewport.scale > 0.35) {
                let label_color = if dimmed {
                    Color32::from_gray(110)
                } else {
                    Color32::from_gray(238)
                };
                painter.text(
                    center + vec2(visual.radius + 5.0, 0.0),
                    Align2::LEFT_CENTER,
                    node.label.as_str(),
                    FontId::proportional(12.0),
                    label_color,
                );
            }
        }
        self.visible_node_count = visible_node_count;

        if let Some(hovered) = interaction.hovered
            && let Some(node) = snapshot.node(hovered)
        {
            let panel_text = format!(
                "{}  |  {}  |  {} documents  |  {} neighbors",
                node.label,
                node.category.label(),
                node.frequency,
                session.adjacency().degree(hovered)
            );
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                panel_text,
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        if explorer.is_loading() {
            painter.text(
                rect.right_top() + vec2(-10.0, 10.0),
                Align2::RIGHT_TOP,
                "fetching...",
                FontId::proportional(13.0),
                Color32::from_rgb(103, 196, 255),
            );
        }
    }
}
