use eframe::egui::{self, RichText, Sense, Ui, vec2};
use spacebio_graph::explorer::Explorer;
use spacebio_graph::interaction::{InteractionState, ViewportTransform};
use spacebio_graph::model::Category;
use spacebio_graph::render::category_color;

use super::super::ViewModel;

fn category_swatch(ui: &mut Ui, category: Category) {
    let (rect, _) = ui.allocate_exact_size(vec2(12.0, 12.0), Sense::hover());
    ui.painter()
        .circle_filled(rect.center(), 5.5, category_color(category));
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui, explorer: &mut Explorer) {
        ui.heading("Graph Controls");
        ui.separator();
        ui.add_space(4.0);

        ui.label(RichText::new("Categories").strong())
            .on_hover_text("With nothing ticked every category is shown.");
        let mut filter = explorer.active_filter().clone();
        let mut filter_changed = false;
        for category in Category::ALL {
            ui.horizontal(|ui| {
                category_swatch(ui, category);
                let mut active = filter.is_active(category);
                if ui.checkbox(&mut active, category.label()).changed() {
                    filter.toggle(category);
                    filter_changed = true;
                }
            });
        }
        let clear = ui
            .add_enabled(!filter.is_unfiltered(), egui::Button::new("Show all categories"))
            .clicked();
        if clear {
            filter = Default::default();
            filter_changed = true;
        }
        if filter_changed {
            explorer.select_filters(filter);
        }
        if let Some(text) = self.last_event_text() {
            ui.small(text);
        }

        ui.separator();

        ui.label("Search (label or id)")
            .on_hover_text("Fuzzy-highlight matching nodes without changing the graph.");
        ui.text_edit_singleline(&mut self.search);
        if let Some(matches) = self
            .search_match_cache
            .as_ref()
            .filter(|cached| !self.search.trim().is_empty() && cached.query == self.search.trim())
        {
            ui.small(format!("{} matching nodes", matches.matches.len()));
        }

        ui.separator();

        let Some(session) = explorer.session() else {
            return;
        };
        let pinned = session.interaction().pinned.len();
        let scale = session.viewport().scale;

        ui.label(RichText::new("Layout").strong());
        ui.label(format!("pinned nodes: {pinned}"));
        if ui
            .add_enabled(pinned > 0, egui::Button::new("Release all pins"))
            .clicked()
        {
            explorer.interact(InteractionState::on_release_all_pins);
        }

        ui.label(format!("zoom: {:.0}%", scale * 100.0));
        if ui.button("Reset view").clicked()
            && let Some(session) = explorer.session_mut()
        {
            session.set_viewport_transform(ViewportTransform::default());
        }

        ui.add_space(8.0);
        ui.small("Drag a node to pin it; double-click a pinned node to release it.");
        ui.small("Drag the canvas or shift-scroll to pan, scroll to zoom.");
    }
}
