use eframe::egui::{self, RichText, Ui};
use spacebio_graph::explorer::Explorer;
use spacebio_graph::model::MAX_DOCUMENTS;
use spacebio_graph::render::category_color;

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui, explorer: &mut Explorer) {
        ui.heading("Selection Details");
        ui.add_space(6.0);

        let Some(node) = self.selected_details.borrow().clone() else {
            ui.label("Click a node in the graph to see its publications.");
            return;
        };

        ui.label(
            RichText::new(node.label.as_str())
                .strong()
                .color(category_color(node.category)),
        );
        ui.small(node.id.as_str());
        ui.add_space(6.0);

        ui.label(format!("Category: {}", node.category));
        ui.label(format!("Mentioned in {} documents", node.frequency));

        let mut pending_selection = None;
        let mut release_pin = None;
        if let Some(session) = explorer.session() {
            if let Some(index) = session.snapshot().index_of(&node.id)
                && session.interaction().is_pinned(index)
            {
                ui.horizontal(|ui| {
                    ui.label("Pinned in place");
                    if ui.button("Release").clicked() {
                        release_pin = Some(index);
                    }
                });
            }

            let neighbors = session.neighbors(&node.id);
            ui.separator();
            ui.label(RichText::new(format!("Connected entities ({})", neighbors.len())).strong());
            if neighbors.is_empty() {
                ui.label("No co-occurring entities under the current filter.");
            } else {
                egui::ScrollArea::vertical()
                    .id_salt("neighbor_scroll")
                    .max_height(220.0)
                    .auto_shrink([false, true])
                    .show(ui, |ui| {
                        for neighbor_id in neighbors {
                            let Some(neighbor) = session.snapshot().node_by_id(neighbor_id) else {
                                continue;
                            };
                            let text = RichText::new(neighbor.label.as_str())
                                .color(category_color(neighbor.category));
                            if ui.link(text).on_hover_text(neighbor_id).clicked() {
                                pending_selection = Some(neighbor_id.to_owned());
                            }
                        }
                    });
            }
        }

        ui.separator();
        ui.label(RichText::new("Source documents").strong());
        if node.documents.is_empty() {
            ui.label("No documents attached to this entity.");
        } else {
            egui::ScrollArea::vertical()
                .id_salt("documents_scroll")
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    for document in &node.documents {
                        let title = match document.year {
                            Some(year) => format!("{} ({year})", document.title),
                            None => document.title.clone(),
                        };
                        match &document.url {
                            Some(url) => {
                                ui.hyperlink_to(title, url);
                            }
                            None => {
                                ui.label(title);
                            }
                        }
                    }
                    if node.frequency as usize > node.documents.len()
                        && node.documents.len() == MAX_DOCUMENTS
                    {
                        ui.small(format!(
                            "showing the first {MAX_DOCUMENTS} of {} documents",
                            node.frequency
                        ));
                    }
                });
        }

        if let Some(index) = release_pin {
            explorer.interact(|state| state.on_release_pin(index));
        }
        if let Some(id) = pending_selection {
            explorer.on_select(Some(&id));
        }
    }
}
