use eframe::egui::{self, Align, Color32, Context, Layout, RichText};
use spacebio_graph::cache::CacheStatus;
use spacebio_graph::explorer::{Explorer, ExplorerEvent};

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn show(&mut self, ctx: &Context, explorer: &mut Explorer) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("Space Biology Knowledge Graph");
                    ui.separator();

                    if let Some(session) = explorer.session() {
                        ui.label(format!("filter: {}", display_key(session.key())));
                        ui.label(format!("nodes: {}", session.snapshot().node_count()));
                        ui.label(format!("edges: {}", session.snapshot().edge_count()));
                    }

                    match explorer.last_status() {
                        Some(CacheStatus::Hit) => {
                            ui.label(RichText::new("cached").color(Color32::from_rgb(120, 200, 140)));
                        }
                        Some(CacheStatus::Miss) => {
                            ui.label(RichText::new("fetched").color(Color32::from_gray(170)));
                        }
                        None => {}
                    }
                    if explorer.is_loading() {
                        ui.spinner();
                    }

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(format!(
                            "visible: {} nodes, {} edges",
                            self.visible_node_count, self.visible_edge_count
                        ));
                        if let Some(session) = explorer.session() {
                            let engine = session.engine();
                            let state = if engine.is_converged() {
                                "settled".to_owned()
                            } else {
                                format!("alpha {:.3}", engine.alpha())
                            };
                            ui.label(format!("layout: {state}, {} ticks", engine.ticks()));
                        }
                    });
                });
            });

        let mut retry = false;
        let mut dismiss = false;
        if let Some(error) = explorer.last_error() {
            egui::TopBottomPanel::top("error_banner")
                .resizable(false)
                .show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        ui.label(
                            RichText::new(format!("Could not load graph: {error}"))
                                .color(Color32::from_rgb(240, 110, 100)),
                        );
                        if explorer.session().is_some() {
                            ui.label("(showing the previous graph)");
                        }
                        retry = ui.button("Retry").clicked();
                        dismiss = ui.button("Dismiss").clicked();
                    });
                });
        }
        if retry {
            let filter = explorer.active_filter().clone();
            explorer.select_filters(filter);
        } else if dismiss {
            explorer.dismiss_error();
        }

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_controls(ui, explorer));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(360.0)
            .show(ctx, |ui| self.draw_details(ui, explorer));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_graph(ui, explorer));
    }

    pub(in crate::app) fn last_event_text(&self) -> Option<String> {
        self.last_event.as_ref().map(|event| match event {
            ExplorerEvent::Installed { key } => format!("loaded [{}]", display_key(key)),
            ExplorerEvent::Failed { key, .. } => format!("failed [{}]", display_key(key)),
            ExplorerEvent::Discarded { key } => format!("discarded stale [{}]", display_key(key)),
        })
    }
}

fn display_key(key: &str) -> &str {
    if key.is_empty() { "all" } else { key }
}
