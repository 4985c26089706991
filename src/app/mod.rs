use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::Arc;

use eframe::egui::{self, Context};
use spacebio_graph::config::ExplorerConfig;
use spacebio_graph::explorer::{Explorer, ExplorerEvent};
use spacebio_graph::fetch::GraphSource;
use spacebio_graph::model::{CategoryFilter, GraphSnapshot, Node};
use tracing::info;

mod graph;
mod render_utils;
mod ui;

/// Initial canvas size until the first frame reports the real one.
const INITIAL_CANVAS: egui::Vec2 = egui::vec2(1000.0, 800.0);

pub struct ExplorerApp {
    explorer: Explorer,
    view: ViewModel,
}

struct ViewModel {
    search: String,
    search_match_cache: Option<SearchMatchCache>,
    /// Written by the explorer's selection callback, read by the details panel.
    selected_details: Rc<RefCell<Option<Node>>>,
    last_event: Option<ExplorerEvent>,
    visible_node_count: usize,
    visible_edge_count: usize,
}

struct SearchMatchCache {
    query: String,
    snapshot: Arc<GraphSnapshot>,
    matches: Arc<HashSet<usize>>,
}

impl ExplorerApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        source: Arc<dyn GraphSource>,
        config: ExplorerConfig,
    ) -> Self {
        let mut explorer = Explorer::new(source, config, INITIAL_CANVAS);

        let selected_details = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&selected_details);
        explorer.on_node_selected(move |node| {
            *sink.borrow_mut() = node.cloned();
        });

        let status = explorer.select_filters(CategoryFilter::all());
        info!(?status, "initial graph requested");

        Self {
            explorer,
            view: ViewModel {
                search: String::new(),
                search_match_cache: None,
                selected_details,
                last_event: None,
                visible_node_count: 0,
                visible_edge_count: 0,
            },
        }
    }
}

impl eframe::App for ExplorerApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let events = self.explorer.poll();
        if let Some(event) = events.into_iter().last() {
            self.view.last_event = Some(event);
        }

        if self.explorer.is_loading() {
            ctx.request_repaint();
        }

        self.view.show(ctx, &mut self.explorer);
    }
}
