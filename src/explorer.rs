//! Top-level coordinator: filter selection, cache, background fetches and the
//! active session.

use std::sync::Arc;
use std::time::Duration;

use eframe::egui::Vec2;
use tracing::{debug, info, warn};

use crate::cache::{CacheStatus, Clock, ResultCache, SystemClock};
use crate::config::ExplorerConfig;
use crate::error::FetchError;
use crate::fetch::{FetchResponse, Fetcher, GraphSource, RequestGuard};
use crate::interaction::{InteractionState, Transition};
use crate::model::{CategoryFilter, GraphSnapshot, Node};
use crate::session::{GraphSession, SelectionChange};

/// Receives the selected node, or `None` when the selection is cleared.
pub type SelectionCallback = Box<dyn FnMut(Option<&Node>)>;

/// Outcome of a completed fetch, as seen by the host.
#[derive(Clone, Debug, PartialEq)]
pub enum ExplorerEvent {
    Installed { key: String },
    Failed { key: String, error: FetchError },
    /// A response for a request that is no longer the latest.
    Discarded { key: String },
}

pub struct Explorer<C: Clock = SystemClock> {
    config: ExplorerConfig,
    cache: ResultCache<C>,
    fetcher: Fetcher,
    guard: RequestGuard,
    active_filter: CategoryFilter,
    session: Option<GraphSession>,
    viewport_size: Vec2,
    last_status: Option<CacheStatus>,
    last_error: Option<FetchError>,
    on_node_selected: Option<SelectionCallback>,
}

impl Explorer<SystemClock> {
    pub fn new(source: Arc<dyn GraphSource>, config: ExplorerConfig, viewport_size: Vec2) -> Self {
        Self::with_cache(source, config, viewport_size, ResultCache::new(config.cache))
    }
}

impl<C: Clock> Explorer<C> {
    pub fn with_cache(
        source: Arc<dyn GraphSource>,
        config: ExplorerConfig,
        viewport_size: Vec2,
        cache: ResultCache<C>,
    ) -> Self {
        Self {
            config,
            cache,
            fetcher: Fetcher::new(source),
            guard: RequestGuard::default(),
            active_filter: CategoryFilter::all(),
            session: None,
            viewport_size,
            last_status: None,
            last_error: None,
            on_node_selected: None,
        }
    }

    pub fn on_node_selected(&mut self, callback: impl FnMut(Option<&Node>) + 'static) {
        self.on_node_selected = Some(Box::new(callback));
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    pub fn active_filter(&self) -> &CategoryFilter {
        &self.active_filter
    }

    pub fn session(&self) -> Option<&GraphSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut GraphSession> {
        self.session.as_mut()
    }

    pub fn last_status(&self) -> Option<CacheStatus> {
        self.last_status
    }

    pub fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    /// Whether a fetch for the active filter is still outstanding.
    pub fn is_loading(&self) -> bool {
        self.guard.is_pending()
    }

    /// Activates `filter`: a fresh cache entry is installed immediately,
    /// otherwise a background fetch is dispatched and any older one is
    /// superseded.
    pub fn select_filters(&mut self, filter: CategoryFilter) -> CacheStatus {
        let key = filter.cache_key();
        self.active_filter = filter;
        self.last_error = None;

        let (status, cached) = self.cache.lookup(&key);
        self.last_status = Some(status);
        match cached {
            Some(snapshot) => {
                debug!(key = %key, "cache hit");
                self.guard.supersede();
                self.install(&key, snapshot);
            }
            None => {
                debug!(key = %key, "cache miss, fetching");
                let ticket = self.guard.issue(&key);
                self.fetcher.dispatch(ticket, self.active_filter.clone());
            }
        }
        status
    }

    /// Drains finished fetches without blocking. Call once per frame.
    pub fn poll(&mut self) -> Vec<ExplorerEvent> {
        let responses = self.fetcher.poll();
        self.handle_responses(responses)
    }

    /// Blocks up to `timeout` for the next finished fetch.
    pub fn wait(&mut self, timeout: Duration) -> Vec<ExplorerEvent> {
        let responses = self.fetcher.wait(timeout);
        self.handle_responses(responses)
    }

    fn handle_responses(&mut self, responses: Vec<FetchResponse>) -> Vec<ExplorerEvent> {
        responses
            .into_iter()
            .map(|FetchResponse { ticket, result }| {
                if !self.guard.accept(&ticket) {
                    debug!(ticket = ticket.id, key = %ticket.key, "discarding stale response");
                    return ExplorerEvent::Discarded { key: ticket.key };
                }

                match result {
                    Ok(snapshot) => {
                        self.cache.put(&ticket.key, Arc::clone(&snapshot));
                        self.install(&ticket.key, snapshot);
                        ExplorerEvent::Installed { key: ticket.key }
                    }
                    Err(error) => {
                        warn!(key = %ticket.key, %error, "graph fetch failed");
                        self.last_error = Some(error.clone());
                        ExplorerEvent::Failed {
                            key: ticket.key,
                            error,
                        }
                    }
                }
            })
            .collect()
    }

    /// Replaces the session wholesale; the viewport transform carries over.
    fn install(&mut self, key: &str, snapshot: Arc<GraphSnapshot>) {
        let previous = self.session.take();
        let mut session =
            GraphSession::initialize(key, snapshot, self.viewport_size, &self.config);
        info!(
            key,
            nodes = session.snapshot().node_count(),
            edges = session.snapshot().edge_count(),
            "installed graph snapshot"
        );

        if let Some(previous) = previous {
            session.set_viewport_transform(previous.viewport());
            if previous.interaction().selected.is_some()
                && let Some(callback) = self.on_node_selected.as_mut()
            {
                callback(None);
            }
        }
        self.session = Some(session);
    }

    pub fn resize(&mut self, viewport_size: Vec2) {
        if self.viewport_size == viewport_size {
            return;
        }
        self.viewport_size = viewport_size;
        if let Some(session) = self.session.as_mut() {
            session.resize(viewport_size);
        }
    }

    pub fn tick(&mut self) -> Option<&[Vec2]> {
        self.session.as_mut().map(|session| session.tick())
    }

    /// Runs an interaction transition against the active session and reports
    /// selection changes to the callback.
    pub fn interact(&mut self, handler: impl FnOnce(InteractionState) -> Transition) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let change = session.interact(handler);
        self.notify(change);
    }

    pub fn on_hover(&mut self, id: Option<&str>) {
        if let Some(session) = self.session.as_mut() {
            session.on_hover(id);
        }
    }

    pub fn on_select(&mut self, id: Option<&str>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let change = session.on_select(id);
        self.notify(change);
    }

    fn notify(&mut self, change: Option<SelectionChange>) {
        let (Some(selected), Some(session), Some(callback)) = (
            change,
            self.session.as_ref(),
            self.on_node_selected.as_mut(),
        ) else {
            return;
        };
        callback(selected.and_then(|index| session.snapshot().node(index)));
    }
}
