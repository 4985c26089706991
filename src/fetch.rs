//! Graph collaborator boundary and background fetching.
//!
//! Each request runs on its own worker thread and reports through its own
//! channel, polled once per frame. [`RequestGuard`] enforces "last request
//! wins": only the response to the most recently issued ticket is accepted.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::error::FetchError;
use crate::model::{Category, CategoryFilter, GraphSnapshot, RawGraph, parse_graph_payload};

/// The sole data-ingestion call of the core.
pub trait GraphSource: Send + Sync + 'static {
    fn fetch_graph(&self, filter: &CategoryFilter) -> Result<RawGraph, FetchError>;
}

enum Backing {
    File(PathBuf),
    Memory(RawGraph),
}

/// Serves a JSON graph payload, filtered per request.
///
/// A file-backed source re-reads the file on every fetch, so edits show up on
/// the next filter change.
pub struct FileGraphSource {
    backing: Backing,
    latency: Duration,
}

impl FileGraphSource {
    /// Opens `path`, failing early if it does not hold a graph payload.
    pub fn from_path(path: &Path) -> Result<Self> {
        let payload = read_payload(path)?;
        info!(
            path = %path.display(),
            nodes = payload.nodes.len(),
            edges = payload.edges.len(),
            "loaded graph payload"
        );

        Ok(Self {
            backing: Backing::File(path.to_path_buf()),
            latency: Duration::ZERO,
        })
    }

    pub fn from_payload(payload: RawGraph) -> Self {
        Self {
            backing: Backing::Memory(payload),
            latency: Duration::ZERO,
        }
    }

    /// Delays every fetch, to mimic a slow network.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.backing {
            Backing::File(path) => Some(path),
            Backing::Memory(_) => None,
        }
    }
}

fn read_payload(path: &Path) -> Result<RawGraph> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read graph payload {}", path.display()))?;
    parse_graph_payload(&raw)
        .with_context(|| format!("failed to parse graph payload {}", path.display()))
}

fn filter_payload(payload: &RawGraph, filter: &CategoryFilter) -> RawGraph {
    let nodes = payload
        .nodes
        .iter()
        .filter(|node| {
            // Unknown categories pass through; ingestion reports and drops them.
            node.category
                .parse::<Category>()
                .map_or(filter.is_unfiltered(), |category| filter.admits(category))
        })
        .cloned()
        .collect::<Vec<_>>();

    let kept = nodes
        .iter()
        .map(|node| node.id.as_str())
        .collect::<HashSet<_>>();
    let edges = payload
        .edges
        .iter()
        .filter(|edge| kept.contains(edge.source.as_str()) && kept.contains(edge.target.as_str()))
        .cloned()
        .collect();

    RawGraph { nodes, edges }
}

impl GraphSource for FileGraphSource {
    fn fetch_graph(&self, filter: &CategoryFilter) -> Result<RawGraph, FetchError> {
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }

        match &self.backing {
            Backing::Memory(payload) => Ok(filter_payload(payload, filter)),
            Backing::File(path) => {
                let raw = std::fs::read_to_string(path).map_err(|error| {
                    FetchError::Unavailable(format!("{}: {error}", path.display()))
                })?;
                let payload = parse_graph_payload(&raw)
                    .map_err(|error| FetchError::Malformed(format!("{error:#}")))?;
                Ok(filter_payload(&payload, filter))
            }
        }
    }
}

/// Identity of one fetch request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchTicket {
    pub id: u64,
    pub key: String,
}

#[derive(Debug)]
pub struct FetchResponse {
    pub ticket: FetchTicket,
    pub result: Result<Arc<GraphSnapshot>, FetchError>,
}

/// Tracks the latest request so older responses can be recognised as stale.
#[derive(Debug, Default)]
pub struct RequestGuard {
    next_id: u64,
    latest: Option<u64>,
}

impl RequestGuard {
    pub fn issue(&mut self, key: &str) -> FetchTicket {
        self.next_id += 1;
        self.latest = Some(self.next_id);
        FetchTicket {
            id: self.next_id,
            key: key.to_owned(),
        }
    }

    /// Forgets the outstanding request, e.g. when a cache hit superseded it.
    pub fn supersede(&mut self) {
        self.latest = None;
    }

    pub fn is_pending(&self) -> bool {
        self.latest.is_some()
    }

    /// Accepts `ticket` only if it is the latest request, at most once.
    pub fn accept(&mut self, ticket: &FetchTicket) -> bool {
        if self.latest == Some(ticket.id) {
            self.latest = None;
            true
        } else {
            false
        }
    }
}

struct Pending {
    ticket: FetchTicket,
    rx: Receiver<Result<Arc<GraphSnapshot>, FetchError>>,
}

/// Runs fetches off the UI thread.
pub struct Fetcher {
    source: Arc<dyn GraphSource>,
    pending: Vec<Pending>,
}

impl Fetcher {
    pub fn new(source: Arc<dyn GraphSource>) -> Self {
        Self {
            source,
            pending: Vec::new(),
        }
    }

    pub fn dispatch(&mut self, ticket: FetchTicket, filter: CategoryFilter) {
        let (tx, rx) = mpsc::channel();
        let source = Arc::clone(&self.source);
        debug!(ticket = ticket.id, key = %ticket.key, "dispatching graph fetch");

        thread::spawn(move || {
            let result = source
                .fetch_graph(&filter)
                .map(|raw| Arc::new(GraphSnapshot::ingest(raw)));
            let _ = tx.send(result);
        });

        self.pending.push(Pending { ticket, rx });
    }

    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    /// Collects every response that is ready without blocking.
    pub fn poll(&mut self) -> Vec<FetchResponse> {
        let mut finished = Vec::new();
        self.pending.retain(|pending| match pending.rx.try_recv() {
            Ok(result) => {
                finished.push(FetchResponse {
                    ticket: pending.ticket.clone(),
                    result,
                });
                false
            }
            Err(TryRecvError::Empty) => true,
            Err(TryRecvError::Disconnected) => {
                finished.push(FetchResponse {
                    ticket: pending.ticket.clone(),
                    result: Err(FetchError::Disconnected),
                });
                false
            }
        });
        finished
    }

    /// Polls until at least one response is ready or `timeout` elapses.
    pub fn wait(&mut self, timeout: Duration) -> Vec<FetchResponse> {
        let deadline = Instant::now() + timeout;
        loop {
            let finished = self.poll();
            if !finished.is_empty() || self.pending.is_empty() || Instant::now() >= deadline {
                return finished;
            }
            thread::sleep(Duration::from_millis(2));
        }
    }
}
