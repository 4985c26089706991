mod app;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use spacebio_graph::config::ExplorerConfig;
use spacebio_graph::fetch::FileGraphSource;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// JSON graph payload with `nodes` and `edges`.
    #[arg(long)]
    payload: PathBuf,

    /// JSON file overriding explorer defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for the initial node scatter.
    #[arg(long)]
    seed: Option<u64>,

    /// Artificial fetch delay in milliseconds.
    #[arg(long)]
    latency_ms: Option<u64>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => ExplorerConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ExplorerConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.layout.seed = seed;
    }
    if let Some(latency_ms) = args.latency_ms {
        config.source_latency_ms = latency_ms;
    }

    let source = FileGraphSource::from_path(&args.payload)?
        .with_latency(Duration::from_millis(config.source_latency_ms));
    let title = format!("spacebio-graph: {}", args.payload.display());

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        &title,
        options,
        Box::new(move |cc| Ok(Box::new(app::ExplorerApp::new(cc, Arc::new(source), config)))),
    )
    .map_err(|error| anyhow!("failed to run viewer: {error}"))
}
