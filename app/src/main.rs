//! Photos entry point: loads the gallery and optionally drives a viewer session
//! from gesture events read on stdin.

mod config;
mod logging;

use clap::Parser;
use gallery::{grid_rows, Aggregator, GalleryState, GalleryStore, ViewerNavState};
use media_index::MediaIndex;
use media_source::{MediaId, MediaRecord};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use viewer::{GestureEvent, MetadataOverlay, ViewerController, ViewerEvent, ViewerFrame};

#[derive(Parser)]
#[command(name = "photos", author, version, about = "Local photo gallery")]
struct Cli {
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override log level (e.g. info, debug)
    #[arg(long)]
    log_level: Option<String>,
    /// Override the data directory holding the index and logs
    #[arg(long)]
    data_path: Option<PathBuf>,
    /// Override the locale used for month labels (e.g. de_DE)
    #[arg(long)]
    locale: Option<String>,
    /// Restrict the gallery to these volumes (repeatable)
    #[arg(long = "volume")]
    volumes: Vec<String>,
    /// Enable tokio console for debugging
    #[arg(long)]
    debug_console: bool,
    /// Enable tracing spans instrumentation
    #[arg(long)]
    trace_spans: bool,
    /// Open the viewer on this item and read gestures from stdin
    #[arg(long)]
    open: Option<MediaId>,
}

/// One stdout line per gesture while the viewer is open.
#[derive(Serialize)]
struct FrameLine {
    id: MediaId,
    #[serde(flatten)]
    frame: ViewerFrame,
    #[serde(skip_serializing_if = "Option::is_none")]
    overlay: Option<MetadataOverlay>,
}

fn frame_line(
    controller: &ViewerController,
    records: &[MediaRecord],
    store: &GalleryStore,
) -> Option<FrameLine> {
    let frame = controller.frame()?;
    let record = records.get(frame.page_index)?;
    let overlay = frame.overlay_visible.then(|| {
        let date = store.aggregator().labeler().day_label(record.capture_timestamp);
        MetadataOverlay::for_record(record, date)
    });
    Some(FrameLine {
        id: record.id,
        frame,
        overlay,
    })
}

#[cfg_attr(feature = "trace-spans", tracing::instrument)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let overrides = config::AppConfigOverrides {
        log_level: cli.log_level.clone(),
        data_path: cli.data_path.clone(),
        locale: cli.locale.clone(),
        authorized_volumes: (!cli.volumes.is_empty()).then(|| cli.volumes.clone()),
        debug_console: cli.debug_console,
        trace_spans: cli.trace_spans,
    };
    let cfg = config::AppConfig::load_from(cli.config.clone()).apply_overrides(&overrides);
    std::fs::create_dir_all(&cfg.data_path)?;
    let _guard = logging::init(&cfg.data_path, &cfg.log_level, cfg.debug_console);

    let index = MediaIndex::new(&cfg.index_path())?;
    let aggregator = Aggregator::new(Arc::new(index), cfg.access_policy(), cfg.labeler()?);
    let mut store = GalleryStore::new(aggregator);

    store.refresh();
    store.next_completion().await;
    let buckets = match store.state() {
        GalleryState::Loaded { buckets, .. } => buckets.clone(),
        GalleryState::Failed { message } => return Err(message.clone().into()),
        GalleryState::Loading => return Err("gallery refresh did not complete".into()),
    };

    let Some(id) = cli.open else {
        println!("{} items in {} months", store.records().len(), buckets.len());
        for bucket in buckets.iter() {
            println!(
                "{} ({} items, {} rows)",
                bucket.label,
                bucket.len(),
                grid_rows(bucket.len(), cfg.grid_columns)
            );
        }
        return Ok(());
    };

    if !store.request_viewer(id) {
        println!("Item not found: {}", id);
        return Ok(());
    }
    let ViewerNavState::Viewing { initial_index } = store.viewer_state() else {
        return Ok(());
    };
    let records = store.records().to_vec();

    let mut controller = ViewerController::new(cfg.display_density);
    let mut events = controller.events();
    controller.open(initial_index, records.len(), cfg.viewport())?;
    if let Some(line) = frame_line(&controller, &records, &store) {
        println!("{}", serde_json::to_string(&line)?);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let gesture: GestureEvent = match serde_json::from_str(line) {
            Ok(g) => g,
            Err(e) => {
                tracing::warn!(error = %e, line, "Skipping malformed gesture");
                continue;
            }
        };
        gesture.dispatch(&mut controller);

        while let Ok(event) = events.try_recv() {
            println!("{}", serde_json::to_string(&event)?);
            if matches!(event, ViewerEvent::Dismissed { .. } | ViewerEvent::Closed { .. }) {
                store.close_viewer();
            }
        }
        match frame_line(&controller, &records, &store) {
            Some(line) => println!("{}", serde_json::to_string(&line)?),
            None => break,
        }
    }

    if controller.is_viewing() {
        controller.close();
        store.close_viewer();
    }
    tracing::info!(viewer = ?store.viewer_state(), "Session finished");
    Ok(())
}
