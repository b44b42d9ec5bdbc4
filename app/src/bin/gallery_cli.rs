use clap::{Parser, Subcommand};
use gallery::{memories, Aggregator};
use media_index::MediaIndex;
use media_source::MediaId;
use std::path::PathBuf;
use std::sync::Arc;

#[path = "../config.rs"]
mod config;
#[path = "../logging.rs"]
mod logging;

#[derive(Parser)]
#[command(
    name = "gallery_cli",
    author,
    version,
    about = "Photos gallery index maintenance CLI"
)]
struct Cli {
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
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Enable tokio console for debugging
    #[arg(long)]
    debug_console: bool,
    /// Enable tracing spans instrumentation
    #[arg(long)]
    trace_spans: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show indexed record count and volumes
    Status,
    /// List month buckets with their item counts
    ListMonths,
    /// List indexed records, newest first
    ListItems {
        /// Maximum number of items to display
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show metadata for an indexed record
    ShowItem {
        /// ID of the record
        id: MediaId,
    },
    /// Import records from a JSON file
    ImportItems {
        /// Path to the JSON file
        #[arg(long)]
        file: PathBuf,
    },
    /// Export all indexed records to a JSON file
    ExportItems {
        /// Path to the export file
        #[arg(long)]
        file: PathBuf,
    },
    /// Delete all indexed records
    ClearIndex,
    /// Mark a record as favorite
    Favorite {
        /// ID of the record
        id: MediaId,
        /// Clear the favorite flag instead
        #[arg(long)]
        unset: bool,
    },
    /// Show the memories carousel
    Memories,
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

    let db_path = cfg.index_path();
    if !db_path.exists() && !matches!(cli.command, Commands::ImportItems { .. }) {
        println!("No index found at {:?}", db_path);
        return Ok(());
    }
    let index = MediaIndex::new(&db_path)?;

    match cli.command {
        Commands::Status => {
            let count = index.record_count()?;
            let volumes = index.volumes()?;
            println!("Indexed records: {}", count);
            println!("Volumes: {}", volumes.join(", "));
        }
        Commands::ListMonths => {
            let aggregator = Aggregator::new(Arc::new(index), cfg.access_policy(), cfg.labeler()?);
            let content = aggregator.load().await?;
            for bucket in &content.buckets {
                println!("{}: {}", bucket.label, bucket.len());
            }
        }
        Commands::ListItems { limit } => {
            let records = index.get_all_records()?;
            let max = limit.unwrap_or(10);
            for record in records.iter().take(max) {
                println!("{} - {}", record.id, record.locator);
            }
        }
        Commands::ShowItem { id } => {
            if let Some(record) = index.get_record(id)? {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                println!("Item not found: {}", id);
            }
        }
        Commands::ImportItems { file } => {
            let count = index.import_records(&file)?;
            println!("Imported {} records from {:?}", count, file);
        }
        Commands::ExportItems { file } => {
            index.export_records(&file)?;
            println!("Exported to {:?}", file);
        }
        Commands::ClearIndex => {
            index.clear_index()?;
            println!("Index cleared");
        }
        Commands::Favorite { id, unset } => {
            if !index.set_favorite(id, !unset)? {
                println!("Item not found: {}", id);
            } else if unset {
                println!("Favorite cleared: {}", id);
            } else {
                println!("Favorite set: {}", id);
            }
        }
        Commands::Memories => {
            let aggregator = Aggregator::new(Arc::new(index), cfg.access_policy(), cfg.labeler()?);
            let content = aggregator.load().await?;
            for memory in memories(&content.buckets, aggregator.labeler(), cfg.memories_limit) {
                let cover = memory
                    .cover
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{} ({} items, cover {})",
                    memory.title.replace('\n', " "),
                    memory.record_count,
                    cover
                );
            }
        }
    }

    Ok(())
}
