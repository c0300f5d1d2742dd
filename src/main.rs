//! CLI entry point for the track_stats tool.
//!
//! Provides subcommands for analyzing a tracking CSV (local file or URL)
//! and for inspecting how its columns resolve against the six fixed roles.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::Path;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use track_stats::aggregator::aggregate::aggregate;
use track_stats::columns::{ColumnMap, ColumnRole, default_synonyms, read_headers, resolve_columns};
use track_stats::fetch::{BasicClient, fetch_text};
use track_stats::output::{append_summary_rows, write_json};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Inputs above this size run on a blocking worker thread instead of the
/// async runtime. Purely a scheduling concern; results are identical.
const WORKER_THRESHOLD_BYTES: usize = 4 * 1024 * 1024;

#[derive(Parser)]
#[command(name = "track_stats")]
#[command(about = "Ingest bird-tracking CSVs into per-track statistics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate a tracking CSV from a file or URL
    Analyze {
        /// Path to file or URL to fetch
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        /// JSON file to write the aggregation result to
        #[arg(short, long, default_value = "result.json")]
        output: String,

        /// Optional CSV file to append flattened summaries to
        #[arg(long)]
        summary_csv: Option<String>,

        #[command(flatten)]
        columns: ColumnArgs,
    },
    /// Show how the source's columns resolve against the six fixed roles
    Columns {
        /// Path to file or URL to fetch
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        #[command(flatten)]
        columns: ColumnArgs,
    },
}

/// Explicit per-role header selections, overriding the synonym defaults.
#[derive(Args)]
struct ColumnArgs {
    /// Header holding the bird/entity id
    #[arg(long)]
    id_column: Option<String>,

    /// Header holding the longitude in degrees
    #[arg(long)]
    lon_column: Option<String>,

    /// Header holding the latitude in degrees
    #[arg(long)]
    lat_column: Option<String>,

    /// Header holding the altitude
    #[arg(long)]
    alt_column: Option<String>,

    /// Header holding the speed
    #[arg(long)]
    speed_column: Option<String>,

    /// Header holding the timestamp
    #[arg(long)]
    ts_column: Option<String>,
}

impl ColumnArgs {
    fn to_selection(&self) -> BTreeMap<ColumnRole, String> {
        let mut explicit = BTreeMap::new();
        let pairs = [
            (ColumnRole::EntityId, &self.id_column),
            (ColumnRole::Longitude, &self.lon_column),
            (ColumnRole::Latitude, &self.lat_column),
            (ColumnRole::Altitude, &self.alt_column),
            (ColumnRole::Speed, &self.speed_column),
            (ColumnRole::Timestamp, &self.ts_column),
        ];
        for (role, selection) in pairs {
            if let Some(header) = selection {
                explicit.insert(role, header.clone());
            }
        }
        explicit
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/track_stats.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("track_stats.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            source,
            output,
            summary_csv,
            columns,
        } => {
            let text = fetcher(&source).await?;
            let column_map = resolve(&text, &columns)?;

            let result = if text.len() > WORKER_THRESHOLD_BYTES {
                info!(bytes = text.len(), "Large input, aggregating off the async runtime");
                tokio::task::spawn_blocking(move || aggregate(&text, &column_map)).await??
            } else {
                aggregate(&text, &column_map)?
            };

            if result.is_empty() {
                warn!("No valid track points in input, writing empty result");
            } else {
                info!(
                    entities = result.tracks.len(),
                    points = result.total_points(),
                    "Aggregation complete"
                );
            }

            write_json(&output, &result)?;
            if let Some(path) = summary_csv {
                append_summary_rows(&path, &result)?;
            }
        }
        Commands::Columns { source, columns } => {
            let text = fetcher(&source).await?;
            let headers = read_headers(&text)?;
            let column_map = resolve_columns(&headers, &columns.to_selection(), &default_synonyms());

            println!("{}", serde_json::to_string_pretty(&column_map)?);
            if let Err(e) = column_map.validate(&headers) {
                warn!(error = %e, "Column resolution is incomplete");
            }
        }
    }

    Ok(())
}

/// Loads CSV text from a local file path or fetches it over HTTP.
#[tracing::instrument(fields(source = %source))]
async fn fetcher(source: &String) -> Result<String> {
    let text = if source.starts_with("http") {
        let client = BasicClient::new();
        fetch_text(&client, source).await?
    } else {
        std::fs::read_to_string(source)?
    };
    Ok(text)
}

fn resolve(text: &str, columns: &ColumnArgs) -> Result<ColumnMap> {
    let headers = read_headers(text)?;
    Ok(resolve_columns(
        &headers,
        &columns.to_selection(),
        &default_synonyms(),
    ))
}
