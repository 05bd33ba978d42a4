//! CLI entry point for the subway arrivals matrix.
//!
//! Runs the display loop, or performs a one-shot aggregation or render of a
//! saved or live feed.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use subway_matrix::{
    arrivals::{ArrivalBoard, FeedAggregator},
    config::{self, AppConfig, RouteFilter},
    display::{FileSink, FrameRenderer, MarqueeParams, save_png},
    fetch::{BasicClient, FeedSource, FileFeedSource, HttpFeedSource, auth::ApiKey},
    model::Bound,
    output::{append_records, board_lines, print_json, print_pretty},
    runtime::run_display,
    weather::NoaaClient,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "subway_matrix")]
#[command(about = "Live NYC subway arrivals on a 64x32 LED matrix", long_about = None)]
struct Cli {
    /// JSON config file; defaults are used for anything it leaves out
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Station preset key (see `stations`)
    #[arg(short, long, global = true)]
    station: Option<String>,

    /// Routes to show: `all` or a comma-separated list such as `R,W`
    #[arg(short, long, global = true)]
    routes: Option<RouteFilter>,

    /// NYCT feed to poll, e.g. `gtfs-nqrw`
    #[arg(long, global = true)]
    feed_path: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the feed and drive the display until Ctrl+C
    Run {
        /// Directory for the PNG frame snapshots
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Add the weather screen to the rotation
        #[arg(short, long, default_value_t = false)]
        weather: bool,
    },
    /// Aggregate one feed snapshot and log the arrival board
    Arrivals {
        /// Path to file or URL to fetch
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        /// CSV file to append arrivals to
        #[arg(long)]
        csv: Option<String>,
    },
    /// Render one frame of a feed snapshot to a PNG
    Render {
        /// Path to file or URL to fetch
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        #[arg(short, long, default_value = "north")]
        bound: Bound,

        /// Animation frame, for inspecting scrolling text
        #[arg(short, long, default_value_t = 0)]
        frame: u64,

        #[arg(short, long, default_value = "frame.png")]
        out: PathBuf,
    },
    /// List the built-in station presets
    Stations,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/subway_matrix.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("subway_matrix.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let mut config = load_config(&cli)?;

    match cli.command {
        Commands::Run { output_dir, weather } => {
            if let Some(dir) = output_dir {
                config.display.output_dir = dir;
            }
            config.weather.enabled |= weather;
            config.validate()?;
            run(config).await?;
        }
        Commands::Arrivals { source, csv } => {
            let board = snapshot(&config, &source).await?;

            for line in board_lines(&board, Utc::now().timestamp()) {
                info!("{line}");
            }
            print_pretty(&board);
            print_json(&board)?;
            if let Some(path) = csv {
                append_records(&path, &board)?;
                info!(path, "Arrivals appended");
            }
        }
        Commands::Render {
            source,
            bound,
            frame,
            out,
        } => {
            let board = snapshot(&config, &source).await?;
            let canvas = FrameRenderer::with_mono_fonts(MarqueeParams::default()).render(
                bound,
                board.get(bound),
                frame,
                Utc::now().timestamp(),
            );
            save_png(&canvas, &out)?;
            info!(
                path = %out.display(),
                %bound,
                frame,
                arrivals = board.get(bound).len(),
                "Frame written"
            );
        }
        Commands::Stations => {
            for preset in config::presets() {
                info!(
                    key = preset.key,
                    name = %preset.station.name,
                    stop = %preset.station.base_stop_id,
                    feed_path = preset.feed_path,
                    routes = ?preset.station.monitored_routes,
                    "Station"
                );
            }
        }
    }

    Ok(())
}

/// Config file (or defaults), then preset, then individual CLI overrides.
fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    if let Some(key) = &cli.station {
        let preset = config::preset(key)
            .with_context(|| format!("unknown station preset '{key}', see `stations`"))?;
        config.station = preset.station;
        config.feed.feed_path = preset.feed_path.to_string();
    }
    if let Some(routes) = &cli.routes {
        config.station.monitored_routes = routes.clone();
    }
    if let Some(feed_path) = &cli.feed_path {
        config.feed.feed_path = feed_path.clone();
    }

    config.validate()?;
    Ok(config)
}

/// HTTP(S) locations go through the MTA client; anything else is read from disk.
fn feed_source(config: &AppConfig, location: &str) -> Result<Box<dyn FeedSource>> {
    let names = config.terminal_names.clone();
    if !location.starts_with("http") {
        return Ok(Box::new(FileFeedSource::new(location, names)));
    }

    let client = BasicClient::with_timeout(Duration::from_secs(config.feed.timeout_secs))?;
    Ok(match config.feed.api_key() {
        Some(key) => {
            let client = ApiKey::x_api_key(client, &key)?;
            Box::new(HttpFeedSource::new(client, location, names))
        }
        None => Box::new(HttpFeedSource::new(client, location, names)),
    })
}

/// One aggregation of a complete feed location (full URL or file).
async fn snapshot(config: &AppConfig, location: &str) -> Result<ArrivalBoard> {
    let trips = feed_source(config, location)?.fetch("").await?;
    Ok(FeedAggregator::new(config.station.clone()).aggregate(&trips))
}

#[tracing::instrument(
    skip_all,
    fields(station = %config.station.name, feed_path = %config.feed.feed_path)
)]
async fn run(config: AppConfig) -> Result<()> {
    let source = feed_source(&config, &config.feed.base_url)?;
    let weather = if config.weather.enabled {
        let client = BasicClient::with_timeout(Duration::from_secs(config.feed.timeout_secs))?;
        Some(NoaaClient::new(client, &config.weather)?)
    } else {
        None
    };
    let save_every = u64::from(config.display.save_every);
    let sink = FileSink::new(&config.display.output_dir, save_every)?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Ctrl+C received, shutting down"),
            Err(e) => {
                error!(error = %e, "Could not listen for Ctrl+C");
                return;
            }
        }
        on_signal.cancel();
    });

    let sink = run_display(&config, source, weather, sink, cancel).await?;
    info!(path = %sink.path().display(), "Display stopped");
    Ok(())
}
