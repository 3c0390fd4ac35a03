//! cursor-monitor - editor inactivity monitor
//!
//! Runs next to an editor host, reads activity events as JSON lines on
//! stdin and answers with status and notification messages on stdout.
//! Without a host it can watch a workspace directory and OS input instead.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

use cursor_monitor::activity::{ActivityTracker, IntervalCadence, SystemClock};
use cursor_monitor::config::{Config, ConfigWatcher, LogFormat, LoggingConfig, OutputFormat};
use cursor_monitor::monitor::{self, Monitor};
use cursor_monitor::sinks::{DisplaySink, JsonLinesOutput, NotificationSink, TextOutput};
use cursor_monitor::sources::{self, SourceContext, SourceSet, EVENT_CHANNEL_CAPACITY};

/// Application version.
const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> Result<()> {
    // Parse command line arguments
    let config_path = std::env::args().nth(1).map(PathBuf::from);

    // Load configuration
    let config = Config::load(config_path.as_deref())?;
    config.validate()?;

    init_tracing(&config.logging)?;

    info!("Starting cursor-monitor v{}", VERSION);

    // One thread drives the tracker; source threads only feed the channel.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    let watched_path = Config::locate(config_path.as_deref()).filter(|p| p.exists());
    let result = runtime.block_on(run(config, watched_path));
    // A pending stdin read would otherwise hold the runtime open.
    runtime.shutdown_timeout(Duration::from_millis(200));
    result?;

    info!("cursor-monitor shutdown complete");
    Ok(())
}

async fn run(config: Config, watched_path: Option<PathBuf>) -> Result<()> {
    let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let source_set = SourceSet::start(
        sources::from_config(&config.sources),
        SourceContext::new(event_tx),
    );
    info!("Active sources: {:?}", source_set.active());

    let (display, notifications): (Box<dyn DisplaySink>, Box<dyn NotificationSink>) =
        match config.output.format {
            OutputFormat::Json => (
                Box::new(JsonLinesOutput::new(std::io::stdout())),
                Box::new(JsonLinesOutput::new(std::io::stdout())),
            ),
            OutputFormat::Text => (
                Box::new(TextOutput::new(std::io::stdout())),
                Box::new(TextOutput::new(std::io::stdout())),
            ),
        };

    let tracker = ActivityTracker::new(IntervalCadence::new(), SystemClock);
    let mut monitor = Monitor::new(tracker, display, notifications);
    monitor.start(&config.monitor);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let config_watcher = watched_path.and_then(|path| {
        ConfigWatcher::new(&path, ConfigWatcher::DEFAULT_DEBOUNCE)
            .map_err(|e| warn!("Config hot reload disabled: {:#}", e))
            .ok()
    });

    let result = monitor::run(monitor, event_rx, config_watcher, shutdown).await;
    source_set.stop();
    result
}

/// Initialize tracing on stderr; stdout carries the host protocol.
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    match logging.format {
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    }
    .context("Failed to initialize tracing")?;

    Ok(())
}
