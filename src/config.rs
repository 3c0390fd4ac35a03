//! Configuration loading from TOML files and environment variables.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::activity::{DEFAULT_MAX_INACTIVITY_PERIODS, DEFAULT_PERIOD_LENGTH_SECONDS};
use crate::watch;

/// Root configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Inactivity tracking thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Whether monitoring starts enabled.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Length of one inactivity period in seconds.
    #[serde(default = "default_warning_time")]
    pub warning_time: u64,
    /// Consecutive inactive periods before the warning fires.
    #[serde(default = "default_max_inactivity_periods")]
    pub max_inactivity_periods: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            warning_time: default_warning_time(),
            max_inactivity_periods: default_max_inactivity_periods(),
        }
    }
}

/// Which activity sources to run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Read host events from stdin.
    #[serde(default = "default_true")]
    pub host_bridge: bool,
    /// Directory to watch for file changes.
    #[serde(default)]
    pub workspace_dir: Option<PathBuf>,
    /// Workspace poll interval in milliseconds, used only when native file
    /// events are unavailable.
    #[serde(default = "default_workspace_poll_ms")]
    pub workspace_poll_ms: u64,
    /// Poll the OS for keyboard/mouse idle time. Opt-in: this counts input
    /// in any application as editor activity.
    #[serde(default)]
    pub system_input: bool,
    /// System idle poll interval in milliseconds.
    #[serde(default = "default_system_poll_ms")]
    pub system_poll_ms: u64,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            host_bridge: true,
            workspace_dir: None,
            workspace_poll_ms: default_workspace_poll_ms(),
            system_input: false,
            system_poll_ms: default_system_poll_ms(),
        }
    }
}

impl SourcesConfig {
    pub fn workspace_poll_interval(&self) -> Duration {
        Duration::from_millis(self.workspace_poll_ms)
    }

    pub fn system_poll_interval(&self) -> Duration {
        Duration::from_millis(self.system_poll_ms)
    }
}

/// Where status and notifications go.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Host protocol messages on stdout.
    #[default]
    Json,
    /// Human-readable console lines.
    Text,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log line format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

// Default value functions
fn default_enabled() -> bool {
    true
}

fn default_true() -> bool {
    true
}

fn default_warning_time() -> u64 {
    DEFAULT_PERIOD_LENGTH_SECONDS
}

fn default_max_inactivity_periods() -> u64 {
    DEFAULT_MAX_INACTIVITY_PERIODS
}

fn default_workspace_poll_ms() -> u64 {
    2000
}

fn default_system_poll_ms() -> u64 {
    500
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(content).with_context(|| "Failed to parse config file")?;
        config.expand_paths();
        Ok(config)
    }

    /// Find the config file to use: the explicit path, else the first
    /// default location that exists.
    pub fn locate(config_path: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = config_path {
            return Some(path.to_path_buf());
        }

        let default_paths = [
            Some(PathBuf::from("config/default.toml")),
            dirs::config_dir().map(|d| d.join("cursor-monitor/config.toml")),
        ];
        default_paths.into_iter().flatten().find(|p| p.exists())
    }

    /// Load configuration with environment variable overrides.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut config = match Self::locate(config_path) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        config.apply_env_overrides();
        config.expand_paths();

        Ok(config)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("CURSOR_MONITOR_ENABLED") {
            if let Ok(v) = val.parse() {
                self.monitor.enabled = v;
            }
        }
        if let Ok(val) = std::env::var("CURSOR_MONITOR_WARNING_TIME") {
            if let Ok(v) = val.parse() {
                self.monitor.warning_time = v;
            }
        }
        if let Ok(val) = std::env::var("CURSOR_MONITOR_MAX_PERIODS") {
            if let Ok(v) = val.parse() {
                self.monitor.max_inactivity_periods = v;
            }
        }
        if let Ok(val) = std::env::var("CURSOR_MONITOR_WORKSPACE") {
            self.sources.workspace_dir = Some(PathBuf::from(val));
        }
        if let Ok(val) = std::env::var("CURSOR_MONITOR_OUTPUT") {
            match val.to_ascii_lowercase().as_str() {
                "json" => self.output.format = OutputFormat::Json,
                "text" => self.output.format = OutputFormat::Text,
                other => warn!("Ignoring unknown CURSOR_MONITOR_OUTPUT={}", other),
            }
        }
        if let Ok(val) = std::env::var("CURSOR_MONITOR_LOG_LEVEL") {
            self.logging.level = val;
        }
    }

    fn expand_paths(&mut self) {
        if let Some(dir) = self.sources.workspace_dir.as_mut() {
            *dir = expand_tilde(dir);
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.monitor.warning_time == 0 {
            anyhow::bail!("Warning time must be greater than 0");
        }
        if self.monitor.max_inactivity_periods == 0 {
            anyhow::bail!("Max inactivity periods must be greater than 0");
        }
        if self.sources.workspace_poll_ms == 0 {
            anyhow::bail!("Workspace poll interval must be greater than 0");
        }
        if self.sources.system_poll_ms == 0 {
            anyhow::bail!("System poll interval must be greater than 0");
        }
        Ok(())
    }
}

/// Watches the loaded config file and reloads it when it changes.
///
/// The parent directory is watched so editors that save by replacing the
/// file are still seen. The file is read one debounce delay after the first
/// event of a burst; events arriving meanwhile are folded into that read.
pub struct ConfigWatcher {
    path: PathBuf,
    debounce: Duration,
    _watcher: Box<dyn Watcher + Send>,
    changes: mpsc::UnboundedReceiver<()>,
    /// Deadline of a reload that was waiting when the last call was cancelled.
    pending: Option<Instant>,
}

impl std::fmt::Debug for ConfigWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigWatcher")
            .field("path", &self.path)
            .field("debounce", &self.debounce)
            .finish_non_exhaustive()
    }
}

impl ConfigWatcher {
    /// Delay between the first event of a burst and reading the file.
    pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

    /// Poll interval used when native file events are unavailable.
    const FALLBACK_POLL_INTERVAL: Duration = Duration::from_millis(500);

    pub fn new(config_path: &Path, debounce: Duration) -> Result<Self> {
        if !config_path.exists() {
            anyhow::bail!("Config file not found: {}", config_path.display());
        }

        let path = config_path
            .canonicalize()
            .unwrap_or_else(|_| config_path.to_path_buf());
        let filename = path
            .file_name()
            .context("Config path has no filename")?
            .to_os_string();
        let parent_dir = path
            .parent()
            .context("Config path has no parent directory")?
            .to_path_buf();

        let (tx, changes) = mpsc::unbounded_channel();
        let handler = move |result: notify::Result<Event>| match result {
            Ok(event) if is_config_change(&event, &filename) => {
                trace!("Config file event: {:?}", event.kind);
                let _ = tx.send(());
            }
            Ok(_) => {}
            Err(e) => warn!("Config watch error: {}", e),
        };

        let mut watcher = watch::create_watcher(handler, Self::FALLBACK_POLL_INTERVAL)?;
        watcher
            .watch(&parent_dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch config directory: {}", parent_dir.display()))?;

        info!("Config hot reload: watching {}", path.display());

        Ok(Self {
            path,
            debounce,
            _watcher: watcher,
            changes,
            pending: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Wait for the next change that parses and validates.
    ///
    /// Invalid edits are logged and skipped. The reload goes through
    /// [`Config::load`], so environment overrides still win over the file.
    /// Cancel-safe: a change seen before cancellation is not lost.
    pub async fn next_reload(&mut self) -> Config {
        loop {
            let deadline = match self.pending {
                Some(deadline) => deadline,
                None => {
                    if self.changes.recv().await.is_none() {
                        debug!("Config watcher stopped");
                        return std::future::pending().await;
                    }
                    let deadline = Instant::now() + self.debounce;
                    self.pending = Some(deadline);
                    deadline
                }
            };

            tokio::time::sleep_until(deadline).await;
            while self.changes.try_recv().is_ok() {}
            self.pending = None;

            if let Some(config) = self.reload() {
                return config;
            }
        }
    }

    fn reload(&self) -> Option<Config> {
        if !self.path.exists() {
            debug!("Config file {:?} is gone, keeping current settings", self.path);
            return None;
        }

        match Config::load(Some(&self.path)).and_then(|c| c.validate().map(|_| c)) {
            Ok(config) => {
                info!("Reloaded configuration from {:?}", self.path);
                Some(config)
            }
            Err(e) => {
                warn!("Ignoring invalid configuration change: {:#}", e);
                None
            }
        }
    }
}

/// Modify and create events on the config file itself; create covers
/// editors that save atomically through a rename.
fn is_config_change(event: &Event, filename: &OsStr) -> bool {
    matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
        && event
            .paths
            .iter()
            .any(|p| p.file_name().is_some_and(|f| f == filename))
}

/// Expand ~ to home directory.
fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(rest) = path.to_str().and_then(|s| s.strip_prefix("~/")) {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}
