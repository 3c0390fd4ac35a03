//! Config files on disk and live reload.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use cursor_monitor::config::{Config, ConfigWatcher, LogFormat, OutputFormat};

const SAMPLE: &str = r#"
[monitor]
enabled = false
warning_time = 15
max_inactivity_periods = 3

[sources]
host_bridge = false
workspace_dir = "/srv/project"
system_input = false

[output]
format = "text"

[logging]
level = "debug"
format = "json"
"#;

const DEBOUNCE: Duration = Duration::from_millis(50);

/// Wait up to `limit` for the watcher's next accepted configuration.
async fn reload_within(watcher: &mut ConfigWatcher, limit: Duration) -> Option<Config> {
    tokio::time::timeout(limit, watcher.next_reload()).await.ok()
}

fn write_sample(dir: &Path) -> PathBuf {
    let path = dir.join("config.toml");
    fs::write(&path, SAMPLE).unwrap();
    path
}

#[test]
fn loads_every_section_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, SAMPLE).unwrap();

    let config = Config::from_file(&path).unwrap();
    assert!(!config.monitor.enabled);
    assert_eq!(config.monitor.warning_time, 15);
    assert_eq!(config.monitor.max_inactivity_periods, 3);
    assert!(!config.sources.host_bridge);
    assert_eq!(
        config.sources.workspace_dir.as_deref(),
        Some(std::path::Path::new("/srv/project"))
    );
    assert_eq!(config.output.format, OutputFormat::Text);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.format, LogFormat::Json);
    assert!(config.validate().is_ok());
}

#[test]
fn missing_explicit_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(Config::load(Some(&dir.path().join("absent.toml"))).is_err());
}

#[test]
fn watcher_requires_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(ConfigWatcher::new(&dir.path().join("absent.toml"), DEBOUNCE).is_err());
}

#[tokio::test]
async fn watcher_ignores_unchanged_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_sample(dir.path());

    let mut watcher = ConfigWatcher::new(&path, DEBOUNCE).unwrap();
    assert!(reload_within(&mut watcher, Duration::from_millis(300)).await.is_none());
}

#[tokio::test]
async fn watcher_ignores_other_files_in_directory() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_sample(dir.path());
    let mut watcher = ConfigWatcher::new(&path, DEBOUNCE).unwrap();

    fs::write(dir.path().join("notes.txt"), "unrelated").unwrap();
    assert!(reload_within(&mut watcher, Duration::from_millis(300)).await.is_none());
}

#[tokio::test]
async fn watcher_reloads_valid_changes() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_sample(dir.path());
    let mut watcher = ConfigWatcher::new(&path, DEBOUNCE).unwrap();

    fs::write(&path, "[monitor]\nwarning_time = 20\n").unwrap();

    let reloaded = reload_within(&mut watcher, Duration::from_secs(5))
        .await
        .expect("change detected");
    assert_eq!(reloaded.monitor.warning_time, 20);
    assert!(reloaded.monitor.enabled);
}

#[tokio::test]
async fn watcher_coalesces_rapid_writes() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_sample(dir.path());
    let mut watcher = ConfigWatcher::new(&path, Duration::from_millis(200)).unwrap();

    for secs in [11, 12, 13] {
        fs::write(&path, format!("[monitor]\nwarning_time = {}\n", secs)).unwrap();
    }

    let reloaded = reload_within(&mut watcher, Duration::from_secs(5))
        .await
        .expect("change detected");
    assert_eq!(reloaded.monitor.warning_time, 13);
    assert!(reload_within(&mut watcher, Duration::from_millis(400)).await.is_none());
}

#[tokio::test]
async fn watcher_skips_invalid_changes() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_sample(dir.path());
    let mut watcher = ConfigWatcher::new(&path, DEBOUNCE).unwrap();

    fs::write(&path, "[monitor]\nwarning_time = 0\n").unwrap();
    assert!(reload_within(&mut watcher, Duration::from_millis(300)).await.is_none());

    fs::write(&path, "[monitor\n").unwrap();
    assert!(reload_within(&mut watcher, Duration::from_millis(300)).await.is_none());

    fs::write(&path, "[monitor]\nwarning_time = 25\n").unwrap();
    let reloaded = reload_within(&mut watcher, Duration::from_secs(5))
        .await
        .expect("valid change after invalid ones");
    assert_eq!(reloaded.monitor.warning_time, 25);
}

#[tokio::test]
async fn watcher_sees_atomic_replace() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_sample(dir.path());
    let mut watcher = ConfigWatcher::new(&path, DEBOUNCE).unwrap();

    let staged = dir.path().join(".config.toml.tmp");
    fs::write(&staged, "[monitor]\nmax_inactivity_periods = 9\n").unwrap();
    fs::rename(&staged, &path).unwrap();

    let reloaded = reload_within(&mut watcher, Duration::from_secs(5))
        .await
        .expect("replace detected");
    assert_eq!(reloaded.monitor.max_inactivity_periods, 9);
}
