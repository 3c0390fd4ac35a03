//! Environment overrides. Kept in their own test binary because they
//! mutate process-wide state.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use cursor_monitor::config::{Config, ConfigWatcher, OutputFormat};

/// Serializes tests that touch `CURSOR_MONITOR_*` variables.
static ENV_LOCK: Mutex<()> = Mutex::new(());

fn lock_env() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn clear_env(vars: &[&str]) {
    for var in vars {
        std::env::remove_var(var);
    }
}

#[test]
fn env_vars_override_file_values() {
    let _guard = lock_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[monitor]\nwarning_time = 15\n").unwrap();

    std::env::set_var("CURSOR_MONITOR_WARNING_TIME", "42");
    std::env::set_var("CURSOR_MONITOR_MAX_PERIODS", "7");
    std::env::set_var("CURSOR_MONITOR_ENABLED", "false");
    std::env::set_var("CURSOR_MONITOR_OUTPUT", "TEXT");
    std::env::set_var("CURSOR_MONITOR_WORKSPACE", "/tmp/ws");

    let config = Config::load(Some(&path)).unwrap();

    clear_env(&[
        "CURSOR_MONITOR_WARNING_TIME",
        "CURSOR_MONITOR_MAX_PERIODS",
        "CURSOR_MONITOR_ENABLED",
        "CURSOR_MONITOR_OUTPUT",
        "CURSOR_MONITOR_WORKSPACE",
    ]);

    assert_eq!(config.monitor.warning_time, 42);
    assert_eq!(config.monitor.max_inactivity_periods, 7);
    assert!(!config.monitor.enabled);
    assert_eq!(config.output.format, OutputFormat::Text);
    assert_eq!(
        config.sources.workspace_dir.as_deref(),
        Some(std::path::Path::new("/tmp/ws"))
    );
}

#[tokio::test]
async fn reload_keeps_env_overrides() {
    let _guard = lock_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[monitor]\nwarning_time = 15\n").unwrap();

    std::env::set_var("CURSOR_MONITOR_WARNING_TIME", "42");

    let startup = Config::load(Some(&path)).unwrap();
    let mut watcher = ConfigWatcher::new(&path, Duration::from_millis(50)).unwrap();
    std::fs::write(&path, "[monitor]\nwarning_time = 15\nmax_inactivity_periods = 3\n").unwrap();
    let reloaded = tokio::time::timeout(Duration::from_secs(5), watcher.next_reload()).await;

    clear_env(&["CURSOR_MONITOR_WARNING_TIME"]);

    let reloaded = reloaded.expect("change detected");
    assert_eq!(startup.monitor.warning_time, 42);
    assert_eq!(reloaded.monitor.warning_time, 42);
    assert_eq!(reloaded.monitor.max_inactivity_periods, 3);
}
