//! Filesystem watcher construction shared by config reload and the
//! workspace source.

use anyhow::{Context, Result};
use notify::{Config as NotifyConfig, EventHandler, PollWatcher, Watcher};
use std::time::Duration;
use tracing::{debug, warn};

/// Create the platform's native watcher, falling back to a `PollWatcher`
/// when the native backend cannot start (containers, network mounts).
///
/// The caller must keep the returned watcher alive for events to flow.
pub fn create_watcher<H>(handler: H, poll_interval: Duration) -> Result<Box<dyn Watcher + Send>>
where
    H: EventHandler + Clone,
{
    match notify::recommended_watcher(handler.clone()) {
        Ok(watcher) => {
            debug!("Using native file watcher backend");
            Ok(Box::new(watcher))
        }
        Err(e) => {
            warn!(
                "Native file watcher unavailable ({}); polling every {:?}",
                e, poll_interval
            );
            let watcher = PollWatcher::new(
                handler,
                NotifyConfig::default().with_poll_interval(poll_interval),
            )
            .context("Failed to create fallback PollWatcher")?;
            Ok(Box::new(watcher))
        }
    }
}
