//! Workspace watcher: reports file creation, deletion, renames and edits
//! anywhere under a directory tree.

use anyhow::{Context, Result};
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

use super::{ActivitySignal, ActivitySource, HostEvent, SourceContext};
use crate::watch;

/// How often the forwarding thread checks whether it should exit.
const STOP_CHECK_INTERVAL: Duration = Duration::from_millis(250);

/// Map a filesystem event to the activity it stands for.
///
/// Access and metadata-only events (permissions, timestamps) are not
/// activity.
pub fn classify(kind: &EventKind) -> Option<ActivitySignal> {
    match kind {
        EventKind::Create(_) => Some(ActivitySignal::FilesCreated),
        EventKind::Remove(_) => Some(ActivitySignal::FilesDeleted),
        EventKind::Modify(ModifyKind::Name(_)) => Some(ActivitySignal::FilesRenamed),
        // Some backends only report `Any` for content writes.
        EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any) => {
            Some(ActivitySignal::DocumentEdited)
        }
        _ => None,
    }
}

/// Watches one directory recursively.
#[derive(Debug)]
pub struct WorkspaceWatcher {
    dir: PathBuf,
    poll_interval: Duration,
}

impl WorkspaceWatcher {
    /// `poll_interval` only applies when the native backend is unavailable.
    pub fn new(dir: PathBuf, poll_interval: Duration) -> Self {
        Self { dir, poll_interval }
    }
}

impl ActivitySource for WorkspaceWatcher {
    fn name(&self) -> &'static str {
        "workspace"
    }

    fn start(self: Box<Self>, ctx: SourceContext) -> Result<()> {
        if !self.dir.is_dir() {
            anyhow::bail!("Workspace directory not found: {}", self.dir.display());
        }

        let (tx, rx) = mpsc::channel::<notify::Result<Event>>();
        let mut watcher = watch::create_watcher(tx, self.poll_interval)?;
        watcher
            .watch(&self.dir, RecursiveMode::Recursive)
            .with_context(|| format!("Failed to watch workspace: {}", self.dir.display()))?;

        info!("Watching {:?} recursively", self.dir);

        thread::Builder::new()
            .name("workspace-watcher".to_string())
            .spawn(move || forward_events(watcher, rx, ctx))
            .context("Failed to spawn workspace watcher thread")?;

        Ok(())
    }
}

/// Owns the watcher and forwards classified events until the sources stop.
///
/// One save usually fires several events; everything already queued behind
/// a relevant event is folded into one signal.
fn forward_events(
    _watcher: Box<dyn Watcher + Send>,
    events: Receiver<notify::Result<Event>>,
    ctx: SourceContext,
) {
    while ctx.is_running() {
        let event = match events.recv_timeout(STOP_CHECK_INTERVAL) {
            Ok(Ok(event)) => event,
            Ok(Err(e)) => {
                warn!("Workspace watch error: {}", e);
                continue;
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        let Some(signal) = classify(&event.kind) else {
            continue;
        };
        let folded = events.try_iter().count();
        trace!(
            "Workspace change: {:?} {:?} (+{} queued)",
            signal,
            event.paths,
            folded
        );

        if !ctx.send_blocking(HostEvent::Activity(signal)) {
            break;
        }
    }

    debug!("Workspace watcher thread exiting");
}
