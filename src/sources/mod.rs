//! Activity sources: everything that can tell the monitor the user did
//! something.
//!
//! Each adapter translates its own event surface into [`HostEvent`]s on a
//! shared channel. The tracker never sees which source fired.

mod host;
mod system;
mod workspace;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::SourcesConfig;
use crate::presentation::NotificationAction;
use crate::protocol::{Command, SettingsUpdate};

pub use host::HostBridge;
pub use system::SystemInputSource;
pub use workspace::WorkspaceWatcher;

/// Capacity of the event channel shared by all sources.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Kinds of host activity. All of them reset the tracker the same way; the
/// kind is only kept for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivitySignal {
    SelectionChanged,
    ActiveEditorChanged,
    ActiveTerminalChanged,
    TerminalOpened,
    TerminalClosed,
    TerminalOutput,
    DocumentEdited,
    FilesCreated,
    FilesDeleted,
    FilesRenamed,
    WorkspaceFoldersChanged,
    TaskStarted,
    TaskEnded,
    /// Keyboard or pointer input reported by the OS.
    SystemInput,
}

/// Everything the monitor loop reacts to besides its own tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    Activity(ActivitySignal),
    Command(Command),
    NotificationAction(NotificationAction),
    Configure(SettingsUpdate),
    Shutdown,
}

/// Shared handles given to each source when it starts.
#[derive(Debug, Clone)]
pub struct SourceContext {
    pub events: mpsc::Sender<HostEvent>,
    running: Arc<AtomicBool>,
}

impl SourceContext {
    pub fn new(events: mpsc::Sender<HostEvent>) -> Self {
        Self {
            events,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// False once the sources were stopped or the monitor went away.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst) && !self.events.is_closed()
    }

    /// Forward an event from a blocking thread.
    ///
    /// Returns false when the receiver is gone.
    pub fn send_blocking(&self, event: HostEvent) -> bool {
        self.events.blocking_send(event).is_ok()
    }
}

/// An adapter over one host event surface.
pub trait ActivitySource: Send {
    fn name(&self) -> &'static str;

    /// Begin emitting events. An error means the source is unavailable in
    /// this environment; the monitor carries on without it.
    fn start(self: Box<Self>, ctx: SourceContext) -> Result<()>;
}

/// The set of sources that were successfully started.
#[derive(Debug)]
pub struct SourceSet {
    ctx: SourceContext,
    active: Vec<&'static str>,
}

impl SourceSet {
    /// Start each source, skipping the ones that fail.
    pub fn start(sources: Vec<Box<dyn ActivitySource>>, ctx: SourceContext) -> Self {
        let mut active = Vec::with_capacity(sources.len());

        for source in sources {
            let name = source.name();
            match source.start(ctx.clone()) {
                Ok(()) => {
                    info!("Activity source '{}' started", name);
                    active.push(name);
                }
                Err(e) => warn!("Activity source '{}' unavailable: {:#}", name, e),
            }
        }

        if active.is_empty() {
            warn!("No activity sources available; only commands will reset the timer");
        }

        Self { ctx, active }
    }

    /// Names of the running sources.
    pub fn active(&self) -> &[&'static str] {
        &self.active
    }

    /// Ask all source threads to exit.
    pub fn stop(&self) {
        self.ctx.running.store(false, Ordering::SeqCst);
        info!("Activity sources stopped");
    }
}

impl Drop for SourceSet {
    fn drop(&mut self) {
        self.ctx.running.store(false, Ordering::SeqCst);
    }
}

/// Build the sources enabled in the configuration.
pub fn from_config(config: &SourcesConfig) -> Vec<Box<dyn ActivitySource>> {
    let mut sources: Vec<Box<dyn ActivitySource>> = Vec::new();

    if config.host_bridge {
        sources.push(Box::new(HostBridge::stdin()));
    }
    if let Some(dir) = &config.workspace_dir {
        sources.push(Box::new(WorkspaceWatcher::new(
            dir.clone(),
            config.workspace_poll_interval(),
        )));
    }
    if config.system_input {
        sources.push(Box::new(SystemInputSource::new(config.system_poll_interval())));
    }

    sources
}
