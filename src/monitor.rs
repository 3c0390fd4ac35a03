//! The monitor: owns the tracker and the sinks, routes host events to
//! tracker operations and re-renders after every change.

use anyhow::Result;
use chrono::Utc;
use std::future::Future;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::activity::{ActivityTracker, Cadence, Clock, IntervalCadence};
use crate::config::{Config, ConfigWatcher, MonitorConfig};
use crate::presentation::{self, Notification, NotificationAction};
use crate::protocol::{Command, SettingsUpdate};
use crate::sinks::{DisplaySink, NotificationSink};
use crate::sources::HostEvent;

/// Whether the event loop should keep going after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

pub struct Monitor<K, C> {
    tracker: ActivityTracker<K, C>,
    display: Box<dyn DisplaySink>,
    notifications: Box<dyn NotificationSink>,
    /// Set when the output pipe closed; the host is gone.
    host_gone: bool,
}

impl<K: Cadence, C: Clock> Monitor<K, C> {
    pub fn new(
        tracker: ActivityTracker<K, C>,
        display: Box<dyn DisplaySink>,
        notifications: Box<dyn NotificationSink>,
    ) -> Self {
        Self {
            tracker,
            display,
            notifications,
            host_gone: false,
        }
    }

    /// Apply the startup configuration and draw the first frame.
    pub fn start(&mut self, config: &MonitorConfig) {
        self.tracker
            .reconfigure(config.warning_time, config.max_inactivity_periods);
        self.tracker.set_enabled(config.enabled);
        info!(
            "Monitor started ({}): {}s periods, warning after {}",
            if config.enabled { "enabled" } else { "disabled" },
            config.warning_time,
            config.max_inactivity_periods
        );
        self.render();
    }

    pub fn tracker(&self) -> &ActivityTracker<K, C> {
        &self.tracker
    }

    pub fn host_gone(&self) -> bool {
        self.host_gone
    }

    /// One cadence tick: advance the tracker, warn on a crossing, redraw.
    pub fn on_tick(&mut self) {
        if let Some(warning) = self.tracker.tick() {
            let notification = Notification::inactivity(&warning, Utc::now());
            if let Some(since) = notification.since {
                info!("User inactive since {}", since.to_rfc3339());
            }
            let result = self.notifications.notify(&notification);
            self.check_output(result);
        }
        self.render();
    }

    pub fn handle_event(&mut self, event: HostEvent) -> Flow {
        match event {
            HostEvent::Activity(signal) => {
                if self.tracker.is_enabled() {
                    debug!("Activity: {:?}", signal);
                    self.tracker.record_activity();
                }
            }
            HostEvent::Command(Command::Toggle) => self.toggle(),
            HostEvent::Command(Command::Reset) => self.reset(),
            HostEvent::NotificationAction(action) => self.on_notification_action(action),
            HostEvent::Configure(update) => self.apply_update(&update),
            HostEvent::Shutdown => {
                info!("Shutdown requested by host");
                return Flow::Stop;
            }
        }

        self.render();
        if self.host_gone {
            Flow::Stop
        } else {
            Flow::Continue
        }
    }

    /// Flip enabled state and tell the user.
    pub fn toggle(&mut self) {
        let enabled = !self.tracker.is_enabled();
        self.tracker.set_enabled(enabled);
        let message = if enabled {
            "🖱️ Cursor Monitor: ENABLED"
        } else {
            "🖱️ Cursor Monitor: DISABLED"
        };
        self.inform(message);
    }

    /// Manual reset; ignored while disabled.
    pub fn reset(&mut self) {
        if !self.tracker.is_enabled() {
            return;
        }
        self.tracker.record_activity();
        self.inform("⏰ Timer Reset!");
    }

    fn on_notification_action(&mut self, action: NotificationAction) {
        debug!("Notification action: {}", action.label());
        match action {
            NotificationAction::ResetCounter => self.tracker.record_activity(),
            // A stale "Disable" must not turn a disabled monitor back on.
            NotificationAction::Disable if self.tracker.is_enabled() => self.toggle(),
            NotificationAction::Disable => {}
        }
    }

    /// Apply a reloaded configuration file.
    pub fn apply_config(&mut self, config: &MonitorConfig) {
        self.apply_update(&SettingsUpdate {
            enabled: Some(config.enabled),
            warning_time: Some(config.warning_time),
            max_inactivity_periods: Some(config.max_inactivity_periods),
        });
        self.render();
    }

    /// Apply host-pushed settings. Unset fields keep their value, and so do
    /// zero thresholds, which a config file would fail to validate.
    fn apply_update(&mut self, update: &SettingsUpdate) {
        let current = self.tracker.snapshot();
        let period = match update.warning_time {
            Some(0) => {
                warn!("Ignoring warning_time = 0 from host");
                current.period_length_seconds
            }
            Some(secs) => secs,
            None => current.period_length_seconds,
        };
        let max = match update.max_inactivity_periods {
            Some(0) => {
                warn!("Ignoring max_inactivity_periods = 0 from host");
                current.max_inactivity_periods
            }
            Some(periods) => periods,
            None => current.max_inactivity_periods,
        };

        self.tracker.reconfigure(period, max);
        if let Some(enabled) = update.enabled {
            if enabled != self.tracker.is_enabled() {
                self.tracker.set_enabled(enabled);
            }
        }
    }

    /// Stop ticking and draw the final state.
    pub fn shutdown(&mut self) {
        self.tracker.shutdown();
        self.render();
        info!("Monitor stopped");
    }

    fn render(&mut self) {
        let tuple = presentation::render(&self.tracker.snapshot());
        let result = self.display.show(&tuple);
        self.check_output(result);
    }

    fn inform(&mut self, message: &str) {
        let result = self.notifications.notify(&Notification::info(message));
        self.check_output(result);
    }

    fn check_output(&mut self, result: Result<()>) {
        let Err(e) = result else {
            return;
        };

        let broken_pipe = e.chain().any(|cause| {
            cause
                .downcast_ref::<std::io::Error>()
                .is_some_and(|io| io.kind() == std::io::ErrorKind::BrokenPipe)
        });
        if broken_pipe {
            if !self.host_gone {
                error!("Host output closed: {:#}", e);
            }
            self.host_gone = true;
        } else {
            warn!("Failed to update host display: {:#}", e);
        }
    }
}

impl<C: Clock> Monitor<IntervalCadence, C> {
    /// Wait for the tracker's cadence. Pending forever while disabled.
    pub async fn next_tick(&mut self) {
        self.tracker.next_tick().await
    }
}

/// Drive the monitor until the host shuts down, the output closes or
/// `shutdown` resolves.
pub async fn run<C, F>(
    mut monitor: Monitor<IntervalCadence, C>,
    mut events: mpsc::Receiver<HostEvent>,
    mut config_watcher: Option<ConfigWatcher>,
    shutdown: F,
) -> Result<()>
where
    C: Clock,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    if let Some(watcher) = &config_watcher {
        info!("Watching {:?} for configuration changes", watcher.path());
    }

    loop {
        tokio::select! {
            _ = monitor.next_tick() => monitor.on_tick(),
            event = events.recv() => {
                let Some(event) = event else {
                    info!("All activity sources closed");
                    break;
                };
                if monitor.handle_event(event) == Flow::Stop {
                    break;
                }
            }
            config = next_reload(&mut config_watcher) => monitor.apply_config(&config.monitor),
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
        }

        if monitor.host_gone() {
            break;
        }
    }

    monitor.shutdown();
    Ok(())
}

/// Next reloaded configuration; pending forever without a watcher.
async fn next_reload(watcher: &mut Option<ConfigWatcher>) -> Config {
    match watcher {
        Some(watcher) => watcher.next_reload().await,
        None => std::future::pending().await,
    }
}
