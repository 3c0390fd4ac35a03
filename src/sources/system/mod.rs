//! OS-level input activity, polled from the platform's idle-time API.

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "windows")]
mod win32;

use anyhow::{Context, Result};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{ActivitySignal, ActivitySource, HostEvent, SourceContext};

#[cfg(target_os = "linux")]
use linux::PlatformIdle;
#[cfg(target_os = "macos")]
use macos::PlatformIdle;
#[cfg(target_os = "windows")]
use win32::PlatformIdle;

/// Platforms without an idle-time API.
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
struct PlatformIdle;

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
impl PlatformIdle {
    const BACKEND: &'static str = "none";

    fn connect() -> Result<Self> {
        anyhow::bail!("system idle time is not supported on this platform")
    }

    fn idle_time(&self) -> Option<Duration> {
        None
    }
}

/// Emits [`ActivitySignal::SystemInput`] whenever the OS saw keyboard or
/// pointer input since the previous poll.
#[derive(Debug)]
pub struct SystemInputSource {
    poll_interval: Duration,
}

impl SystemInputSource {
    pub fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }
}

impl ActivitySource for SystemInputSource {
    fn name(&self) -> &'static str {
        "system"
    }

    fn start(self: Box<Self>, ctx: SourceContext) -> Result<()> {
        let idle = PlatformIdle::connect()?;
        let poll_interval = self.poll_interval;

        thread::Builder::new()
            .name("idle-monitor".to_string())
            .spawn(move || run_idle_monitor(idle, poll_interval, ctx))
            .context("Failed to spawn idle monitor thread")?;

        Ok(())
    }
}

/// True when the reported idle time shows input during the last poll.
fn saw_input(idle_time: Duration, poll_interval: Duration) -> bool {
    idle_time < poll_interval
}

fn run_idle_monitor(idle: PlatformIdle, poll_interval: Duration, ctx: SourceContext) {
    info!("Starting idle monitor using {}", PlatformIdle::BACKEND);
    let mut failures_reported = false;

    while ctx.is_running() {
        thread::sleep(poll_interval);

        match idle.idle_time() {
            Some(idle_time) => {
                failures_reported = false;
                if saw_input(idle_time, poll_interval)
                    && !ctx.send_blocking(HostEvent::Activity(ActivitySignal::SystemInput))
                {
                    break;
                }
            }
            None if !failures_reported => {
                warn!("Failed to query {} idle time", PlatformIdle::BACKEND);
                failures_reported = true;
            }
            None => {}
        }
    }

    debug!("Idle monitor thread exiting");
}
