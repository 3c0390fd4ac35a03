//! Idle time for Linux using the X11 XScreenSaver extension.

use anyhow::{Context, Result};
use std::time::Duration;
use x11rb::connection::Connection;
use x11rb::protocol::screensaver::ConnectionExt as ScreensaverConnectionExt;
use x11rb::protocol::xproto::Window;
use x11rb::rust_connection::RustConnection;

/// Open X11 connection plus the root window to query.
pub(super) struct PlatformIdle {
    conn: RustConnection,
    root: Window,
}

impl PlatformIdle {
    pub(super) const BACKEND: &'static str = "X11 XScreenSaver";

    /// Connect and verify the screensaver extension answers.
    pub(super) fn connect() -> Result<Self> {
        let (conn, screen_num) = RustConnection::connect(None)
            .context("Failed to connect to X11 display. Is DISPLAY set?")?;
        let root = conn.setup().roots[screen_num].root;

        conn.screensaver_query_info(root)
            .context("XScreenSaver extension not available")?
            .reply()
            .context("Failed to query XScreenSaver info")?;

        Ok(Self { conn, root })
    }

    pub(super) fn idle_time(&self) -> Option<Duration> {
        let reply = self
            .conn
            .screensaver_query_info(self.root)
            .ok()?
            .reply()
            .ok()?;
        Some(Duration::from_millis(reply.ms_since_user_input as u64))
    }
}
