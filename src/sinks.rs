//! Output sinks for the status indicator and notifications.

use anyhow::{Context, Result};
use std::io::Write;
use std::sync::{Arc, Mutex};

use crate::presentation::{DisplayTuple, Notification, NotificationLevel};
use crate::protocol::OutboundMessage;

/// Persistent status indicator.
pub trait DisplaySink: Send {
    fn show(&mut self, tuple: &DisplayTuple) -> Result<()>;
}

/// Transient user notifications.
pub trait NotificationSink: Send {
    fn notify(&mut self, notification: &Notification) -> Result<()>;
}

/// Writes host protocol messages, one JSON object per line.
///
/// Status messages are only written when the tuple changed.
pub struct JsonLinesOutput<W> {
    writer: W,
    last_status: Option<DisplayTuple>,
}

impl<W: Write> JsonLinesOutput<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            last_status: None,
        }
    }

    fn write_message(&mut self, message: &OutboundMessage) -> Result<()> {
        let line = serde_json::to_string(message)?;
        writeln!(self.writer, "{}", line).context("Failed to write to host")?;
        self.writer.flush().context("Failed to flush host output")?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> DisplaySink for JsonLinesOutput<W> {
    fn show(&mut self, tuple: &DisplayTuple) -> Result<()> {
        if self.last_status.as_ref() == Some(tuple) {
            return Ok(());
        }
        self.write_message(&OutboundMessage::from(tuple))?;
        self.last_status = Some(tuple.clone());
        Ok(())
    }
}

impl<W: Write + Send> NotificationSink for JsonLinesOutput<W> {
    fn notify(&mut self, notification: &Notification) -> Result<()> {
        self.write_message(&OutboundMessage::from(notification))
    }
}

/// Plain console lines for running without an editor host.
pub struct TextOutput<W> {
    writer: W,
    last_text: Option<String>,
}

impl<W: Write> TextOutput<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            last_text: None,
        }
    }
}

impl<W: Write + Send> DisplaySink for TextOutput<W> {
    fn show(&mut self, tuple: &DisplayTuple) -> Result<()> {
        if self.last_text.as_deref() == Some(tuple.text.as_str()) {
            return Ok(());
        }
        writeln!(self.writer, "{}", tuple.text)?;
        self.writer.flush()?;
        self.last_text = Some(tuple.text.clone());
        Ok(())
    }
}

impl<W: Write + Send> NotificationSink for TextOutput<W> {
    fn notify(&mut self, notification: &Notification) -> Result<()> {
        let prefix = match notification.level {
            NotificationLevel::Info => "ℹ️",
            NotificationLevel::Warning => "⚠️",
        };
        let mut line = format!("{} {}", prefix, notification.message);
        if let Some(since) = notification.since {
            line.push_str(&format!(" since {}", since.format("%H:%M:%S UTC")));
        }
        if !notification.actions.is_empty() {
            let actions: Vec<_> = notification.actions.iter().map(|a| a.label()).collect();
            line.push_str(&format!(" [{}]", actions.join(" | ")));
        }
        writeln!(self.writer, "{}", line)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// In-memory sink; clones share the same buffers.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    statuses: Arc<Mutex<Vec<DisplayTuple>>>,
    notifications: Arc<Mutex<Vec<Notification>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statuses(&self) -> Vec<DisplayTuple> {
        self.statuses.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn last_status(&self) -> Option<DisplayTuple> {
        self.statuses.lock().ok().and_then(|s| s.last().cloned())
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications
            .lock()
            .map(|n| n.clone())
            .unwrap_or_default()
    }
}

impl DisplaySink for MemorySink {
    fn show(&mut self, tuple: &DisplayTuple) -> Result<()> {
        self.statuses
            .lock()
            .map_err(|_| anyhow::anyhow!("status buffer poisoned"))?
            .push(tuple.clone());
        Ok(())
    }
}

impl NotificationSink for MemorySink {
    fn notify(&mut self, notification: &Notification) -> Result<()> {
        self.notifications
            .lock()
            .map_err(|_| anyhow::anyhow!("notification buffer poisoned"))?
            .push(notification.clone());
        Ok(())
    }
}
