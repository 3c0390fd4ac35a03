//! Host bridge: host events read as JSON lines from an async reader.

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tracing::{debug, info, trace, warn};

use super::{ActivitySignal, ActivitySource, HostEvent, SourceContext};
use crate::protocol::HostMessage;

/// Reads [`HostMessage`]s and forwards them as [`HostEvent`]s.
pub struct HostBridge<R> {
    reader: R,
}

impl HostBridge<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin + Send + 'static> HostBridge<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Forward messages until EOF or until the monitor goes away.
    ///
    /// EOF means the host closed the pipe and is forwarded as
    /// [`HostEvent::Shutdown`].
    pub async fn pump(self, ctx: SourceContext) {
        let mut lines = self.reader.lines();

        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    info!("Host closed the event stream");
                    let _ = ctx.events.send(HostEvent::Shutdown).await;
                    break;
                }
                Err(e) => {
                    warn!("Failed to read host event stream: {}", e);
                    let _ = ctx.events.send(HostEvent::Shutdown).await;
                    break;
                }
            };

            let message = match HostMessage::parse(&line) {
                Ok(message) => message,
                Err(e) => {
                    warn!("Skipping host line: {}", e);
                    continue;
                }
            };
            trace!("Host message: {:?}", message);

            let Some(event) = translate(message) else {
                continue;
            };
            if ctx.events.send(event).await.is_err() || !ctx.is_running() {
                break;
            }
        }

        debug!("Host bridge exiting");
    }
}

/// Map a protocol message onto the monitor's event vocabulary.
pub(crate) fn translate(message: HostMessage) -> Option<HostEvent> {
    match message {
        HostMessage::Activity { signal } => Some(HostEvent::Activity(signal)),
        HostMessage::DocumentEdited { changes: 0 } => None,
        HostMessage::DocumentEdited { .. } => {
            Some(HostEvent::Activity(ActivitySignal::DocumentEdited))
        }
        HostMessage::Command { command } => Some(HostEvent::Command(command)),
        HostMessage::NotificationAction { action } => Some(HostEvent::NotificationAction(action)),
        HostMessage::Configure(update) => Some(HostEvent::Configure(update)),
        HostMessage::Shutdown => Some(HostEvent::Shutdown),
    }
}

impl<R: AsyncBufRead + Unpin + Send + 'static> ActivitySource for HostBridge<R> {
    fn name(&self) -> &'static str {
        "host"
    }

    fn start(self: Box<Self>, ctx: SourceContext) -> Result<()> {
        tokio::spawn(self.pump(ctx));
        Ok(())
    }
}
