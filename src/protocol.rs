//! Line-delimited JSON protocol spoken with the editor host.
//!
//! Inbound messages arrive one per line on stdin; outbound messages are
//! written one per line to stdout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::presentation::{
    ColorClass, DisplayTuple, Notification, NotificationAction, NotificationLevel,
};
use crate::sources::ActivitySignal;

/// User-invocable commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    /// Flip between enabled and disabled.
    Toggle,
    /// Start a new streak (also bound to clicking the status item).
    Reset,
}

/// Settings the host may push at runtime. Missing fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsUpdate {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub warning_time: Option<u64>,
    #[serde(default)]
    pub max_inactivity_periods: Option<u64>,
}

/// Message received from the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostMessage {
    Activity { signal: ActivitySignal },
    /// Document change; empty change sets are not activity.
    DocumentEdited {
        #[serde(default = "default_changes")]
        changes: usize,
    },
    Command { command: Command },
    NotificationAction { action: NotificationAction },
    Configure(SettingsUpdate),
    Shutdown,
}

fn default_changes() -> usize {
    1
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("empty message")]
    Empty,
    #[error("malformed host message: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl HostMessage {
    /// Decode one protocol line.
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(ProtocolError::Empty);
        }
        Ok(serde_json::from_str(line)?)
    }
}

/// Message written to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    Status {
        icon: String,
        text: String,
        color: ColorClass,
        tooltip: String,
    },
    Notification {
        level: NotificationLevel,
        message: String,
        actions: Vec<NotificationAction>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        since: Option<DateTime<Utc>>,
    },
}

impl From<&DisplayTuple> for OutboundMessage {
    fn from(tuple: &DisplayTuple) -> Self {
        Self::Status {
            icon: tuple.icon.clone(),
            text: tuple.text.clone(),
            color: tuple.color,
            tooltip: tuple.tooltip.clone(),
        }
    }
}

impl From<&Notification> for OutboundMessage {
    fn from(notification: &Notification) -> Self {
        Self::Notification {
            level: notification.level,
            message: notification.message.clone(),
            actions: notification.actions.clone(),
            since: notification.since,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_activity_signal() {
        let msg = HostMessage::parse(r#"{"type":"activity","signal":"terminal_output"}"#).unwrap();
        assert_eq!(
            msg,
            HostMessage::Activity {
                signal: ActivitySignal::TerminalOutput
            }
        );
    }

    #[test]
    fn document_edit_defaults_to_one_change() {
        let msg = HostMessage::parse(r#"{"type":"document_edited"}"#).unwrap();
        assert_eq!(msg, HostMessage::DocumentEdited { changes: 1 });
    }

    #[test]
    fn parses_commands_and_actions() {
        assert_eq!(
            HostMessage::parse(r#"{"type":"command","command":"toggle"}"#).unwrap(),
            HostMessage::Command {
                command: Command::Toggle
            }
        );
        assert_eq!(
            HostMessage::parse(r#"{"type":"notification_action","action":"Reset Counter"}"#)
                .unwrap(),
            HostMessage::NotificationAction {
                action: NotificationAction::ResetCounter
            }
        );
    }

    #[test]
    fn parses_partial_configure() {
        let msg = HostMessage::parse(r#"{"type":"configure","warning_time":30}"#).unwrap();
        assert_eq!(
            msg,
            HostMessage::Configure(SettingsUpdate {
                enabled: None,
                warning_time: Some(30),
                max_inactivity_periods: None,
            })
        );
    }

    #[test]
    fn rejects_blank_and_unknown_lines() {
        assert!(matches!(HostMessage::parse("   "), Err(ProtocolError::Empty)));
        assert!(matches!(
            HostMessage::parse(r#"{"type":"launch_rockets"}"#),
            Err(ProtocolError::Malformed(_))
        ));
        assert!(matches!(
            HostMessage::parse("not json"),
            Err(ProtocolError::Malformed(_))
        ));
    }

    #[test]
    fn status_serializes_with_type_tag() {
        let tuple = DisplayTuple {
            icon: "💚".into(),
            text: "💚 Active: 0s".into(),
            color: ColorClass::Normal,
            tooltip: "tip".into(),
        };
        let json = serde_json::to_value(OutboundMessage::from(&tuple)).unwrap();
        assert_eq!(json["type"], "status");
        assert_eq!(json["color"], "normal");
        assert_eq!(json["text"], "💚 Active: 0s");
    }

    #[test]
    fn notification_serializes_action_labels() {
        let notification = Notification {
            level: NotificationLevel::Warning,
            message: "m".into(),
            actions: NotificationAction::ALL.to_vec(),
            since: None,
        };
        let json = serde_json::to_value(OutboundMessage::from(&notification)).unwrap();
        assert_eq!(json["type"], "notification");
        assert_eq!(json["level"], "warning");
        assert_eq!(json["actions"][0], "Reset Counter");
        assert_eq!(json["actions"][1], "Disable");
        assert!(json.get("since").is_none());
    }

    #[test]
    fn warning_carries_inactive_since_timestamp() {
        let warning = crate::activity::InactivityWarning {
            elapsed_seconds: 50,
            inactivity_periods: 5,
            period_length_seconds: 10,
        };
        let now = "2024-03-01T12:00:50Z".parse::<DateTime<Utc>>().unwrap();
        let notification = Notification::inactivity(&warning, now);

        let json = serde_json::to_value(OutboundMessage::from(&notification)).unwrap();
        assert_eq!(json["since"], "2024-03-01T12:00:00Z");
    }
}
