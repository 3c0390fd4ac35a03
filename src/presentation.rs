//! Maps tracker state to what the status indicator and notifications show.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::activity::{ActivitySnapshot, InactivityWarning, Phase};

/// Host color slot for the status indicator background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorClass {
    /// No background (monitor off).
    None,
    Normal,
    Warning,
    Error,
}

/// Everything a status indicator needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayTuple {
    pub icon: String,
    pub text: String,
    pub color: ColorClass,
    pub tooltip: String,
}

/// Render the status indicator for the given state.
pub fn render(state: &ActivitySnapshot) -> DisplayTuple {
    if !state.enabled {
        return off();
    }

    let elapsed = state.elapsed_seconds;
    let count = state.inactivity_period_count;
    let max = state.max_inactivity_periods;

    if state.phase() == Phase::Warning {
        let icon = if elapsed % 2 == 0 { "🔴" } else { "⚠️" };
        return DisplayTuple {
            icon: icon.to_string(),
            text: format!("{} INACTIVE: {}s ({} periods)", icon, elapsed, count),
            color: ColorClass::Error,
            tooltip: format!(
                "⚠️ User inactive for {} seconds across {} consecutive {}-second periods!",
                elapsed, count, state.period_length_seconds
            ),
        };
    }

    // Same recomputed count as the warning check, so both agree on period 1.
    if count >= 1 {
        return DisplayTuple {
            icon: "🟡".to_string(),
            text: format!("🟡 Period {}/{}: {}s", count, max, elapsed),
            color: ColorClass::Warning,
            tooltip: format!(
                "{} more inactive periods until warning ({}s in current period)",
                max - count,
                elapsed
            ),
        };
    }

    let icon = active_icon(elapsed, state.period_length_seconds);
    DisplayTuple {
        icon: icon.to_string(),
        text: format!("{} Active: {}s", icon, elapsed),
        color: ColorClass::Normal,
        tooltip: format!(
            "User active - {}s in current period. Warning after {} consecutive periods.",
            elapsed, max
        ),
    }
}

/// Fixed tuple shown while monitoring is disabled.
pub fn off() -> DisplayTuple {
    DisplayTuple {
        icon: "🖱️".to_string(),
        text: "🖱️ Monitor: OFF".to_string(),
        color: ColorClass::None,
        tooltip: "Cursor Monitor is disabled".to_string(),
    }
}

/// Icon band within the first period: start (<=30%), middle (<=70%), end.
fn active_icon(elapsed: u64, period_length: u64) -> &'static str {
    let scaled = elapsed * 10;
    if scaled <= period_length * 3 {
        "💚"
    } else if scaled <= period_length * 7 {
        "🖱️"
    } else {
        "🟡"
    }
}

/// Response options offered with the inactivity warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationAction {
    #[serde(rename = "Reset Counter")]
    ResetCounter,
    #[serde(rename = "Disable")]
    Disable,
}

impl NotificationAction {
    pub const ALL: [NotificationAction; 2] = [Self::ResetCounter, Self::Disable];

    pub fn label(&self) -> &'static str {
        match self {
            Self::ResetCounter => "Reset Counter",
            Self::Disable => "Disable",
        }
    }
}

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Warning,
}

/// A message for the host's notification area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub actions: Vec<NotificationAction>,
    /// Wall-clock start of the inactive streak, on warnings only.
    pub since: Option<DateTime<Utc>>,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
            actions: Vec::new(),
            since: None,
        }
    }

    /// The warning for `warning`, stamped with when the streak began as
    /// seen from `now`.
    pub fn inactivity(warning: &InactivityWarning, now: DateTime<Utc>) -> Self {
        let idle_for = std::time::Duration::from_secs(warning.elapsed_seconds);
        Self {
            since: Some(now - chrono::Duration::from_std(idle_for).unwrap_or_default()),
            ..Self::from(warning)
        }
    }
}

impl From<&InactivityWarning> for Notification {
    fn from(warning: &InactivityWarning) -> Self {
        Self {
            level: NotificationLevel::Warning,
            message: format!(
                "Inactive for {} consecutive {}-second periods ({}s total)",
                warning.inactivity_periods, warning.period_length_seconds, warning.elapsed_seconds
            ),
            actions: NotificationAction::ALL.to_vec(),
            since: None,
        }
    }
}
