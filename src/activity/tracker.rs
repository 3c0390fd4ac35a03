//! The inactivity state machine.

use std::time::Instant;
use tracing::{debug, info, warn};

use super::cadence::Cadence;
use super::clock::Clock;
use super::{DEFAULT_MAX_INACTIVITY_PERIODS, DEFAULT_PERIOD_LENGTH_SECONDS};

/// Which side of the warning threshold the tracker is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Fewer than `max_inactivity_periods` periods have elapsed.
    Active,
    /// The threshold has been reached; stays here until the next reset.
    Warning,
}

/// Read-only view of the tracker state, consumed by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivitySnapshot {
    pub enabled: bool,
    pub elapsed_seconds: u64,
    pub period_length_seconds: u64,
    pub inactivity_period_count: u64,
    pub max_inactivity_periods: u64,
}

impl ActivitySnapshot {
    pub fn phase(&self) -> Phase {
        if self.inactivity_period_count >= self.max_inactivity_periods {
            Phase::Warning
        } else {
            Phase::Active
        }
    }
}

/// Emitted once each time the tracker crosses into [`Phase::Warning`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InactivityWarning {
    pub elapsed_seconds: u64,
    pub inactivity_periods: u64,
    pub period_length_seconds: u64,
}

/// Coalesces activity resets and periodic ticks into an elapsed-time
/// counter quantized into inactivity periods.
///
/// All mutation goes through [`record_activity`](Self::record_activity),
/// [`tick`](Self::tick), [`set_enabled`](Self::set_enabled) and
/// [`reconfigure`](Self::reconfigure). The period count is always derived
/// from the elapsed time.
#[derive(Debug)]
pub struct ActivityTracker<K, C> {
    cadence: K,
    clock: C,
    enabled: bool,
    /// Start of the current streak, `None` until the first reset.
    start_instant: Option<Instant>,
    elapsed_seconds: u64,
    period_length_seconds: u64,
    inactivity_period_count: u64,
    max_inactivity_periods: u64,
}

impl<K: Cadence, C: Clock> ActivityTracker<K, C> {
    /// Create a disabled tracker with default thresholds.
    ///
    /// Nothing ticks until [`set_enabled(true)`](Self::set_enabled).
    pub fn new(cadence: K, clock: C) -> Self {
        Self {
            cadence,
            clock,
            enabled: false,
            start_instant: None,
            elapsed_seconds: 0,
            period_length_seconds: DEFAULT_PERIOD_LENGTH_SECONDS,
            inactivity_period_count: 0,
            max_inactivity_periods: DEFAULT_MAX_INACTIVITY_PERIODS,
        }
    }

    /// Builder-style threshold setup for a tracker that is not yet running.
    pub fn with_thresholds(mut self, period_length_seconds: u64, max_inactivity_periods: u64) -> Self {
        self.store_thresholds(period_length_seconds, max_inactivity_periods);
        self
    }

    /// Start a fresh streak. No-op while disabled.
    pub fn record_activity(&mut self) {
        if !self.enabled {
            return;
        }

        self.start_instant = Some(self.clock.now());
        self.elapsed_seconds = 0;
        self.inactivity_period_count = 0;
        self.cadence.start();
    }

    /// Advance the timeline and recompute the period count.
    ///
    /// Returns a warning only on the tick that crosses the threshold.
    pub fn tick(&mut self) -> Option<InactivityWarning> {
        if !self.enabled || !self.cadence.is_running() {
            return None;
        }
        let start = self.start_instant?;

        self.elapsed_seconds = self
            .clock
            .now()
            .saturating_duration_since(start)
            .as_secs();
        let period_count = self.elapsed_seconds / self.period_length_seconds;

        if period_count <= self.inactivity_period_count {
            return None;
        }

        let was_below = self.inactivity_period_count < self.max_inactivity_periods;
        self.inactivity_period_count = period_count;
        debug!(
            "Inactivity period {} reached ({}s elapsed)",
            period_count, self.elapsed_seconds
        );

        if was_below && period_count >= self.max_inactivity_periods {
            warn!(
                "Inactive for {} periods ({}s)",
                period_count, self.elapsed_seconds
            );
            return Some(InactivityWarning {
                elapsed_seconds: self.elapsed_seconds,
                inactivity_periods: period_count,
                period_length_seconds: self.period_length_seconds,
            });
        }

        None
    }

    /// Enable or disable tracking.
    ///
    /// Disabling stops the cadence before returning and zeroes the period
    /// count; the last elapsed value is kept. Enabling starts a new streak.
    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled {
            if !self.enabled {
                info!("Activity tracking enabled");
            }
            self.enabled = true;
            self.record_activity();
        } else if self.enabled {
            self.cadence.stop();
            self.enabled = false;
            self.inactivity_period_count = 0;
            info!("Activity tracking disabled");
        }
    }

    /// Replace the thresholds. While enabled this also starts a new streak so
    /// no count computed against the old period length survives.
    pub fn reconfigure(&mut self, period_length_seconds: u64, max_inactivity_periods: u64) {
        self.store_thresholds(period_length_seconds, max_inactivity_periods);
        info!(
            "Thresholds set: {}s periods, warning after {}",
            self.period_length_seconds, self.max_inactivity_periods
        );
        if self.enabled {
            self.record_activity();
        }
    }

    fn store_thresholds(&mut self, period_length_seconds: u64, max_inactivity_periods: u64) {
        if period_length_seconds == 0 || max_inactivity_periods == 0 {
            warn!(
                "Ignoring zero threshold (period={}s, max={}), using 1",
                period_length_seconds, max_inactivity_periods
            );
        }
        self.period_length_seconds = period_length_seconds.max(1);
        self.max_inactivity_periods = max_inactivity_periods.max(1);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn phase(&self) -> Phase {
        self.snapshot().phase()
    }

    pub fn snapshot(&self) -> ActivitySnapshot {
        ActivitySnapshot {
            enabled: self.enabled,
            elapsed_seconds: self.elapsed_seconds,
            period_length_seconds: self.period_length_seconds,
            inactivity_period_count: self.inactivity_period_count,
            max_inactivity_periods: self.max_inactivity_periods,
        }
    }

    pub fn cadence(&self) -> &K {
        &self.cadence
    }

    /// Stop ticking for good; the tracker stays inspectable.
    pub fn shutdown(&mut self) {
        self.cadence.stop();
        self.enabled = false;
    }
}

impl<C: Clock> ActivityTracker<super::IntervalCadence, C> {
    /// Wait for the cadence. Pending forever while stopped.
    pub async fn next_tick(&mut self) {
        self.cadence.tick().await
    }
}
