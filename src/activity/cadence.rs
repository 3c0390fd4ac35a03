//! The periodic tick cadence that drives [`ActivityTracker::tick`].
//!
//! [`ActivityTracker::tick`]: super::ActivityTracker::tick

use std::time::Duration;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::trace;

/// Interval between tracker ticks.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Start/stop control over a periodic schedule.
///
/// `stop` must take effect before it returns: a stopped cadence never
/// delivers another tick.
pub trait Cadence {
    fn start(&mut self);
    fn stop(&mut self);
    fn is_running(&self) -> bool;
}

/// Tokio-backed cadence, one tick per [`TICK_INTERVAL`].
///
/// Must be started from within a tokio runtime.
#[derive(Debug)]
pub struct IntervalCadence {
    period: Duration,
    interval: Option<Interval>,
}

impl IntervalCadence {
    pub fn new() -> Self {
        Self::with_period(TICK_INTERVAL)
    }

    pub fn with_period(period: Duration) -> Self {
        Self {
            period,
            interval: None,
        }
    }

    /// Wait for the next tick. Pending forever while stopped.
    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}

impl Default for IntervalCadence {
    fn default() -> Self {
        Self::new()
    }
}

impl Cadence for IntervalCadence {
    fn start(&mut self) {
        if self.interval.is_some() {
            return;
        }
        // First tick one period from now; the reset itself already rendered.
        let mut interval = tokio::time::interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.interval = Some(interval);
        trace!("Tick cadence started ({:?})", self.period);
    }

    fn stop(&mut self) {
        if self.interval.take().is_some() {
            trace!("Tick cadence stopped");
        }
    }

    fn is_running(&self) -> bool {
        self.interval.is_some()
    }
}

/// Cadence driven by hand; records how often it was started and stopped.
#[derive(Debug, Default, Clone)]
pub struct ManualCadence {
    running: bool,
    starts: u32,
    stops: u32,
}

impl ManualCadence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stopped→running transitions.
    pub fn starts(&self) -> u32 {
        self.starts
    }

    /// Number of running→stopped transitions.
    pub fn stops(&self) -> u32 {
        self.stops
    }
}

impl Cadence for ManualCadence {
    fn start(&mut self) {
        if !self.running {
            self.running = true;
            self.starts += 1;
        }
    }

    fn stop(&mut self) {
        if self.running {
            self.running = false;
            self.stops += 1;
        }
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_pending, task};

    #[test]
    fn stopped_interval_never_ticks() {
        let mut cadence = IntervalCadence::new();
        let mut tick = task::spawn(cadence.tick());
        assert_pending!(tick.poll());
        assert_pending!(tick.poll());
    }

    #[tokio::test(start_paused = true)]
    async fn running_interval_ticks_once_per_period() {
        let mut cadence = IntervalCadence::new();
        cadence.start();
        assert!(cadence.is_running());

        let before = Instant::now();
        cadence.tick().await;
        assert_eq!(Instant::now() - before, TICK_INTERVAL);

        cadence.tick().await;
        assert_eq!(Instant::now() - before, TICK_INTERVAL * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_keeps_existing_schedule() {
        let mut cadence = IntervalCadence::new();
        cadence.start();
        tokio::time::advance(Duration::from_millis(600)).await;
        cadence.start();

        let before = Instant::now();
        cadence.tick().await;
        assert_eq!(Instant::now() - before, Duration::from_millis(400));
    }

    #[test]
    fn manual_cadence_counts_transitions() {
        let mut cadence = ManualCadence::new();
        cadence.start();
        cadence.start();
        cadence.stop();
        cadence.stop();
        cadence.start();

        assert!(cadence.is_running());
        assert_eq!(cadence.starts(), 2);
        assert_eq!(cadence.stops(), 1);
    }
}
