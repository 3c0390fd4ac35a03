//! Inactivity tracking: the streak timeline, period quantization and the
//! edge-triggered warning.

mod cadence;
mod clock;
mod tracker;

pub use cadence::{Cadence, IntervalCadence, ManualCadence, TICK_INTERVAL};
pub use clock::{Clock, ManualClock, SystemClock};
pub use tracker::{ActivitySnapshot, ActivityTracker, InactivityWarning, Phase};

/// Default length of one inactivity period in seconds.
pub const DEFAULT_PERIOD_LENGTH_SECONDS: u64 = 10;

/// Default number of consecutive periods before the warning fires.
pub const DEFAULT_MAX_INACTIVITY_PERIODS: u64 = 5;
