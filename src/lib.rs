//! Cursor Monitor
//!
//! Tracks editor activity and escalates an inactivity warning in a status
//! indicator. Activity events reset a streak timer; elapsed time is counted
//! in fixed-length periods, and reaching the configured number of periods
//! fires a one-shot warning.

pub mod activity;
pub mod config;
pub mod monitor;
pub mod presentation;
pub mod protocol;
pub mod sinks;
pub mod sources;
pub mod watch;
