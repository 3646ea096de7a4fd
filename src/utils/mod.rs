//! Utility functions and helpers
//!
//! This module contains the clock abstraction used for safe-window cutoffs,
//! lease expiry and document timestamps.

pub mod time;

pub use time::{Clock, ManualClock, SystemClock};
