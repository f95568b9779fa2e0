//! Wall-clock source for UID generation.
//!
//! The generator only ever asks for "milliseconds since the Unix epoch", so
//! the clock is a one-method trait. Tests substitute a scripted clock to
//! drive sequence rollover and clock-regression paths deterministically.

use std::time::{SystemTime, UNIX_EPOCH};

/// Millisecond-resolution wall clock.
pub trait Clock: Send + Sync {
    /// Current wall-clock time in milliseconds since the Unix epoch.
    fn current_millis(&self) -> u64;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline(always)]
    fn current_millis(&self) -> u64 {
        unix_time_ms()
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
#[inline(always)]
pub fn unix_time_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("System time before Unix epoch!")
        .as_millis() as u64
}
