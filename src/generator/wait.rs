//! Clock-wait loop for sequence exhaustion.
//!
//! When a millisecond's sequence space wraps, issuance busy-polls the clock
//! until it strictly advances. The wait is bound to real clock granularity
//! (one millisecond), so it stays a spin rather than a sleep; an optional
//! deadline keeps callers from being stuck if the clock never advances.

use std::thread;
use std::time::Instant;

use crate::error::UidError;

/// Yield to the scheduler every N spin iterations.
const SPIN_YIELD_EVERY: u32 = 16;

/// Busy-poll `current` until it returns a millisecond strictly past
/// `last_millis`.
///
/// `current` may itself fail (timestamp budget exhausted mid-wait); that
/// error propagates. With a deadline, returns `DeadlineExceeded` once
/// `Instant::now()` passes it.
pub(crate) fn next_millis<F>(
    last_millis: u64,
    deadline: Option<Instant>,
    mut current: F,
) -> Result<u64, UidError>
where
    F: FnMut() -> Result<u64, UidError>,
{
    let mut spins: u32 = 0;
    loop {
        let now = current()?;
        if now > last_millis {
            return Ok(now);
        }
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                return Err(UidError::DeadlineExceeded);
            }
        }
        std::hint::spin_loop();
        spins = spins.wrapping_add(1);
        if spins % SPIN_YIELD_EVERY == 0 {
            thread::yield_now();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_immediate_advance() {
        let got = next_millis(100, None, || Ok(101)).unwrap();
        assert_eq!(got, 101);
    }

    #[test]
    fn test_advances_after_polling() {
        let mut ticks = 0u64;
        let got = next_millis(100, None, || {
            ticks += 1;
            Ok(if ticks < 5 { 100 } else { 102 })
        })
        .unwrap();
        assert_eq!(got, 102);
        assert_eq!(ticks, 5);
    }

    #[test]
    fn test_propagates_poll_error() {
        let err = next_millis(100, None, || {
            Err(UidError::TimestampExhausted { now: 100, epoch: 0 })
        })
        .unwrap_err();
        assert!(matches!(err, UidError::TimestampExhausted { .. }));
    }

    #[test]
    fn test_deadline_expires() {
        let deadline = Instant::now() + Duration::from_millis(5);
        let err = next_millis(100, Some(deadline), || Ok(100)).unwrap_err();
        assert_eq!(err, UidError::DeadlineExceeded);
    }
}
