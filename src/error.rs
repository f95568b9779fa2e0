use thiserror::Error;

/// Errors returned by [`UidGenerator`](crate::UidGenerator) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UidError {
    /// The timestamp bit budget is used up; no more distinct timestamps can
    /// be encoded against the configured epoch.
    #[error("Timestamp bits exhausted. Refusing UID generate. Now: {now}, epoch: {epoch}")]
    TimestampExhausted { now: u64, epoch: u64 },
    /// The wall clock moved backwards (e.g. an NTP correction).
    #[error("Clock moved backwards. Refusing to generate id for {delta} milliseconds")]
    ClockMovedBackwards { delta: u64 },
    /// The sequence-exhausted clock wait did not complete before the caller's
    /// deadline.
    #[error("Deadline exceeded while waiting for the next millisecond")]
    DeadlineExceeded,
    /// A reconfiguration argument was rejected.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
    /// The generator mutex is poisoned (a panic happened while it was held).
    #[error("generator lock is poisoned")]
    LockPoisoned,
}

/// Errors returned by [`RingBuffer`](crate::RingBuffer) operations.
///
/// `Full` and `Empty` are expected under load; the remaining variants signal
/// a slot or cursor that is not in the state the operation requires, which
/// should never happen under correct synchronization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    /// Put rejected: the buffer already holds `bufferSize - 1` unread values.
    #[error("Rejected putting buffer for uid: {uid}")]
    Full { uid: u64 },
    /// Take found nothing new since the last read.
    #[error("Rejected take buffer: buffer is empty")]
    Empty,
    /// The cursor was observed moving backwards. Indicates a concurrency bug.
    #[error("Cursor can't move back: {from} -> {to}")]
    CursorMovedBack { from: i64, to: i64 },
    /// The slot at `index` has not been fully published by a put, or a racing
    /// take already consumed it.
    #[error("Slot {index} not in can-take status")]
    SlotNotReady { index: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let clock_backwards = UidError::ClockMovedBackwards { delta: 100 };
        assert_eq!(
            clock_backwards.to_string(),
            "Clock moved backwards. Refusing to generate id for 100 milliseconds"
        );

        let full = BufferError::Full { uid: 42 };
        assert_eq!(full.to_string(), "Rejected putting buffer for uid: 42");
    }

    #[test]
    fn test_error_clone_eq() {
        let original = BufferError::CursorMovedBack { from: 3, to: 2 };
        let cloned = original.clone();
        assert_eq!(original, cloned);
    }
}
