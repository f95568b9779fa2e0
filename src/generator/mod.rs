//! Clock-driven UID generator.
//!
//! Split into modules:
//! - `clock` - pluggable wall-clock source
//! - `wait` - busy-poll loop for sequence exhaustion
//!
//! All issuance and reconfiguration runs under one exclusive section per
//! generator: sequence and last-millisecond form a compound read-modify-write
//! that plain atomics cannot express, and routing the setters through the
//! same mutex keeps a reconfiguration from interleaving with issuance.

mod clock;
mod wait;

use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use chrono::{DateTime, Utc};

pub use clock::{Clock, SystemClock};

use crate::allocator::BitAllocator;
use crate::config::{parse_epoch_date, ConfigError, UidConfig};
use crate::error::UidError;

/// Mutable generator state, owned exclusively under the mutex.
#[derive(Debug)]
struct Internals {
    allocator: BitAllocator,
    epoch_millis: u64,
    worker_id: u64,
    sequence: u64,
    last_millis: u64,
}

/// Snowflake-style UID generator.
///
/// Issues roughly time-ordered 64-bit identifiers, unique per worker id.
/// Thread-safe; share it behind an `Arc` for concurrent use.
#[derive(Debug)]
pub struct UidGenerator<C: Clock = SystemClock> {
    inner: Mutex<Internals>,
    clock: C,
}

/// Reject a millisecond reading whose delta from the epoch no longer fits
/// the timestamp field. Unsigned wrapping means a clock before the epoch
/// reads as an enormous delta and is rejected the same way.
#[inline]
fn checked_millis(now: u64, epoch: u64, max_delta: u64) -> Result<u64, UidError> {
    if now.wrapping_sub(epoch) > max_delta {
        return Err(UidError::TimestampExhausted { now, epoch });
    }
    Ok(now)
}

impl UidGenerator<SystemClock> {
    /// Create a generator with the default configuration.
    pub fn new() -> Result<Self, ConfigError> {
        Self::with_config(UidConfig::default())
    }

    /// Create a generator with a custom configuration.
    pub fn with_config(config: UidConfig) -> Result<Self, ConfigError> {
        Self::with_clock(config, SystemClock)
    }
}

impl Default for UidGenerator<SystemClock> {
    fn default() -> Self {
        Self::new().expect("default configuration is valid")
    }
}

impl<C: Clock> UidGenerator<C> {
    /// Create a generator with a custom clock source.
    pub fn with_clock(config: UidConfig, clock: C) -> Result<Self, ConfigError> {
        let allocator = BitAllocator::new(
            config.timestamp_bits(),
            config.worker_bits(),
            config.sequence_bits(),
        )?;
        Ok(Self {
            inner: Mutex::new(Internals {
                allocator,
                epoch_millis: config.epoch_millis(),
                worker_id: config.worker_id(),
                sequence: 0,
                last_millis: 0,
            }),
            clock,
        })
    }

    /// Generate the next UID.
    ///
    /// If the current millisecond's sequence space is exhausted, busy-polls
    /// the clock until it advances; use [`get_uid_before`](Self::get_uid_before)
    /// for a bounded wait.
    pub fn get_uid(&self) -> Result<u64, UidError> {
        self.next_id(None)
    }

    /// Generate the next UID, giving up with [`UidError::DeadlineExceeded`]
    /// if the sequence-exhausted clock wait passes `deadline`.
    pub fn get_uid_before(&self, deadline: Instant) -> Result<u64, UidError> {
        self.next_id(Some(deadline))
    }

    fn next_id(&self, deadline: Option<Instant>) -> Result<u64, UidError> {
        let mut internals = self.lock()?;
        let epoch = internals.epoch_millis;
        let max_delta = internals.allocator.max_delta_millis();
        let poll = || checked_millis(self.clock.current_millis(), epoch, max_delta);

        let mut now = poll()?;
        if now < internals.last_millis {
            return Err(UidError::ClockMovedBackwards {
                delta: internals.last_millis - now,
            });
        }

        if now == internals.last_millis {
            internals.sequence = (internals.sequence + 1) & internals.allocator.max_sequence();
            if internals.sequence == 0 {
                match wait::next_millis(internals.last_millis, deadline, poll) {
                    Ok(next) => now = next,
                    Err(err) => {
                        // A failed issuance must not consume sequence space:
                        // restore the wrapped counter so a retry waits again
                        // instead of reusing already-issued sequences.
                        internals.sequence = internals.allocator.max_sequence();
                        return Err(err);
                    }
                }
            }
        } else {
            internals.sequence = 0;
        }
        internals.last_millis = now;

        Ok(internals
            .allocator
            .allocate(now - epoch, internals.worker_id, internals.sequence))
    }

    /// Decode a UID into a human-readable string:
    /// `UID:<decimal>, timestamp:<YYYY-MM-DD>, workerId:<decimal>, sequence:<decimal>`.
    pub fn parse_uid(&self, uid: u64) -> Result<String, UidError> {
        let internals = self.lock()?;
        let (delta, worker_id, sequence) = internals.allocator.decompose(uid);
        let timestamp = internals.epoch_millis + delta;
        let date = DateTime::<Utc>::from_timestamp_millis(timestamp as i64)
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| timestamp.to_string());
        Ok(format!(
            "UID:{uid}, timestamp:{date}, workerId:{worker_id}, sequence:{sequence}"
        ))
    }

    /// Decode a UID into `(delta_millis, worker_id, sequence)` under the
    /// current bit layout.
    pub fn decompose(&self, uid: u64) -> Result<(u64, u64, u64), UidError> {
        Ok(self.lock()?.allocator.decompose(uid))
    }

    /// Snapshot of the current bit layout.
    pub fn layout(&self) -> Result<BitAllocator, UidError> {
        Ok(self.lock()?.allocator)
    }

    /// The configured worker id.
    pub fn worker_id(&self) -> Result<u64, UidError> {
        Ok(self.lock()?.worker_id)
    }

    /// The configured epoch in milliseconds since the Unix epoch.
    pub fn epoch_millis(&self) -> Result<u64, UidError> {
        Ok(self.lock()?.epoch_millis)
    }

    /// Replace the worker id, validated against the current worker width.
    pub fn set_worker_id(&self, worker_id: u64) -> Result<(), UidError> {
        let mut internals = self.lock()?;
        let max = internals.allocator.max_worker_id();
        if worker_id > max {
            return Err(ConfigError::InvalidWorkerId { worker_id, max }.into());
        }
        internals.worker_id = worker_id;
        Ok(())
    }

    /// Replace the epoch from a `YYYY-MM-DD` date, truncated to midnight UTC.
    pub fn set_epoch(&self, date: &str) -> Result<(), UidError> {
        let epoch_millis = parse_epoch_date(date)?;
        self.lock()?.epoch_millis = epoch_millis;
        Ok(())
    }

    /// Replace the timestamp field width, rebuilding the bit layout.
    pub fn set_timestamp_bits(&self, bits: u8) -> Result<(), UidError> {
        let mut internals = self.lock()?;
        let allocator = BitAllocator::new(
            bits,
            internals.allocator.worker_bits(),
            internals.allocator.sequence_bits(),
        )?;
        internals.allocator = allocator;
        Ok(())
    }

    /// Replace the worker field width, rebuilding the bit layout. The
    /// current worker id must still fit the new width.
    pub fn set_worker_bits(&self, bits: u8) -> Result<(), UidError> {
        let mut internals = self.lock()?;
        let allocator = BitAllocator::new(
            internals.allocator.timestamp_bits(),
            bits,
            internals.allocator.sequence_bits(),
        )?;
        if internals.worker_id > allocator.max_worker_id() {
            return Err(ConfigError::InvalidWorkerId {
                worker_id: internals.worker_id,
                max: allocator.max_worker_id(),
            }
            .into());
        }
        internals.allocator = allocator;
        Ok(())
    }

    /// Replace the sequence field width, rebuilding the bit layout.
    pub fn set_sequence_bits(&self, bits: u8) -> Result<(), UidError> {
        let mut internals = self.lock()?;
        let allocator = BitAllocator::new(
            internals.allocator.timestamp_bits(),
            internals.allocator.worker_bits(),
            bits,
        )?;
        internals.allocator = allocator;
        // A narrower sequence field must not leave a stale high sequence
        // behind; it would exceed the new mask until the next rollover.
        internals.sequence &= allocator.max_sequence();
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Internals>, UidError> {
        self.inner.lock().map_err(|_| UidError::LockPoisoned)
    }
}
