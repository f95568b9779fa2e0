//! Configuration for the UID generator.

mod builder;

use chrono::NaiveDate;
use thiserror::Error;

pub use builder::UidConfigBuilder;
pub(crate) use builder::{
    DEFAULT_EPOCH_DATE, DEFAULT_EPOCH_MILLIS, DEFAULT_SEQUENCE_BITS, DEFAULT_TIMESTAMP_BITS,
    DEFAULT_WORKER_BITS, DEFAULT_WORKER_ID,
};

use crate::allocator::BitAllocator;

/// Irrecoverable misconfigurations, surfaced at construction or
/// reconfiguration time. These must never be silently ignored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A single field width is outside `[0, 64)`.
    #[error("Bit width {bits} must be below 64")]
    BitWidthOutOfRange { bits: u8 },
    /// The widths plus the sign bit do not cover exactly 64 bits.
    #[error(
        "Invalid bit allocation: 1 (sign) + {timestamp_bits} + {worker_bits} + {sequence_bits} must be 64"
    )]
    BitsSumMismatch {
        timestamp_bits: u8,
        worker_bits: u8,
        sequence_bits: u8,
    },
    /// The epoch date string did not parse as `YYYY-MM-DD`.
    #[error("Epoch date `{date}` is not a valid YYYY-MM-DD date")]
    InvalidEpochDate { date: String },
    /// The worker id exceeds what the worker field can hold.
    #[error("Worker id {worker_id} exceeds maximum {max}")]
    InvalidWorkerId { worker_id: u64, max: u64 },
    /// Ring buffer sizes must be non-zero powers of two.
    #[error("Buffer size {size} must be a positive power of 2")]
    BufferSizeNotPowerOfTwo { size: usize },
    /// The padding factor is a percentage.
    #[error("Padding factor {factor} must be between 0 and 100")]
    InvalidPaddingFactor { factor: u32 },
}

/// Parse a `YYYY-MM-DD` calendar date into milliseconds since the Unix epoch,
/// truncated to midnight UTC.
pub(crate) fn parse_epoch_date(date: &str) -> Result<u64, ConfigError> {
    let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
        ConfigError::InvalidEpochDate {
            date: date.to_owned(),
        }
    })?;
    let midnight = parsed
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| ConfigError::InvalidEpochDate {
            date: date.to_owned(),
        })?;
    Ok(midnight.and_utc().timestamp_millis() as u64)
}

/// Validated startup configuration for a [`UidGenerator`](crate::UidGenerator).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UidConfig {
    timestamp_bits: u8,
    worker_bits: u8,
    sequence_bits: u8,
    epoch_millis: u64,
    worker_id: u64,
}

impl UidConfig {
    /// Create a new configuration builder.
    pub fn builder() -> UidConfigBuilder {
        UidConfigBuilder::new()
    }

    pub(crate) fn from_parts(
        timestamp_bits: u8,
        worker_bits: u8,
        sequence_bits: u8,
        epoch_millis: u64,
        worker_id: u64,
    ) -> Result<Self, ConfigError> {
        // BitAllocator::new carries the width validation; build one up front
        // so a bad layout never reaches the generator.
        let allocator = BitAllocator::new(timestamp_bits, worker_bits, sequence_bits)?;
        if worker_id > allocator.max_worker_id() {
            return Err(ConfigError::InvalidWorkerId {
                worker_id,
                max: allocator.max_worker_id(),
            });
        }
        Ok(Self {
            timestamp_bits,
            worker_bits,
            sequence_bits,
            epoch_millis,
            worker_id,
        })
    }

    #[inline(always)]
    pub const fn timestamp_bits(&self) -> u8 {
        self.timestamp_bits
    }

    #[inline(always)]
    pub const fn worker_bits(&self) -> u8 {
        self.worker_bits
    }

    #[inline(always)]
    pub const fn sequence_bits(&self) -> u8 {
        self.sequence_bits
    }

    #[inline(always)]
    pub const fn epoch_millis(&self) -> u64 {
        self.epoch_millis
    }

    #[inline(always)]
    pub const fn worker_id(&self) -> u64 {
        self.worker_id
    }
}

impl Default for UidConfig {
    fn default() -> Self {
        UidConfigBuilder::new()
            .build()
            .expect("default configuration is valid")
    }
}
