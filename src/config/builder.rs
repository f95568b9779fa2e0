//! UidConfig builder for constructing configuration.

use once_cell::sync::Lazy;

use super::{parse_epoch_date, ConfigError, UidConfig};

/// Default field widths: 41 timestamp + 10 worker + 12 sequence (+ 1 sign).
pub(crate) const DEFAULT_TIMESTAMP_BITS: u8 = 41;
pub(crate) const DEFAULT_WORKER_BITS: u8 = 10;
pub(crate) const DEFAULT_SEQUENCE_BITS: u8 = 12;

/// Default epoch, midnight UTC.
pub(crate) const DEFAULT_EPOCH_DATE: &str = "2016-05-20";

/// Placeholder worker id. Production deployments must assign worker ids from
/// an external coordination mechanism; that acquisition is out of scope here.
pub(crate) const DEFAULT_WORKER_ID: u64 = 1;

pub(crate) static DEFAULT_EPOCH_MILLIS: Lazy<u64> = Lazy::new(|| {
    parse_epoch_date(DEFAULT_EPOCH_DATE).expect("default epoch date is valid")
});

/// Builder for [`UidConfig`].
#[derive(Debug, Clone)]
pub struct UidConfigBuilder {
    timestamp_bits: u8,
    worker_bits: u8,
    sequence_bits: u8,
    epoch_millis: u64,
    worker_id: u64,
}

impl UidConfigBuilder {
    /// Create a builder with the default 41/10/12 layout.
    pub fn new() -> Self {
        Self {
            timestamp_bits: DEFAULT_TIMESTAMP_BITS,
            worker_bits: DEFAULT_WORKER_BITS,
            sequence_bits: DEFAULT_SEQUENCE_BITS,
            epoch_millis: *DEFAULT_EPOCH_MILLIS,
            worker_id: DEFAULT_WORKER_ID,
        }
    }

    /// Set the timestamp field width. Validated at [`build`](Self::build)
    /// together with the other widths.
    pub const fn timestamp_bits(mut self, bits: u8) -> Self {
        self.timestamp_bits = bits;
        self
    }

    /// Set the worker-id field width.
    pub const fn worker_bits(mut self, bits: u8) -> Self {
        self.worker_bits = bits;
        self
    }

    /// Set the sequence field width.
    pub const fn sequence_bits(mut self, bits: u8) -> Self {
        self.sequence_bits = bits;
        self
    }

    /// Set the epoch from a `YYYY-MM-DD` calendar date, truncated to
    /// midnight UTC.
    pub fn epoch_date(mut self, date: &str) -> Result<Self, ConfigError> {
        self.epoch_millis = parse_epoch_date(date)?;
        Ok(self)
    }

    /// Set the epoch directly in milliseconds since the Unix epoch.
    pub const fn epoch_millis(mut self, millis: u64) -> Self {
        self.epoch_millis = millis;
        self
    }

    /// Set the worker id. Validated against the worker field width at build.
    pub const fn worker_id(mut self, worker_id: u64) -> Self {
        self.worker_id = worker_id;
        self
    }

    /// Build the final configuration, validating the bit layout and worker id.
    pub fn build(self) -> Result<UidConfig, ConfigError> {
        UidConfig::from_parts(
            self.timestamp_bits,
            self.worker_bits,
            self.sequence_bits,
            self.epoch_millis,
            self.worker_id,
        )
    }
}

impl Default for UidConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
