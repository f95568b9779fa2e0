//! Bit-layout algebra for 64-bit UIDs.
//!
//! A UID packs `{sign, timestamp-delta, workerId, sequence}` into one word:
//!
//! ```text
//! | 1 bit sign | timestamp_bits delta | worker_bits workerId | sequence_bits seq |
//! ```
//!
//! The allocator is a pure value: shifts and maxima are precomputed once from
//! the widths and never mutated. Reconfiguring a generator's widths replaces
//! the allocator wholesale.

use crate::config::ConfigError;

/// Precomputed shifts and maxima for one `{timestamp, worker, sequence}` layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitAllocator {
    timestamp_bits: u8,
    worker_bits: u8,
    sequence_bits: u8,

    max_delta_millis: u64,
    max_worker_id: u64,
    max_sequence: u64,

    timestamp_shift: u8,
    worker_shift: u8,
}

/// Total width of a UID word.
pub const TOTAL_BITS: u8 = 64;
/// Reserved sign bit, always zero in generated UIDs.
pub const SIGN_BITS: u8 = 1;

/// Maximum value representable in `bits` bits.
#[inline]
const fn max_value(bits: u8) -> u64 {
    if bits == 0 {
        0
    } else {
        (1u64 << bits) - 1
    }
}

impl BitAllocator {
    /// Build an allocator from field widths.
    ///
    /// The widths plus the sign bit must cover exactly 64 bits; each width
    /// must be below 64 on its own.
    pub fn new(timestamp_bits: u8, worker_bits: u8, sequence_bits: u8) -> Result<Self, ConfigError> {
        for bits in [timestamp_bits, worker_bits, sequence_bits] {
            if bits >= TOTAL_BITS {
                return Err(ConfigError::BitWidthOutOfRange { bits });
            }
        }
        let total =
            SIGN_BITS as u32 + timestamp_bits as u32 + worker_bits as u32 + sequence_bits as u32;
        if total != TOTAL_BITS as u32 {
            return Err(ConfigError::BitsSumMismatch {
                timestamp_bits,
                worker_bits,
                sequence_bits,
            });
        }

        Ok(Self {
            timestamp_bits,
            worker_bits,
            sequence_bits,
            max_delta_millis: max_value(timestamp_bits),
            max_worker_id: max_value(worker_bits),
            max_sequence: max_value(sequence_bits),
            timestamp_shift: worker_bits + sequence_bits,
            worker_shift: sequence_bits,
        })
    }

    /// Pack fields into a UID word.
    ///
    /// Bounds are the caller's responsibility: an out-of-range field silently
    /// corrupts its neighbors instead of failing, so callers must enforce
    /// `delta <= max_delta_millis()` etc. before calling.
    #[inline(always)]
    pub const fn allocate(&self, delta_millis: u64, worker_id: u64, sequence: u64) -> u64 {
        (delta_millis << self.timestamp_shift) | (worker_id << self.worker_shift) | sequence
    }

    /// Recover `(delta_millis, worker_id, sequence)` from a UID word.
    #[inline]
    pub const fn decompose(&self, uid: u64) -> (u64, u64, u64) {
        let delta = (uid >> self.timestamp_shift) & self.max_delta_millis;
        let worker = (uid >> self.worker_shift) & self.max_worker_id;
        let sequence = uid & self.max_sequence;
        (delta, worker, sequence)
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
    pub const fn max_delta_millis(&self) -> u64 {
        self.max_delta_millis
    }

    #[inline(always)]
    pub const fn max_worker_id(&self) -> u64 {
        self.max_worker_id
    }

    #[inline(always)]
    pub const fn max_sequence(&self) -> u64 {
        self.max_sequence
    }

    #[inline(always)]
    pub(crate) const fn timestamp_shift(&self) -> u8 {
        self.timestamp_shift
    }

    #[inline(always)]
    pub(crate) const fn worker_shift(&self) -> u8 {
        self.worker_shift
    }
}
