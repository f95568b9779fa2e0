//! Bounded concurrent cache of pre-generated UIDs.
//!
//! A power-of-two ring of slots, each paired with a flag that alternates
//! `CAN_PUT -> CAN_TAKE -> CAN_PUT`. Puts run under a mutex covering the
//! whole buffer; takes are lock-free, synchronizing through the cursor, the
//! tail, and the per-slot flags.
//!
//! Publication ordering: a put stores the slot value, then the flag with
//! `Release`, then advances the tail with `Release`. A take that acquires
//! either the tail or the flag therefore observes the completed value write;
//! seeing `CAN_TAKE` is the guarantee that the slot is readable.
//!
//! The hot counters are wrapped in [`CachePadded`] so producer and consumer
//! cores do not invalidate each other's cache lines.

pub mod padding;

use std::sync::atomic::{AtomicI64, AtomicU64, AtomicU8, Ordering};
use std::sync::Mutex;

use crossbeam_utils::CachePadded;

use crate::config::ConfigError;
use crate::error::BufferError;

/// Logical position of a counter that has never been written or read.
const START_POINT: i64 = -1;

/// Slot is free for a producer.
const CAN_PUT: u8 = 0;
/// Slot holds an unconsumed value.
const CAN_TAKE: u8 = 1;

/// Default padding factor, percent of capacity.
pub const DEFAULT_PADDING_PERCENT: u32 = 50;

/// Fixed-capacity ring of pre-computed UIDs.
///
/// Holds at most `buffer_size - 1` unread values: the tail never wraps onto
/// unread data, so `tail - cursor <= buffer_size - 1` at all times.
#[derive(Debug)]
pub struct RingBuffer {
    buffer_size: usize,
    index_mask: i64,

    slots: Box<[AtomicU64]>,
    flags: Box<[CachePadded<AtomicU8>]>,

    /// Logical position of the last successfully written slot.
    tail: CachePadded<AtomicI64>,
    /// Logical position of the last successfully read slot.
    cursor: CachePadded<AtomicI64>,

    /// Remaining-capacity level below which a refill should be triggered.
    padding_threshold: i64,

    put_lock: Mutex<()>,
}

impl RingBuffer {
    /// Create a buffer with the default padding factor of 50 percent.
    pub fn new(buffer_size: usize) -> Result<Self, ConfigError> {
        Self::with_padding_factor(buffer_size, DEFAULT_PADDING_PERCENT)
    }

    /// Create a buffer sized to a power of two with an explicit padding
    /// factor in `[0, 100]`.
    pub fn with_padding_factor(
        buffer_size: usize,
        padding_factor: u32,
    ) -> Result<Self, ConfigError> {
        if buffer_size == 0 || !buffer_size.is_power_of_two() {
            return Err(ConfigError::BufferSizeNotPowerOfTwo { size: buffer_size });
        }
        if padding_factor > 100 {
            return Err(ConfigError::InvalidPaddingFactor {
                factor: padding_factor,
            });
        }

        let slots = (0..buffer_size).map(|_| AtomicU64::new(0)).collect();
        let flags = (0..buffer_size)
            .map(|_| CachePadded::new(AtomicU8::new(CAN_PUT)))
            .collect();

        Ok(Self {
            buffer_size,
            index_mask: buffer_size as i64 - 1,
            slots,
            flags,
            tail: CachePadded::new(AtomicI64::new(START_POINT)),
            cursor: CachePadded::new(AtomicI64::new(START_POINT)),
            padding_threshold: buffer_size as i64 * padding_factor as i64 / 100,
            put_lock: Mutex::new(()),
        })
    }

    /// Append one UID.
    ///
    /// Fast-fails with [`BufferError::Full`] when the buffer already holds
    /// `buffer_size - 1` unread values; it never waits for space, pushing
    /// backpressure to the caller.
    pub fn put(&self, uid: u64) -> Result<(), BufferError> {
        // The lock guards no data itself, so a poisoned guard is safe to
        // recover: the put section below cannot leave a slot half-written.
        let _guard = self
            .put_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let current_tail = self.tail.load(Ordering::Acquire);
        let current_cursor = self.cursor.load(Ordering::Acquire);

        // The first write counts from zero, not from the sentinel.
        let distance = if current_cursor == START_POINT {
            current_tail
        } else {
            current_tail - current_cursor
        };
        if distance == self.buffer_size as i64 - 1 {
            return Err(BufferError::Full { uid });
        }

        let next_index = ((current_tail + 1) & self.index_mask) as usize;
        if self.flags[next_index].load(Ordering::Acquire) != CAN_PUT {
            // Defensive double-check behind the logical-full test.
            return Err(BufferError::Full { uid });
        }

        self.slots[next_index].store(uid, Ordering::Relaxed);
        self.flags[next_index].store(CAN_TAKE, Ordering::Release);
        self.tail.fetch_add(1, Ordering::Release);
        Ok(())
    }

    /// Consume one UID without taking the put lock.
    ///
    /// Consumers claim a position by CAS-advancing the cursor only while it
    /// trails the tail, so the cursor can never pass the tail and
    /// `tail - cursor` never goes negative.
    pub fn take(&self) -> Result<u64, BufferError> {
        let mut current_cursor = self.cursor.load(Ordering::Acquire);
        let next_cursor = loop {
            let current_tail = self.tail.load(Ordering::Acquire);
            if current_tail == current_cursor {
                return Err(BufferError::Empty);
            }
            match self.cursor.compare_exchange_weak(
                current_cursor,
                current_cursor + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break current_cursor + 1,
                Err(observed) => current_cursor = observed,
            }
        };

        if next_cursor < current_cursor {
            // Cannot happen short of i64 overflow; kept as a loud invariant
            // guard because a backward cursor means lost or duplicated UIDs.
            tracing::error!(
                from = current_cursor,
                to = next_cursor,
                "ring buffer cursor moved backwards"
            );
            return Err(BufferError::CursorMovedBack {
                from: current_cursor,
                to: next_cursor,
            });
        }

        let index = (next_cursor & self.index_mask) as usize;
        if self.flags[index].load(Ordering::Acquire) != CAN_TAKE {
            // The put that published this position has not completed, or a
            // racing take consumed it: a concurrency bug either way.
            tracing::error!(index, "ring buffer slot not in can-take status");
            return Err(BufferError::SlotNotReady { index });
        }

        let uid = self.slots[index].load(Ordering::Relaxed);
        self.flags[index].store(CAN_PUT, Ordering::Release);
        Ok(uid)
    }

    /// Number of unread values currently buffered.
    pub fn remaining(&self) -> i64 {
        let tail = self.tail.load(Ordering::Acquire);
        let cursor = self.cursor.load(Ordering::Acquire);
        tail - cursor
    }

    /// Whether remaining capacity has dropped below the padding threshold,
    /// i.e. a background refill should be scheduled.
    pub fn needs_padding(&self) -> bool {
        self.remaining() < self.padding_threshold
    }

    /// Total slot count. Usable capacity is one less.
    pub const fn capacity(&self) -> usize {
        self.buffer_size
    }

    /// Remaining-capacity level that triggers an eager refill.
    pub const fn padding_threshold(&self) -> i64 {
        self.padding_threshold
    }
}
