//! Generator fronted by a pre-filled ring buffer.
//!
//! Consumers take from the buffer on the fast path and fall back to direct
//! generation when the buffer runs empty, trading a little staleness of the
//! buffered timestamps for reduced tail latency under bursty load.

use std::sync::Arc;
use std::time::Instant;

use crate::buffer::padding::BufferPadder;
use crate::buffer::{RingBuffer, DEFAULT_PADDING_PERCENT};
use crate::config::{ConfigError, UidConfig};
use crate::error::{BufferError, UidError};
use crate::generator::{Clock, SystemClock, UidGenerator};

/// A [`UidGenerator`] fronted by a [`RingBuffer`] of run-ahead UIDs.
#[derive(Debug)]
pub struct CachedUidGenerator<C: Clock = SystemClock> {
    generator: Arc<UidGenerator<C>>,
    buffer: Arc<RingBuffer>,
    padder: BufferPadder,
}

impl CachedUidGenerator<SystemClock> {
    /// Create a cached generator with the default configuration and padding
    /// factor. `buffer_size` must be a power of two, sized for the expected
    /// peak burst.
    pub fn new(config: UidConfig, buffer_size: usize) -> Result<Self, ConfigError> {
        Self::with_padding_factor(config, buffer_size, DEFAULT_PADDING_PERCENT)
    }

    /// Create a cached generator with an explicit padding factor.
    pub fn with_padding_factor(
        config: UidConfig,
        buffer_size: usize,
        padding_factor: u32,
    ) -> Result<Self, ConfigError> {
        Self::with_clock(config, buffer_size, padding_factor, SystemClock)
    }
}

impl<C: Clock + 'static> CachedUidGenerator<C> {
    /// Create a cached generator with a custom clock source.
    pub fn with_clock(
        config: UidConfig,
        buffer_size: usize,
        padding_factor: u32,
        clock: C,
    ) -> Result<Self, ConfigError> {
        let generator = Arc::new(UidGenerator::with_clock(config, clock)?);
        let buffer = Arc::new(RingBuffer::with_padding_factor(buffer_size, padding_factor)?);

        let provider = {
            let generator = Arc::clone(&generator);
            move || generator.get_uid()
        };
        let padder = BufferPadder::new(Arc::clone(&buffer), provider);
        padder.pad_to_full();

        Ok(Self {
            generator,
            buffer,
            padder,
        })
    }

    /// Take a pre-generated UID from the buffer, falling back to direct
    /// generation when the buffer is empty. Schedules a background refill
    /// whenever remaining capacity is observed below the padding threshold.
    pub fn get_uid(&self) -> Result<u64, UidError> {
        match self.buffer.take() {
            Ok(uid) => {
                if self.buffer.needs_padding() {
                    self.padder.schedule();
                }
                Ok(uid)
            }
            Err(BufferError::Empty) => {
                self.padder.schedule();
                self.generator.get_uid()
            }
            Err(error) => {
                // Slot-state violations are concurrency bugs: log loudly,
                // then serve the caller from the slow path anyway.
                tracing::error!(%error, "unexpected ring buffer state, falling back");
                self.padder.schedule();
                self.generator.get_uid()
            }
        }
    }

    /// Buffered fast path with a bounded slow path: the fallback generation
    /// gives up at `deadline` instead of spinning indefinitely.
    pub fn get_uid_before(&self, deadline: Instant) -> Result<u64, UidError> {
        match self.buffer.take() {
            Ok(uid) => {
                if self.buffer.needs_padding() {
                    self.padder.schedule();
                }
                Ok(uid)
            }
            Err(_) => {
                self.padder.schedule();
                self.generator.get_uid_before(deadline)
            }
        }
    }

    /// Decode a UID into a human-readable string.
    pub fn parse_uid(&self, uid: u64) -> Result<String, UidError> {
        self.generator.parse_uid(uid)
    }

    /// The wrapped generator (the slow path).
    pub fn generator(&self) -> &Arc<UidGenerator<C>> {
        &self.generator
    }

    /// The backing ring buffer.
    pub fn buffer(&self) -> &Arc<RingBuffer> {
        &self.buffer
    }

    /// The background refill executor.
    pub fn padder(&self) -> &BufferPadder {
        &self.padder
    }
}
