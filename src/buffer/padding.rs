//! Single-flight background refill for the ring buffer.
//!
//! Whichever take caller first observes remaining capacity below the
//! padding threshold calls [`BufferPadder::schedule`]; exactly one refill
//! runs at a time, and concurrent triggers return immediately instead of
//! blocking or duplicating the work.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crate::buffer::RingBuffer;
use crate::error::UidError;

type Provider = Box<dyn Fn() -> Result<u64, UidError> + Send + Sync>;

struct PadderInner {
    buffer: Arc<RingBuffer>,
    provider: Provider,
    /// Single-flight latch: set while a refill is in flight.
    running: AtomicBool,
}

/// Refills a [`RingBuffer`] from an upstream UID provider.
///
/// Clones share the same latch and buffer; clone freely to hand a trigger
/// handle to each consumer.
#[derive(Clone)]
pub struct BufferPadder {
    inner: Arc<PadderInner>,
}

impl std::fmt::Debug for BufferPadder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPadder")
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl BufferPadder {
    /// Create a padder that feeds `buffer` from `provider`.
    pub fn new<F>(buffer: Arc<RingBuffer>, provider: F) -> Self
    where
        F: Fn() -> Result<u64, UidError> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(PadderInner {
                buffer,
                provider: Box::new(provider),
                running: AtomicBool::new(false),
            }),
        }
    }

    /// Schedule an asynchronous refill.
    ///
    /// The first caller wins the latch and spawns one worker thread; callers
    /// that find a refill already in flight return without blocking.
    pub fn schedule(&self) {
        if self
            .inner
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let inner = Arc::clone(&self.inner);
        let spawned = thread::Builder::new()
            .name("uidgen-padding".into())
            .spawn(move || {
                inner.fill();
                inner.running.store(false, Ordering::Release);
            });
        if let Err(error) = spawned {
            self.inner.running.store(false, Ordering::Release);
            tracing::error!(%error, "failed to spawn padding thread");
        }
    }

    /// Run one refill synchronously. Intended for startup pre-fill, before
    /// the buffer is shared with consumers.
    pub fn pad_to_full(&self) {
        self.inner.fill();
    }

    /// Whether a scheduled refill is currently in flight.
    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }
}

impl PadderInner {
    /// Pull from the provider and put until the buffer rejects (comfortably
    /// full) or the provider fails.
    fn fill(&self) {
        loop {
            let uid = match (self.provider)() {
                Ok(uid) => uid,
                Err(error) => {
                    tracing::warn!(%error, "padding provider failed, abandoning refill");
                    return;
                }
            };
            if self.buffer.put(uid).is_err() {
                return;
            }
        }
    }
}
