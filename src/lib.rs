//! # uidgen
//!
//! Snowflake-style 64-bit unique identifiers with a run-ahead cache.
//!
//! A UID packs `{sign, timestamp-delta, workerId, sequence}` into one 64-bit
//! word. Identifiers are:
//! - 📈 Roughly time-ordered, strictly monotonic per worker
//! - 🔒 Thread-safe to generate
//! - ⚡️ Cacheable: a bounded ring buffer pre-stages UIDs so bursty callers
//!   are not forced to wait on clock-tick boundaries
//!
//! Direct generation:
//!
//! ```
//! use uidgen::UidGenerator;
//!
//! let generator = UidGenerator::new().unwrap();
//! let uid = generator.get_uid().unwrap();
//! println!("{}", generator.parse_uid(uid).unwrap());
//! ```
//!
//! Cached generation:
//!
//! ```
//! use uidgen::{CachedUidGenerator, UidConfig};
//!
//! let cached = CachedUidGenerator::new(UidConfig::default(), 1024).unwrap();
//! let uid = cached.get_uid().unwrap();
//! # let _ = uid;
//! ```

#![forbid(unsafe_code)]

mod allocator;
mod buffer;
mod cached;
mod config;
mod error;
mod generator;

#[cfg(test)]
pub mod tests;

// Re-export main types
pub use allocator::BitAllocator;
pub use buffer::padding::BufferPadder;
pub use buffer::{RingBuffer, DEFAULT_PADDING_PERCENT};
pub use cached::CachedUidGenerator;
pub use config::{ConfigError, UidConfig, UidConfigBuilder};
pub use error::{BufferError, UidError};
pub use generator::{Clock, SystemClock, UidGenerator};
