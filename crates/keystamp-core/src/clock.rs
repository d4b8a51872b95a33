//! Wall-clock abstraction
//!
//! Signature timestamps and token expiry are both expressed in epoch
//! milliseconds. Components take a [`SharedClock`] so tests can pin time with
//! [`ManualClock`] instead of sleeping.

use std::fmt::Debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

/// Source of the current time in epoch milliseconds
pub trait Clock: Send + Sync + Debug {
    /// Milliseconds since the Unix epoch
    fn now_millis(&self) -> i64;
}

/// Reference-counted clock handle passed into signers, verifiers and codecs
pub type SharedClock = Arc<dyn Clock>;

/// Clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Create a shared handle to the system clock
    pub fn shared() -> SharedClock {
        Arc::new(Self)
    }
}

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Manually driven clock for deterministic tests
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    /// Create a clock frozen at `millis`
    pub fn new(millis: i64) -> Self {
        Self {
            millis: AtomicI64::new(millis),
        }
    }

    /// Create a clock frozen at the current system time
    pub fn starting_now() -> Self {
        Self::new(SystemClock.now_millis())
    }

    /// Jump to an absolute time
    pub fn set(&self, millis: i64) {
        self.millis.store(millis, Ordering::SeqCst);
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        let delta = i64::try_from(by.as_millis()).unwrap_or(i64::MAX);
        self.millis.fetch_add(delta, Ordering::SeqCst);
    }

    /// Move the clock backward
    pub fn rewind(&self, by: Duration) {
        let delta = i64::try_from(by.as_millis()).unwrap_or(i64::MAX);
        self.millis.fetch_sub(delta, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.millis.load(Ordering::SeqCst)
    }
}
