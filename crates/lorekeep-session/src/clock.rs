//! Wall-clock access for expiry checks.
//!
//! Token expiry is an absolute Unix timestamp, so unlike most timing in
//! the workspace this needs the wall clock, not `Instant`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the current Unix time, in seconds.
pub trait Clock: Send + Sync + 'static {
    fn now_epoch_secs(&self) -> u64;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_secs(&self) -> u64 {
        // A clock set before 1970 reads as the epoch, which makes every
        // real token look valid for a while rather than panicking.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// A clock that only moves when told to. For tests and demos.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(now_epoch_secs: u64) -> Self {
        Self {
            now: AtomicU64::new(now_epoch_secs),
        }
    }

    pub fn set(&self, now_epoch_secs: u64) {
        self.now.store(now_epoch_secs, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_epoch_secs(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}
