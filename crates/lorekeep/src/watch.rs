//! Periodic expiry watch.
//!
//! Route changes and credential replacements already run the expiry
//! check. A user who leaves the app open on one screen triggers neither,
//! so the watch re-runs the check on a fixed interval.
//!
//! The first check is delayed by a random jitter so that many clients
//! started at the same instant (a CI farm, a restored browser session)
//! don't all wake up together.

use std::sync::Weak;
use std::time::Duration;

use rand::Rng;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, trace, warn};

use crate::SessionContext;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the periodic expiry watch.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Time between checks. Default: 30 s.
    pub interval: Duration,
    /// Upper bound of the random delay before the first check.
    /// Default: 2 s. Zero disables the jitter.
    pub initial_jitter: Duration,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval: Self::DEFAULT_INTERVAL,
            initial_jitter: Duration::from_secs(2),
        }
    }
}

impl WatchConfig {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

    /// Creates a config with the given interval and the default jitter.
    pub fn every(interval: Duration) -> Self {
        Self {
            interval,
            ..Default::default()
        }
    }

    /// Replaces out-of-range values so the config is safe to use.
    ///
    /// A zero interval would make `tokio::time::interval_at` panic; it is
    /// replaced by [`Self::DEFAULT_INTERVAL`].
    pub fn validated(mut self) -> Self {
        if self.interval.is_zero() {
            warn!("expiry watch interval is zero, using default");
            self.interval = Self::DEFAULT_INTERVAL;
        }
        self
    }

    fn first_delay(&self) -> Duration {
        let max_us = u64::try_from(self.initial_jitter.as_micros()).unwrap_or(u64::MAX);
        if max_us == 0 {
            return Duration::ZERO;
        }
        Duration::from_micros(rand::rng().random_range(0..max_us))
    }
}

// ---------------------------------------------------------------------------
// ExpiryWatch
// ---------------------------------------------------------------------------

/// Handle to a running expiry watch. Dropping it stops the watch.
#[derive(Debug)]
pub struct ExpiryWatch {
    handle: JoinHandle<()>,
}

impl ExpiryWatch {
    pub(crate) fn spawn(context: Weak<SessionContext>, config: WatchConfig) -> Self {
        let config = config.validated();
        let start = Instant::now() + config.first_delay();

        let handle = tokio::spawn(async move {
            let mut ticker = time::interval_at(start, config.interval);
            // A suspended laptop shouldn't wake up to a burst of checks.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            debug!(interval = ?config.interval, "expiry watch started");
            loop {
                ticker.tick().await;
                let Some(context) = context.upgrade() else {
                    debug!("session context dropped, expiry watch exiting");
                    break;
                };
                let outcome = context.check_expiry();
                trace!(?outcome, "periodic expiry check");
            }
        });

        Self { handle }
    }

    /// Stops the watch.
    pub fn stop(self) {
        // Drop aborts.
    }

    /// Whether the watch task has ended.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ExpiryWatch {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// =========================================================================
// Tests
// =========================================================================
