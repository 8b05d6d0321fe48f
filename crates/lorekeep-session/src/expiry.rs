//! The expiry monitor: forces a logout once every held credential has
//! expired.
//!
//! The client holds up to two credentials (a primary token and a
//! fallback). As long as at least one of them is still good, the session
//! stays up. Once all of them are dead the monitor:
//!
//! 1. shows one "session expired" notification (fixed id, so repeats
//!    don't stack),
//! 2. terminates the session (clears credentials and identity),
//! 3. navigates to the login route.
//!
//! # When it runs
//!
//! There's no timer in here. The monitor is evaluated on every route
//! change and whenever a credential is replaced; a periodic watch can be
//! layered on top by whoever owns the credentials.
//!
//! # Fail-closed
//!
//! A token whose claims can't be decoded, or that carries no `exp`, is
//! treated as expired. When in doubt the user gets logged out.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::{
    ClaimDecoder, Clock, Credential, JwtClaimDecoder, Navigator, Notification, Notifier,
    SessionTerminator, Severity, SystemClock,
};

// ---------------------------------------------------------------------------
// ExpiryConfig
// ---------------------------------------------------------------------------

/// Configuration for the expiry monitor.
#[derive(Debug, Clone)]
pub struct ExpiryConfig {
    /// Where a forced logout sends the user.
    pub login_route: String,

    /// Routes on which the monitor never acts. The registration screen
    /// is reached without credentials (or with leftover dead ones), and
    /// bouncing the user off it would make signing up impossible.
    pub exempt_routes: Vec<String>,

    /// Grace window added to each token's `exp`. Zero by default: a token
    /// is expired the second its `exp` is reached.
    pub leeway: Duration,

    /// Deduplication id of the expiry notification.
    pub notification_id: String,
    pub notification_title: String,
    pub notification_message: String,
}

impl Default for ExpiryConfig {
    fn default() -> Self {
        Self {
            login_route: "/login".into(),
            exempt_routes: vec!["/register".into()],
            leeway: Duration::ZERO,
            notification_id: "session-expired".into(),
            notification_title: "Session expired".into(),
            notification_message: "Your session has expired. Please sign in again.".into(),
        }
    }
}

impl ExpiryConfig {
    pub fn is_exempt(&self, route: &str) -> bool {
        self.exempt_routes.iter().any(|r| r == route)
    }

    fn notification(&self) -> Notification {
        Notification {
            id: self.notification_id.clone(),
            title: self.notification_title.clone(),
            message: self.notification_message.clone(),
            severity: Severity::Warning,
        }
    }
}

// ---------------------------------------------------------------------------
// ExpiryOutcome
// ---------------------------------------------------------------------------

/// What a single evaluation decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryOutcome {
    /// The current route is exempt; nothing was checked.
    Exempt,
    /// No credential is held; nothing to expire.
    NoCredentials,
    /// At least one held credential is still valid.
    Valid,
    /// Every held credential had expired; the logout path ran.
    LoggedOut,
    /// Every held credential had expired, but the logout path already
    /// ran for exactly these credentials.
    AlreadyHandled,
}

// ---------------------------------------------------------------------------
// ExpiryMonitor
// ---------------------------------------------------------------------------

/// Evaluates held credentials and forces logout when all have expired.
pub struct ExpiryMonitor {
    config: ExpiryConfig,
    decoder: Box<dyn ClaimDecoder>,
    clock: Arc<dyn Clock>,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
    terminator: Arc<dyn SessionTerminator>,
    /// Tokens that last triggered a logout. Cleared once the monitor sees
    /// a valid or empty credential set again.
    handled: Mutex<Option<Vec<String>>>,
}

impl ExpiryMonitor {
    /// Creates a monitor using [`JwtClaimDecoder`] and [`SystemClock`].
    pub fn new(
        config: ExpiryConfig,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn Notifier>,
        terminator: Arc<dyn SessionTerminator>,
    ) -> Self {
        Self {
            config,
            decoder: Box::new(JwtClaimDecoder),
            clock: Arc::new(SystemClock),
            navigator,
            notifier,
            terminator,
            handled: Mutex::new(None),
        }
    }

    /// Replaces the claim decoder.
    pub fn with_decoder(mut self, decoder: impl ClaimDecoder) -> Self {
        self.decoder = Box::new(decoder);
        self
    }

    /// Replaces the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &ExpiryConfig {
        &self.config
    }

    /// Forgets which credentials last triggered a logout.
    ///
    /// Call whenever a new set of credentials is committed (login,
    /// refresh). Otherwise re-committing the very tokens that were just
    /// logged out would read as [`ExpiryOutcome::AlreadyHandled`] and the
    /// session would stay up on dead credentials.
    pub fn rearm(&self) {
        if self.lock_handled().take().is_some() {
            tracing::debug!("expiry latch rearmed");
        }
    }

    /// Checks the held credentials against the clock.
    ///
    /// Call on every route change and whenever either credential is
    /// replaced. See the module docs for the full decision table.
    pub fn evaluate(
        &self,
        primary: Option<&Credential>,
        fallback: Option<&Credential>,
        current_route: &str,
    ) -> ExpiryOutcome {
        if self.config.is_exempt(current_route) {
            tracing::trace!(route = current_route, "expiry check skipped on exempt route");
            return ExpiryOutcome::Exempt;
        }

        let held: Vec<&Credential> = [primary, fallback].into_iter().flatten().collect();
        if held.is_empty() {
            *self.lock_handled() = None;
            return ExpiryOutcome::NoCredentials;
        }

        let now = self.clock.now_epoch_secs();
        if !held.iter().all(|c| self.is_expired(c, now)) {
            *self.lock_handled() = None;
            return ExpiryOutcome::Valid;
        }

        let fingerprint: Vec<String> = held.iter().map(|c| c.token().to_string()).collect();
        {
            let mut handled = self.lock_handled();
            if handled.as_ref() == Some(&fingerprint) {
                tracing::debug!("expired credentials already handled");
                return ExpiryOutcome::AlreadyHandled;
            }
            *handled = Some(fingerprint);
        }

        // The lock is released before running effects: terminating the
        // session fans out to subscribers that may call back in here.
        tracing::info!(
            route = current_route,
            held = held.len(),
            "all credentials expired, forcing logout"
        );
        self.notifier.notify(self.config.notification());
        self.terminator.terminate();
        self.navigator.navigate(&self.config.login_route);

        ExpiryOutcome::LoggedOut
    }

    /// Whether `credential` is expired at `now`.
    fn is_expired(&self, credential: &Credential, now: u64) -> bool {
        let claims = match self.decoder.decode(credential.token()) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::debug!(error = %e, "undecodable credential treated as expired");
                return true;
            }
        };
        let Some(exp) = claims.exp else {
            tracing::debug!("credential without exp claim treated as expired");
            return true;
        };
        now as f64 >= exp + self.config.leeway.as_secs_f64()
    }

    fn lock_handled(&self) -> MutexGuard<'_, Option<Vec<String>>> {
        self.handled.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ExpiryMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpiryMonitor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// =========================================================================
// Tests
// =========================================================================
