//! Side-effect seams for the forced-logout path.
//!
//! When the expiry monitor decides the session is over, three things
//! happen outside this crate: the user is told, the session state is
//! cleared, and the app moves to the login screen. Each of those is a
//! trait here so the monitor stays testable and UI-agnostic.
//!
//! Closures implement [`Navigator`] and [`SessionTerminator`] directly,
//! which keeps wiring code short:
//!
//! ```rust
//! use lorekeep_session::{Navigator, SessionTerminator};
//!
//! let nav = |path: &str| println!("go to {path}");
//! nav.navigate("/login");
//!
//! let logout = || println!("bye");
//! logout.terminate();
//! ```

use std::sync::{Mutex, MutexGuard, PoisonError};

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

/// Moves the app to another route.
pub trait Navigator: Send + Sync + 'static {
    fn navigate(&self, path: &str);
}

impl<F> Navigator for F
where
    F: Fn(&str) + Send + Sync + 'static,
{
    fn navigate(&self, path: &str) {
        self(path)
    }
}

// ---------------------------------------------------------------------------
// Session termination
// ---------------------------------------------------------------------------

/// Clears credentials and identity (the logout action).
pub trait SessionTerminator: Send + Sync + 'static {
    fn terminate(&self);
}

impl<F> SessionTerminator for F
where
    F: Fn() + Send + Sync + 'static,
{
    fn terminate(&self) {
        self()
    }
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A user-visible message.
///
/// `id` is the deduplication key: showing a notification whose id is
/// already on screen does nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub message: String,
    pub severity: Severity,
}

/// Shows notifications to the user.
pub trait Notifier: Send + Sync + 'static {
    fn notify(&self, notification: Notification);
}

/// An in-process notification tray that suppresses duplicate ids.
///
/// A notification stays active until [`dismiss`](Self::dismiss)ed. While
/// it's active, further notifications with the same id are dropped, so
/// repeated expiry checks can't stack the same warning.
#[derive(Debug, Default)]
pub struct NotificationCenter {
    active: Mutex<Vec<Notification>>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Active notifications, oldest first.
    pub fn active(&self) -> Vec<Notification> {
        self.lock().clone()
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.lock().iter().any(|n| n.id == id)
    }

    /// Removes the notification with `id`. Returns `true` if one was active.
    pub fn dismiss(&self, id: &str) -> bool {
        let mut active = self.lock();
        let before = active.len();
        active.retain(|n| n.id != id);
        active.len() != before
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Notification>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Notifier for NotificationCenter {
    fn notify(&self, notification: Notification) {
        let mut active = self.lock();
        if active.iter().any(|n| n.id == notification.id) {
            tracing::debug!(id = %notification.id, "duplicate notification suppressed");
            return;
        }
        tracing::info!(
            id = %notification.id,
            severity = ?notification.severity,
            title = %notification.title,
            "notification shown"
        );
        active.push(notification);
    }
}
