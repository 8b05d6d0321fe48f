//! The invalidation coordinator: keeps every store consistent with the
//! current identity.
//!
//! When the identity changes (login, logout, switching accounts, a role
//! change), everything the stores cached belongs to the *previous*
//! identity. The coordinator wipes it before anyone reads it:
//!
//! ```text
//! IdentitySignal::replace(next)
//!     │
//!     ▼
//! on_identity_change(previous, next)
//!     │  not a transition? ──→ nothing happens
//!     ▼
//! for each store, in registry order:
//!     reset() ──(fails)──→ log, skip this store
//!     clear_persisted() ──(fails)──→ log, carry on
//!     tag_identity(next.subject)
//! ```
//!
//! # Guarantees
//!
//! - At most one fan-out per observed transition.
//! - Stores are visited in the registry's declared order, so a reader of
//!   a later store never sees it reset before an earlier one. There is no
//!   cross-store atomicity beyond that ordering.
//! - One store failing never stops the others.
//!
//! # Refetch hazard
//!
//! The fan-out is synchronous; refetches a screen triggers afterwards are
//! not. A refetch for the old identity can finish after the transition,
//! so async writers should go through
//! [`MemoryStore::commit_for`](lorekeep_store::MemoryStore::commit_for).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lorekeep_identity::{Identity, IdentitySignal, SubjectId, Subscription};
use lorekeep_store::StoreRegistry;

/// What happened during one fan-out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvalidationReport {
    /// Subject before the transition.
    pub previous: Option<SubjectId>,
    /// Subject after the transition; every successfully reset store is
    /// now tagged with it.
    pub next: Option<SubjectId>,
    /// Stores that were reset and re-tagged, in fan-out order.
    pub reset: Vec<String>,
    /// Stores whose reset failed and were skipped.
    pub failed: Vec<String>,
}

impl InvalidationReport {
    /// `true` if no store failed to reset.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Fans out store resets on identity transitions.
///
/// Wrap it in an `Arc` and [`attach`](Self::attach) it to the
/// process's [`IdentitySignal`]. The coordinator keeps its own
/// registration state, so attaching twice is harmless.
pub struct InvalidationCoordinator {
    registry: StoreRegistry,
    /// The live subscription, once attached.
    attachment: Mutex<Option<Subscription>>,
    last_report: Mutex<Option<InvalidationReport>>,
    transitions: AtomicU64,
}

impl InvalidationCoordinator {
    pub fn new(registry: StoreRegistry) -> Self {
        Self {
            registry,
            attachment: Mutex::new(None),
            last_report: Mutex::new(None),
            transitions: AtomicU64::new(0),
        }
    }

    pub fn registry(&self) -> &StoreRegistry {
        &self.registry
    }

    /// Subscribes to `signal`. Returns `false` if already attached.
    ///
    /// The subscription holds only a `Weak` reference to the coordinator,
    /// so the signal never keeps it alive on its own.
    pub fn attach(self: &Arc<Self>, signal: &IdentitySignal) -> bool {
        let mut attachment = lock(&self.attachment);
        if attachment.is_some() {
            tracing::debug!("invalidation coordinator already attached");
            return false;
        }

        let coordinator = Arc::downgrade(self);
        let subscription = signal.subscribe(move |previous, next| {
            if let Some(coordinator) = coordinator.upgrade() {
                coordinator.on_identity_change(previous, next);
            }
        });
        *attachment = Some(subscription);

        tracing::info!(stores = self.registry.len(), "invalidation coordinator attached");
        true
    }

    /// Drops the subscription. Returns `false` if it wasn't attached.
    pub fn detach(&self) -> bool {
        lock(&self.attachment).take().is_some()
    }

    pub fn is_attached(&self) -> bool {
        lock(&self.attachment).is_some()
    }

    /// Handles one committed identity change.
    ///
    /// Returns `None` when `next` isn't a transition from `previous`
    /// (same subject, same roles), otherwise the report of the fan-out.
    pub fn on_identity_change(
        &self,
        previous: &Identity,
        next: &Identity,
    ) -> Option<InvalidationReport> {
        if !next.is_transition_from(previous) {
            tracing::debug!(subject = %next, "identity unchanged, stores kept");
            return None;
        }

        let subject = next.subject();
        let mut report = InvalidationReport {
            previous: previous.subject().cloned(),
            next: subject.cloned(),
            ..InvalidationReport::default()
        };

        for store in self.registry.iter() {
            let name = store.name();

            if let Err(e) = store.reset() {
                tracing::error!(store = %name, error = %e, "store reset failed, skipping");
                report.failed.push(name.to_string());
                continue;
            }

            if let Err(e) = store.clear_persisted() {
                tracing::warn!(store = %name, error = %e, "could not clear persisted snapshot");
            }

            store.tag_identity(subject);
            report.reset.push(name.to_string());
        }

        self.transitions.fetch_add(1, Ordering::Relaxed);
        tracing::info!(
            previous = %previous,
            next = %next,
            reset = report.reset.len(),
            failed = report.failed.len(),
            "stores invalidated for identity transition"
        );

        *lock(&self.last_report) = Some(report.clone());
        Some(report)
    }

    /// The report of the most recent fan-out.
    pub fn last_report(&self) -> Option<InvalidationReport> {
        lock(&self.last_report).clone()
    }

    /// How many transitions have been handled.
    pub fn transitions(&self) -> u64 {
        self.transitions.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for InvalidationCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvalidationCoordinator")
            .field("registry", &self.registry)
            .field("attached", &self.is_attached())
            .field("transitions", &self.transitions())
            .finish()
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

// =========================================================================
// Tests
// =========================================================================
