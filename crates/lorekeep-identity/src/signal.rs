//! The identity signal: an observable holding the current [`Identity`].
//!
//! Every part of the client that cares about "who is signed in" either
//! reads [`IdentitySignal::current`] or subscribes for changes. The login
//! and logout flows are the only writers; they call
//! [`IdentitySignal::replace`] with a whole new identity.
//!
//! # Delivery rules
//!
//! - Subscribers run **synchronously**, inside `replace`, in the order they
//!   subscribed. There is no batching: two commits produce two callbacks.
//! - Each callback receives `(previous, next)`. Filtering out non-changes
//!   is the subscriber's job.
//! - A subscription lives as long as its [`Subscription`] guard. Drop the
//!   guard and the callback is never invoked again.
//!
//! # Re-entrancy
//!
//! The subscriber list is copied out of the lock before any callback runs,
//! so a callback may read the signal, subscribe, or commit a new identity
//! without deadlocking.
//!
//! Commits are delivered strictly in commit order. A commit made while
//! another one is still being delivered (from inside a callback, or from
//! another thread) updates [`current`](IdentitySignal::current) at once
//! but is queued: every subscriber first sees the outer transition, then
//! the queued one. Such a nested `replace` returns before its own
//! subscribers have run; the dispatching call drains the queue.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::Identity;

/// A subscriber callback: `(previous, next)`.
type Callback = Arc<dyn Fn(&Identity, &Identity) + Send + Sync>;

struct SignalState {
    current: Identity,
    /// Registered callbacks in subscription order, tagged with the id
    /// their `Subscription` guard uses to remove them.
    subscribers: Vec<(u64, Callback)>,
    next_subscriber_id: u64,
    /// Committed transitions not yet delivered, oldest first.
    pending: VecDeque<(Identity, Identity)>,
    /// Set while some `replace` call is draining `pending`.
    dispatching: bool,
}

/// Process-wide observable holding the current identity.
///
/// Cloning the signal is cheap and every clone observes the same state:
/// it's an `Arc` underneath. Create one at startup and hand clones to
/// whoever needs them.
#[derive(Clone)]
pub struct IdentitySignal {
    state: Arc<Mutex<SignalState>>,
}

impl IdentitySignal {
    /// Creates a signal holding [`Identity::unauthenticated`].
    pub fn new() -> Self {
        Self::with_identity(Identity::unauthenticated())
    }

    /// Creates a signal holding `initial`.
    pub fn with_identity(initial: Identity) -> Self {
        Self {
            state: Arc::new(Mutex::new(SignalState {
                current: initial,
                subscribers: Vec::new(),
                next_subscriber_id: 1,
                pending: VecDeque::new(),
                dispatching: false,
            })),
        }
    }

    /// Returns a clone of the current identity.
    pub fn current(&self) -> Identity {
        self.lock().current.clone()
    }

    /// Commits `next` as the current identity and notifies subscribers.
    ///
    /// Returns the identity that was replaced. If another commit is being
    /// delivered right now, this one is queued behind it (see the module
    /// docs) and the call returns without waiting for delivery.
    pub fn replace(&self, next: Identity) -> Identity {
        let previous = {
            let mut state = self.lock();
            let previous = std::mem::replace(&mut state.current, next.clone());
            state.pending.push_back((previous.clone(), next.clone()));
            if state.dispatching {
                tracing::debug!(
                    previous = %previous,
                    next = %next,
                    "identity committed during delivery, queued"
                );
                return previous;
            }
            state.dispatching = true;
            previous
        };

        let _dispatch = DispatchGuard { state: &self.state };
        loop {
            let (transition, subscribers) = {
                let mut state = self.lock();
                let Some(transition) = state.pending.pop_front() else {
                    break;
                };
                let subscribers: Vec<Callback> = state
                    .subscribers
                    .iter()
                    .map(|(_, cb)| Arc::clone(cb))
                    .collect();
                (transition, subscribers)
            };
            let (from, to) = &transition;

            tracing::debug!(
                previous = %from,
                next = %to,
                subscribers = subscribers.len(),
                "identity committed"
            );

            for callback in subscribers {
                callback(from, to);
            }
        }

        previous
    }

    /// Registers `callback` and returns the guard that keeps it alive.
    ///
    /// `#[must_use]` because dropping the guard on the spot unsubscribes
    /// immediately, which is almost certainly a bug.
    #[must_use = "dropping the Subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Identity, &Identity) + Send + Sync + 'static,
    {
        let mut state = self.lock();
        let id = state.next_subscriber_id;
        state.next_subscriber_id += 1;
        state.subscribers.push((id, Arc::new(callback)));

        Subscription {
            id,
            state: Arc::downgrade(&self.state),
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    /// Locks the state, recovering from poisoning.
    ///
    /// A subscriber that panicked can't leave `SignalState` half-written
    /// (callbacks never run under the lock), so the data is still valid.
    fn lock(&self) -> MutexGuard<'_, SignalState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for IdentitySignal {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for IdentitySignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("IdentitySignal")
            .field("current", &state.current)
            .field("subscribers", &state.subscribers.len())
            .finish()
    }
}

/// Clears the dispatching flag when delivery ends, including by a
/// panicking subscriber, so later commits are not queued forever.
struct DispatchGuard<'a> {
    state: &'a Arc<Mutex<SignalState>>,
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.dispatching = false;
    }
}

/// Guard returned by [`IdentitySignal::subscribe`].
///
/// Holds a `Weak` reference so a forgotten guard doesn't keep the signal
/// alive, and removes its callback on drop.
pub struct Subscription {
    id: u64,
    state: Weak<Mutex<SignalState>>,
}

impl Subscription {
    /// Explicitly ends the subscription. Equivalent to dropping the guard.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(state) = self.state.upgrade() {
            let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
            state.subscribers.retain(|(id, _)| *id != self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

// =========================================================================
// Tests
// =========================================================================
