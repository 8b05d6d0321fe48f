//! Session lifecycle for Lorekeep.
//!
//! This crate keeps cached data honest about who is signed in:
//!
//! 1. **Invalidation**: [`InvalidationCoordinator`] watches the
//!    [`IdentitySignal`](lorekeep_identity::IdentitySignal) and, on every
//!    identity transition, resets every registered store in declared order
//!    and re-tags it with the new subject
//! 2. **Expiry**: [`ExpiryMonitor`] checks the held credentials on
//!    navigation and credential changes, and forces a logout once all of
//!    them have expired
//!
//! Credentials are decoded through the [`ClaimDecoder`] trait; the
//! side effects of a forced logout go through [`Navigator`], [`Notifier`]
//! and [`SessionTerminator`], so the crate never touches a UI directly.
//!
//! # How it fits in the stack
//!
//! ```text
//! Context (above)  ← wires signal, registry, monitor together
//!     ↕
//! Session Layer (this crate)  ← invalidation + expiry
//!     ↕
//! Store Layer / Identity Layer (below)
//! ```

mod claims;
mod clock;
mod coordinator;
mod credential;
mod effects;
mod error;
mod expiry;

pub use claims::{ClaimDecoder, JwtClaimDecoder, TokenClaims};
pub use clock::{Clock, ManualClock, SystemClock};
pub use coordinator::{InvalidationCoordinator, InvalidationReport};
pub use credential::Credential;
pub use effects::{
    Navigator, Notification, NotificationCenter, Notifier, SessionTerminator, Severity,
};
pub use error::SessionError;
pub use expiry::{ExpiryConfig, ExpiryMonitor, ExpiryOutcome};
