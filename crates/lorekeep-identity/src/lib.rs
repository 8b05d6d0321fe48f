//! Identity layer for Lorekeep.
//!
//! This crate answers one question for the rest of the client: **who is
//! signed in right now?**
//!
//! - **Types** ([`Identity`], [`SubjectId`], [`RoleSet`]): the value that
//!   describes the authenticated user. An identity is replaced wholesale on
//!   login/logout, never edited in place.
//! - **Signal** ([`IdentitySignal`]): the observable that holds the current
//!   identity and tells subscribers when it changes.
//!
//! # How it fits in the stack
//!
//! ```text
//! Session Layer (above)  ← invalidates caches when the identity changes
//!     ↕
//! Identity Layer (this crate)  ← holds the current identity, notifies
//! ```

// ---------------------------------------------------------------------------
// Module declarations
// ---------------------------------------------------------------------------

mod error;
mod signal;
mod types;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use error::IdentityError;
pub use signal::{IdentitySignal, Subscription};
pub use types::{Identity, RoleSet, SubjectId, ADMIN_ROLE};
