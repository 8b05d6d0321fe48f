//! # Lorekeep
//!
//! Session-lifecycle core for the Lorekeep campaign companion client.
//!
//! Lorekeep keeps three things consistent with whoever is signed in:
//!
//! - **User-scoped caches.** Every identity transition (login, logout,
//!   switching accounts, a role change) resets all registered stores in
//!   a fixed order before any screen reads them again.
//! - **The real-time connection handle.** One provider owns it and
//!   republishes it to every consumer.
//! - **Credential expiry.** Once every held token has expired, the user
//!   is logged out, notified once, and sent to the login screen.
//!
//! The pieces live in their own crates and are re-exported here:
//!
//! | Crate | Contents |
//! |-------|----------|
//! | `lorekeep-identity` | [`Identity`], [`IdentitySignal`] |
//! | `lorekeep-store` | [`StoreHandle`], [`MemoryStore`], [`StoreRegistry`] |
//! | `lorekeep-session` | [`InvalidationCoordinator`], [`ExpiryMonitor`] |
//! | `lorekeep-connection` | [`ConnectionProvider`], [`ConnectionContext`] |
//!
//! [`SessionContext`] wires them together.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lorekeep::prelude::*;
//!
//! # fn main() -> Result<(), LorekeepError> {
//! lorekeep::telemetry::init_tracing();
//!
//! let ctx = SessionContext::builder()
//!     .navigator(|path: &str| println!("go to {path}"))
//!     .build()?;
//!
//! let me = Identity::authenticated(SubjectId::new("u1")?, RoleSet::new(["player"]));
//! ctx.login(me, Some(Credential::new("<jwt>")), None);
//! ctx.on_route_change("/campaigns");
//! # Ok(())
//! # }
//! ```

mod context;
mod credentials;
mod error;
mod stores;
pub mod telemetry;
mod watch;

pub use context::{SessionContext, SessionContextBuilder};
pub use credentials::{CredentialHolder, HeldCredentials};
pub use error::LorekeepError;
pub use stores::{DomainCache, StandardStores, StoreConfig};
pub use watch::{ExpiryWatch, WatchConfig};

pub use lorekeep_connection::{
    ConnectionContext, ConnectionError, ConnectionId, ConnectionProvider, ConnectionScope,
    ConnectionSnapshot,
};
pub use lorekeep_identity::{
    ADMIN_ROLE, Identity, IdentityError, IdentitySignal, RoleSet, SubjectId, Subscription,
};
pub use lorekeep_session::{
    ClaimDecoder, Clock, Credential, ExpiryConfig, ExpiryMonitor, ExpiryOutcome,
    InvalidationCoordinator, InvalidationReport, JwtClaimDecoder, ManualClock, Navigator,
    Notification, NotificationCenter, Notifier, SessionError, SessionTerminator, Severity,
    SystemClock, TokenClaims,
};
pub use lorekeep_store::{
    FileSnapshot, MemoryStore, NoSnapshot, SnapshotStore, StoreError, StoreHandle, StoreKind,
    StoreRegistry, StoreRegistryBuilder,
};

/// Convenience re-exports for applications.
///
/// ```rust
/// use lorekeep::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        ConnectionContext, ConnectionProvider, Credential, ExpiryConfig, ExpiryOutcome,
        Identity, LorekeepError, RoleSet, SessionContext, StoreConfig, SubjectId, WatchConfig,
    };
}
