//! Connection handle provider for Lorekeep.
//!
//! The real-time channel itself (a WebSocket, a hosted pub/sub client,
//! whatever the app uses) comes from an external library. This crate
//! only **owns** the live handle and republishes it, together with its
//! liveness flag and connection id, to everyone who needs it.
//!
//! # Roles
//!
//! - [`ConnectionProvider`]: created once at startup; hands out contexts
//!   and mounts scopes
//! - [`ConnectionScope`]: the single writer, alive while a connection is
//!   provisioned; dropping it unmounts
//! - [`ConnectionContext`]: a read-only view; fails with
//!   [`ConnectionError::NotProvisioned`] outside an active scope
//!
//! ```text
//! external lib ──push──→ ConnectionScope ──watch──→ ConnectionContext (×N)
//! ```
//!
//! Reconnection policy stays with the external library: when it
//! reconnects, the app pushes the new state through the scope.

mod error;
mod provider;

pub use error::ConnectionError;
pub use provider::{ConnectionContext, ConnectionProvider, ConnectionScope, ConnectionSnapshot};

use std::fmt;

/// Identifier the real-time service assigned to the connection.
///
/// Opaque and service-defined, so it's a string rather than a number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the underlying string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}
