//! Unified error type for Lorekeep.

use lorekeep_connection::ConnectionError;
use lorekeep_identity::IdentityError;
use lorekeep_session::SessionError;
use lorekeep_store::StoreError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `lorekeep` crate, you deal with this single error type
/// instead of importing errors from each layer. The `#[from]` attribute
/// on each variant lets `?` convert layer errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum LorekeepError {
    /// Malformed identity value.
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// A store or registry error.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A session-layer error.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The connection handle was misused.
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}
