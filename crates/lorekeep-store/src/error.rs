//! Error types for the store layer.

use lorekeep_identity::SubjectId;

use crate::StoreKind;

/// Errors that can occur while operating on stores.
///
/// The session layer treats most of these as best-effort: a failing
/// reset is logged and skipped, a failing snapshot erase is swallowed.
/// Only registry construction errors and stale-identity commits are
/// meant to reach the caller.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A store could not reset its in-memory cache.
    #[error("store {store} failed to reset: {reason}")]
    ResetFailed { store: String, reason: String },

    /// A store could not erase its persisted snapshot.
    #[error("store {store} failed to clear persisted snapshot: {source}")]
    PersistClearFailed {
        store: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading or writing a snapshot failed.
    #[error("snapshot i/o failed: {0}")]
    Snapshot(#[from] std::io::Error),

    /// A snapshot could not be encoded or decoded.
    #[error("snapshot encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),

    /// Data fetched for one subject arrived after the store was re-tagged
    /// for another. Committing it would leak one user's data into
    /// another user's session, so the write is refused.
    #[error(
        "store {store} is tagged for {current:?}, refusing data fetched for {expected}"
    )]
    StaleIdentity {
        store: String,
        expected: SubjectId,
        current: Option<SubjectId>,
    },

    /// A store was registered after a store of a later kind, which would
    /// break the declared fan-out order.
    #[error("store {store} ({kind}) registered out of declared order")]
    OutOfOrder { store: String, kind: StoreKind },

    /// A store with this name (or a second store of a single-instance
    /// kind) is already registered.
    #[error("store {0} is already registered")]
    Duplicate(String),
}
