/// Errors that can occur when reading or providing the connection handle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    /// The handle was read while no provider scope is mounted: before
    /// the first mount, or after the scope was dropped. This is a usage
    /// error in the caller, not a network condition.
    #[error("no connection is provisioned in this scope")]
    NotProvisioned,

    /// A second scope was mounted while one is still live. The provider
    /// has exactly one writer.
    #[error("a connection scope is already mounted")]
    AlreadyMounted,

    /// The provider and every scope were dropped; no further values will
    /// ever be pushed.
    #[error("connection provider closed")]
    ProviderClosed,
}
