//! Error types for the identity layer.

/// Errors that can occur while building identity values.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IdentityError {
    /// A subject id must carry at least one non-whitespace character.
    /// An empty id would be indistinguishable from "nobody" in logs.
    #[error("subject id must not be empty")]
    EmptySubject,
}
