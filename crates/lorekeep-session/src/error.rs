//! Error types for the session layer.

/// Errors that can occur in the session layer.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A token's claims could not be read: the token isn't three
    /// dot-separated segments, the payload isn't base64url, or the JSON
    /// doesn't parse.
    ///
    /// The expiry monitor treats this exactly like an expired token.
    #[error("token claims could not be decoded: {0}")]
    DecodeFailure(String),
}
