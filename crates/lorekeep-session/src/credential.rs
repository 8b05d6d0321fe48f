//! Held credentials.

use std::fmt;

/// A bearer token issued at login or refresh.
///
/// Immutable once issued: a refresh produces a new `Credential`, it
/// never edits the old one. `Debug` redacts the token so credentials
/// can sit in structs that get logged.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credential {
    token: String,
}

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .finish()
    }
}
