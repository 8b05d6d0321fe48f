//! Holder for the primary and fallback credentials.

use std::sync::{Mutex, MutexGuard, PoisonError};

use lorekeep_session::Credential;

/// The credentials held at one moment.
#[derive(Debug, Clone, Default)]
pub struct HeldCredentials {
    pub primary: Option<Credential>,
    pub fallback: Option<Credential>,
}

impl HeldCredentials {
    pub fn new(primary: Option<Credential>, fallback: Option<Credential>) -> Self {
        Self { primary, fallback }
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_none() && self.fallback.is_none()
    }
}

/// Thread-safe slot for the held credentials.
///
/// Both credentials are swapped together so a reader never sees a new
/// primary next to the previous session's fallback.
#[derive(Debug, Default)]
pub struct CredentialHolder {
    held: Mutex<HeldCredentials>,
}

impl CredentialHolder {
    pub fn new(initial: HeldCredentials) -> Self {
        Self {
            held: Mutex::new(initial),
        }
    }

    /// Returns a copy of the held credentials.
    pub fn get(&self) -> HeldCredentials {
        self.lock().clone()
    }

    /// Replaces both credentials, returning the previous pair.
    pub fn replace(&self, next: HeldCredentials) -> HeldCredentials {
        std::mem::replace(&mut *self.lock(), next)
    }

    /// Drops both credentials.
    pub fn clear(&self) -> HeldCredentials {
        self.replace(HeldCredentials::default())
    }

    fn lock(&self) -> MutexGuard<'_, HeldCredentials> {
        self.held.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(primary: &str, fallback: &str) -> HeldCredentials {
        HeldCredentials::new(
            Some(Credential::new(primary)),
            Some(Credential::new(fallback)),
        )
    }

    #[test]
    fn test_holder_default_is_empty() {
        assert!(CredentialHolder::default().get().is_empty());
    }

    #[test]
    fn test_replace_returns_previous_pair() {
        let holder = CredentialHolder::new(pair("a", "b"));

        let previous = holder.replace(pair("c", "d"));

        assert_eq!(previous.primary.as_ref().map(Credential::token), Some("a"));
        assert_eq!(holder.get().fallback.as_ref().map(Credential::token), Some("d"));
    }

    #[test]
    fn test_clear_drops_both() {
        let holder = CredentialHolder::new(pair("a", "b"));

        holder.clear();

        assert!(holder.get().is_empty());
    }
}
