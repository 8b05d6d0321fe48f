//! Core identity types.
//!
//! An [`Identity`] is the client's view of "who is signed in": an optional
//! subject id plus the roles the server granted. It is a plain value:
//! cloning it is cheap, and the only way to "change" it is to build a new
//! one and hand it to the [`IdentitySignal`](crate::IdentitySignal).

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::IdentityError;

/// Role name that grants access to the admin-scoped caches.
pub const ADMIN_ROLE: &str = "admin";

// ---------------------------------------------------------------------------
// SubjectId
// ---------------------------------------------------------------------------

/// The opaque identifier of an authenticated user.
///
/// Newtype over `String` so a subject id can't be mixed up with a token,
/// a route, or any other string floating around the session layer.
///
/// `#[serde(transparent)]` stores it as a bare JSON string, which keeps
/// persisted snapshots readable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
    /// Creates a subject id, rejecting empty or whitespace-only input.
    pub fn new(id: impl Into<String>) -> Result<Self, IdentityError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(IdentityError::EmptySubject);
        }
        Ok(Self(id))
    }

    /// Returns the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SubjectId {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for SubjectId {
    type Error = IdentityError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// RoleSet
// ---------------------------------------------------------------------------

/// The set of roles granted to an identity.
///
/// The set is immutable once built: it lives behind an `Arc`, and no
/// method hands out a mutable reference. That means two role sets can
/// only differ if someone built a different one, so equality is
/// structural (`BTreeSet` comparison) and there is no way to sneak a
/// role change past the coordinator by editing a set in place.
///
/// `BTreeSet` keeps roles sorted, so `Debug` output and serialized
/// snapshots are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet(Arc<BTreeSet<String>>);

impl RoleSet {
    /// Builds a role set from any iterator of role names.
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(Arc::new(roles.into_iter().map(Into::into).collect()))
    }

    /// An empty role set (what an unauthenticated identity carries).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns `true` if `role` is in the set.
    pub fn contains(&self, role: &str) -> bool {
        self.0.contains(role)
    }

    /// Returns `true` if the set grants [`ADMIN_ROLE`].
    pub fn is_admin(&self) -> bool {
        self.contains(ADMIN_ROLE)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates role names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for RoleSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Who is signed in, as far as the client knows.
///
/// `subject: None` means unauthenticated. The role set of an
/// unauthenticated identity is always empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    subject: Option<SubjectId>,
    roles: RoleSet,
}

impl Identity {
    /// The identity every process starts with: nobody signed in.
    pub fn unauthenticated() -> Self {
        Self::default()
    }

    /// An authenticated identity for `subject` with the given roles.
    pub fn authenticated(subject: SubjectId, roles: RoleSet) -> Self {
        Self {
            subject: Some(subject),
            roles,
        }
    }

    /// The subject id, or `None` when unauthenticated.
    pub fn subject(&self) -> Option<&SubjectId> {
        self.subject.as_ref()
    }

    pub fn roles(&self) -> &RoleSet {
        &self.roles
    }

    pub fn is_authenticated(&self) -> bool {
        self.subject.is_some()
    }

    /// Returns `true` if moving from `previous` to `self` is an identity
    /// transition: the subject changed, or the role set did.
    ///
    /// A re-render that hands back the same subject and the same roles
    /// is not a transition.
    pub fn is_transition_from(&self, previous: &Identity) -> bool {
        self.subject != previous.subject || self.roles != previous.roles
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subject {
            Some(subject) => write!(f, "{subject}"),
            None => f.write_str("<anonymous>"),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn subject(id: &str) -> SubjectId {
        SubjectId::new(id).expect("valid subject id")
    }

    // =====================================================================
    // SubjectId
    // =====================================================================

    #[test]
    fn test_subject_id_new_rejects_empty() {
        assert_eq!(SubjectId::new(""), Err(IdentityError::EmptySubject));
        assert_eq!(SubjectId::new("   "), Err(IdentityError::EmptySubject));
    }

    #[test]
    fn test_subject_id_display_is_raw_id() {
        assert_eq!(subject("u1").to_string(), "u1");
    }

    #[test]
    fn test_subject_id_serializes_as_bare_string() {
        let json = serde_json::to_string(&subject("u1")).unwrap();
        assert_eq!(json, "\"u1\"");
    }

    // =====================================================================
    // RoleSet
    // =====================================================================

    #[test]
    fn test_role_set_equality_is_structural() {
        // Two separately built sets with the same roles are equal, even
        // though they live in different allocations.
        let a = RoleSet::new(["player", "gm"]);
        let b = RoleSet::new(["gm", "player"]);
        assert_eq!(a, b);
        assert_ne!(a, RoleSet::new(["player"]));
    }

    #[test]
    fn test_role_set_is_admin() {
        assert!(RoleSet::new([ADMIN_ROLE]).is_admin());
        assert!(!RoleSet::new(["player"]).is_admin());
        assert!(!RoleSet::empty().is_admin());
    }

    #[test]
    fn test_role_set_iter_is_sorted() {
        let roles: RoleSet = ["player", "admin", "gm"].into_iter().collect();
        let names: Vec<&str> = roles.iter().collect();
        assert_eq!(names, vec!["admin", "gm", "player"]);
    }

    // =====================================================================
    // Identity
    // =====================================================================

    #[test]
    fn test_unauthenticated_has_no_subject_and_no_roles() {
        let id = Identity::unauthenticated();
        assert!(!id.is_authenticated());
        assert!(id.subject().is_none());
        assert!(id.roles().is_empty());
        assert_eq!(id.to_string(), "<anonymous>");
    }

    #[test]
    fn test_is_transition_from_different_subject() {
        let u1 = Identity::authenticated(subject("u1"), RoleSet::empty());
        let u2 = Identity::authenticated(subject("u2"), RoleSet::empty());
        assert!(u2.is_transition_from(&u1));
    }

    #[test]
    fn test_is_transition_from_same_subject_same_roles_is_false() {
        let roles = RoleSet::new(["player"]);
        let a = Identity::authenticated(subject("u1"), roles.clone());
        let b = Identity::authenticated(subject("u1"), roles);
        assert!(!b.is_transition_from(&a));
    }

    #[test]
    fn test_is_transition_from_role_change() {
        // Same user, promoted to admin: the admin caches must be
        // rebuilt, so this counts as a transition.
        let a = Identity::authenticated(subject("u1"), RoleSet::new(["player"]));
        let b = Identity::authenticated(
            subject("u1"),
            RoleSet::new(["player", ADMIN_ROLE]),
        );
        assert!(b.is_transition_from(&a));
    }

    #[test]
    fn test_is_transition_from_logout() {
        let a = Identity::authenticated(subject("u1"), RoleSet::empty());
        assert!(Identity::unauthenticated().is_transition_from(&a));
    }
}
