//! The store capability: what the session layer can do to any store.
//!
//! Stores come in many shapes (typed caches, admin tables, whatever a
//! screen needs), but invalidation only needs three operations. Putting
//! them behind one trait means the coordinator never has to ask "does
//! this store support X?" at runtime: a store without persistence just
//! keeps the default no-op `clear_persisted`.

use std::fmt;

use lorekeep_identity::SubjectId;
use serde::{Deserialize, Serialize};

use crate::StoreError;

// ---------------------------------------------------------------------------
// StoreKind
// ---------------------------------------------------------------------------

/// The data domain a store caches.
///
/// The variant order **is** the fan-out order: `Ord` is derived, so
/// `Character < Inventory < … < Admin`. The registry refuses to register
/// a store whose kind sorts before one already registered.
///
/// ```text
/// character → inventory → notes → spellbook → campaign → admin
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    Character,
    Inventory,
    Notes,
    Spellbook,
    /// The active play session / campaign.
    Campaign,
    /// Admin-scoped caches. Several may be registered.
    Admin,
}

impl StoreKind {
    /// Every kind in fan-out order.
    pub const ALL: [StoreKind; 6] = [
        StoreKind::Character,
        StoreKind::Inventory,
        StoreKind::Notes,
        StoreKind::Spellbook,
        StoreKind::Campaign,
        StoreKind::Admin,
    ];

    /// Whether more than one store of this kind may be registered.
    pub fn allows_multiple(self) -> bool {
        matches!(self, StoreKind::Admin)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StoreKind::Character => "character",
            StoreKind::Inventory => "inventory",
            StoreKind::Notes => "notes",
            StoreKind::Spellbook => "spellbook",
            StoreKind::Campaign => "campaign",
            StoreKind::Admin => "admin",
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// StoreHandle
// ---------------------------------------------------------------------------

/// Uniform capability every registered store exposes.
///
/// # Trait bounds
///
/// - `Send + Sync` → the registry is shared behind an `Arc` and stores may
///   be reached from any Tokio task.
/// - `'static` → stores live for the whole process; they're reset, never
///   destroyed.
///
/// All methods take `&self`: stores use interior mutability so the
/// registry can hold plain `Arc<dyn StoreHandle>`s.
pub trait StoreHandle: Send + Sync + 'static {
    /// A stable, human-readable name used in logs and reports.
    fn name(&self) -> &str;

    /// The data domain this store belongs to.
    fn kind(&self) -> StoreKind;

    /// Drops all cached content, returning the store to its empty state.
    fn reset(&self) -> Result<(), StoreError>;

    /// Erases the persisted snapshot, if the store has one.
    ///
    /// Stores without persistence keep this default.
    fn clear_persisted(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Stamps the store with the subject its content now belongs to
    /// (`None` for an unauthenticated session).
    fn tag_identity(&self, subject: Option<&SubjectId>);

    /// The subject the store is currently tagged with.
    fn tagged_identity(&self) -> Option<SubjectId>;
}
