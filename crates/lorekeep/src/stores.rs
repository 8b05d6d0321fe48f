//! The standard set of user-scoped stores.
//!
//! Six caches ship with the client, one per data domain. Screens read and
//! write them directly; the session layer only ever resets them.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use lorekeep_identity::SubjectId;
use lorekeep_store::{
    FileSnapshot, MemoryStore, StoreError, StoreHandle, StoreKind, StoreRegistry,
};

/// Cached records of one domain, keyed by record id.
///
/// Records stay as raw JSON: the session layer never looks inside them,
/// and the screens that do own their own types.
pub type DomainCache = BTreeMap<String, serde_json::Value>;

/// Store configuration.
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    /// Directory for JSON snapshots. `None` keeps every store in memory
    /// only.
    pub persist_dir: Option<PathBuf>,
}

/// Handles to the six standard stores.
#[derive(Debug, Clone)]
pub struct StandardStores {
    pub character: Arc<MemoryStore<DomainCache>>,
    pub inventory: Arc<MemoryStore<DomainCache>>,
    pub notes: Arc<MemoryStore<DomainCache>>,
    pub spellbook: Arc<MemoryStore<DomainCache>>,
    pub campaign: Arc<MemoryStore<DomainCache>>,
    pub admin: Arc<MemoryStore<DomainCache>>,
}

impl StandardStores {
    pub fn new(config: &StoreConfig) -> Self {
        let make = |kind: StoreKind| -> Arc<MemoryStore<DomainCache>> {
            let name = kind.as_str();
            let store = match &config.persist_dir {
                Some(dir) => {
                    MemoryStore::with_snapshot(name, kind, FileSnapshot::in_dir(dir, name))
                }
                None => MemoryStore::new(name, kind),
            };
            Arc::new(store)
        };

        Self {
            character: make(StoreKind::Character),
            inventory: make(StoreKind::Inventory),
            notes: make(StoreKind::Notes),
            spellbook: make(StoreKind::Spellbook),
            campaign: make(StoreKind::Campaign),
            admin: make(StoreKind::Admin),
        }
    }

    /// All six, in fan-out order.
    pub fn all(&self) -> [&Arc<MemoryStore<DomainCache>>; 6] {
        [
            &self.character,
            &self.inventory,
            &self.notes,
            &self.spellbook,
            &self.campaign,
            &self.admin,
        ]
    }

    /// Builds the registry: the six standard stores, then `extra_admin`
    /// in the given order.
    pub fn registry(
        &self,
        extra_admin: &[Arc<dyn StoreHandle>],
    ) -> Result<StoreRegistry, StoreError> {
        let mut builder = StoreRegistry::builder();
        for store in self.all() {
            builder = builder.register(Arc::clone(store) as Arc<dyn StoreHandle>)?;
        }
        for store in extra_admin {
            builder = builder.register(Arc::clone(store))?;
        }
        Ok(builder.build())
    }

    /// Rehydrates every store from its snapshot, for `subject`.
    ///
    /// Best-effort: a store whose snapshot can't be read starts empty.
    /// Returns the names of the stores that were restored.
    pub fn restore(&self, subject: Option<&SubjectId>) -> Vec<String> {
        let mut restored = Vec::new();
        for store in self.all() {
            store.tag_identity(subject);
            match store.restore(subject) {
                Ok(true) => restored.push(store.name().to_string()),
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(store = %store.name(), error = %e, "snapshot restore failed");
                }
            }
        }
        restored
    }
}
