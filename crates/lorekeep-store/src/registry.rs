//! The store registry: the fixed, ordered list of user-scoped stores.
//!
//! The registry is built once at startup and never changes afterwards.
//! Its iteration order is the order in which the session layer resets
//! stores on an identity transition, so that order is checked as stores
//! are registered instead of being left to whoever wrote the startup code.

use std::collections::HashSet;
use std::sync::Arc;

use crate::{StoreError, StoreHandle};

/// An immutable, ordered collection of stores.
///
/// Built with [`StoreRegistry::builder`]. Cloning is cheap (the stores
/// themselves are shared).
#[derive(Clone, Default)]
pub struct StoreRegistry {
    stores: Vec<Arc<dyn StoreHandle>>,
}

impl StoreRegistry {
    pub fn builder() -> StoreRegistryBuilder {
        StoreRegistryBuilder::default()
    }

    /// Stores in declared fan-out order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn StoreHandle>> {
        self.stores.iter()
    }

    /// Store names in declared fan-out order.
    pub fn names(&self) -> Vec<&str> {
        self.stores.iter().map(|s| s.name()).collect()
    }

    /// Looks up a store by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn StoreHandle>> {
        self.stores.iter().find(|s| s.name() == name)
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}

impl std::fmt::Debug for StoreRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreRegistry")
            .field("stores", &self.names())
            .finish()
    }
}

/// Builder that enforces the registry's ordering rules.
///
/// - Kinds must be registered in [`StoreKind`](crate::StoreKind) order
///   (equal kinds may follow each other only for kinds that allow
///   multiple stores).
/// - Store names are unique.
#[derive(Default)]
pub struct StoreRegistryBuilder {
    stores: Vec<Arc<dyn StoreHandle>>,
    names: HashSet<String>,
}

impl StoreRegistryBuilder {
    /// Appends `store` to the fan-out order.
    ///
    /// # Errors
    /// - [`StoreError::Duplicate`]: the name is taken, or the kind only
    ///   allows one store and already has it
    /// - [`StoreError::OutOfOrder`]: a store of a later kind is already
    ///   registered
    pub fn register(mut self, store: Arc<dyn StoreHandle>) -> Result<Self, StoreError> {
        let name = store.name().to_string();
        let kind = store.kind();

        if self.names.contains(&name) {
            return Err(StoreError::Duplicate(name));
        }

        if let Some(last) = self.stores.last().map(|s| s.kind()) {
            if kind < last {
                return Err(StoreError::OutOfOrder { store: name, kind });
            }
            if kind == last && !kind.allows_multiple() {
                return Err(StoreError::Duplicate(name));
            }
        }

        tracing::debug!(store = %name, %kind, "store registered");
        self.names.insert(name);
        self.stores.push(store);
        Ok(self)
    }

    pub fn build(self) -> StoreRegistry {
        StoreRegistry {
            stores: self.stores,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
