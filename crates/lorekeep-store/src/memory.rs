//! `MemoryStore`: a typed in-memory cache that knows whose data it holds.
//!
//! Each store keeps two things side by side:
//! - the cached value `T` (whatever the screen needs: a list of
//!   characters, a spellbook, …)
//! - the subject the value belongs to
//!
//! Keeping the subject next to the data is what lets the store refuse a
//! late refetch for a user who has already signed out (see
//! [`MemoryStore::commit_for`]).

use std::sync::{Mutex, MutexGuard, PoisonError};

use lorekeep_identity::SubjectId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{NoSnapshot, SnapshotStore, StoreError, StoreHandle, StoreKind};

/// What a store holds, and what gets written to its snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Cached<T> {
    subject: Option<SubjectId>,
    data: T,
}

/// A typed cache with an optional persisted snapshot.
///
/// `T: Default` because "reset" means "back to `T::default()`".
pub struct MemoryStore<T> {
    name: String,
    kind: StoreKind,
    cached: Mutex<Cached<T>>,
    snapshot: Box<dyn SnapshotStore>,
}

impl<T> MemoryStore<T>
where
    T: Clone + Default + Serialize + DeserializeOwned + Send + 'static,
{
    /// Creates an empty, non-persistent store.
    pub fn new(name: impl Into<String>, kind: StoreKind) -> Self {
        Self::with_snapshot(name, kind, NoSnapshot)
    }

    /// Creates an empty store backed by `snapshot`.
    ///
    /// Nothing is loaded until [`restore`](Self::restore) is called.
    pub fn with_snapshot(
        name: impl Into<String>,
        kind: StoreKind,
        snapshot: impl SnapshotStore,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            cached: Mutex::new(Cached::default()),
            snapshot: Box::new(snapshot),
        }
    }

    /// Returns a clone of the cached value.
    pub fn get(&self) -> T {
        self.lock().data.clone()
    }

    /// Runs `f` against the cached value without cloning it.
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.lock().data)
    }

    /// Replaces the cached value and persists it.
    ///
    /// The value is written for whichever subject the store is tagged
    /// with right now. Use [`commit_for`](Self::commit_for) for data
    /// that was fetched asynchronously.
    pub fn set(&self, value: T) -> Result<(), StoreError> {
        let mut cached = self.lock();
        cached.data = value;
        self.persist(&cached)
    }

    /// Mutates the cached value in place and persists the result.
    pub fn update(&self, f: impl FnOnce(&mut T)) -> Result<(), StoreError> {
        let mut cached = self.lock();
        f(&mut cached.data);
        self.persist(&cached)
    }

    /// Commits data fetched on behalf of `subject`, but only if the store
    /// is still tagged for that subject.
    ///
    /// A refetch started before a logout can complete after it. Callers
    /// pass the subject they fetched for; if the identity moved on in the
    /// meantime the write is refused with [`StoreError::StaleIdentity`].
    pub fn commit_for(&self, subject: &SubjectId, value: T) -> Result<(), StoreError> {
        let mut cached = self.lock();
        if cached.subject.as_ref() != Some(subject) {
            tracing::debug!(
                store = %self.name,
                expected = %subject,
                "dropping refetched data for stale identity"
            );
            return Err(StoreError::StaleIdentity {
                store: self.name.clone(),
                expected: subject.clone(),
                current: cached.subject.clone(),
            });
        }
        cached.data = value;
        self.persist(&cached)
    }

    /// Loads the persisted snapshot, if it belongs to `expected`.
    ///
    /// Returns `Ok(true)` when content was restored. A snapshot written
    /// for a different subject is erased instead of loaded.
    pub fn restore(&self, expected: Option<&SubjectId>) -> Result<bool, StoreError> {
        let Some(bytes) = self.snapshot.load()? else {
            return Ok(false);
        };
        let restored: Cached<T> = serde_json::from_slice(&bytes)?;

        if restored.subject.as_ref() != expected {
            tracing::info!(
                store = %self.name,
                "discarding snapshot that belongs to another subject"
            );
            self.snapshot.erase()?;
            return Ok(false);
        }

        *self.lock() = restored;
        tracing::debug!(store = %self.name, "snapshot restored");
        Ok(true)
    }

    fn persist(&self, cached: &Cached<T>) -> Result<(), StoreError> {
        if !self.snapshot.is_persistent() {
            return Ok(());
        }
        let bytes = serde_json::to_vec(cached)?;
        self.snapshot.save(&bytes)
    }

    fn lock(&self) -> MutexGuard<'_, Cached<T>> {
        self.cached.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> StoreHandle for MemoryStore<T>
where
    T: Clone + Default + Serialize + DeserializeOwned + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StoreKind {
        self.kind
    }

    fn reset(&self) -> Result<(), StoreError> {
        let mut cached = self.lock();
        cached.data = T::default();
        Ok(())
    }

    fn clear_persisted(&self) -> Result<(), StoreError> {
        self.snapshot
            .erase()
            .map_err(|source| StoreError::PersistClearFailed {
                store: self.name.clone(),
                source,
            })
    }

    fn tag_identity(&self, subject: Option<&SubjectId>) {
        self.lock().subject = subject.cloned();
    }

    fn tagged_identity(&self) -> Option<SubjectId> {
        self.lock().subject.clone()
    }
}

impl<T> std::fmt::Debug for MemoryStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("persistent", &self.snapshot.is_persistent())
            .finish()
    }
}

// =========================================================================
// Tests
// =========================================================================
