//! Persisted snapshots: where a store's content goes between runs.
//!
//! A [`SnapshotStore`] deals in raw bytes; the store that owns it decides
//! the encoding. Two implementations ship here:
//!
//! - [`NoSnapshot`]: nothing is persisted (the default for every store)
//! - [`FileSnapshot`]: one file per store on the local disk

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::StoreError;

/// Byte-level persistence for one store.
pub trait SnapshotStore: Send + Sync + 'static {
    /// Loads the snapshot. `Ok(None)` means nothing has been saved.
    fn load(&self) -> Result<Option<Vec<u8>>, StoreError>;

    /// Replaces the snapshot with `bytes`.
    fn save(&self, bytes: &[u8]) -> Result<(), StoreError>;

    /// Deletes the snapshot. Erasing a snapshot that doesn't exist is
    /// not an error.
    fn erase(&self) -> Result<(), std::io::Error>;

    /// Whether this backend actually persists anything.
    fn is_persistent(&self) -> bool {
        true
    }
}

/// A backend that persists nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSnapshot;

impl SnapshotStore for NoSnapshot {
    fn load(&self) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(None)
    }

    fn save(&self, _bytes: &[u8]) -> Result<(), StoreError> {
        Ok(())
    }

    fn erase(&self) -> Result<(), std::io::Error> {
        Ok(())
    }

    fn is_persistent(&self) -> bool {
        false
    }
}

/// A snapshot kept in a single file.
///
/// Writes go to a sibling `.tmp` file first and are renamed into place,
/// so a crash mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct FileSnapshot {
    path: PathBuf,
}

impl FileSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<dir>/<store_name>.json`
    pub fn in_dir(dir: impl AsRef<Path>, store_name: &str) -> Self {
        Self::new(dir.as_ref().join(format!("{store_name}.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for FileSnapshot {
    fn load(&self) -> Result<Option<Vec<u8>>, StoreError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Snapshot(e)),
        }
    }

    fn save(&self, bytes: &[u8]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn erase(&self) -> Result<(), std::io::Error> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}
