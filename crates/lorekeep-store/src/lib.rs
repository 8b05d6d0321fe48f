//! Client-side data caches for Lorekeep.
//!
//! Every piece of user-scoped data the client keeps around (character
//! sheets, inventory, notes, spellbook, the active campaign, admin views)
//! lives in a store. This crate provides:
//!
//! 1. **The capability**: [`StoreHandle`], the uniform interface the
//!    session layer uses to reset a store and re-tag it with an identity
//! 2. **A ready-made store**: [`MemoryStore`], an in-memory cache with
//!    optional on-disk snapshots ([`SnapshotStore`], [`FileSnapshot`])
//! 3. **The registry**: [`StoreRegistry`], the fixed, ordered list of
//!    stores that get invalidated together
//!
//! # How it fits in the stack
//!
//! ```text
//! Session Layer (above)  ← fans out resets over the registry
//!     ↕
//! Store Layer (this crate)  ← owns cached data, tagged by subject
//!     ↕
//! Identity Layer (below)  ← provides SubjectId
//! ```

mod error;
mod handle;
mod memory;
mod registry;
mod snapshot;

pub use error::StoreError;
pub use handle::{StoreHandle, StoreKind};
pub use memory::MemoryStore;
pub use registry::{StoreRegistry, StoreRegistryBuilder};
pub use snapshot::{FileSnapshot, NoSnapshot, SnapshotStore};
