//! # cmspub Store
//!
//! Resource model and store gateway for the cmspub publish engine.
//!
//! A workspace ("project") is a tree of folders and files. Editors change
//! resources in offline workspaces; the publish engine copies accepted
//! changes into the single online workspace. This crate defines the records
//! involved and the traits the engine talks to, plus two implementations.
//!
//! ## Design Principles
//!
//! - The engine depends only on the [`Backend`] traits, never on a concrete
//!   store
//! - Resource ids are workspace-local; cross-workspace lookups go by path
//! - Every mutating call commits on its own, there are no transactions
//! - Expected misses are `Ok(None)`, errors are reserved for failures
//!
//! ## Available Stores
//!
//! - [`InMemoryStore`] - For tests and embedding
//! - [`FileStore`] - CBOR snapshot on disk, persisted after every call
//!
//! ## Example
//!
//! ```rust
//! use cmspub_store::{InMemoryStore, Resource, ResourceState, ResourceStore, WorkspaceId};
//!
//! let store = InMemoryStore::new();
//! let offline = WorkspaceId::new(2);
//! store.create_workspace(offline, "Offline").unwrap();
//! store
//!     .seed(offline, &Resource::folder("/news").with_state(ResourceState::New))
//!     .unwrap();
//! let found = store.try_find(offline, "/news").unwrap().unwrap();
//! assert_eq!(found.state, ResourceState::New);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;
pub mod types;

pub use backend::{Backend, HistoryStore, LockService, PropertyStore, ResourceStore};
pub use error::{StoreError, StoreResult};
pub use file::FileStore;
pub use memory::InMemoryStore;
pub use types::{
    BackupRecord, ContentId, GroupId, Launcher, Lock, ProjectRecord, PropertyDefinition,
    PropertyMap, Resource, ResourceId, ResourceKind, ResourceState, ResourceType, UserId,
    WorkspaceId, ROOT_PATH,
};
