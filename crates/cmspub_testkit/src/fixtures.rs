//! Test fixtures and store helpers.
//!
//! Provides ready-made stores with an online and an offline workspace, plus
//! shortcuts for staging edits in the offline workspace.

use cmspub_store::{
    Backend, FileStore, InMemoryStore, Lock, PropertyDefinition, PropertyStore, Resource,
    ResourceState, ResourceStore, UserId, WorkspaceId,
};
use std::path::Path;
use tempfile::TempDir;

/// The online workspace used by fixtures.
pub const ONLINE: WorkspaceId = WorkspaceId::new(1);

/// The offline workspace used by fixtures.
pub const OFFLINE: WorkspaceId = WorkspaceId::new(2);

/// A second offline workspace, used to hold foreign locks.
pub const OTHER: WorkspaceId = WorkspaceId::new(3);

/// The user publishing in fixture runs.
pub const ACTOR: UserId = UserId::new(100);

enum Inner {
    Memory(InMemoryStore),
    File(FileStore),
}

/// A test store with automatic cleanup.
///
/// Dereferences to `dyn Backend`, so it can be handed to the publisher
/// directly.
pub struct TestStore {
    inner: Inner,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: Option<TempDir>,
}

impl TestStore {
    /// Creates an in-memory store with the online, offline and other
    /// workspaces.
    pub fn memory() -> Self {
        let store = Self {
            inner: Inner::Memory(InMemoryStore::new()),
            _temp_dir: None,
        };
        store.create_workspaces();
        store
    }

    /// Creates a file-backed store in a temporary directory with the same
    /// workspaces as [`TestStore::memory`].
    pub fn file() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = FileStore::open(temp_dir.path()).expect("Failed to open file store");
        let store = Self {
            inner: Inner::File(store),
            _temp_dir: Some(temp_dir),
        };
        store.create_workspaces();
        store
    }

    fn create_workspaces(&self) {
        for (id, name) in [(ONLINE, "Online"), (OFFLINE, "Offline"), (OTHER, "Other")] {
            let created = match &self.inner {
                Inner::Memory(s) => s.create_workspace(id, name),
                Inner::File(s) => s.create_workspace(id, name),
            };
            created.expect("Failed to create workspace");
        }
    }

    /// Returns the store directory if file-backed, None if in-memory.
    pub fn path(&self) -> Option<&Path> {
        self._temp_dir.as_ref().map(|d| d.path())
    }

    /// Returns the store as a backend trait object.
    pub fn backend(&self) -> &(dyn Backend + 'static) {
        match &self.inner {
            Inner::Memory(s) => s,
            Inner::File(s) => s,
        }
    }

    /// Inserts `template` into `workspace` exactly as given.
    pub fn seed(&self, workspace: WorkspaceId, template: &Resource) -> Resource {
        let seeded = match &self.inner {
            Inner::Memory(s) => s.seed(workspace, template),
            Inner::File(s) => s.seed(workspace, template),
        };
        seeded.unwrap_or_else(|e| panic!("Failed to seed {}: {e}", template.path))
    }

    /// Stages an offline folder in `state`.
    pub fn folder(&self, path: &str, state: ResourceState) -> Resource {
        self.seed(OFFLINE, &Resource::folder(path).with_state(state))
    }

    /// Stages an offline file in `state`.
    pub fn file_in(&self, path: &str, content: &str, state: ResourceState) -> Resource {
        self.seed(
            OFFLINE,
            &Resource::file(path, content.to_string()).with_state(state),
        )
    }

    /// Stages an offline file locked by a user of [`OTHER`].
    pub fn locked_file(&self, path: &str, content: &str, state: ResourceState) -> Resource {
        self.seed(
            OFFLINE,
            &Resource::file(path, content.to_string())
                .with_state(state)
                .with_lock(Lock {
                    user: UserId::new(7),
                    workspace: OTHER,
                }),
        )
    }

    /// Puts a published folder into the online workspace.
    pub fn online_folder(&self, path: &str) -> Resource {
        self.seed(ONLINE, &Resource::folder(path).with_state(ResourceState::Unchanged))
    }

    /// Puts a published file into the online workspace.
    pub fn online_file(&self, path: &str, content: &str) -> Resource {
        self.seed(
            ONLINE,
            &Resource::file(path, content.to_string()).with_state(ResourceState::Unchanged),
        )
    }

    /// Defines `name` for the type of `resource` and sets it in `workspace`.
    pub fn set_property(&self, workspace: WorkspaceId, resource: &Resource, name: &str, value: &str) {
        let store = self.backend();
        store
            .define_property(PropertyDefinition::new(name, resource.resource_type))
            .expect("Failed to define property");
        store
            .write_property(name, workspace, value, resource.id, resource.resource_type)
            .expect("Failed to write property");
    }

    /// Looks up `path` in `workspace`.
    pub fn find(&self, workspace: WorkspaceId, path: &str) -> Option<Resource> {
        self.backend()
            .try_find(workspace, path)
            .expect("Failed to look up resource")
    }

    /// Looks up `path` in `workspace`, panicking if absent.
    pub fn get(&self, workspace: WorkspaceId, path: &str) -> Resource {
        self.find(workspace, path)
            .unwrap_or_else(|| panic!("{path} missing in {workspace}"))
    }
}

impl std::ops::Deref for TestStore {
    type Target = dyn Backend;

    fn deref(&self) -> &Self::Target {
        self.backend()
    }
}
