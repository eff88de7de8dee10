//! Collaborator traits consumed by the publish engine.
//!
//! A backing store implements all four traits once; the engine only ever
//! sees them through [`Backend`]. Every mutating call is an independent
//! commit: there is no multi-call transaction.

use crate::error::StoreResult;
use crate::types::{
    BackupRecord, ProjectRecord, PropertyDefinition, PropertyMap, Resource, ResourceId,
    ResourceState, ResourceType, WorkspaceId,
};

/// Read/write access to resource and content records of a workspace.
///
/// # Invariants
///
/// - `(path, workspace)` is unique; creating at an occupied path fails with
///   [`StoreError::AlreadyExists`](crate::StoreError::AlreadyExists)
/// - reads return resources in discovery (creation) order
/// - ids are workspace-local
pub trait ResourceStore: Send + Sync {
    /// Returns every folder of the workspace, root included.
    fn read_folders(&self, workspace: WorkspaceId) -> StoreResult<Vec<Resource>>;

    /// Returns every file of the workspace with its content.
    fn read_files(&self, workspace: WorkspaceId) -> StoreResult<Vec<Resource>>;

    /// Reads a resource by id.
    ///
    /// # Errors
    ///
    /// Returns `IdNotFound` if no resource carries the id.
    fn read_resource(&self, workspace: WorkspaceId, id: ResourceId) -> StoreResult<Resource>;

    /// Looks up a resource by path. A miss is `Ok(None)`, not an error.
    fn try_find(&self, workspace: WorkspaceId, path: &str) -> StoreResult<Option<Resource>>;

    /// Creates a folder under `parent` from `template`.
    ///
    /// The store assigns the id; the template's content id, metadata and
    /// state are kept.
    ///
    /// # Errors
    ///
    /// - `AlreadyExists` if the path is occupied
    /// - `IdNotFound` if `parent` does not exist
    fn create_folder(
        &self,
        workspace: WorkspaceId,
        parent: ResourceId,
        template: &Resource,
    ) -> StoreResult<Resource>;

    /// Creates a file under `parent` from `template`, content included.
    ///
    /// # Errors
    ///
    /// Same as [`ResourceStore::create_folder`].
    fn create_file(
        &self,
        workspace: WorkspaceId,
        parent: ResourceId,
        template: &Resource,
    ) -> StoreResult<Resource>;

    /// Overwrites the metadata of `target` with that of `source` and sets
    /// `state`. Identity, path, parent and content id are kept.
    fn overwrite_metadata(
        &self,
        workspace: WorkspaceId,
        target: ResourceId,
        source: &Resource,
        state: ResourceState,
    ) -> StoreResult<Resource>;

    /// Like [`ResourceStore::overwrite_metadata`] but also replaces content.
    fn overwrite_metadata_and_content(
        &self,
        workspace: WorkspaceId,
        target: ResourceId,
        source: &Resource,
        state: ResourceState,
    ) -> StoreResult<Resource>;

    /// Sets the lifecycle state of a resource.
    fn set_state(
        &self,
        workspace: WorkspaceId,
        id: ResourceId,
        state: ResourceState,
    ) -> StoreResult<()>;

    /// Deletes one resource record.
    fn delete(&self, workspace: WorkspaceId, id: ResourceId) -> StoreResult<()>;

    /// Removes the file at `path` if present. Used for temporary files.
    fn remove_file(&self, workspace: WorkspaceId, path: &str) -> StoreResult<()>;

    /// Removes the folder at `path` together with every descendant and its
    /// properties. Absence of the folder is not an error.
    fn delete_folder(&self, workspace: WorkspaceId, path: &str) -> StoreResult<()>;
}

/// Metadata key-value records attached to resources.
pub trait PropertyStore: Send + Sync {
    /// Registers a property definition. Registering twice is a no-op.
    fn define_property(&self, definition: PropertyDefinition) -> StoreResult<()>;

    /// Reads every property of a resource scoped by its type.
    fn read_all_properties(
        &self,
        workspace: WorkspaceId,
        resource: ResourceId,
        resource_type: ResourceType,
    ) -> StoreResult<PropertyMap>;

    /// Writes one property value, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `UnknownPropertyDefinition` if `(name, resource_type)` is not
    /// defined.
    fn write_property(
        &self,
        name: &str,
        workspace: WorkspaceId,
        value: &str,
        resource: ResourceId,
        resource_type: ResourceType,
    ) -> StoreResult<()>;

    /// Deletes every property of a resource.
    fn delete_all_properties(&self, workspace: WorkspaceId, resource: ResourceId)
        -> StoreResult<()>;
}

/// Append-only history of published resources.
pub trait HistoryStore: Send + Sync {
    /// Returns the version the next reservation would hand out: one more than
    /// the highest version written or reserved so far. Does not reserve
    /// anything.
    fn next_backup_version(&self) -> StoreResult<u64>;

    /// Atomically claims the next backup version. Two callers never receive
    /// the same value, even if neither has written a record yet.
    fn reserve_backup_version(&self) -> StoreResult<u64>;

    /// Appends a resource snapshot.
    fn write_snapshot(&self, record: &BackupRecord) -> StoreResult<()>;

    /// Appends a workspace-level record.
    fn write_project_record(&self, record: &ProjectRecord) -> StoreResult<()>;

    /// Returns every snapshot tagged with `version`.
    fn read_snapshots(&self, version: u64) -> StoreResult<Vec<BackupRecord>>;

    /// Returns every workspace-level record in write order.
    fn read_project_records(&self) -> StoreResult<Vec<ProjectRecord>>;
}

/// Lock lookups.
pub trait LockService: Send + Sync {
    /// Returns true if `resource` is locked in a workspace other than
    /// `current`.
    fn is_locked_by_other_workspace(&self, resource: &Resource, current: WorkspaceId) -> bool;
}

/// Everything the publish engine needs from a backing store.
pub trait Backend: ResourceStore + PropertyStore + HistoryStore + LockService {}

impl<T: ResourceStore + PropertyStore + HistoryStore + LockService> Backend for T {}
