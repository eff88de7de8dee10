//! File-backed resource store.

use crate::backend::{HistoryStore, LockService, PropertyStore, ResourceStore};
use crate::error::{StoreError, StoreResult};
use crate::memory::{InMemoryStore, StoreState};
use crate::types::{
    BackupRecord, ProjectRecord, PropertyDefinition, PropertyMap, Resource, ResourceId,
    ResourceState, ResourceType, WorkspaceId,
};
use fs2::FileExt;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the data file inside the store directory.
const DATA_FILE: &str = "store.cbor";
/// Name of the advisory lock file inside the store directory.
const LOCK_FILE: &str = "LOCK";

/// A resource store persisted to a directory.
///
/// State is held in memory and written to `store.cbor` after every
/// mutating call, so each call is its own durable commit. A crash between
/// two calls leaves the earlier ones visible, exactly like the row-level
/// commits of a relational backend.
///
/// The directory is locked for exclusive use while the store is open.
///
/// # Example
///
/// ```no_run
/// use cmspub_store::{FileStore, WorkspaceId};
/// use std::path::Path;
///
/// let store = FileStore::open(Path::new("site-store")).unwrap();
/// store.create_workspace(WorkspaceId::new(1), "Online").unwrap();
/// ```
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    inner: InMemoryStore,
    commit_lock: Mutex<()>,
    _lock_file: File,
}

impl FileStore {
    /// Opens the store in `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// - `PermissionDenied` if another process holds the store lock
    /// - `Serialization` if the data file cannot be decoded
    /// - `Io` for filesystem failures
    pub fn open(dir: &Path) -> StoreResult<Self> {
        fs::create_dir_all(dir)?;

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(dir.join(LOCK_FILE))?;
        lock_file
            .try_lock_exclusive()
            .map_err(|_| StoreError::PermissionDenied {
                message: format!("store {} is locked by another process", dir.display()),
            })?;

        let data_path = dir.join(DATA_FILE);
        let state = if data_path.exists() {
            let reader = BufReader::new(File::open(&data_path)?);
            ciborium::from_reader::<StoreState, _>(reader)
                .map_err(|e| StoreError::serialization(e.to_string()))?
        } else {
            StoreState::default()
        };
        debug!(path = %dir.display(), "opened file store");

        Ok(Self {
            dir: dir.to_path_buf(),
            inner: InMemoryStore::from_state(state),
            commit_lock: Mutex::new(()),
            _lock_file: lock_file,
        })
    }

    /// Returns the store directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// See [`InMemoryStore::create_workspace`].
    pub fn create_workspace(
        &self,
        workspace: WorkspaceId,
        name: impl Into<String>,
    ) -> StoreResult<Resource> {
        self.commit(|mem| mem.create_workspace(workspace, name))
    }

    /// See [`InMemoryStore::workspaces`].
    pub fn workspaces(&self) -> Vec<(WorkspaceId, String)> {
        self.inner.workspaces()
    }

    /// See [`InMemoryStore::seed`].
    pub fn seed(&self, workspace: WorkspaceId, template: &Resource) -> StoreResult<Resource> {
        self.commit(|mem| mem.seed(workspace, template))
    }

    /// Runs one mutation and persists the result before returning.
    ///
    /// Commits are serialized; the guard is released on every exit path. A
    /// failed mutation is not persisted.
    fn commit<T>(&self, op: impl FnOnce(&InMemoryStore) -> StoreResult<T>) -> StoreResult<T> {
        let _guard = self.commit_lock.lock();
        let out = op(&self.inner)?;
        self.persist()?;
        Ok(out)
    }

    fn persist(&self) -> StoreResult<()> {
        let data_path = self.dir.join(DATA_FILE);
        let tmp_path = self.dir.join(format!("{DATA_FILE}.tmp"));

        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        ciborium::into_writer(&self.inner.state(), &mut writer)
            .map_err(|e| StoreError::serialization(e.to_string()))?;
        writer.flush()?;
        writer
            .into_inner()
            .map_err(|e| StoreError::Io(e.into_error()))?
            .sync_all()?;

        if let Err(e) = fs::rename(&tmp_path, &data_path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        Ok(())
    }
}

impl ResourceStore for FileStore {
    fn read_folders(&self, workspace: WorkspaceId) -> StoreResult<Vec<Resource>> {
        self.inner.read_folders(workspace)
    }

    fn read_files(&self, workspace: WorkspaceId) -> StoreResult<Vec<Resource>> {
        self.inner.read_files(workspace)
    }

    fn read_resource(&self, workspace: WorkspaceId, id: ResourceId) -> StoreResult<Resource> {
        self.inner.read_resource(workspace, id)
    }

    fn try_find(&self, workspace: WorkspaceId, path: &str) -> StoreResult<Option<Resource>> {
        self.inner.try_find(workspace, path)
    }

    fn create_folder(
        &self,
        workspace: WorkspaceId,
        parent: ResourceId,
        template: &Resource,
    ) -> StoreResult<Resource> {
        self.commit(|mem| mem.create_folder(workspace, parent, template))
    }

    fn create_file(
        &self,
        workspace: WorkspaceId,
        parent: ResourceId,
        template: &Resource,
    ) -> StoreResult<Resource> {
        self.commit(|mem| mem.create_file(workspace, parent, template))
    }

    fn overwrite_metadata(
        &self,
        workspace: WorkspaceId,
        target: ResourceId,
        source: &Resource,
        state: ResourceState,
    ) -> StoreResult<Resource> {
        self.commit(|mem| mem.overwrite_metadata(workspace, target, source, state))
    }

    fn overwrite_metadata_and_content(
        &self,
        workspace: WorkspaceId,
        target: ResourceId,
        source: &Resource,
        state: ResourceState,
    ) -> StoreResult<Resource> {
        self.commit(|mem| mem.overwrite_metadata_and_content(workspace, target, source, state))
    }

    fn set_state(
        &self,
        workspace: WorkspaceId,
        id: ResourceId,
        state: ResourceState,
    ) -> StoreResult<()> {
        self.commit(|mem| mem.set_state(workspace, id, state))
    }

    fn delete(&self, workspace: WorkspaceId, id: ResourceId) -> StoreResult<()> {
        self.commit(|mem| mem.delete(workspace, id))
    }

    fn remove_file(&self, workspace: WorkspaceId, path: &str) -> StoreResult<()> {
        self.commit(|mem| mem.remove_file(workspace, path))
    }

    fn delete_folder(&self, workspace: WorkspaceId, path: &str) -> StoreResult<()> {
        self.commit(|mem| mem.delete_folder(workspace, path))
    }
}

impl PropertyStore for FileStore {
    fn define_property(&self, definition: PropertyDefinition) -> StoreResult<()> {
        self.commit(|mem| mem.define_property(definition))
    }

    fn read_all_properties(
        &self,
        workspace: WorkspaceId,
        resource: ResourceId,
        resource_type: ResourceType,
    ) -> StoreResult<PropertyMap> {
        self.inner
            .read_all_properties(workspace, resource, resource_type)
    }

    fn write_property(
        &self,
        name: &str,
        workspace: WorkspaceId,
        value: &str,
        resource: ResourceId,
        resource_type: ResourceType,
    ) -> StoreResult<()> {
        self.commit(|mem| mem.write_property(name, workspace, value, resource, resource_type))
    }

    fn delete_all_properties(
        &self,
        workspace: WorkspaceId,
        resource: ResourceId,
    ) -> StoreResult<()> {
        self.commit(|mem| mem.delete_all_properties(workspace, resource))
    }
}

impl HistoryStore for FileStore {
    fn next_backup_version(&self) -> StoreResult<u64> {
        self.inner.next_backup_version()
    }

    fn reserve_backup_version(&self) -> StoreResult<u64> {
        self.commit(|mem| mem.reserve_backup_version())
    }

    fn write_snapshot(&self, record: &BackupRecord) -> StoreResult<()> {
        self.commit(|mem| mem.write_snapshot(record))
    }

    fn write_project_record(&self, record: &ProjectRecord) -> StoreResult<()> {
        self.commit(|mem| mem.write_project_record(record))
    }

    fn read_snapshots(&self, version: u64) -> StoreResult<Vec<BackupRecord>> {
        self.inner.read_snapshots(version)
    }

    fn read_project_records(&self) -> StoreResult<Vec<ProjectRecord>> {
        self.inner.read_project_records()
    }
}

impl LockService for FileStore {
    fn is_locked_by_other_workspace(&self, resource: &Resource, current: WorkspaceId) -> bool {
        self.inner.is_locked_by_other_workspace(resource, current)
    }
}
