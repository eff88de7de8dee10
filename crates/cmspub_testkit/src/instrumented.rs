//! A store wrapper that records mutations and injects failures.
//!
//! Useful for asserting that a run touched nothing, or for interrupting a
//! run half way and checking that the next one converges.

use cmspub_store::{
    BackupRecord, HistoryStore, LockService, ProjectRecord, PropertyDefinition, PropertyMap,
    PropertyStore, Resource, ResourceId, ResourceState, ResourceStore, ResourceType, StoreError,
    StoreResult, WorkspaceId,
};
use parking_lot::Mutex;

/// One recorded mutating call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    /// Name of the trait method.
    pub op: &'static str,
    /// Workspace the call targeted, if any.
    pub workspace: Option<WorkspaceId>,
    /// Path of the resource the call touched, empty if unknown.
    pub path: String,
}

#[derive(Debug, Default)]
struct Faults {
    property_reads: Vec<String>,
    property_writes: Vec<String>,
    once: Vec<(&'static str, String)>,
}

/// Wraps a backend, logging every mutating call and failing selected ones.
///
/// Reads are passed through unrecorded. Failed calls are recorded too.
#[derive(Debug)]
pub struct InstrumentedStore<S> {
    inner: S,
    calls: Mutex<Vec<Call>>,
    faults: Mutex<Faults>,
}

impl<S: ResourceStore + PropertyStore + HistoryStore + LockService> InstrumentedStore<S> {
    /// Wraps `inner`.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
            faults: Mutex::new(Faults::default()),
        }
    }

    /// Returns the wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Returns every mutating call so far.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Returns the number of mutating calls so far.
    pub fn mutation_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Returns the ops of every recorded call touching `path`.
    pub fn ops_for(&self, path: &str) -> Vec<&'static str> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.path == path)
            .map(|c| c.op)
            .collect()
    }

    /// Forgets recorded calls.
    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    /// Makes every property write to the resource at `path` fail.
    pub fn fail_property_writes(&self, path: &str) {
        self.faults.lock().property_writes.push(path.to_string());
    }

    /// Makes every property read of the resource at `path` fail.
    pub fn fail_property_reads(&self, path: &str) {
        self.faults.lock().property_reads.push(path.to_string());
    }

    /// Makes the next `op` on `path` fail once.
    pub fn fail_once(&self, op: &'static str, path: &str) {
        self.faults.lock().once.push((op, path.to_string()));
    }

    /// Removes every pending fault.
    pub fn heal(&self) {
        *self.faults.lock() = Faults::default();
    }

    fn path_of(&self, workspace: WorkspaceId, id: ResourceId) -> String {
        self.inner
            .read_resource(workspace, id)
            .map(|r| r.path)
            .unwrap_or_default()
    }

    fn record(&self, op: &'static str, workspace: Option<WorkspaceId>, path: &str) -> StoreResult<()> {
        self.calls.lock().push(Call {
            op,
            workspace,
            path: path.to_string(),
        });

        let mut faults = self.faults.lock();
        if op == "write_property" && faults.property_writes.iter().any(|p| p == path) {
            return Err(injected(op, path));
        }
        if let Some(pos) = faults.once.iter().position(|(o, p)| *o == op && p == path) {
            faults.once.remove(pos);
            return Err(injected(op, path));
        }
        Ok(())
    }
}

fn injected(op: &str, path: &str) -> StoreError {
    StoreError::Io(std::io::Error::new(
        std::io::ErrorKind::Other,
        format!("injected fault: {op} {path}"),
    ))
}

impl<S: ResourceStore + PropertyStore + HistoryStore + LockService> ResourceStore
    for InstrumentedStore<S>
{
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
        self.record("create_folder", Some(workspace), &template.path)?;
        self.inner.create_folder(workspace, parent, template)
    }

    fn create_file(
        &self,
        workspace: WorkspaceId,
        parent: ResourceId,
        template: &Resource,
    ) -> StoreResult<Resource> {
        self.record("create_file", Some(workspace), &template.path)?;
        self.inner.create_file(workspace, parent, template)
    }

    fn overwrite_metadata(
        &self,
        workspace: WorkspaceId,
        target: ResourceId,
        source: &Resource,
        state: ResourceState,
    ) -> StoreResult<Resource> {
        self.record("overwrite_metadata", Some(workspace), &source.path)?;
        self.inner.overwrite_metadata(workspace, target, source, state)
    }

    fn overwrite_metadata_and_content(
        &self,
        workspace: WorkspaceId,
        target: ResourceId,
        source: &Resource,
        state: ResourceState,
    ) -> StoreResult<Resource> {
        self.record("overwrite_metadata_and_content", Some(workspace), &source.path)?;
        self.inner
            .overwrite_metadata_and_content(workspace, target, source, state)
    }

    fn set_state(
        &self,
        workspace: WorkspaceId,
        id: ResourceId,
        state: ResourceState,
    ) -> StoreResult<()> {
        self.record("set_state", Some(workspace), &self.path_of(workspace, id))?;
        self.inner.set_state(workspace, id, state)
    }

    fn delete(&self, workspace: WorkspaceId, id: ResourceId) -> StoreResult<()> {
        self.record("delete", Some(workspace), &self.path_of(workspace, id))?;
        self.inner.delete(workspace, id)
    }

    fn remove_file(&self, workspace: WorkspaceId, path: &str) -> StoreResult<()> {
        self.record("remove_file", Some(workspace), path)?;
        self.inner.remove_file(workspace, path)
    }

    fn delete_folder(&self, workspace: WorkspaceId, path: &str) -> StoreResult<()> {
        self.record("delete_folder", Some(workspace), path)?;
        self.inner.delete_folder(workspace, path)
    }
}

impl<S: ResourceStore + PropertyStore + HistoryStore + LockService> PropertyStore
    for InstrumentedStore<S>
{
    fn define_property(&self, definition: PropertyDefinition) -> StoreResult<()> {
        self.record("define_property", None, "")?;
        self.inner.define_property(definition)
    }

    fn read_all_properties(
        &self,
        workspace: WorkspaceId,
        resource: ResourceId,
        resource_type: ResourceType,
    ) -> StoreResult<PropertyMap> {
        let path = self.path_of(workspace, resource);
        if self.faults.lock().property_reads.contains(&path) {
            return Err(injected("read_all_properties", &path));
        }
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
        self.record(
            "write_property",
            Some(workspace),
            &self.path_of(workspace, resource),
        )?;
        self.inner
            .write_property(name, workspace, value, resource, resource_type)
    }

    fn delete_all_properties(
        &self,
        workspace: WorkspaceId,
        resource: ResourceId,
    ) -> StoreResult<()> {
        self.record(
            "delete_all_properties",
            Some(workspace),
            &self.path_of(workspace, resource),
        )?;
        self.inner.delete_all_properties(workspace, resource)
    }
}

impl<S: ResourceStore + PropertyStore + HistoryStore + LockService> HistoryStore
    for InstrumentedStore<S>
{
    fn next_backup_version(&self) -> StoreResult<u64> {
        self.inner.next_backup_version()
    }

    fn reserve_backup_version(&self) -> StoreResult<u64> {
        self.record("reserve_backup_version", None, "")?;
        self.inner.reserve_backup_version()
    }

    fn write_snapshot(&self, record: &BackupRecord) -> StoreResult<()> {
        self.record("write_snapshot", Some(record.workspace), &record.resource.path)?;
        self.inner.write_snapshot(record)
    }

    fn write_project_record(&self, record: &ProjectRecord) -> StoreResult<()> {
        self.record("write_project_record", Some(record.workspace), "")?;
        self.inner.write_project_record(record)
    }

    fn read_snapshots(&self, version: u64) -> StoreResult<Vec<BackupRecord>> {
        self.inner.read_snapshots(version)
    }

    fn read_project_records(&self) -> StoreResult<Vec<ProjectRecord>> {
        self.inner.read_project_records()
    }
}

impl<S: ResourceStore + PropertyStore + HistoryStore + LockService> LockService
    for InstrumentedStore<S>
{
    fn is_locked_by_other_workspace(&self, resource: &Resource, current: WorkspaceId) -> bool {
        self.inner.is_locked_by_other_workspace(resource, current)
    }
}
