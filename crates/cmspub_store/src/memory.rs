//! In-memory resource store.

use crate::backend::{HistoryStore, LockService, PropertyStore, ResourceStore};
use crate::error::{StoreError, StoreResult};
use crate::types::{
    is_same_or_below, parent_of, BackupRecord, ContentId, ProjectRecord, PropertyDefinition,
    PropertyMap, Resource, ResourceId, ResourceKind, ResourceState, ResourceType, WorkspaceId,
    ROOT_PATH,
};
use bytes::Bytes;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Everything a store holds. Shared with [`crate::FileStore`], which
/// persists it as CBOR.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct StoreState {
    workspaces: BTreeMap<WorkspaceId, WorkspaceData>,
    definitions: BTreeSet<PropertyDefinition>,
    snapshots: Vec<BackupRecord>,
    project_records: Vec<ProjectRecord>,
    #[serde(default)]
    last_reserved_version: u64,
    next_content_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceData {
    name: String,
    next_id: u64,
    // Keyed by id; ids grow monotonically so iteration is discovery order.
    resources: BTreeMap<ResourceId, Resource>,
    properties: BTreeMap<ResourceId, PropertyMap>,
}

impl WorkspaceData {
    fn new(workspace: WorkspaceId, name: String) -> Self {
        Self {
            name,
            // Distinct id ranges per workspace keep ids from ever matching
            // across workspaces by accident.
            next_id: (u64::from(workspace.get()) << 32) | 1,
            resources: BTreeMap::new(),
            properties: BTreeMap::new(),
        }
    }

    fn find(&self, path: &str) -> Option<&Resource> {
        self.resources.values().find(|r| r.path == path)
    }
}

impl StoreState {
    fn ws(&self, workspace: WorkspaceId) -> StoreResult<&WorkspaceData> {
        self.workspaces
            .get(&workspace)
            .ok_or(StoreError::UnknownWorkspace(workspace))
    }

    fn ws_mut(&mut self, workspace: WorkspaceId) -> StoreResult<&mut WorkspaceData> {
        self.workspaces
            .get_mut(&workspace)
            .ok_or(StoreError::UnknownWorkspace(workspace))
    }

    fn get(&self, workspace: WorkspaceId, id: ResourceId) -> StoreResult<&Resource> {
        self.ws(workspace)?
            .resources
            .get(&id)
            .ok_or(StoreError::IdNotFound { workspace, id })
    }

    fn get_mut(&mut self, workspace: WorkspaceId, id: ResourceId) -> StoreResult<&mut Resource> {
        self.ws_mut(workspace)?
            .resources
            .get_mut(&id)
            .ok_or(StoreError::IdNotFound { workspace, id })
    }

    fn read_kind(&self, workspace: WorkspaceId, kind: ResourceKind) -> StoreResult<Vec<Resource>> {
        Ok(self
            .ws(workspace)?
            .resources
            .values()
            .filter(|r| r.kind == kind)
            .cloned()
            .collect())
    }

    fn create_workspace(&mut self, workspace: WorkspaceId, name: String) -> StoreResult<Resource> {
        if self.workspaces.contains_key(&workspace) {
            return Err(StoreError::already_exists(workspace, ROOT_PATH));
        }
        self.workspaces
            .insert(workspace, WorkspaceData::new(workspace, name));
        let root = Resource::folder(ROOT_PATH).with_state(ResourceState::Unchanged);
        self.insert(workspace, None, &root, ResourceKind::Folder)
    }

    /// Inserts a resource built from `template`, assigning id and, when the
    /// template carries none, a content id.
    fn insert(
        &mut self,
        workspace: WorkspaceId,
        parent: Option<ResourceId>,
        template: &Resource,
        kind: ResourceKind,
    ) -> StoreResult<Resource> {
        if template.kind != kind {
            return Err(StoreError::Corrupted(format!(
                "{} has kind {:?}, expected {:?}",
                template.path, template.kind, kind
            )));
        }
        if let Some(parent) = parent {
            let parent = self.get(workspace, parent)?;
            if !parent.is_folder() || parent_of(&template.path) != Some(parent.path.as_str()) {
                return Err(StoreError::InvalidParent {
                    path: template.path.clone(),
                    parent: parent.path.clone(),
                });
            }
        }

        let content_id = if template.content_id.get() == 0 {
            self.next_content_id += 1;
            ContentId::new(self.next_content_id)
        } else {
            template.content_id
        };

        let data = self.ws_mut(workspace)?;
        if data.find(&template.path).is_some() {
            return Err(StoreError::already_exists(workspace, template.path.clone()));
        }

        let id = ResourceId::new(data.next_id);
        data.next_id += 1;

        let mut resource = template.clone();
        resource.id = id;
        resource.content_id = content_id;
        resource.parent_id = parent;
        resource.workspace = workspace;
        if kind == ResourceKind::Folder {
            resource.content = Bytes::new();
        }
        resource.size = resource.content.len() as u64;

        data.resources.insert(id, resource.clone());
        Ok(resource)
    }

    fn overwrite(
        &mut self,
        workspace: WorkspaceId,
        target: ResourceId,
        source: &Resource,
        state: ResourceState,
        with_content: bool,
    ) -> StoreResult<Resource> {
        let resource = self.get_mut(workspace, target)?;
        resource.resource_type = source.resource_type;
        resource.flags = source.flags;
        resource.owner = source.owner;
        resource.group = source.group;
        resource.access_flags = source.access_flags;
        resource.lock = source.lock;
        resource.launcher = source.launcher.clone();
        resource.created_at = source.created_at;
        resource.created_by = source.created_by;
        resource.modified_at = source.modified_at;
        resource.modified_by = source.modified_by;
        resource.state = state;
        if with_content && resource.kind == ResourceKind::File {
            resource.content = source.content.clone();
            resource.size = source.content.len() as u64;
        }
        Ok(resource.clone())
    }

    fn remove_where(
        &mut self,
        workspace: WorkspaceId,
        matches: impl Fn(&Resource) -> bool,
    ) -> StoreResult<usize> {
        let data = self.ws_mut(workspace)?;
        let doomed: Vec<ResourceId> = data
            .resources
            .values()
            .filter(|r| matches(r))
            .map(|r| r.id)
            .collect();
        for id in &doomed {
            data.resources.remove(id);
            data.properties.remove(id);
        }
        Ok(doomed.len())
    }

    fn max_version(&self) -> u64 {
        let snapshots = self.snapshots.iter().map(|r| r.version);
        let projects = self.project_records.iter().map(|r| r.version);
        snapshots
            .chain(projects)
            .max()
            .unwrap_or(0)
            .max(self.last_reserved_version)
    }

    fn reserve_version(&mut self) -> u64 {
        let version = self.max_version() + 1;
        self.last_reserved_version = version;
        version
    }
}

/// A resource store kept entirely in memory.
///
/// Suitable for tests and for embedding the engine without persistence.
/// Every workspace numbers its resources in its own id range.
///
/// # Example
///
/// ```rust
/// use cmspub_store::{InMemoryStore, ResourceStore, WorkspaceId};
///
/// let store = InMemoryStore::new();
/// let root = store.create_workspace(WorkspaceId::new(1), "Online").unwrap();
/// assert_eq!(root.path, "/");
/// assert!(store.try_find(WorkspaceId::new(1), "/").unwrap().is_some());
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<StoreState>,
}

impl InMemoryStore {
    /// Creates an empty store with no workspaces.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_state(state: StoreState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    pub(crate) fn state(&self) -> StoreState {
        self.state.read().clone()
    }

    /// Creates a workspace with an empty root folder and returns the root.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` if the workspace is already present.
    pub fn create_workspace(
        &self,
        workspace: WorkspaceId,
        name: impl Into<String>,
    ) -> StoreResult<Resource> {
        self.state.write().create_workspace(workspace, name.into())
    }

    /// Returns `(id, name)` of every workspace.
    pub fn workspaces(&self) -> Vec<(WorkspaceId, String)> {
        self.state
            .read()
            .workspaces
            .iter()
            .map(|(id, data)| (*id, data.name.clone()))
            .collect()
    }

    /// Inserts a resource below its parent path exactly as given, state
    /// included. Used to stage edits in an offline workspace.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the parent folder does not exist, or
    /// `AlreadyExists` if the path is occupied.
    pub fn seed(&self, workspace: WorkspaceId, template: &Resource) -> StoreResult<Resource> {
        let mut state = self.state.write();
        let parent = match parent_of(&template.path) {
            Some(parent_path) => Some(
                state
                    .ws(workspace)?
                    .find(parent_path)
                    .map(|p| p.id)
                    .ok_or_else(|| StoreError::not_found(workspace, parent_path))?,
            ),
            None => return Err(StoreError::already_exists(workspace, ROOT_PATH)),
        };
        state.insert(workspace, parent, template, template.kind)
    }

    /// Replaces the lock of a resource.
    pub fn set_lock(
        &self,
        workspace: WorkspaceId,
        id: ResourceId,
        lock: Option<crate::types::Lock>,
    ) -> StoreResult<()> {
        self.state.write().get_mut(workspace, id)?.lock = lock;
        Ok(())
    }
}

impl ResourceStore for InMemoryStore {
    fn read_folders(&self, workspace: WorkspaceId) -> StoreResult<Vec<Resource>> {
        self.state.read().read_kind(workspace, ResourceKind::Folder)
    }

    fn read_files(&self, workspace: WorkspaceId) -> StoreResult<Vec<Resource>> {
        self.state.read().read_kind(workspace, ResourceKind::File)
    }

    fn read_resource(&self, workspace: WorkspaceId, id: ResourceId) -> StoreResult<Resource> {
        self.state.read().get(workspace, id).cloned()
    }

    fn try_find(&self, workspace: WorkspaceId, path: &str) -> StoreResult<Option<Resource>> {
        Ok(self.state.read().ws(workspace)?.find(path).cloned())
    }

    fn create_folder(
        &self,
        workspace: WorkspaceId,
        parent: ResourceId,
        template: &Resource,
    ) -> StoreResult<Resource> {
        self.state
            .write()
            .insert(workspace, Some(parent), template, ResourceKind::Folder)
    }

    fn create_file(
        &self,
        workspace: WorkspaceId,
        parent: ResourceId,
        template: &Resource,
    ) -> StoreResult<Resource> {
        self.state
            .write()
            .insert(workspace, Some(parent), template, ResourceKind::File)
    }

    fn overwrite_metadata(
        &self,
        workspace: WorkspaceId,
        target: ResourceId,
        source: &Resource,
        state: ResourceState,
    ) -> StoreResult<Resource> {
        self.state
            .write()
            .overwrite(workspace, target, source, state, false)
    }

    fn overwrite_metadata_and_content(
        &self,
        workspace: WorkspaceId,
        target: ResourceId,
        source: &Resource,
        state: ResourceState,
    ) -> StoreResult<Resource> {
        self.state
            .write()
            .overwrite(workspace, target, source, state, true)
    }

    fn set_state(
        &self,
        workspace: WorkspaceId,
        id: ResourceId,
        state: ResourceState,
    ) -> StoreResult<()> {
        self.state.write().get_mut(workspace, id)?.state = state;
        Ok(())
    }

    fn delete(&self, workspace: WorkspaceId, id: ResourceId) -> StoreResult<()> {
        let removed = self.state.write().remove_where(workspace, |r| r.id == id)?;
        if removed == 0 {
            return Err(StoreError::IdNotFound { workspace, id });
        }
        Ok(())
    }

    fn remove_file(&self, workspace: WorkspaceId, path: &str) -> StoreResult<()> {
        self.state
            .write()
            .remove_where(workspace, |r| r.kind == ResourceKind::File && r.path == path)?;
        Ok(())
    }

    fn delete_folder(&self, workspace: WorkspaceId, path: &str) -> StoreResult<()> {
        if path == ROOT_PATH {
            return Err(StoreError::PermissionDenied {
                message: format!("cannot delete the root folder of {workspace}"),
            });
        }
        self.state
            .write()
            .remove_where(workspace, |r| is_same_or_below(&r.path, path))?;
        Ok(())
    }
}

impl PropertyStore for InMemoryStore {
    fn define_property(&self, definition: PropertyDefinition) -> StoreResult<()> {
        self.state.write().definitions.insert(definition);
        Ok(())
    }

    fn read_all_properties(
        &self,
        workspace: WorkspaceId,
        resource: ResourceId,
        resource_type: ResourceType,
    ) -> StoreResult<PropertyMap> {
        let state = self.state.read();
        let props = state
            .ws(workspace)?
            .properties
            .get(&resource)
            .map(|props| {
                props
                    .iter()
                    .filter(|(name, _)| {
                        state
                            .definitions
                            .contains(&PropertyDefinition::new(name.as_str(), resource_type))
                    })
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default();
        Ok(props)
    }

    fn write_property(
        &self,
        name: &str,
        workspace: WorkspaceId,
        value: &str,
        resource: ResourceId,
        resource_type: ResourceType,
    ) -> StoreResult<()> {
        let mut state = self.state.write();
        if !state
            .definitions
            .contains(&PropertyDefinition::new(name, resource_type))
        {
            return Err(StoreError::UnknownPropertyDefinition {
                name: name.to_string(),
                resource_type,
            });
        }
        state.get(workspace, resource)?;
        state
            .ws_mut(workspace)?
            .properties
            .entry(resource)
            .or_default()
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn delete_all_properties(
        &self,
        workspace: WorkspaceId,
        resource: ResourceId,
    ) -> StoreResult<()> {
        self.state.write().ws_mut(workspace)?.properties.remove(&resource);
        Ok(())
    }
}

impl HistoryStore for InMemoryStore {
    fn next_backup_version(&self) -> StoreResult<u64> {
        Ok(self.state.read().max_version() + 1)
    }

    fn reserve_backup_version(&self) -> StoreResult<u64> {
        Ok(self.state.write().reserve_version())
    }

    fn write_snapshot(&self, record: &BackupRecord) -> StoreResult<()> {
        self.state.write().snapshots.push(record.clone());
        Ok(())
    }

    fn write_project_record(&self, record: &ProjectRecord) -> StoreResult<()> {
        self.state.write().project_records.push(record.clone());
        Ok(())
    }

    fn read_snapshots(&self, version: u64) -> StoreResult<Vec<BackupRecord>> {
        Ok(self
            .state
            .read()
            .snapshots
            .iter()
            .filter(|r| r.version == version)
            .cloned()
            .collect())
    }

    fn read_project_records(&self) -> StoreResult<Vec<ProjectRecord>> {
        Ok(self.state.read().project_records.clone())
    }
}

impl LockService for InMemoryStore {
    fn is_locked_by_other_workspace(&self, resource: &Resource, current: WorkspaceId) -> bool {
        resource.lock.is_some_and(|lock| lock.workspace != current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Lock, UserId};

    const ONLINE: WorkspaceId = WorkspaceId::new(1);
    const OFFLINE: WorkspaceId = WorkspaceId::new(2);

    fn store() -> InMemoryStore {
        let store = InMemoryStore::new();
        store.create_workspace(ONLINE, "Online").unwrap();
        store.create_workspace(OFFLINE, "Offline").unwrap();
        store
    }

    #[test]
    fn workspaces_start_with_root() {
        let store = store();
        let folders = store.read_folders(ONLINE).unwrap();
        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].path, "/");
        assert_eq!(folders[0].parent_id, None);
        assert_eq!(store.workspaces().len(), 2);
    }

    #[test]
    fn ids_are_workspace_local() {
        let store = store();
        let online_root = store.try_find(ONLINE, "/").unwrap().unwrap();
        let offline_root = store.try_find(OFFLINE, "/").unwrap().unwrap();
        assert_ne!(online_root.id, offline_root.id);
        assert!(store.read_resource(ONLINE, offline_root.id).is_err());
    }

    #[test]
    fn create_rejects_occupied_path() {
        let store = store();
        let root = store.try_find(ONLINE, "/").unwrap().unwrap();
        store
            .create_folder(ONLINE, root.id, &Resource::folder("/a"))
            .unwrap();
        let err = store
            .create_folder(ONLINE, root.id, &Resource::folder("/a"))
            .unwrap_err();
        assert!(err.is_already_exists());
    }

    #[test]
    fn create_rejects_wrong_parent() {
        let store = store();
        let root = store.try_find(ONLINE, "/").unwrap().unwrap();
        let err = store
            .create_file(ONLINE, root.id, &Resource::file("/a/x.html", "x"))
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidParent { .. }));
    }

    #[test]
    fn seed_keeps_state_and_resolves_parent() {
        let store = store();
        let folder = store
            .seed(OFFLINE, &Resource::folder("/a").with_state(ResourceState::New))
            .unwrap();
        let file = store
            .seed(OFFLINE, &Resource::file("/a/x.html", "<p/>"))
            .unwrap();
        assert_eq!(folder.state, ResourceState::New);
        assert_eq!(file.parent_id, Some(folder.id));
        assert_eq!(file.size, 4);

        let err = store
            .seed(OFFLINE, &Resource::file("/missing/y.html", "y"))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn overwrite_keeps_identity() {
        let store = store();
        let file = store
            .seed(OFFLINE, &Resource::file("/x.html", "old"))
            .unwrap();
        let mut source = Resource::file("/elsewhere.html", "new content");
        source.flags = 7;

        let updated = store
            .overwrite_metadata(OFFLINE, file.id, &source, ResourceState::Changed)
            .unwrap();
        assert_eq!(updated.path, "/x.html");
        assert_eq!(updated.flags, 7);
        assert_eq!(&updated.content[..], b"old");

        let updated = store
            .overwrite_metadata_and_content(OFFLINE, file.id, &source, ResourceState::Unchanged)
            .unwrap();
        assert_eq!(&updated.content[..], b"new content");
        assert_eq!(updated.size, 11);
        assert_eq!(updated.content_id, file.content_id);
    }

    #[test]
    fn delete_folder_removes_descendants() {
        let store = store();
        store.seed(OFFLINE, &Resource::folder("/a")).unwrap();
        store.seed(OFFLINE, &Resource::folder("/a/b")).unwrap();
        store.seed(OFFLINE, &Resource::file("/a/b/x", "x")).unwrap();
        store.seed(OFFLINE, &Resource::folder("/ab")).unwrap();

        store.delete_folder(OFFLINE, "/a").unwrap();
        assert!(store.try_find(OFFLINE, "/a/b/x").unwrap().is_none());
        assert!(store.try_find(OFFLINE, "/ab").unwrap().is_some());

        // Absent folder is fine.
        store.delete_folder(OFFLINE, "/a").unwrap();
        assert!(store.delete_folder(OFFLINE, "/").is_err());
    }

    #[test]
    fn properties_require_definition() {
        let store = store();
        let file = store.seed(OFFLINE, &Resource::file("/x", "x")).unwrap();
        let err = store
            .write_property("title", OFFLINE, "Home", file.id, file.resource_type)
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownPropertyDefinition { .. }));

        store
            .define_property(PropertyDefinition::new("title", file.resource_type))
            .unwrap();
        store
            .write_property("title", OFFLINE, "Home", file.id, file.resource_type)
            .unwrap();
        store
            .write_property("title", OFFLINE, "Start", file.id, file.resource_type)
            .unwrap();

        let props = store
            .read_all_properties(OFFLINE, file.id, file.resource_type)
            .unwrap();
        assert_eq!(props.len(), 1);
        assert_eq!(props["title"], "Start");

        store.delete_all_properties(OFFLINE, file.id).unwrap();
        assert!(store
            .read_all_properties(OFFLINE, file.id, file.resource_type)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn backup_version_is_max_plus_one() {
        let store = store();
        assert_eq!(store.next_backup_version().unwrap(), 1);
        store
            .write_project_record(&ProjectRecord {
                version: 4,
                workspace: OFFLINE,
                published_at: 0,
                published_by: UserId::new(1),
                resource_count: 0,
            })
            .unwrap();
        assert_eq!(store.next_backup_version().unwrap(), 5);
        // Reading twice does not advance.
        assert_eq!(store.next_backup_version().unwrap(), 5);
    }

    #[test]
    fn reserved_versions_are_never_handed_out_twice() {
        let store = store();
        let first = store.reserve_backup_version().unwrap();
        let second = store.reserve_backup_version().unwrap();
        assert_eq!((first, second), (1, 2));
        // Reservations count even before anything is written.
        assert_eq!(store.next_backup_version().unwrap(), 3);
    }

    #[test]
    fn lock_service_checks_workspace() {
        let store = store();
        let file = Resource::file("/x", "x").with_lock(Lock {
            user: UserId::new(1),
            workspace: WorkspaceId::new(3),
        });
        assert!(store.is_locked_by_other_workspace(&file, OFFLINE));
        assert!(!store.is_locked_by_other_workspace(&file, WorkspaceId::new(3)));
        assert!(!store.is_locked_by_other_workspace(&Resource::file("/y", "y"), OFFLINE));
    }
}
