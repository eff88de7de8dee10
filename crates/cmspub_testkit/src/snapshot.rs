//! Path-keyed views of a workspace for comparing workspaces and runs.
//!
//! Ids are workspace-local, so comparisons go by path and leave ids out.

use cmspub_store::{
    Backend, PropertyMap, Resource, ResourceKind, ResourceState, ResourceType, StoreResult,
    WorkspaceId,
};
use std::collections::BTreeMap;

/// Everything about a resource that publishing is expected to carry over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceView {
    /// Folder or file.
    pub kind: ResourceKind,
    /// Lifecycle state.
    pub state: ResourceState,
    /// Resource type.
    pub resource_type: ResourceType,
    /// Flag bits.
    pub flags: u32,
    /// Content bytes.
    pub content: Vec<u8>,
    /// Properties scoped by the resource type.
    pub properties: PropertyMap,
}

impl ResourceView {
    fn new(resource: &Resource, properties: PropertyMap) -> Self {
        Self {
            kind: resource.kind,
            state: resource.state,
            resource_type: resource.resource_type,
            flags: resource.flags,
            content: resource.content.to_vec(),
            properties,
        }
    }
}

/// A workspace keyed by path.
pub type WorkspaceSnapshot = BTreeMap<String, ResourceView>;

/// Captures every resource of `workspace` with its properties.
pub fn snapshot_workspace<S: Backend + ?Sized>(
    store: &S,
    workspace: WorkspaceId,
) -> StoreResult<WorkspaceSnapshot> {
    let mut out = BTreeMap::new();
    let folders = store.read_folders(workspace)?;
    let files = store.read_files(workspace)?;
    for resource in folders.iter().chain(files.iter()) {
        let properties =
            store.read_all_properties(workspace, resource.id, resource.resource_type)?;
        out.insert(resource.path.clone(), ResourceView::new(resource, properties));
    }
    Ok(out)
}

/// Returns the paths of `workspace` whose state is not `Unchanged`.
pub fn pending_paths<S: Backend + ?Sized>(
    store: &S,
    workspace: WorkspaceId,
) -> StoreResult<Vec<String>> {
    Ok(snapshot_workspace(store, workspace)?
        .into_iter()
        .filter(|(_, view)| view.state.is_modified())
        .map(|(path, _)| path)
        .collect())
}
