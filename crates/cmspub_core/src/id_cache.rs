//! Offline-to-online parent id translation for one publish run.

use crate::error::{PublishError, PublishResult};
use cmspub_store::{Resource, ResourceId, ResourceStore, WorkspaceId};
use std::collections::HashMap;
use tracing::trace;

/// Maps offline folder ids to the ids of their online counterparts.
///
/// Ids are workspace-local, so a miss is resolved by reading the offline
/// folder and looking up the online resource at the same path. The cache
/// lives for one run and is the only place ids of the two workspaces meet.
#[derive(Debug)]
pub struct IdCache {
    source: WorkspaceId,
    target: WorkspaceId,
    entries: HashMap<ResourceId, ResourceId>,
}

impl IdCache {
    /// Creates an empty cache for a `source -> target` run.
    pub fn new(source: WorkspaceId, target: WorkspaceId) -> Self {
        Self {
            source,
            target,
            entries: HashMap::new(),
        }
    }

    /// Records that `offline` is published as `online`.
    pub fn put(&mut self, offline: ResourceId, online: ResourceId) {
        self.entries.insert(offline, online);
    }

    /// Returns the online id for the offline folder `offline_parent`.
    ///
    /// # Errors
    ///
    /// Returns `UnresolvedParent` if the offline folder is unknown or has no
    /// online counterpart yet.
    pub fn get<S: ResourceStore + ?Sized>(
        &mut self,
        store: &S,
        offline_parent: ResourceId,
    ) -> PublishResult<ResourceId> {
        if let Some(online) = self.entries.get(&offline_parent) {
            return Ok(*online);
        }

        let parent = store
            .read_resource(self.source, offline_parent)
            .map_err(|e| PublishError::unresolved_parent(offline_parent.to_string(), Some(e)))?;
        let online = store
            .try_find(self.target, &parent.path)
            .map_err(|e| PublishError::unresolved_parent(parent.path.clone(), Some(e)))?
            .ok_or_else(|| PublishError::unresolved_parent(parent.path.clone(), None))?;

        trace!(path = %parent.path, offline = %offline_parent, online = %online.id, "resolved parent");
        self.entries.insert(offline_parent, online.id);
        Ok(online.id)
    }

    /// Returns the online id of `resource`'s parent folder.
    ///
    /// # Errors
    ///
    /// Returns `UnresolvedParent` naming `resource` if it has no parent or
    /// the parent cannot be resolved.
    pub fn parent_of<S: ResourceStore + ?Sized>(
        &mut self,
        store: &S,
        resource: &Resource,
    ) -> PublishResult<ResourceId> {
        let parent = resource
            .parent_id
            .ok_or_else(|| PublishError::unresolved_parent(resource.path.clone(), None))?;
        self.get(store, parent).map_err(|e| match e {
            PublishError::UnresolvedParent { source, .. } => {
                PublishError::unresolved_parent(resource.path.clone(), source)
            }
            other => other,
        })
    }
}
