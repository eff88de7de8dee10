//! Copies resource properties between workspaces.

use cmspub_store::{PropertyMap, PropertyStore, Resource, StoreResult, WorkspaceId};
use tracing::trace;

/// How existing properties on the target are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplicationMode {
    /// The target was just created and carries no properties.
    Fresh,
    /// Drop every target property before copying. Full overwrite, no merge.
    Overwrite,
}

/// Replicates property records from an offline resource to its online
/// counterpart.
///
/// Errors are returned to the caller; the orchestrator treats them as
/// warnings so one malformed property never blocks a run.
#[derive(Debug)]
pub struct PropertyReplicator<'a, S: PropertyStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: PropertyStore + ?Sized> PropertyReplicator<'a, S> {
    /// Creates a replicator over `store`.
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Reads every property of `resource` in `workspace`.
    pub fn read(&self, workspace: WorkspaceId, resource: &Resource) -> StoreResult<PropertyMap> {
        self.store
            .read_all_properties(workspace, resource.id, resource.resource_type)
    }

    /// Writes `props` onto `target` in `target_ws`. Returns the number of
    /// properties written.
    pub fn replicate(
        &self,
        props: &PropertyMap,
        target_ws: WorkspaceId,
        target: &Resource,
        mode: ReplicationMode,
    ) -> StoreResult<usize> {
        if mode == ReplicationMode::Overwrite {
            self.store.delete_all_properties(target_ws, target.id)?;
        }

        for (name, value) in props {
            self.store
                .write_property(name, target_ws, value, target.id, target.resource_type)?;
        }
        trace!(path = %target.path, count = props.len(), "replicated properties");
        Ok(props.len())
    }

    /// Deletes every property of `resource` in `workspace`.
    pub fn delete_all(&self, workspace: WorkspaceId, resource: &Resource) -> StoreResult<()> {
        self.store.delete_all_properties(workspace, resource.id)
    }
}
