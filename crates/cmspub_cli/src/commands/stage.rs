//! Stage command implementation.
//!
//! Records an edit in an offline workspace so the next publish picks it up.

use super::{open_store, CmdResult};
use cmspub_store::{Resource, ResourceState, ResourceStore, WorkspaceId};
use std::fs;
use std::path::Path;
use tracing::debug;

/// What to stage at a resource path.
#[derive(Debug)]
pub enum Edit<'a> {
    /// Create a folder.
    Folder,
    /// Create or replace a file with the content of a local file.
    File(&'a Path),
    /// Mark the resource deleted.
    Delete,
}

/// Runs the stage command.
pub fn run(store_path: &Path, workspace: u32, resource_path: &str, edit: Edit<'_>) -> CmdResult {
    let store = open_store(store_path)?;
    let workspace = WorkspaceId::new(workspace);
    let existing = store.try_find(workspace, resource_path)?;

    let (resource, state) = match (edit, existing) {
        (Edit::Delete, Some(found)) => {
            store.set_state(workspace, found.id, ResourceState::Deleted)?;
            (found, ResourceState::Deleted)
        }
        (Edit::Delete, None) => {
            return Err(format!("{resource_path} not found in {workspace}").into());
        }
        (Edit::Folder, Some(found)) => {
            return Err(format!("{} already exists in {workspace}", found.path).into());
        }
        (Edit::Folder, None) => {
            let folder = store.seed(workspace, &Resource::folder(resource_path))?;
            (folder, ResourceState::New)
        }
        (Edit::File(source), Some(found)) => {
            let content = fs::read(source)?;
            // A file never published stays new.
            let state = if found.state == ResourceState::New {
                ResourceState::New
            } else {
                ResourceState::Changed
            };
            let template = Resource {
                size: content.len() as u64,
                content: content.into(),
                modified_at: cmspub_store::types::now_millis(),
                ..found.clone()
            };
            let updated =
                store.overwrite_metadata_and_content(workspace, found.id, &template, state)?;
            (updated, state)
        }
        (Edit::File(source), None) => {
            let content = fs::read(source)?;
            let file = store.seed(workspace, &Resource::file(resource_path, content))?;
            (file, ResourceState::New)
        }
    };

    debug!(path = %resource.path, %state, "staged edit");
    println!("✓ {} is {state} in {workspace}", resource.path);
    Ok(())
}
