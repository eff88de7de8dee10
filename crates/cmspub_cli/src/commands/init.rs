//! Init command implementation.

use super::CmdResult;
use cmspub_store::{FileStore, WorkspaceId};
use std::path::Path;
use tracing::info;

/// Creates a store with one online and any number of offline workspaces.
///
/// Workspaces that already exist are left untouched.
pub fn run(path: &Path, online: u32, offline: &[u32]) -> CmdResult {
    if offline.contains(&online) {
        return Err(format!("workspace {online} cannot be both online and offline").into());
    }

    let store = FileStore::open(path)?;
    let existing: Vec<WorkspaceId> = store.workspaces().into_iter().map(|(id, _)| id).collect();

    let mut wanted = vec![(WorkspaceId::new(online), "Online".to_string())];
    wanted.extend(
        offline
            .iter()
            .map(|id| (WorkspaceId::new(*id), format!("Offline {id}"))),
    );

    for (id, name) in wanted {
        if existing.contains(&id) {
            println!("  {id} already exists");
            continue;
        }
        store.create_workspace(id, name.clone())?;
        info!(workspace = %id, name = %name, "created workspace");
        println!("✓ Created {id} ({name})");
    }

    println!("Store ready at {:?}", store.path());
    Ok(())
}
