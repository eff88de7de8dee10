//! Inspect command implementation.

use super::{open_store, CmdResult};
use cmspub_store::{Resource, ResourceStore, WorkspaceId};
use serde::Serialize;
use std::path::Path;

/// One listed resource.
#[derive(Debug, Serialize)]
pub struct ResourceEntry {
    /// Resource path.
    pub path: String,
    /// `folder` or `file`.
    pub kind: &'static str,
    /// Lifecycle state.
    pub state: String,
    /// Content size in bytes.
    pub size: u64,
    /// Workspace holding the lock, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked_in: Option<u32>,
}

impl From<&Resource> for ResourceEntry {
    fn from(resource: &Resource) -> Self {
        Self {
            path: resource.path.clone(),
            kind: if resource.is_folder() { "folder" } else { "file" },
            state: resource.state.to_string(),
            size: resource.size,
            locked_in: resource.lock.map(|l| l.workspace.get()),
        }
    }
}

/// Workspace inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Workspace id.
    pub workspace: u32,
    /// Workspace name.
    pub name: String,
    /// Resources in discovery order, folders first.
    pub resources: Vec<ResourceEntry>,
}

/// Runs the inspect command.
pub fn run(path: &Path, workspace: u32, format: &str) -> CmdResult {
    let store = open_store(path)?;
    let id = WorkspaceId::new(workspace);
    let name = store
        .workspaces()
        .into_iter()
        .find(|(ws, _)| *ws == id)
        .map(|(_, name)| name)
        .ok_or_else(|| format!("unknown workspace {id}"))?;

    let folders = store.read_folders(id)?;
    let files = store.read_files(id)?;
    let result = InspectResult {
        workspace,
        name,
        resources: folders.iter().chain(files.iter()).map(ResourceEntry::from).collect(),
    };

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text(&result);
        }
    }

    Ok(())
}

fn print_text(result: &InspectResult) {
    println!("Workspace {} ({})", result.workspace, result.name);
    println!("==========================");
    for entry in &result.resources {
        let lock = entry
            .locked_in
            .map(|ws| format!("  [locked in ws:{ws}]"))
            .unwrap_or_default();
        println!(
            "  {:<9} {:<6} {:>8}  {}{}",
            entry.state, entry.kind, entry.size, entry.path, lock
        );
    }
    let pending = result
        .resources
        .iter()
        .filter(|e| e.state != "UNCHANGED")
        .count();
    println!();
    println!("{} resources, {} pending publish", result.resources.len(), pending);
}
