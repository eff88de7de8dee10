//! Publish command implementation.

use super::{open_store, CmdResult};
use cmspub_core::{FsExporter, PublishConfig, Publisher};
use cmspub_store::{UserId, WorkspaceId};
use std::fs;
use std::path::Path;
use tracing::info;

/// Loads a JSON configuration file, or the defaults when none is given.
pub fn load_config(path: Option<&Path>) -> CmdResult<PublishConfig> {
    let Some(path) = path else {
        return Ok(PublishConfig::default());
    };
    let text = fs::read_to_string(path)?;
    let config: PublishConfig = serde_json::from_str(&text)
        .map_err(|e| format!("invalid config {:?}: {e}", path))?;
    Ok(config)
}

/// Publishes `workspace` into the configured online workspace.
pub fn run(
    store_path: &Path,
    workspace: u32,
    actor: u32,
    no_history: bool,
    config_path: Option<&Path>,
) -> CmdResult {
    let config = load_config(config_path)?;
    let store = open_store(store_path)?;
    let exporter = FsExporter::from_config(&config);
    let history = config.history_enabled && !no_history;

    info!(workspace, actor, history, "publishing");
    let report = Publisher::new(&store, &config)
        .with_exporter(&exporter)
        .publish(
            UserId::new(actor),
            WorkspaceId::new(workspace),
            config.online_workspace,
            history,
        )?;

    for path in &report.changed_paths {
        println!("  {path}");
    }
    for warning in &report.warnings {
        println!("  ! {warning}");
    }
    let stats = &report.stats;
    println!(
        "✓ Published {} resources (version {}, run {})",
        report.changed_paths.len(),
        report.version,
        report.run_id
    );
    println!(
        "  created {}, updated {}, deleted {}, skipped {} locked, dropped {} temporary",
        stats.created, stats.updated, stats.deleted, stats.skipped_locked, stats.temp_removed
    );
    Ok(())
}
