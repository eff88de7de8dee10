//! History command implementation.

use super::{format_timestamp, open_store, CmdResult};
use cmspub_store::HistoryStore;
use std::path::Path;

/// Lists publish runs, or the snapshots of one version.
pub fn run(path: &Path, version: Option<u64>) -> CmdResult {
    let store = open_store(path)?;

    let Some(version) = version else {
        let records = store.read_project_records()?;
        if records.is_empty() {
            println!("No publish history recorded");
        }
        for record in records {
            println!(
                "  v{:<5} {} by {}: {} resources, {}",
                record.version,
                record.workspace,
                record.published_by,
                record.resource_count,
                format_timestamp(record.published_at)
            );
        }
        return Ok(());
    };

    let snapshots = store.read_snapshots(version)?;
    if snapshots.is_empty() {
        return Err(format!("no snapshots for version {version}").into());
    }
    println!("Version {version}");
    for snapshot in snapshots {
        println!(
            "  {:<9} {}  sha256:{}  {} properties",
            snapshot.resource.state.to_string(),
            snapshot.resource.path,
            snapshot.content_digest.get(..12).unwrap_or(snapshot.content_digest.as_str()),
            snapshot.properties.len()
        );
    }
    Ok(())
}
