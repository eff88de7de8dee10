//! CLI command implementations.

pub mod history;
pub mod init;
pub mod inspect;
pub mod publish;
pub mod stage;

use cmspub_store::FileStore;
use std::path::Path;

/// Result type shared by every command.
pub type CmdResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Opens an existing store directory.
pub fn open_store(path: &Path) -> CmdResult<FileStore> {
    if !path.join("store.cbor").exists() {
        return Err(format!("No store found at {:?}; run `cmspub init` first", path).into());
    }
    Ok(FileStore::open(path)?)
}

fn format_timestamp(ms: u64) -> String {
    let secs = ms / 1000;
    let days = secs / 86400;
    format!(
        "{} days, {:02}:{:02}:{:02} since epoch",
        days,
        (secs / 3600) % 24,
        (secs / 60) % 60,
        secs % 60
    )
}
