//! Versioned history snapshots written during a publish run.
//!
//! All snapshots of one run share a single backup version, so the state of
//! any resource "immediately after publish N" can be queried by version.
//! Records are append-only; this module never updates or removes one.

use cmspub_store::{
    BackupRecord, HistoryStore, ProjectRecord, PropertyMap, Resource, StoreResult, UserId,
    WorkspaceId,
};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use tracing::{debug, trace};

/// Version used by runs that do not record history.
pub const UNVERSIONED: u64 = 1;

/// Writes history records for one publish run.
///
/// The version is claimed from the store on the first write, so a run that
/// publishes nothing leaves the store untouched. Until then [`version`]
/// reports the value the store would hand out next.
///
/// [`version`]: HistoryWriter::version
#[derive(Debug, Clone)]
pub struct HistoryWriter {
    enabled: bool,
    version: u64,
    reserved: bool,
    published_at: u64,
    published_by: UserId,
}

impl HistoryWriter {
    /// Starts a run. With history disabled the version is [`UNVERSIONED`]
    /// and nothing is ever written.
    pub fn begin<S: HistoryStore + ?Sized>(
        store: &S,
        enabled: bool,
        published_at: u64,
        published_by: UserId,
    ) -> StoreResult<Self> {
        let version = if enabled {
            store.next_backup_version()?
        } else {
            UNVERSIONED
        };
        Ok(Self {
            enabled,
            version,
            reserved: false,
            published_at,
            published_by,
        })
    }

    /// Backup version of this run.
    pub fn version(&self) -> u64 {
        self.version
    }

    fn reserve<S: HistoryStore + ?Sized>(&mut self, store: &S) -> StoreResult<u64> {
        if !self.reserved {
            self.version = store.reserve_backup_version()?;
            self.reserved = true;
            debug!(version = self.version, "reserved backup version");
        }
        Ok(self.version)
    }

    /// Snapshots `resource` as it is in `workspace`, with `properties`.
    ///
    /// Must be called before the offline state is reset or the resource is
    /// removed. A no-op when history is disabled.
    pub fn snapshot<S: HistoryStore + ?Sized>(
        &mut self,
        store: &S,
        workspace: WorkspaceId,
        resource: &Resource,
        properties: &PropertyMap,
    ) -> StoreResult<()> {
        if !self.enabled {
            return Ok(());
        }
        let version = self.reserve(store)?;
        let record = BackupRecord {
            version,
            workspace,
            published_at: self.published_at,
            published_by: self.published_by,
            resource: resource.clone(),
            properties: properties.clone(),
            content_digest: content_digest(&resource.content),
        };
        store.write_snapshot(&record)?;
        trace!(path = %resource.path, version, "wrote history snapshot");
        Ok(())
    }

    /// Writes the workspace-level record closing the run.
    pub fn write_project_record<S: HistoryStore + ?Sized>(
        &mut self,
        store: &S,
        workspace: WorkspaceId,
        resource_count: u64,
    ) -> StoreResult<()> {
        if !self.enabled {
            return Ok(());
        }
        let version = self.reserve(store)?;
        store.write_project_record(&ProjectRecord {
            version,
            workspace,
            published_at: self.published_at,
            published_by: self.published_by,
            resource_count,
        })
    }
}

/// Hex SHA-256 of `content`.
pub fn content_digest(content: &[u8]) -> String {
    let digest = Sha256::digest(content);
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest.iter() {
        let _ = write!(out, "{byte:02x}");
    }
    out
}
