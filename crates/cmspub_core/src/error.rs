//! Error types for the publish engine.

use cmspub_store::{StoreError, WorkspaceId};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for publish operations.
pub type PublishResult<T> = Result<T, PublishError>;

/// Fatal errors of a publish run.
///
/// Property replication failures and best-effort export deletions never
/// surface here; they are logged and collected as warnings on the report.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Backing store error on the resource create/update/delete path.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The online parent folder of a resource could not be located.
    #[error("cannot resolve online parent of {path}")]
    UnresolvedParent {
        /// Path of the resource being published.
        path: String,
        /// Underlying lookup failure, if any.
        #[source]
        source: Option<StoreError>,
    },

    /// Mirroring a resource onto an export point failed.
    #[error("export of {path} to {target} failed: {source}")]
    Export {
        /// Resource path.
        path: String,
        /// Filesystem destination.
        target: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// The run was asked to publish into a workspace that is not the online
    /// workspace, or into the source itself.
    #[error("invalid publish target: {source_ws} -> {target_ws}: {reason}")]
    InvalidTarget {
        /// Source workspace.
        source_ws: WorkspaceId,
        /// Requested target workspace.
        target_ws: WorkspaceId,
        /// Why the pair was rejected.
        reason: String,
    },
}

impl PublishError {
    /// Creates an unresolved parent error.
    pub fn unresolved_parent(path: impl Into<String>, source: Option<StoreError>) -> Self {
        Self::UnresolvedParent {
            path: path.into(),
            source,
        }
    }

    /// Creates an export error.
    pub fn export(path: impl Into<String>, target: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Export {
            path: path.into(),
            target: target.into(),
            source,
        }
    }
}
