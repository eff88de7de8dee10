//! Publish engine configuration.

use cmspub_store::WorkspaceId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default id of the online workspace.
pub const DEFAULT_ONLINE_WORKSPACE: WorkspaceId = WorkspaceId::new(1);

/// Default prefix marking temporary files that are never published.
pub const DEFAULT_TEMP_FILE_PREFIX: &str = "~";

/// Configuration of a publish engine instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// The single online workspace every run publishes into.
    pub online_workspace: WorkspaceId,

    /// Files whose name starts with this prefix are dropped from the
    /// offline workspace instead of being published.
    pub temp_file_prefix: String,

    /// Whether runs write history snapshots unless told otherwise.
    pub history_enabled: bool,

    /// Paths mirrored onto the external filesystem.
    pub export_points: Vec<ExportPoint>,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            online_workspace: DEFAULT_ONLINE_WORKSPACE,
            temp_file_prefix: DEFAULT_TEMP_FILE_PREFIX.to_string(),
            history_enabled: true,
            export_points: Vec::new(),
        }
    }
}

impl PublishConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the online workspace.
    #[must_use]
    pub fn online_workspace(mut self, workspace: WorkspaceId) -> Self {
        self.online_workspace = workspace;
        self
    }

    /// Sets the temporary file prefix.
    #[must_use]
    pub fn temp_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.temp_file_prefix = prefix.into();
        self
    }

    /// Sets the default for history snapshots.
    #[must_use]
    pub fn history_enabled(mut self, value: bool) -> Self {
        self.history_enabled = value;
        self
    }

    /// Adds an export point.
    #[must_use]
    pub fn export_point(mut self, point: ExportPoint) -> Self {
        self.export_points.push(point);
        self
    }

    /// Returns true if a file name marks a temporary file.
    pub fn is_temporary(&self, name: &str) -> bool {
        !self.temp_file_prefix.is_empty() && name.starts_with(&self.temp_file_prefix)
    }
}

/// A path prefix whose resources are mirrored into a filesystem directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportPoint {
    /// Resource path prefix, e.g. `/sites/default/export`.
    pub prefix: String,
    /// Directory receiving the mirrored tree.
    pub destination: PathBuf,
}

impl ExportPoint {
    /// Creates an export point.
    pub fn new(prefix: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
            destination: destination.into(),
        }
    }
}
