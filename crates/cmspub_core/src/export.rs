//! Mirroring of published resources onto an external filesystem.
//!
//! Resources below a configured export point are written to disk as they
//! are published. Paths outside every export point are a no-op.

use crate::config::{ExportPoint, PublishConfig};
use crate::error::{PublishError, PublishResult};
use cmspub_store::types::is_same_or_below;
use cmspub_store::Resource;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Hooks invoked by the orchestrator for every published resource.
///
/// Failures of `on_folder_create` and `on_write` are fatal to the run.
/// Failures of `on_remove` are logged and ignored by the orchestrator.
pub trait ExportAdapter: Send + Sync {
    /// Returns the key of the export rule matching `path`, if any.
    fn export_key(&self, path: &str) -> Option<&str>;

    /// Mirrors a folder creation.
    fn on_folder_create(&self, folder: &Resource) -> PublishResult<()>;

    /// Mirrors a file content write.
    fn on_write(&self, file: &Resource, content: &[u8]) -> PublishResult<()>;

    /// Mirrors the removal of a folder or file.
    fn on_remove(&self, resource: &Resource) -> PublishResult<()>;
}

/// Adapter for deployments without export points.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopExporter;

impl ExportAdapter for NoopExporter {
    fn export_key(&self, _path: &str) -> Option<&str> {
        None
    }

    fn on_folder_create(&self, _folder: &Resource) -> PublishResult<()> {
        Ok(())
    }

    fn on_write(&self, _file: &Resource, _content: &[u8]) -> PublishResult<()> {
        Ok(())
    }

    fn on_remove(&self, _resource: &Resource) -> PublishResult<()> {
        Ok(())
    }
}

/// Writes exported resources into local directories.
///
/// A resource at `<prefix>/a/b.html` is mirrored at
/// `<destination>/a/b.html`. When export points nest, the longest prefix
/// wins. File writes go through a temporary sibling and a rename, so a
/// reader never sees a half-written file.
#[derive(Debug, Clone, Default)]
pub struct FsExporter {
    points: Vec<ExportPoint>,
}

impl FsExporter {
    /// Creates an exporter for the given export points.
    pub fn new(points: Vec<ExportPoint>) -> Self {
        Self { points }
    }

    /// Creates an exporter from the export points of `config`.
    pub fn from_config(config: &PublishConfig) -> Self {
        Self::new(config.export_points.clone())
    }

    fn matching_point(&self, path: &str) -> Option<&ExportPoint> {
        self.points
            .iter()
            .filter(|p| is_same_or_below(path, &p.prefix))
            .max_by_key(|p| p.prefix.trim_end_matches('/').len())
    }

    /// Returns the filesystem location of `path`, `None` if not exported.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the path contains `.` or `..` segments.
    pub fn target_path(&self, path: &str) -> io::Result<Option<PathBuf>> {
        let Some(point) = self.matching_point(path) else {
            return Ok(None);
        };
        let prefix = point.prefix.trim_end_matches('/');
        let relative = path.strip_prefix(prefix).unwrap_or(path);

        let mut target = point.destination.clone();
        for segment in relative.split('/').filter(|s| !s.is_empty()) {
            if segment == "." || segment == ".." {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("refusing to export path with relative segment: {path}"),
                ));
            }
            target.push(segment);
        }
        Ok(Some(target))
    }

    fn resolve(&self, resource: &Resource) -> PublishResult<Option<PathBuf>> {
        self.target_path(&resource.path).map_err(|e| {
            PublishError::export(resource.path.clone(), PathBuf::new(), e)
        })
    }
}

impl ExportAdapter for FsExporter {
    fn export_key(&self, path: &str) -> Option<&str> {
        self.matching_point(path).map(|p| p.prefix.as_str())
    }

    fn on_folder_create(&self, folder: &Resource) -> PublishResult<()> {
        let Some(target) = self.resolve(folder)? else {
            return Ok(());
        };
        fs::create_dir_all(&target)
            .map_err(|e| PublishError::export(folder.path.clone(), target.clone(), e))?;
        debug!(path = %folder.path, target = %target.display(), "exported folder");
        Ok(())
    }

    fn on_write(&self, file: &Resource, content: &[u8]) -> PublishResult<()> {
        let Some(target) = self.resolve(file)? else {
            return Ok(());
        };
        atomic_write(&target, content)
            .map_err(|e| PublishError::export(file.path.clone(), target.clone(), e))?;
        debug!(path = %file.path, target = %target.display(), bytes = content.len(), "exported file");
        Ok(())
    }

    fn on_remove(&self, resource: &Resource) -> PublishResult<()> {
        let Some(target) = self.resolve(resource)? else {
            return Ok(());
        };
        let result = if resource.is_folder() {
            fs::remove_dir_all(&target)
        } else {
            fs::remove_file(&target)
        };
        match result {
            Ok(()) => {
                debug!(path = %resource.path, target = %target.display(), "removed export");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PublishError::export(resource.path.clone(), target, e)),
        }
    }
}

/// Writes `content` to `<path>.cmspub.tmp`, then renames it over `path`.
fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = PathBuf::from(format!("{}.cmspub.tmp", path.display()));
    fs::write(&tmp, content)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}
