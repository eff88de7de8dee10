//! The publish orchestrator.
//!
//! A run reconciles one offline workspace into the online workspace in three
//! phases:
//!
//! 1. folders, in discovery order (parents exist online before any child)
//! 2. files, in discovery order
//! 3. folders marked deleted, in reverse discovery order
//!
//! There is no surrounding transaction. Each store call commits on its own
//! and a failed run leaves its partial work in place; re-running converges
//! because `NEW` collisions fall back to updates and property failures are
//! not fatal.

use crate::config::PublishConfig;
use crate::error::{PublishError, PublishResult};
use crate::export::{ExportAdapter, NoopExporter};
use crate::history::HistoryWriter;
use crate::id_cache::IdCache;
use crate::properties::{PropertyReplicator, ReplicationMode};
use crate::state::PublishAction;
use cmspub_store::types::{is_same_or_below, now_millis};
use cmspub_store::{
    Backend, LockService, PropertyMap, Resource, ResourceState, ResourceStore, UserId,
    WorkspaceId, ROOT_PATH,
};
use std::collections::HashSet;
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

/// Counters describing what a run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishStats {
    /// Online resources created.
    pub created: u64,
    /// Online resources overwritten.
    pub updated: u64,
    /// Resources removed from both workspaces.
    pub deleted: u64,
    /// `NEW` resources that already existed online and were updated.
    pub fallback_updates: u64,
    /// Resources skipped because another workspace holds their lock.
    pub skipped_locked: u64,
    /// Temporary files dropped from the offline workspace.
    pub temp_removed: u64,
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct PublishReport {
    /// Identifier of the run, also attached to every log line.
    pub run_id: Uuid,
    /// Backup version of the run. A run that wrote no history reports the
    /// version the next run would claim.
    pub version: u64,
    /// Paths of every published resource, in processing order.
    pub changed_paths: Vec<String>,
    /// Counters.
    pub stats: PublishStats,
    /// Non-fatal failures that were logged and skipped.
    pub warnings: Vec<String>,
}

/// Publishes offline workspaces into the online workspace.
///
/// # Example
///
/// ```rust
/// use cmspub_core::{PublishConfig, Publisher};
/// use cmspub_store::{InMemoryStore, Resource, ResourceState, UserId, WorkspaceId};
///
/// let online = WorkspaceId::new(1);
/// let offline = WorkspaceId::new(2);
/// let store = InMemoryStore::new();
/// store.create_workspace(online, "Online").unwrap();
/// store.create_workspace(offline, "Offline").unwrap();
/// store.seed(offline, &Resource::folder("/a").with_state(ResourceState::New)).unwrap();
/// store.seed(offline, &Resource::file("/a/x.html", "hi").with_state(ResourceState::New)).unwrap();
///
/// let config = PublishConfig::default();
/// let report = Publisher::new(&store, &config)
///     .publish(UserId::new(1), offline, online, true)
///     .unwrap();
/// assert_eq!(report.changed_paths, vec!["/a", "/a/x.html"]);
/// ```
pub struct Publisher<'a, S: Backend + ?Sized> {
    store: &'a S,
    config: &'a PublishConfig,
    exporter: &'a dyn ExportAdapter,
}

impl<'a, S: Backend + ?Sized> Publisher<'a, S> {
    /// Creates a publisher without export points.
    pub fn new(store: &'a S, config: &'a PublishConfig) -> Self {
        Self {
            store,
            config,
            exporter: &NoopExporter,
        }
    }

    /// Mirrors published resources through `exporter`.
    #[must_use]
    pub fn with_exporter(mut self, exporter: &'a dyn ExportAdapter) -> Self {
        self.exporter = exporter;
        self
    }

    /// Publishes every modified resource of `source` into `target`.
    ///
    /// Two runs for the same source must not overlap; callers serialize them.
    ///
    /// # Errors
    ///
    /// - `InvalidTarget` if `target` is not the configured online workspace
    ///   or equals `source`; nothing is touched in that case
    /// - `UnresolvedParent` if a resource's online parent folder is missing
    /// - `Store` for failures on the create/update/delete path
    /// - `Export` if mirroring a folder or file write fails
    ///
    /// Changes applied before the error stay committed.
    pub fn publish(
        &self,
        actor: UserId,
        source: WorkspaceId,
        target: WorkspaceId,
        history_enabled: bool,
    ) -> PublishResult<PublishReport> {
        if target != self.config.online_workspace {
            return Err(PublishError::InvalidTarget {
                source_ws: source,
                target_ws: target,
                reason: format!("online workspace is {}", self.config.online_workspace),
            });
        }
        if source == target {
            return Err(PublishError::InvalidTarget {
                source_ws: source,
                target_ws: target,
                reason: "cannot publish the online workspace into itself".into(),
            });
        }

        let run_id = Uuid::new_v4();
        let span = info_span!("publish", run = %run_id, source = %source, target = %target);
        let _enter = span.enter();

        let history = HistoryWriter::begin(self.store, history_enabled, now_millis(), actor)?;
        info!(version = history.version(), history = history_enabled, "publish started");

        let mut run = Run {
            store: self.store,
            config: self.config,
            exporter: self.exporter,
            source,
            target,
            cache: IdCache::new(source, target),
            history,
            changed: Vec::new(),
            seen: HashSet::new(),
            deleted_folders: Vec::new(),
            locked_paths: Vec::new(),
            stats: PublishStats::default(),
            warnings: Vec::new(),
        };

        for folder in self.store.read_folders(source)? {
            run.publish_folder(folder)?;
        }
        for file in self.store.read_files(source)? {
            run.publish_file(file)?;
        }
        run.delete_folders()?;

        if !run.changed.is_empty() {
            run.history
                .write_project_record(self.store, source, run.changed.len() as u64)?;
        }

        info!(
            changed = run.changed.len(),
            created = run.stats.created,
            updated = run.stats.updated,
            deleted = run.stats.deleted,
            warnings = run.warnings.len(),
            "publish finished"
        );

        Ok(PublishReport {
            run_id,
            version: run.history.version(),
            changed_paths: run.changed,
            stats: run.stats,
            warnings: run.warnings,
        })
    }
}

/// Mutable state of one run.
struct Run<'a, S: Backend + ?Sized> {
    store: &'a S,
    config: &'a PublishConfig,
    exporter: &'a dyn ExportAdapter,
    source: WorkspaceId,
    target: WorkspaceId,
    cache: IdCache,
    history: HistoryWriter,
    changed: Vec<String>,
    seen: HashSet<String>,
    deleted_folders: Vec<Resource>,
    locked_paths: Vec<String>,
    stats: PublishStats,
    warnings: Vec<String>,
}

impl<'a, S: Backend + ?Sized> Run<'a, S> {
    fn action_for(&mut self, resource: &Resource) -> PublishAction {
        let locked = self
            .store
            .is_locked_by_other_workspace(resource, self.source);
        let action = PublishAction::decide(resource, locked, self.config);
        if action == PublishAction::SkipLocked {
            self.stats.skipped_locked += 1;
            self.locked_paths.push(resource.path.clone());
            debug!(path = %resource.path, "locked in another workspace, skipping");
        }
        action
    }

    fn publish_folder(&mut self, folder: Resource) -> PublishResult<()> {
        let action = self.action_for(&folder);
        if action == PublishAction::Delete && folder.path == ROOT_PATH {
            self.warn(format!("ignoring deletion of root folder in {}", self.source));
            return Ok(());
        }
        if action.touches_online() {
            self.mark_changed(&folder.path);
        }
        let id = folder.id;
        match action {
            PublishAction::Skip | PublishAction::SkipLocked | PublishAction::DropTemporary => {}
            PublishAction::Delete => {
                debug!(path = %folder.path, "folder queued for deletion");
                self.deleted_folders.push(folder);
            }
            PublishAction::Create | PublishAction::Update => {
                debug!(path = %folder.path, ?action, "publishing folder");
                self.exporter.on_folder_create(&folder)?;
                let props = self.read_properties(&folder);
                self.upsert(&folder, action, props.as_ref())?;
                self.history.snapshot(
                    self.store,
                    self.source,
                    &folder,
                    &props.unwrap_or_default(),
                )?;
            }
        }
        if action.resets_offline_state() {
            self.store
                .set_state(self.source, id, ResourceState::Unchanged)?;
        }
        Ok(())
    }

    fn publish_file(&mut self, file: Resource) -> PublishResult<()> {
        let action = self.action_for(&file);
        if action.touches_online() {
            self.mark_changed(&file.path);
        }
        match action {
            PublishAction::Skip | PublishAction::SkipLocked => {}
            PublishAction::DropTemporary => {
                debug!(path = %file.path, "dropping temporary file");
                self.store.remove_file(self.source, &file.path)?;
                self.stats.temp_removed += 1;
            }
            PublishAction::Delete => {
                debug!(path = %file.path, "deleting file");
                self.remove_export(&file);
                let props = self.read_properties(&file).unwrap_or_default();
                self.history.snapshot(self.store, self.source, &file, &props)?;
                // A missing online counterpart means an earlier run already
                // removed it.
                if let Some(online) = self.store.try_find(self.target, &file.path)? {
                    self.delete_properties(self.target, &online);
                    self.store.delete(self.target, online.id)?;
                }
                self.delete_properties(self.source, &file);
                self.store.delete(self.source, file.id)?;
                self.stats.deleted += 1;
            }
            PublishAction::Create | PublishAction::Update => {
                debug!(path = %file.path, ?action, "publishing file");
                self.exporter.on_write(&file, &file.content)?;
                let props = self.read_properties(&file);
                self.upsert(&file, action, props.as_ref())?;
                self.history.snapshot(
                    self.store,
                    self.source,
                    &file,
                    &props.unwrap_or_default(),
                )?;
            }
        }
        if action.resets_offline_state() {
            self.store
                .set_state(self.source, file.id, ResourceState::Unchanged)?;
        }
        Ok(())
    }

    /// Deletes queued folders, children first.
    ///
    /// A folder with a descendant locked in another workspace is kept in both
    /// workspaces and stays `DELETED`, so a later run retries it.
    fn delete_folders(&mut self) -> PublishResult<()> {
        let folders = std::mem::take(&mut self.deleted_folders);
        for folder in folders.iter().rev() {
            let locked = self
                .locked_paths
                .iter()
                .find(|path| is_same_or_below(path, &folder.path))
                .cloned();
            if let Some(locked) = locked {
                self.warn(format!(
                    "keeping deleted folder {}: {locked} is locked in another workspace",
                    folder.path
                ));
                self.unmark_changed(&folder.path);
                continue;
            }

            debug!(path = %folder.path, "deleting folder");
            self.remove_export(folder);
            let props = self.read_properties(folder).unwrap_or_default();
            self.history.snapshot(self.store, self.source, folder, &props)?;
            self.delete_properties(self.source, folder);
            self.store.delete_folder(self.target, &folder.path)?;
            self.store.delete_folder(self.source, &folder.path)?;
            self.stats.deleted += 1;
        }
        Ok(())
    }

    /// Creates or overwrites the online counterpart of `resource` and copies
    /// its properties.
    fn upsert(
        &mut self,
        resource: &Resource,
        action: PublishAction,
        props: Option<&PropertyMap>,
    ) -> PublishResult<Resource> {
        // The root always exists online, so a NEW root is just an update.
        if action == PublishAction::Create && resource.parent_id.is_some() {
            let parent = self.cache.parent_of(self.store, resource)?;
            let template = resource.published_copy();
            let created = if resource.is_folder() {
                self.store.create_folder(self.target, parent, &template)
            } else {
                self.store.create_file(self.target, parent, &template)
            };
            match created {
                Ok(online) => {
                    self.cache.put(resource.id, online.id);
                    self.replicate(props, &online, ReplicationMode::Fresh);
                    self.stats.created += 1;
                    return Ok(online);
                }
                Err(e) if e.is_already_exists() => {
                    debug!(path = %resource.path, "NEW resource already online, updating instead");
                    self.stats.fallback_updates += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }

        let existing = self.find_or_create(resource)?;
        let template = resource.published_copy();
        let online = if resource.is_folder() {
            self.store
                .overwrite_metadata(self.target, existing.id, &template, ResourceState::Unchanged)?
        } else {
            self.store.overwrite_metadata_and_content(
                self.target,
                existing.id,
                &template,
                ResourceState::Unchanged,
            )?
        };
        self.cache.put(resource.id, online.id);
        self.replicate(props, &online, ReplicationMode::Overwrite);
        self.stats.updated += 1;
        Ok(online)
    }

    /// Locates the online resource at the same path, creating it below the
    /// resolved parent if it is missing.
    fn find_or_create(&mut self, resource: &Resource) -> PublishResult<Resource> {
        if let Some(found) = self.store.try_find(self.target, &resource.path)? {
            return Ok(found);
        }
        let parent = self.cache.parent_of(self.store, resource)?;
        let template = resource.published_copy();
        let created = if resource.is_folder() {
            self.store.create_folder(self.target, parent, &template)?
        } else {
            self.store.create_file(self.target, parent, &template)?
        };
        debug!(path = %resource.path, "created missing online counterpart");
        Ok(created)
    }

    /// Reads the offline properties of `resource` once for replication and
    /// history. A failed read is a warning.
    fn read_properties(&mut self, resource: &Resource) -> Option<PropertyMap> {
        match PropertyReplicator::new(self.store).read(self.source, resource) {
            Ok(props) => Some(props),
            Err(e) => {
                self.warn(format!("reading properties of {} failed: {e}", resource.path));
                None
            }
        }
    }

    /// Copies `props` onto `online`. Without props (the read failed) the
    /// online properties are left as they are.
    fn replicate(&mut self, props: Option<&PropertyMap>, online: &Resource, mode: ReplicationMode) {
        let Some(props) = props else {
            return;
        };
        let result =
            PropertyReplicator::new(self.store).replicate(props, self.target, online, mode);
        if let Err(e) = result {
            self.warn(format!("property replication failed for {}: {e}", online.path));
        }
    }

    fn delete_properties(&mut self, workspace: WorkspaceId, resource: &Resource) {
        if let Err(e) = PropertyReplicator::new(self.store).delete_all(workspace, resource) {
            self.warn(format!(
                "deleting properties of {} in {workspace} failed: {e}",
                resource.path
            ));
        }
    }

    fn remove_export(&mut self, resource: &Resource) {
        if let Err(e) = self.exporter.on_remove(resource) {
            self.warn(format!("export cleanup failed: {e}"));
        }
    }

    fn mark_changed(&mut self, path: &str) {
        if self.seen.insert(path.to_string()) {
            self.changed.push(path.to_string());
        }
    }

    fn unmark_changed(&mut self, path: &str) {
        if self.seen.remove(path) {
            self.changed.retain(|p| p != path);
        }
    }

    fn warn(&mut self, message: String) {
        warn!("{message}");
        self.warnings.push(message);
    }
}
