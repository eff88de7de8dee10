//! End-to-end publish runs against in-memory and file-backed stores.

use cmspub_core::{
    ExportAdapter, ExportPoint, FsExporter, PublishConfig, PublishError, PublishReport,
    PublishResult, Publisher, UNVERSIONED,
};
use cmspub_store::{
    Backend, HistoryStore, InMemoryStore, PropertyDefinition, PropertyStore, Resource, ResourceState,
    ResourceStore, WorkspaceId,
};
use cmspub_testkit::prelude::*;
use proptest::prelude::*;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::TempDir;

fn publish(store: &TestStore) -> PublishReport {
    let config = PublishConfig::default();
    Publisher::new(&**store, &config)
        .publish(ACTOR, OFFLINE, ONLINE, true)
        .expect("publish failed")
}

fn instrumented() -> InstrumentedStore<InMemoryStore> {
    let inner = InMemoryStore::new();
    inner.create_workspace(ONLINE, "Online").unwrap();
    inner.create_workspace(OFFLINE, "Offline").unwrap();
    InstrumentedStore::new(inner)
}

fn stage(store: &InstrumentedStore<InMemoryStore>, ws: WorkspaceId, template: Resource) -> Resource {
    store.inner().seed(ws, &template).unwrap()
}

fn publish_instrumented(store: &InstrumentedStore<InMemoryStore>) -> PublishResult<PublishReport> {
    let config = PublishConfig::default();
    Publisher::new(store, &config).publish(ACTOR, OFFLINE, ONLINE, true)
}

/// Records every export hook; optionally fails removals.
#[derive(Default)]
struct RecordingExporter {
    events: Mutex<Vec<String>>,
    fail_remove: bool,
}

impl RecordingExporter {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl ExportAdapter for RecordingExporter {
    fn export_key(&self, _path: &str) -> Option<&str> {
        Some("/")
    }

    fn on_folder_create(&self, folder: &Resource) -> PublishResult<()> {
        self.events.lock().unwrap().push(format!("mkdir {}", folder.path));
        Ok(())
    }

    fn on_write(&self, file: &Resource, content: &[u8]) -> PublishResult<()> {
        self.events
            .lock()
            .unwrap()
            .push(format!("write {} {}", file.path, content.len()));
        Ok(())
    }

    fn on_remove(&self, resource: &Resource) -> PublishResult<()> {
        self.events.lock().unwrap().push(format!("rm {}", resource.path));
        if self.fail_remove {
            return Err(PublishError::export(
                resource.path.clone(),
                PathBuf::from("/nowhere"),
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn new_folder_with_new_file() {
    let store = TestStore::memory();
    store.folder("/a", ResourceState::New);
    store.file_in("/a/x.html", "<h1>x</h1>", ResourceState::New);

    let report = publish(&store);

    assert_eq!(report.changed_paths, vec!["/a", "/a/x.html"]);
    assert_eq!(report.stats.created, 2);
    assert!(report.warnings.is_empty());

    let online_folder = store.get(ONLINE, "/a");
    let online_file = store.get(ONLINE, "/a/x.html");
    assert_eq!(online_file.parent_id, Some(online_folder.id));
    assert_eq!(online_file.state, ResourceState::Unchanged);
    assert_eq!(&online_file.content[..], b"<h1>x</h1>");

    assert_eq!(store.get(OFFLINE, "/a").state, ResourceState::Unchanged);
    assert_eq!(store.get(OFFLINE, "/a/x.html").state, ResourceState::Unchanged);

    let snapshots = store.read_snapshots(report.version).unwrap();
    assert_eq!(snapshots.len(), 2);
    let records = store.read_project_records().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].version, report.version);
    assert_eq!(records[0].workspace, OFFLINE);
}

#[test]
fn new_file_colliding_with_online_file_is_updated() {
    let store = TestStore::memory();
    store.folder("/a", ResourceState::Unchanged);
    store.online_folder("/a");
    let existing = store.online_file("/a/x.html", "old");
    store.set_property(ONLINE, &existing, "stale", "yes");

    let offline = store.file_in("/a/x.html", "new", ResourceState::New);
    store.set_property(OFFLINE, &offline, "title", "New");

    let report = publish(&store);

    assert_eq!(report.stats.fallback_updates, 1);
    assert_eq!(report.stats.updated, 1);
    assert_eq!(report.stats.created, 0);

    let online = store.get(ONLINE, "/a/x.html");
    assert_eq!(online.id, existing.id);
    assert_eq!(&online.content[..], b"new");

    let props = store
        .read_all_properties(ONLINE, online.id, online.resource_type)
        .unwrap();
    assert_eq!(props.len(), 1);
    assert_eq!(props["title"], "New");
}

#[test]
fn deleted_file_is_snapshotted_once_and_removed() {
    let store = TestStore::memory();
    store.online_file("/old.html", "gone soon");
    store.file_in("/old.html", "gone soon", ResourceState::Deleted);

    let report = publish(&store);

    assert_eq!(report.changed_paths, vec!["/old.html"]);
    assert_eq!(report.stats.deleted, 1);
    assert!(store.find(ONLINE, "/old.html").is_none());
    assert!(store.find(OFFLINE, "/old.html").is_none());

    let snapshots = store.read_snapshots(report.version).unwrap();
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].resource.path, "/old.html");
    assert_eq!(snapshots[0].resource.state, ResourceState::Deleted);
    assert_eq!(&snapshots[0].resource.content[..], b"gone soon");
}

#[test]
fn deleted_file_without_online_copy_still_converges() {
    let store = TestStore::memory();
    store.file_in("/never-published.html", "x", ResourceState::Deleted);

    let report = publish(&store);
    assert_eq!(report.stats.deleted, 1);
    assert!(store.find(OFFLINE, "/never-published.html").is_none());
}

#[test]
fn property_failure_only_warns() {
    let store = instrumented();
    stage(&store, OFFLINE, Resource::folder("/a").with_state(ResourceState::New));
    let file = stage(
        &store,
        OFFLINE,
        Resource::file("/a/x.html", "x").with_state(ResourceState::New),
    );
    store
        .define_property(PropertyDefinition::new("title", file.resource_type))
        .unwrap();
    store
        .write_property("title", OFFLINE, "X", file.id, file.resource_type)
        .unwrap();
    store.fail_property_writes("/a/x.html");
    store.fail_property_reads("/a");

    let report = publish_instrumented(&store).unwrap();

    assert_eq!(report.warnings.len(), 2, "warnings: {:?}", report.warnings);
    assert!(report.warnings[0].contains("reading properties of /a "));
    assert!(report.warnings[1].contains("/a/x.html"));
    assert!(store.try_find(ONLINE, "/a").unwrap().is_some());
    assert!(store.try_find(ONLINE, "/a/x.html").unwrap().is_some());
    assert_eq!(
        store.try_find(OFFLINE, "/a/x.html").unwrap().unwrap().state,
        ResourceState::Unchanged
    );

    // Unreadable properties are snapshotted as empty.
    let snapshots = store.read_snapshots(report.version).unwrap();
    let folder = snapshots.iter().find(|s| s.resource.path == "/a").unwrap();
    assert!(folder.properties.is_empty());
    let file = snapshots
        .iter()
        .find(|s| s.resource.path == "/a/x.html")
        .unwrap();
    assert_eq!(file.properties["title"], "X");
}

#[test]
fn locked_resource_is_neither_copied_nor_reset() {
    let store = TestStore::memory();
    store.locked_file("/busy.html", "x", ResourceState::New);

    let report = publish(&store);

    assert!(report.changed_paths.is_empty());
    assert_eq!(report.stats.skipped_locked, 1);
    assert!(store.find(ONLINE, "/busy.html").is_none());
    assert_eq!(store.get(OFFLINE, "/busy.html").state, ResourceState::New);
}

#[test]
fn deleted_folder_with_locked_descendant_is_kept() {
    let store = TestStore::memory();
    store.online_folder("/a");
    store.online_file("/a/x.html", "published");
    store.online_file("/a/y.html", "y");
    store.folder("/a", ResourceState::Deleted);
    store.locked_file("/a/x.html", "draft", ResourceState::Changed);
    store.file_in("/a/y.html", "y", ResourceState::Deleted);

    let report = publish(&store);

    assert_eq!(report.stats.skipped_locked, 1);
    assert_eq!(report.stats.deleted, 1);
    assert_eq!(report.changed_paths, vec!["/a/y.html"]);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("/a/x.html"));

    // The locked file and its folders survive in both workspaces.
    assert_eq!(store.get(OFFLINE, "/a").state, ResourceState::Deleted);
    assert_eq!(store.get(OFFLINE, "/a/x.html").state, ResourceState::Changed);
    assert_eq!(&store.get(ONLINE, "/a/x.html").content[..], b"published");
    assert!(store.find(ONLINE, "/a").is_some());
    assert!(store.find(ONLINE, "/a/y.html").is_none());

    let snapshots = store.read_snapshots(report.version).unwrap();
    let paths: Vec<_> = snapshots.iter().map(|s| s.resource.path.as_str()).collect();
    assert_eq!(paths, vec!["/a/y.html"]);
}

#[test]
fn temporary_file_is_dropped_not_published() {
    let store = TestStore::memory();
    store.folder("/a", ResourceState::New);
    store.file_in("/a/~draft.html", "wip", ResourceState::New);

    let report = publish(&store);

    assert_eq!(report.changed_paths, vec!["/a"]);
    assert_eq!(report.stats.temp_removed, 1);
    assert!(store.find(OFFLINE, "/a/~draft.html").is_none());
    assert!(store.find(ONLINE, "/a/~draft.html").is_none());
}

#[test]
fn unchanged_resources_are_left_alone() {
    let store = TestStore::memory();
    store.online_file("/u.html", "online version");
    store.file_in("/u.html", "offline version", ResourceState::Unchanged);

    let report = publish(&store);

    assert!(report.changed_paths.is_empty());
    assert_eq!(&store.get(ONLINE, "/u.html").content[..], b"online version");
    assert!(store.read_project_records().unwrap().is_empty());
}

#[test]
fn disabled_history_writes_no_records() {
    let store = TestStore::memory();
    store.file_in("/x.html", "x", ResourceState::New);

    let config = PublishConfig::default();
    let report = Publisher::new(&*store, &config)
        .publish(ACTOR, OFFLINE, ONLINE, false)
        .unwrap();

    assert_eq!(report.version, UNVERSIONED);
    assert!(store.read_snapshots(UNVERSIONED).unwrap().is_empty());
    assert!(store.read_project_records().unwrap().is_empty());
    assert!(store.find(ONLINE, "/x.html").is_some());
}

#[test]
fn versions_increase_across_runs() {
    let store = TestStore::memory();
    store.file_in("/x.html", "x", ResourceState::New);
    let first = publish(&store);

    let file = store.get(OFFLINE, "/x.html");
    store
        .set_state(OFFLINE, file.id, ResourceState::Changed)
        .unwrap();
    let second = publish(&store);

    assert_eq!(second.version, first.version + 1);
    assert_eq!(store.read_project_records().unwrap().len(), 2);
}

/// Publishes [`OTHER`] from inside the first file write of an outer run,
/// so both runs are in flight before either writes history.
struct OverlappingRun<'a> {
    store: &'a (dyn Backend + 'static),
    inner: Mutex<Option<PublishReport>>,
}

impl ExportAdapter for OverlappingRun<'_> {
    fn export_key(&self, _path: &str) -> Option<&str> {
        Some("/")
    }

    fn on_folder_create(&self, _folder: &Resource) -> PublishResult<()> {
        Ok(())
    }

    fn on_write(&self, _file: &Resource, _content: &[u8]) -> PublishResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.is_none() {
            let config = PublishConfig::default();
            *inner = Some(Publisher::new(self.store, &config).publish(ACTOR, OTHER, ONLINE, true)?);
        }
        Ok(())
    }

    fn on_remove(&self, _resource: &Resource) -> PublishResult<()> {
        Ok(())
    }
}

#[test]
fn overlapping_runs_get_distinct_versions() {
    let store = TestStore::memory();
    store.file_in("/x.html", "x", ResourceState::New);
    store.seed(
        OTHER,
        &Resource::file("/y.html", "y").with_state(ResourceState::New),
    );

    let exporter = OverlappingRun {
        store: store.backend(),
        inner: Mutex::new(None),
    };
    let config = PublishConfig::default();
    let outer = Publisher::new(&*store, &config)
        .with_exporter(&exporter)
        .publish(ACTOR, OFFLINE, ONLINE, true)
        .unwrap();
    let inner = exporter.inner.lock().unwrap().take().unwrap();

    assert_ne!(outer.version, inner.version);
    let outer_paths: Vec<_> = store
        .read_snapshots(outer.version)
        .unwrap()
        .into_iter()
        .map(|s| s.resource.path)
        .collect();
    assert_eq!(outer_paths, vec!["/x.html"]);
    let inner_snapshots = store.read_snapshots(inner.version).unwrap();
    assert_eq!(inner_snapshots.len(), 1);
    assert_eq!(inner_snapshots[0].workspace, OTHER);

    let mut versions: Vec<_> = store
        .read_project_records()
        .unwrap()
        .iter()
        .map(|r| r.version)
        .collect();
    versions.sort_unstable();
    versions.dedup();
    assert_eq!(versions.len(), 2);
}

#[test]
fn invalid_target_touches_nothing() {
    let store = instrumented();
    stage(&store, OFFLINE, Resource::file("/x.html", "x").with_state(ResourceState::New));

    let config = PublishConfig::default();
    let err = Publisher::new(&store, &config)
        .publish(ACTOR, OFFLINE, WorkspaceId::new(9), true)
        .unwrap_err();

    assert!(matches!(err, PublishError::InvalidTarget { .. }));
    assert_eq!(store.mutation_count(), 0);
}

#[test]
fn missing_online_parent_is_fatal() {
    let store = TestStore::memory();
    // Published folder that vanished online.
    store.folder("/a", ResourceState::Unchanged);
    store.file_in("/a/x.html", "x", ResourceState::New);

    let config = PublishConfig::default();
    let err = Publisher::new(&*store, &config)
        .publish(ACTOR, OFFLINE, ONLINE, true)
        .unwrap_err();

    assert!(matches!(err, PublishError::UnresolvedParent { ref path, .. } if path == "/a/x.html"));
    assert_eq!(store.get(OFFLINE, "/a/x.html").state, ResourceState::New);
}

// ============================================================================
// Ordering
// ============================================================================

fn position(calls: &[Call], op: &str, ws: WorkspaceId, path: &str) -> usize {
    calls
        .iter()
        .position(|c| c.op == op && c.workspace == Some(ws) && c.path == path)
        .unwrap_or_else(|| panic!("no {op} on {path} in {ws}"))
}

#[test]
fn folders_are_created_before_their_files() {
    let store = instrumented();
    stage(&store, OFFLINE, Resource::folder("/a").with_state(ResourceState::New));
    stage(&store, OFFLINE, Resource::folder("/a/b").with_state(ResourceState::New));
    stage(
        &store,
        OFFLINE,
        Resource::file("/a/b/x.html", "x").with_state(ResourceState::New),
    );

    publish_instrumented(&store).unwrap();

    let calls = store.calls();
    let a = position(&calls, "create_folder", ONLINE, "/a");
    let b = position(&calls, "create_folder", ONLINE, "/a/b");
    let x = position(&calls, "create_file", ONLINE, "/a/b/x.html");
    assert!(a < b && b < x);
}

#[test]
fn folder_deletions_run_last_in_reverse_order() {
    let store = instrumented();
    let root = store.try_find(ONLINE, "/").unwrap().unwrap();
    let a = store.create_folder(ONLINE, root.id, &Resource::folder("/a")).unwrap();
    let b = store.create_folder(ONLINE, a.id, &Resource::folder("/a/b")).unwrap();
    store
        .create_file(ONLINE, b.id, &Resource::file("/a/b/z.html", "z"))
        .unwrap();
    stage(&store, OFFLINE, Resource::folder("/a").with_state(ResourceState::Deleted));
    stage(&store, OFFLINE, Resource::folder("/a/b").with_state(ResourceState::Deleted));
    stage(
        &store,
        OFFLINE,
        Resource::file("/a/b/z.html", "z").with_state(ResourceState::Deleted),
    );
    stage(&store, OFFLINE, Resource::folder("/c").with_state(ResourceState::New));
    store.clear();

    let report = publish_instrumented(&store).unwrap();
    assert_eq!(report.stats.deleted, 3);

    let calls = store.calls();
    let create_c = position(&calls, "create_folder", ONLINE, "/c");
    let delete_z = position(&calls, "delete", ONLINE, "/a/b/z.html");
    let delete_b = position(&calls, "delete_folder", ONLINE, "/a/b");
    let delete_a = position(&calls, "delete_folder", ONLINE, "/a");
    assert!(create_c < delete_z);
    assert!(delete_z < delete_b);
    assert!(delete_b < delete_a);

    assert!(store.try_find(ONLINE, "/a").unwrap().is_none());
    assert!(store.try_find(OFFLINE, "/a").unwrap().is_none());
}

// ============================================================================
// Idempotence and convergence
// ============================================================================

#[test]
fn second_run_performs_no_mutations() {
    let store = instrumented();
    stage(&store, OFFLINE, Resource::folder("/a").with_state(ResourceState::New));
    stage(
        &store,
        OFFLINE,
        Resource::file("/a/x.html", "x").with_state(ResourceState::Changed),
    );
    stage(
        &store,
        OFFLINE,
        Resource::file("/a/~tmp", "t").with_state(ResourceState::New),
    );
    publish_instrumented(&store).unwrap();
    store.clear();

    let report = publish_instrumented(&store).unwrap();

    assert!(report.changed_paths.is_empty());
    assert_eq!(store.mutation_count(), 0, "calls: {:?}", store.calls());
}

#[test]
fn rerun_after_interrupted_create_converges() {
    let store = instrumented();
    stage(&store, OFFLINE, Resource::folder("/a").with_state(ResourceState::New));
    stage(
        &store,
        OFFLINE,
        Resource::file("/a/x.html", "x").with_state(ResourceState::New),
    );
    stage(&store, OFFLINE, Resource::folder("/b").with_state(ResourceState::New));
    stage(
        &store,
        OFFLINE,
        Resource::file("/b/y.html", "y").with_state(ResourceState::New),
    );
    store.fail_once("create_file", "/b/y.html");

    let err = publish_instrumented(&store).unwrap_err();
    assert!(matches!(err, PublishError::Store(_)));
    // Work before the failure stays committed.
    assert!(store.try_find(ONLINE, "/a/x.html").unwrap().is_some());
    assert!(store.try_find(ONLINE, "/b/y.html").unwrap().is_none());

    let report = publish_instrumented(&store).unwrap();
    assert_eq!(report.changed_paths, vec!["/b/y.html"]);
    assert!(store.try_find(ONLINE, "/b/y.html").unwrap().is_some());
    assert_eq!(
        snapshot_workspace(&store, ONLINE).unwrap(),
        snapshot_workspace(&store, OFFLINE).unwrap()
    );
}

#[test]
fn rerun_after_lost_state_reset_falls_back_to_update() {
    let store = instrumented();
    stage(
        &store,
        OFFLINE,
        Resource::file("/x.html", "x").with_state(ResourceState::New),
    );
    store.fail_once("set_state", "/x.html");

    assert!(publish_instrumented(&store).is_err());
    let online = store.try_find(ONLINE, "/x.html").unwrap().unwrap();

    let report = publish_instrumented(&store).unwrap();
    assert_eq!(report.stats.fallback_updates, 1);
    assert_eq!(store.try_find(ONLINE, "/x.html").unwrap().unwrap().id, online.id);
    assert_eq!(
        store.try_find(OFFLINE, "/x.html").unwrap().unwrap().state,
        ResourceState::Unchanged
    );
}

// ============================================================================
// Export
// ============================================================================

#[test]
fn export_hooks_follow_publish_order() {
    let store = TestStore::memory();
    store.online_file("/old.html", "o");
    store.file_in("/old.html", "o", ResourceState::Deleted);
    store.folder("/a", ResourceState::New);
    store.file_in("/a/x.html", "xyz", ResourceState::New);

    let exporter = RecordingExporter::default();
    let config = PublishConfig::default();
    Publisher::new(&*store, &config)
        .with_exporter(&exporter)
        .publish(ACTOR, OFFLINE, ONLINE, true)
        .unwrap();

    assert_eq!(
        exporter.events(),
        vec!["mkdir /a", "rm /old.html", "write /a/x.html 3"]
    );
}

#[test]
fn export_removal_failure_only_warns() {
    let store = TestStore::memory();
    store.online_file("/old.html", "o");
    store.file_in("/old.html", "o", ResourceState::Deleted);

    let exporter = RecordingExporter {
        fail_remove: true,
        ..Default::default()
    };
    let config = PublishConfig::default();
    let report = Publisher::new(&*store, &config)
        .with_exporter(&exporter)
        .publish(ACTOR, OFFLINE, ONLINE, true)
        .unwrap();

    assert_eq!(report.warnings.len(), 1);
    assert!(store.find(ONLINE, "/old.html").is_none());
}

#[test]
fn filesystem_export_mirrors_publish_and_delete() {
    let out = TempDir::new().unwrap();
    let config = PublishConfig::default().export_point(ExportPoint::new("/site", out.path()));
    let exporter = FsExporter::from_config(&config);

    let store = TestStore::memory();
    store.folder("/site", ResourceState::New);
    let page = store.file_in("/site/index.html", "<html/>", ResourceState::New);
    store.file_in("/private.html", "secret", ResourceState::New);

    let publisher = Publisher::new(&*store, &config).with_exporter(&exporter);
    publisher.publish(ACTOR, OFFLINE, ONLINE, true).unwrap();

    assert_eq!(std::fs::read(out.path().join("index.html")).unwrap(), b"<html/>");
    assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 1);

    store
        .set_state(OFFLINE, page.id, ResourceState::Deleted)
        .unwrap();
    publisher.publish(ACTOR, OFFLINE, ONLINE, true).unwrap();
    assert!(!out.path().join("index.html").exists());
}

#[test]
fn filesystem_export_failure_is_fatal() {
    let out = TempDir::new().unwrap();
    let blocker = out.path().join("blocker");
    std::fs::write(&blocker, b"not a directory").unwrap();

    let config = PublishConfig::default().export_point(ExportPoint::new("/site", &blocker));
    let exporter = FsExporter::from_config(&config);

    let store = TestStore::memory();
    store.folder("/site", ResourceState::New);

    let err = Publisher::new(&*store, &config)
        .with_exporter(&exporter)
        .publish(ACTOR, OFFLINE, ONLINE, true)
        .unwrap_err();
    assert!(matches!(err, PublishError::Export { .. }));
    assert!(store.find(ONLINE, "/site").is_none());
}

// ============================================================================
// File-backed store
// ============================================================================

#[test]
fn publish_on_file_store() {
    let store = TestStore::file();
    store.folder("/a", ResourceState::New);
    let file = store.file_in("/a/x.html", "x", ResourceState::New);
    store.set_property(OFFLINE, &file, "title", "X");

    let report = publish(&store);
    assert_eq!(report.changed_paths, vec!["/a", "/a/x.html"]);
    assert_eq!(
        snapshot_workspace(&*store, ONLINE).unwrap(),
        snapshot_workspace(&*store, OFFLINE).unwrap()
    );
    assert!(store.path().unwrap().join("store.cbor").exists());
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn publish_mirrors_offline_and_is_idempotent(entries in offline_tree_strategy()) {
        let store = TestStore::memory();
        seed_online_counterparts(&store, &entries);
        seed_tree(&store, &entries);

        publish(&store);

        prop_assert!(pending_paths(&*store, OFFLINE).unwrap().is_empty());
        let online = snapshot_workspace(&*store, ONLINE).unwrap();
        prop_assert_eq!(&online, &snapshot_workspace(&*store, OFFLINE).unwrap());
        for entry in entries.iter().filter(|e| e.state == ResourceState::Deleted) {
            prop_assert!(!online.contains_key(&entry.path));
        }

        let records = store.read_project_records().unwrap().len();
        let second = publish(&store);
        prop_assert!(second.changed_paths.is_empty());
        prop_assert_eq!(&snapshot_workspace(&*store, ONLINE).unwrap(), &online);
        prop_assert_eq!(store.read_project_records().unwrap().len(), records);
    }
}
