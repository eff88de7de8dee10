//! Property-based test generators using proptest.
//!
//! Provides strategies for generating offline workspaces whose states are
//! consistent: nothing lives below a deleted folder unless it is deleted
//! too, and everything below a new folder is new.

use crate::fixtures::{TestStore, OFFLINE, ONLINE};
use cmspub_store::{Resource, ResourceState};
use proptest::prelude::*;
use std::collections::BTreeMap;

/// One resource to stage in the offline workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// Absolute path.
    pub path: String,
    /// True for folders.
    pub folder: bool,
    /// State to stage the resource in.
    pub state: ResourceState,
    /// File content, empty for folders.
    pub content: Vec<u8>,
}

impl TreeEntry {
    /// Returns the resource template for this entry.
    pub fn to_resource(&self) -> Resource {
        if self.folder {
            Resource::folder(self.path.clone()).with_state(self.state)
        } else {
            Resource::file(self.path.clone(), self.content.clone()).with_state(self.state)
        }
    }
}

/// Strategy for generating resource states.
pub fn state_strategy() -> impl Strategy<Value = ResourceState> {
    prop_oneof![
        Just(ResourceState::Unchanged),
        Just(ResourceState::Changed),
        Just(ResourceState::New),
        Just(ResourceState::Deleted),
    ]
}

/// Strategy for generating path segments.
pub fn segment_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z]{1,6}").expect("Invalid regex")
}

/// Strategy for generating file contents.
pub fn content_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..64)
}

/// Strategy for generating an offline tree of top-level folders with files
/// below them, in creation order.
pub fn offline_tree_strategy() -> impl Strategy<Value = Vec<TreeEntry>> {
    let file = (segment_strategy(), state_strategy(), content_strategy());
    let folder = (
        segment_strategy(),
        state_strategy(),
        prop::collection::vec(file, 0..4),
    );
    prop::collection::vec(folder, 0..5).prop_map(|folders| {
        // Duplicate names collapse onto the first occurrence.
        let mut unique = BTreeMap::new();
        for (name, state, files) in folders {
            unique.entry(name).or_insert((state, files));
        }

        let mut entries = Vec::new();
        for (name, (folder_state, files)) in unique {
            let folder_path = format!("/{name}");
            entries.push(TreeEntry {
                path: folder_path.clone(),
                folder: true,
                state: folder_state,
                content: Vec::new(),
            });

            let mut seen = BTreeMap::new();
            for (file_name, state, content) in files {
                seen.entry(file_name).or_insert((state, content));
            }
            for (file_name, (state, content)) in seen {
                let state = match folder_state {
                    ResourceState::Deleted | ResourceState::New => folder_state,
                    _ => state,
                };
                entries.push(TreeEntry {
                    path: format!("{folder_path}/{file_name}.html"),
                    folder: false,
                    state,
                    content,
                });
            }
        }
        entries
    })
}

/// Stages `entries` in the offline workspace of `store`.
pub fn seed_tree(store: &TestStore, entries: &[TreeEntry]) {
    for entry in entries {
        store.seed(OFFLINE, &entry.to_resource());
    }
}

/// Puts an online copy of every entry that was published before, that is
/// every entry not in the `New` state.
pub fn seed_online_counterparts(store: &TestStore, entries: &[TreeEntry]) {
    for entry in entries.iter().filter(|e| e.state != ResourceState::New) {
        store.seed(ONLINE, &entry.to_resource().with_state(ResourceState::Unchanged));
    }
}
