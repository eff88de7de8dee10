//! Publish decisions derived from a resource's lifecycle state.

use crate::config::PublishConfig;
use cmspub_store::{Resource, ResourceKind, ResourceState};

/// What a publish run does with one offline resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishAction {
    /// Leave the resource alone.
    Skip,
    /// Locked in another workspace; skipped for this run.
    SkipLocked,
    /// Temporary file: removed from the offline workspace, never published.
    DropTemporary,
    /// Create the online counterpart. A path collision falls back to
    /// [`PublishAction::Update`].
    Create,
    /// Locate or create the online counterpart and overwrite it.
    Update,
    /// Remove the online counterpart and the offline record.
    Delete,
}

impl PublishAction {
    /// Maps a state to its action, ignoring locks and temporary names.
    pub fn for_state(state: ResourceState) -> Self {
        match state {
            ResourceState::Unchanged => PublishAction::Skip,
            ResourceState::New => PublishAction::Create,
            ResourceState::Changed => PublishAction::Update,
            ResourceState::Deleted => PublishAction::Delete,
        }
    }

    /// Decides the action for `resource`.
    ///
    /// Locks win over everything, then the temporary prefix (files only),
    /// then the state.
    pub fn decide(resource: &Resource, locked_elsewhere: bool, config: &PublishConfig) -> Self {
        if locked_elsewhere {
            return PublishAction::SkipLocked;
        }
        if resource.kind == ResourceKind::File && config.is_temporary(resource.name()) {
            return PublishAction::DropTemporary;
        }
        Self::for_state(resource.state)
    }

    /// Returns true if the offline state is reset to `Unchanged` once the
    /// action succeeds.
    pub fn resets_offline_state(self) -> bool {
        matches!(self, PublishAction::Create | PublishAction::Update)
    }

    /// Returns true if the action touches the online workspace.
    pub fn touches_online(self) -> bool {
        matches!(
            self,
            PublishAction::Create | PublishAction::Update | PublishAction::Delete
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmspub_store::{Lock, UserId, WorkspaceId};

    #[test]
    fn states_map_to_disjoint_actions() {
        assert_eq!(PublishAction::for_state(ResourceState::Unchanged), PublishAction::Skip);
        assert_eq!(PublishAction::for_state(ResourceState::New), PublishAction::Create);
        assert_eq!(PublishAction::for_state(ResourceState::Changed), PublishAction::Update);
        assert_eq!(PublishAction::for_state(ResourceState::Deleted), PublishAction::Delete);
    }

    #[test]
    fn lock_wins_over_state() {
        let config = PublishConfig::default();
        let file = Resource::file("/x.html", "x")
            .with_state(ResourceState::Deleted)
            .with_lock(Lock {
                user: UserId::new(1),
                workspace: WorkspaceId::new(7),
            });
        assert_eq!(PublishAction::decide(&file, true, &config), PublishAction::SkipLocked);
    }

    #[test]
    fn temporary_files_are_dropped_regardless_of_state() {
        let config = PublishConfig::default();
        for state in [ResourceState::Unchanged, ResourceState::New, ResourceState::Deleted] {
            let file = Resource::file("/a/~draft.html", "x").with_state(state);
            assert_eq!(
                PublishAction::decide(&file, false, &config),
                PublishAction::DropTemporary
            );
        }
    }

    #[test]
    fn temporary_prefix_ignores_folders() {
        let config = PublishConfig::default();
        let folder = Resource::folder("/~work").with_state(ResourceState::New);
        assert_eq!(PublishAction::decide(&folder, false, &config), PublishAction::Create);
    }

    #[test]
    fn only_create_and_update_reset_state() {
        assert!(PublishAction::Create.resets_offline_state());
        assert!(PublishAction::Update.resets_offline_state());
        assert!(!PublishAction::Delete.resets_offline_state());
        assert!(!PublishAction::Skip.touches_online());
        assert!(PublishAction::Delete.touches_online());
    }
}
