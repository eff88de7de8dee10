//! Resource data model shared by every store implementation.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Path of the root folder of every workspace.
pub const ROOT_PATH: &str = "/";

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $inner:ty, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub $inner);

        impl $name {
            /// Creates a new id.
            #[must_use]
            pub const fn new(id: $inner) -> Self {
                Self(id)
            }

            /// Returns the raw id value.
            #[must_use]
            pub const fn get(self) -> $inner {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }
    };
}

id_type!(
    /// Identifier of a workspace ("project").
    WorkspaceId,
    u32,
    "ws"
);
id_type!(
    /// Path-independent identity of a resource.
    ///
    /// Ids are assigned by the store per workspace and are never comparable
    /// across workspaces.
    ResourceId,
    u64,
    "res"
);
id_type!(
    /// Identity of a resource's content record. Immutable once assigned.
    ContentId,
    u64,
    "content"
);
id_type!(
    /// Identifier of a user.
    UserId,
    u32,
    "user"
);
id_type!(
    /// Identifier of a group.
    GroupId,
    u32,
    "group"
);
id_type!(
    /// Resource type tag. Property definitions are keyed by it.
    ResourceType,
    u32,
    "type"
);

/// Lifecycle state of a resource in an offline workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ResourceState {
    /// Identical to the published version.
    #[default]
    Unchanged,
    /// Edited since the last publish.
    Changed,
    /// Created since the last publish.
    New,
    /// Marked for deletion on the next publish.
    Deleted,
}

impl ResourceState {
    /// Returns true if a publish run has work to do for this state.
    pub fn is_modified(self) -> bool {
        !matches!(self, ResourceState::Unchanged)
    }
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceState::Unchanged => "UNCHANGED",
            ResourceState::Changed => "CHANGED",
            ResourceState::New => "NEW",
            ResourceState::Deleted => "DELETED",
        };
        f.write_str(s)
    }
}

/// Whether a resource is a folder or a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// A container of other resources.
    Folder,
    /// A leaf carrying content.
    File,
}

/// A lock held on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lock {
    /// The user holding the lock.
    pub user: UserId,
    /// The workspace the lock was taken in.
    pub workspace: WorkspaceId,
}

/// Launcher metadata used by the delivery layer to render a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Launcher {
    /// Launcher type code.
    pub launcher_type: i32,
    /// Launcher class name, empty when unused.
    pub class_name: String,
}

/// A folder or file in a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Workspace-local identity.
    pub id: ResourceId,
    /// Content identity.
    pub content_id: ContentId,
    /// Identity of the parent folder, `None` for the root.
    pub parent_id: Option<ResourceId>,
    /// Absolute path without trailing slash.
    pub path: String,
    /// Folder or file.
    pub kind: ResourceKind,
    /// Type tag.
    pub resource_type: ResourceType,
    /// Flag bits.
    pub flags: u32,
    /// Owning user.
    pub owner: UserId,
    /// Owning group.
    pub group: GroupId,
    /// Workspace the resource lives in.
    pub workspace: WorkspaceId,
    /// Access flag bits.
    pub access_flags: u32,
    /// Publish lifecycle state.
    pub state: ResourceState,
    /// Current lock, if any.
    pub lock: Option<Lock>,
    /// Launcher metadata.
    pub launcher: Launcher,
    /// Creation time, milliseconds since the Unix epoch.
    pub created_at: u64,
    /// Creating user.
    pub created_by: UserId,
    /// Last modification time, milliseconds since the Unix epoch.
    pub modified_at: u64,
    /// Last modifying user.
    pub modified_by: UserId,
    /// Content length in bytes.
    pub size: u64,
    /// File content. Always empty for folders.
    pub content: Bytes,
}

impl Resource {
    /// Creates a folder template at `path`. Ids are assigned by the store.
    pub fn folder(path: impl Into<String>) -> Self {
        Self::blank(path.into(), ResourceKind::Folder, Bytes::new())
    }

    /// Creates a file template at `path` with the given content.
    pub fn file(path: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self::blank(path.into(), ResourceKind::File, content.into())
    }

    fn blank(path: String, kind: ResourceKind, content: Bytes) -> Self {
        let now = now_millis();
        Self {
            id: ResourceId::new(0),
            content_id: ContentId::new(0),
            parent_id: None,
            path,
            kind,
            resource_type: ResourceType::new(match kind {
                ResourceKind::Folder => 0,
                ResourceKind::File => 1,
            }),
            flags: 0,
            owner: UserId::new(0),
            group: GroupId::new(0),
            workspace: WorkspaceId::new(0),
            access_flags: 0,
            state: ResourceState::New,
            lock: None,
            launcher: Launcher::default(),
            created_at: now,
            created_by: UserId::new(0),
            modified_at: now,
            modified_by: UserId::new(0),
            size: content.len() as u64,
            content,
        }
    }

    /// Sets the state.
    #[must_use]
    pub fn with_state(mut self, state: ResourceState) -> Self {
        self.state = state;
        self
    }

    /// Sets the resource type.
    #[must_use]
    pub fn with_type(mut self, resource_type: ResourceType) -> Self {
        self.resource_type = resource_type;
        self
    }

    /// Sets the lock.
    #[must_use]
    pub fn with_lock(mut self, lock: Lock) -> Self {
        self.lock = Some(lock);
        self
    }

    /// Returns true for folders.
    pub fn is_folder(&self) -> bool {
        self.kind == ResourceKind::Folder
    }

    /// Returns the last path segment. The root folder's name is empty.
    pub fn name(&self) -> &str {
        name_of(&self.path)
    }

    /// Returns the path of the parent folder, `None` for the root.
    pub fn parent_path(&self) -> Option<&str> {
        parent_of(&self.path)
    }

    /// Returns the template used to create or overwrite the online
    /// counterpart: same metadata and content, state reset, no lock.
    pub fn published_copy(&self) -> Resource {
        Resource {
            state: ResourceState::Unchanged,
            lock: None,
            ..self.clone()
        }
    }
}

/// Metadata properties of one resource, keyed by name.
pub type PropertyMap = BTreeMap<String, String>;

/// Declares that properties named `name` may be attached to resources of
/// `resource_type`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PropertyDefinition {
    /// Property name.
    pub name: String,
    /// Resource type the definition applies to.
    pub resource_type: ResourceType,
}

impl PropertyDefinition {
    /// Creates a new definition.
    pub fn new(name: impl Into<String>, resource_type: ResourceType) -> Self {
        Self {
            name: name.into(),
            resource_type,
        }
    }
}

/// Immutable history snapshot of one resource taken during a publish run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupRecord {
    /// Backup version shared by every snapshot of the run.
    pub version: u64,
    /// Workspace the snapshot was taken from.
    pub workspace: WorkspaceId,
    /// Publish time, milliseconds since the Unix epoch.
    pub published_at: u64,
    /// Publishing user.
    pub published_by: UserId,
    /// Metadata and content at publish time.
    pub resource: Resource,
    /// Properties at publish time.
    pub properties: PropertyMap,
    /// Hex SHA-256 of the content.
    pub content_digest: String,
}

/// Workspace-level history record written once per publish run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    /// Backup version of the run.
    pub version: u64,
    /// Published workspace.
    pub workspace: WorkspaceId,
    /// Publish time, milliseconds since the Unix epoch.
    pub published_at: u64,
    /// Publishing user.
    pub published_by: UserId,
    /// Number of resources the run changed.
    pub resource_count: u64,
}

/// Returns the last segment of `path`.
pub fn name_of(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or_default()
}

/// Returns the parent folder path of `path`, `None` for the root.
pub fn parent_of(path: &str) -> Option<&str> {
    if path == ROOT_PATH {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some(ROOT_PATH),
        Some(idx) => Some(&path[..idx]),
        None => None,
    }
}

/// Returns true if `path` equals `prefix` or lies below it.
pub fn is_same_or_below(path: &str, prefix: &str) -> bool {
    if prefix == ROOT_PATH {
        return path.starts_with('/');
    }
    let prefix = prefix.trim_end_matches('/');
    path == prefix
        || (path.starts_with(prefix) && path.as_bytes().get(prefix.len()) == Some(&b'/'))
}

/// Current time in milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
