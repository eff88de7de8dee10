//! Error types for store operations.

use crate::types::{ResourceId, ResourceType, WorkspaceId};
use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while reading or writing a resource store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No resource exists at the given path.
    #[error("resource not found: {path} in {workspace}")]
    NotFound {
        /// Workspace that was searched.
        workspace: WorkspaceId,
        /// Path that was looked up.
        path: String,
    },

    /// No resource carries the given id.
    #[error("resource not found: {id} in {workspace}")]
    IdNotFound {
        /// Workspace that was searched.
        workspace: WorkspaceId,
        /// Id that was looked up.
        id: ResourceId,
    },

    /// A resource already occupies the path.
    #[error("resource already exists: {path} in {workspace}")]
    AlreadyExists {
        /// Workspace where the collision happened.
        workspace: WorkspaceId,
        /// The occupied path.
        path: String,
    },

    /// The resource path does not sit directly below the given parent.
    #[error("invalid parent for {path}: {parent}")]
    InvalidParent {
        /// Path of the resource being created.
        path: String,
        /// Path of the parent it was attached to.
        parent: String,
    },

    /// The workspace is not known to the store.
    #[error("unknown workspace: {0}")]
    UnknownWorkspace(WorkspaceId),

    /// The resource is marked deleted and cannot be read as live data.
    #[error("resource is deleted: {path}")]
    ResourceDeleted {
        /// Path of the deleted resource.
        path: String,
    },

    /// The actor may not perform the operation.
    #[error("permission denied: {message}")]
    PermissionDenied {
        /// Description of the refusal.
        message: String,
    },

    /// No property definition exists for the name and resource type.
    #[error("unknown property definition: {name} for {resource_type}")]
    UnknownPropertyDefinition {
        /// Property name.
        name: String,
        /// Resource type the property was written for.
        resource_type: ResourceType,
    },

    /// Structured payload could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The persisted store is inconsistent.
    #[error("store corrupted: {0}")]
    Corrupted(String),
}

impl StoreError {
    /// Creates a not found error for a path.
    pub fn not_found(workspace: WorkspaceId, path: impl Into<String>) -> Self {
        Self::NotFound {
            workspace,
            path: path.into(),
        }
    }

    /// Creates an already exists error for a path.
    pub fn already_exists(workspace: WorkspaceId, path: impl Into<String>) -> Self {
        Self::AlreadyExists {
            workspace,
            path: path.into(),
        }
    }

    /// Creates a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    /// Returns true for both path and id lookups that missed.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::IdNotFound { .. })
    }

    /// Returns true if the error reports a path collision.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}
