//! # cmspub Core
//!
//! Publish engine for cmspub.
//!
//! This crate provides:
//! - The publish orchestrator that reconciles an offline workspace into the
//!   online workspace
//! - Per-resource publish decisions derived from the resource state
//! - Offline-to-online parent id translation
//! - Property replication between workspaces
//! - Versioned history snapshots
//! - Mirroring of exported paths onto the local filesystem
//!
//! The engine talks to storage only through the traits of `cmspub_store`.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod export;
mod history;
mod id_cache;
mod properties;
mod publish;
mod state;

pub use config::{ExportPoint, PublishConfig, DEFAULT_ONLINE_WORKSPACE, DEFAULT_TEMP_FILE_PREFIX};
pub use error::{PublishError, PublishResult};
pub use export::{ExportAdapter, FsExporter, NoopExporter};
pub use history::{content_digest, HistoryWriter, UNVERSIONED};
pub use id_cache::IdCache;
pub use properties::{PropertyReplicator, ReplicationMode};
pub use publish::{PublishReport, PublishStats, Publisher};
pub use state::PublishAction;
