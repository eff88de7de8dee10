//! # cmspub Testkit
//!
//! Test utilities for cmspub.
//!
//! This crate provides:
//! - Test fixtures with ready-made online and offline workspaces
//! - A store wrapper that records mutations and injects failures
//! - Path-keyed workspace snapshots for comparing runs
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cmspub_testkit::prelude::*;
//!
//! #[test]
//! fn test_publish() {
//!     let store = TestStore::memory();
//!     store.folder("/a", ResourceState::New);
//!     // ... publish and assert
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod instrumented;
pub mod snapshot;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::instrumented::*;
    pub use crate::snapshot::*;
}

pub use fixtures::*;
pub use generators::*;
pub use instrumented::*;
pub use snapshot::*;
