//! # git-vendor Library
//!
//! This library provides the vendor synchronization engine behind the
//! `git-vendor` command-line tool: it turns a declarative set of vendor
//! definitions into an on-disk, hash-verified, lock-pinned tree of
//! third-party sources.
//!
//! ## Quick Example
//!
//! ```
//! use git_vendor::config::{self, PathMapping, VendorDefinition};
//!
//! let yaml = r#"
//! vendors:
//!   - name: left-pad
//!     url: https://github.com/left-pad/left-pad.git
//!     ref: v1.0.0
//!     mappings:
//!       - from: src
//!         to: vendor/left-pad
//! "#;
//! let mut vendors = config::parse(yaml).unwrap();
//! assert_eq!(vendors.vendors.len(), 1);
//!
//! // Destinations may not overlap, across all vendors.
//! let clash = VendorDefinition::new(
//!     "other",
//!     "https://github.com/other/other.git",
//!     "main",
//!     vec![PathMapping::new("", "vendor/left-pad/extra").unwrap()],
//! );
//! assert!(vendors.add_vendor(clash).is_err());
//! ```
//!
//! ## Core Concepts
//!
//! - **Config Store (`config`)**: vendor definitions and their path mappings,
//!   validated on every mutation and saved atomically.
//! - **Lock Store (`lock`)**: the commit each vendor is pinned to plus a
//!   checksum per destination, replaced as a whole file.
//! - **Git Operations (`repository`, `git`)**: the capability trait the engine
//!   drives git through, and its implementation over the system `git`.
//! - **Incremental Cache (`cache`)**: fetched trees keyed by commit hash.
//! - **Sync Scheduler (`sync`)**: plans a run, fetches each distinct commit
//!   once on a worker pool, writes destinations atomically and updates the
//!   lock once.
//! - **Status (`status`, `compliance`)**: local and remote drift plus a
//!   compliance verdict per vendor.
//!
//! Snapshots of the config and lock are passed explicitly into every run;
//! there is no process-wide state.

pub mod cache;
pub mod checksum;
pub mod compliance;
pub mod config;
pub mod defaults;
pub mod error;
pub mod filesystem;
pub mod git;
pub mod lock;
pub mod output;
pub mod path;
pub mod project;
pub mod repository;
pub mod status;
pub mod suggestions;
pub mod sync;

#[cfg(test)]
mod path_proptest;
