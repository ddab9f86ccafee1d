//! # Error Handling
//!
//! This module defines the centralized error type for `git-vendor`. It uses
//! `thiserror` to describe every anticipated failure mode with a message a
//! user can act on.
//!
//! The variants fall into a few groups that callers treat differently:
//!
//! - **Configuration errors** (`DuplicateName`, `MappingConflict`,
//!   `InvalidPath`, ...) are fatal to the mutating command and are always
//!   raised before anything is written.
//! - **Store errors** (`ConfigParse`, `LockCorrupt`, `Io`) abort a sync or
//!   status run before any worker starts.
//! - **Per-vendor errors** (`Network`, `RefNotFound`, `AuthRequired`,
//!   `SourcePathMissing`, ...) are recorded against a single vendor and never
//!   cancel its siblings. Only `Network` is retried.

use thiserror::Error;

/// Main error type for git-vendor operations
#[derive(Error, Debug)]
pub enum Error {
    /// The vendor configuration file could not be parsed.
    #[error("Configuration parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// No vendor configuration exists at the expected location.
    #[error("Configuration file not found: {path}\n  hint: run 'git-vendor init' to create one")]
    ConfigNotFound { path: String },

    /// A vendor with this name is already configured.
    #[error("Vendor '{name}' already exists")]
    DuplicateName { name: String },

    /// No vendor with this name is configured.
    #[error("Vendor '{name}' not found")]
    VendorNotFound { name: String },

    /// The vendor has no mapping with the given destination.
    #[error("Vendor '{vendor}' has no mapping to '{to}'")]
    MappingNotFound { vendor: String, to: String },

    /// Two destination paths are equal or nested inside one another.
    #[error("Mapping conflict: '{path}' ({vendor}) overlaps '{other_path}' ({other_vendor})")]
    MappingConflict {
        vendor: String,
        path: String,
        other_vendor: String,
        other_path: String,
    },

    /// A mapping path is absolute, empty, or escapes the project root.
    #[error("Invalid path '{path}': {message}")]
    InvalidPath { path: String, message: String },

    /// A vendor definition is structurally invalid.
    #[error("Invalid vendor '{name}': {message}")]
    InvalidVendor { name: String, message: String },

    /// The lock file exists but cannot be understood.
    #[error("Lock file is corrupt: {path}: {message}\n  hint: restore it from version control or delete it and run 'git-vendor pull' to re-pin every vendor")]
    LockCorrupt { path: String, message: String },

    /// The requested ref does not exist on the remote.
    #[error("Ref '{r#ref}' not found in {url}")]
    RefNotFound { url: String, r#ref: String },

    /// A transient network failure; callers may retry.
    #[error("Network operation error: {url} - {message}")]
    Network { url: String, message: String },

    /// The remote refused access.
    #[error("Authentication required for {url}: {message}\n  hint: check your SSH keys, credential helper or access token")]
    AuthRequired { url: String, message: String },

    /// A git command failed for a reason outside the taxonomy above.
    #[error("Git command failed for {url}: {command} - {stderr}")]
    GitCommand {
        command: String,
        url: String,
        stderr: String,
    },

    /// A mapping's source path no longer exists in the fetched tree.
    #[error("Source path '{path}' of vendor '{vendor}' does not exist at {commit}\n  hint: fix the mapping, or pass --prune to remove its destination")]
    SourcePathMissing {
        vendor: String,
        path: String,
        commit: String,
    },

    /// An error occurred with a cache operation.
    #[error("Cache operation error: {message}")]
    Cache { message: String },

    /// An error occurred while writing the destination tree.
    #[error("Filesystem operation error: {message}")]
    Filesystem { message: String },

    /// An error indicating that a mutex or other lock has been poisoned.
    #[error("Lock poisoned: {context}")]
    LockPoisoned { context: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML error, wrapped from `serde_yaml::Error`.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON serialization error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether the failed operation may succeed if attempted again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Network { .. })
    }

    /// Whether this error is a configuration problem rather than a runtime
    /// failure.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Error::DuplicateName { .. }
                | Error::VendorNotFound { .. }
                | Error::MappingNotFound { .. }
                | Error::MappingConflict { .. }
                | Error::InvalidPath { .. }
                | Error::InvalidVendor { .. }
        )
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
