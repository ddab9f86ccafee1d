//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `git-vendor` command-line tool. Each subcommand is defined in its own file.
//!
//! ## Structure
//!
//! Each command module typically contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and the shared
//!   [`Context`] and performs the command's logic.
//!
//! The `execute` function is responsible for orchestrating the necessary
//! operations, calling into the `git_vendor` library to perform the core logic.

use std::path::PathBuf;

use git_vendor::config::VendorConfig;
use git_vendor::error::Error;
use git_vendor::output::OutputConfig;
use git_vendor::project::Project;
use git_vendor::suggestions;

pub mod add;
pub mod cache;
pub mod completions;
pub mod edit;
pub mod init;
pub mod list;
pub mod mapping;
pub mod pull;
pub mod remove;
pub mod rename;
pub mod status;
pub mod validate;

/// State shared by every command: where the project lives and how to print.
#[derive(Debug, Clone)]
pub struct Context {
    pub project: Project,
    pub out: OutputConfig,
}

impl Context {
    pub fn new(root: PathBuf, color_flag: &str) -> Self {
        Self {
            project: Project::new(root),
            out: OutputConfig::from_env_and_flag(color_flag),
        }
    }
}

/// Turn a library error into a CLI error, suggesting a configured name when
/// the vendor was not found.
pub fn explain(err: Error, config: &VendorConfig) -> anyhow::Error {
    match err {
        Error::VendorNotFound { name } => {
            let known: Vec<&str> = config.vendors.iter().map(|v| v.name.as_str()).collect();
            suggestions::vendor_not_found(&name, &known)
        }
        other => other.into(),
    }
}

/// Parse a `FROM:TO` mapping argument.
pub fn parse_mapping(value: &str) -> anyhow::Result<git_vendor::config::PathMapping> {
    if !value.contains(':') {
        return Err(suggestions::invalid_mapping(value));
    }
    Ok(git_vendor::config::PathMapping::parse(value)?)
}
