//! # Vendor Configuration
//!
//! This module defines the vendor definitions stored in
//! `.git-vendor/vendor.yml` and the Config Store that loads, validates and
//! saves them.
//!
//! ## Key Components
//!
//! - **`VendorDefinition`**: one vendored repository: its name, source URL,
//!   tracked ref, path mappings and compliance policy.
//! - **`PathMapping`**: copies the upstream subpath `from` to the project
//!   path `to`.
//! - **`VendorConfig`**: the full set of definitions plus the mutation
//!   operations used by the CLI. Every mutation checks the structural
//!   invariants against the whole set before committing, so a rejected call
//!   leaves the config exactly as it was.
//! - **`ConfigStore`**: reads and atomically replaces the YAML file.
//!
//! Destination paths may never be equal or nested, whether they belong to
//! the same vendor or to different ones. The check is a full scan over every
//! mapping; vendor counts are small.

use crate::error::{Error, Result};
use crate::filesystem;
use crate::path;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// How strictly license and pin requirements are enforced for a vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplianceLevel {
    /// Requires a license and zero drift.
    Strict,
    /// Requires only that the vendor is locked.
    #[default]
    Lenient,
    /// Reported, never fails.
    Info,
}

impl fmt::Display for ComplianceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ComplianceLevel::Strict => "strict",
            ComplianceLevel::Lenient => "lenient",
            ComplianceLevel::Info => "info",
        };
        f.write_str(s)
    }
}

impl FromStr for ComplianceLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(ComplianceLevel::Strict),
            "lenient" => Ok(ComplianceLevel::Lenient),
            "info" => Ok(ComplianceLevel::Info),
            other => Err(format!(
                "unknown compliance level '{}' (expected strict, lenient or info)",
                other
            )),
        }
    }
}

/// Copies part of a vendor's tree into the project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathMapping {
    /// Source subpath inside the upstream repository. Empty means the root.
    #[serde(default)]
    pub from: String,
    /// Destination path relative to the project root.
    pub to: String,
}

impl PathMapping {
    /// Build a normalized mapping, rejecting invalid paths.
    pub fn new(from: &str, to: &str) -> Result<Self> {
        Ok(Self {
            from: path::normalize(from, true)?,
            to: path::destination(to)?,
        })
    }

    /// Parse the CLI form `FROM:TO`.
    pub fn parse(value: &str) -> Result<Self> {
        match value.split_once(':') {
            Some((from, to)) => Self::new(from, to),
            None => Err(Error::InvalidPath {
                path: value.to_string(),
                message: "expected FROM:TO".to_string(),
            }),
        }
    }
}

impl fmt::Display for PathMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let from = if self.from.is_empty() { "." } else { &self.from };
        write!(f, "{} -> {}", from, self.to)
    }
}

/// A single vendored repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorDefinition {
    /// Unique vendor name.
    pub name: String,
    /// Source repository URL.
    pub url: String,
    /// Tracked branch, tag or commit.
    pub r#ref: String,
    /// Ordered path mappings.
    #[serde(default)]
    pub mappings: Vec<PathMapping>,
    /// Compliance policy.
    #[serde(default)]
    pub compliance: ComplianceLevel,
    /// Declared SPDX license identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    /// Group tag used by `pull --group`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

impl VendorDefinition {
    /// Create a lenient vendor with no license or group.
    pub fn new(name: &str, url: &str, r#ref: &str, mappings: Vec<PathMapping>) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            r#ref: r#ref.to_string(),
            mappings,
            compliance: ComplianceLevel::default(),
            license: None,
            group: None,
        }
    }

    /// Find a mapping by destination path.
    pub fn mapping(&self, to: &str) -> Option<&PathMapping> {
        self.mappings.iter().find(|m| m.to == to)
    }
}

/// Field updates applied by `edit`.
#[derive(Debug, Clone, Default)]
pub struct VendorEdit {
    pub url: Option<String>,
    pub r#ref: Option<String>,
    pub compliance: Option<ComplianceLevel>,
    /// `Some(None)` clears the license.
    pub license: Option<Option<String>>,
    /// `Some(None)` clears the group.
    pub group: Option<Option<String>>,
}

/// The full set of vendor definitions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorConfig {
    #[serde(default)]
    pub vendors: Vec<VendorDefinition>,
}

impl VendorConfig {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a vendor by name.
    pub fn get(&self, name: &str) -> Option<&VendorDefinition> {
        self.vendors.iter().find(|v| v.name == name)
    }

    fn position(&self, name: &str) -> Result<usize> {
        self.vendors
            .iter()
            .position(|v| v.name == name)
            .ok_or_else(|| Error::VendorNotFound {
                name: name.to_string(),
            })
    }

    /// Add a new vendor after validating it against every existing one.
    pub fn add_vendor(&mut self, vendor: VendorDefinition) -> Result<()> {
        if self.get(&vendor.name).is_some() {
            return Err(Error::DuplicateName { name: vendor.name });
        }
        let mut candidate = self.clone();
        candidate.vendors.push(vendor);
        candidate.check()?;
        *self = candidate;
        Ok(())
    }

    /// Remove a vendor, returning its definition.
    pub fn remove_vendor(&mut self, name: &str) -> Result<VendorDefinition> {
        let index = self.position(name)?;
        Ok(self.vendors.remove(index))
    }

    /// Rename a vendor. The caller is responsible for renaming the lock entry.
    pub fn rename_vendor(&mut self, old: &str, new: &str) -> Result<()> {
        let index = self.position(old)?;
        if old == new {
            return Ok(());
        }
        if self.get(new).is_some() {
            return Err(Error::DuplicateName {
                name: new.to_string(),
            });
        }
        check_name(new)?;
        self.vendors[index].name = new.to_string();
        Ok(())
    }

    /// Update the scalar fields of a vendor.
    pub fn edit_vendor(&mut self, name: &str, edit: VendorEdit) -> Result<()> {
        let index = self.position(name)?;
        let mut vendor = self.vendors[index].clone();
        if let Some(url) = edit.url {
            vendor.url = url;
        }
        if let Some(r#ref) = edit.r#ref {
            vendor.r#ref = r#ref;
        }
        if let Some(level) = edit.compliance {
            vendor.compliance = level;
        }
        if let Some(license) = edit.license {
            vendor.license = license;
        }
        if let Some(group) = edit.group {
            vendor.group = group;
        }
        check_vendor_fields(&vendor)?;
        self.vendors[index] = vendor;
        Ok(())
    }

    /// Append a mapping to a vendor.
    pub fn add_mapping(&mut self, name: &str, mapping: PathMapping) -> Result<()> {
        let index = self.position(name)?;
        let mut candidate = self.clone();
        candidate.vendors[index].mappings.push(mapping);
        candidate.check()?;
        *self = candidate;
        Ok(())
    }

    /// Remove the mapping with destination `to`. The last mapping of a vendor
    /// cannot be removed.
    pub fn remove_mapping(&mut self, name: &str, to: &str) -> Result<PathMapping> {
        let index = self.position(name)?;
        let to = path::normalize(to, false)?;
        let vendor = &mut self.vendors[index];
        let pos = vendor
            .mappings
            .iter()
            .position(|m| m.to == to)
            .ok_or_else(|| Error::MappingNotFound {
                vendor: name.to_string(),
                to: to.clone(),
            })?;
        if vendor.mappings.len() == 1 {
            return Err(Error::InvalidVendor {
                name: name.to_string(),
                message: "cannot remove the last mapping; remove the vendor instead".to_string(),
            });
        }
        Ok(vendor.mappings.remove(pos))
    }

    /// Replace the mapping with destination `to`.
    pub fn update_mapping(&mut self, name: &str, to: &str, mapping: PathMapping) -> Result<()> {
        let index = self.position(name)?;
        let to = path::normalize(to, false)?;
        let pos = self.vendors[index]
            .mappings
            .iter()
            .position(|m| m.to == to)
            .ok_or_else(|| Error::MappingNotFound {
                vendor: name.to_string(),
                to: to.clone(),
            })?;
        let mut candidate = self.clone();
        candidate.vendors[index].mappings[pos] = mapping;
        candidate.check()?;
        *self = candidate;
        Ok(())
    }

    /// Run every structural check read-only and return all problems found.
    pub fn validate(&self) -> Vec<Error> {
        let mut problems = Vec::new();

        for (i, vendor) in self.vendors.iter().enumerate() {
            if let Err(e) = check_vendor_fields(vendor) {
                problems.push(e);
            }
            if self.vendors[..i].iter().any(|v| v.name == vendor.name) {
                problems.push(Error::DuplicateName {
                    name: vendor.name.clone(),
                });
            }
            for mapping in &vendor.mappings {
                if let Err(e) = path::normalize(&mapping.from, true) {
                    problems.push(e);
                }
                if let Err(e) = path::destination(&mapping.to) {
                    problems.push(e);
                }
            }
        }

        let all: Vec<(&str, &str)> = self
            .vendors
            .iter()
            .flat_map(|v| v.mappings.iter().map(move |m| (v.name.as_str(), m.to.as_str())))
            .collect();
        for (i, (vendor, to)) in all.iter().enumerate() {
            for (other_vendor, other_to) in &all[..i] {
                if path::paths_overlap(to, other_to) {
                    problems.push(Error::MappingConflict {
                        vendor: vendor.to_string(),
                        path: to.to_string(),
                        other_vendor: other_vendor.to_string(),
                        other_path: other_to.to_string(),
                    });
                }
            }
        }

        problems
    }

    /// The first problem reported by [`validate`], if any.
    ///
    /// [`validate`]: VendorConfig::validate
    pub fn check(&self) -> Result<()> {
        match self.validate().into_iter().next() {
            Some(problem) => Err(problem),
            None => Ok(()),
        }
    }
}

fn check_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidVendor {
            name: name.to_string(),
            message: "names may only contain letters, digits, '-', '_' and '.'".to_string(),
        })
    }
}

fn check_vendor_fields(vendor: &VendorDefinition) -> Result<()> {
    check_name(&vendor.name)?;
    if vendor.url.trim().is_empty() {
        return Err(Error::InvalidVendor {
            name: vendor.name.clone(),
            message: "url must not be empty".to_string(),
        });
    }
    if vendor.r#ref.trim().is_empty() {
        return Err(Error::InvalidVendor {
            name: vendor.name.clone(),
            message: "ref must not be empty".to_string(),
        });
    }
    if vendor.mappings.is_empty() {
        return Err(Error::InvalidVendor {
            name: vendor.name.clone(),
            message: "at least one mapping is required".to_string(),
        });
    }
    Ok(())
}

/// Check that a repository URL is something git can fetch from.
///
/// Accepts anything `url` can parse (https, ssh, file), scp-like
/// `user@host:path` remotes and existing local directories.
pub fn check_repository_url(raw: &str) -> Result<()> {
    if url::Url::parse(raw).is_ok() {
        return Ok(());
    }
    let scp_like = raw
        .split_once(':')
        .map(|(host, path)| host.contains('@') && !path.is_empty())
        .unwrap_or(false);
    if scp_like || Path::new(raw).is_dir() {
        return Ok(());
    }
    Err(Error::InvalidVendor {
        name: raw.to_string(),
        message: "not a recognizable git repository URL".to_string(),
    })
}

/// Reads and writes the vendor configuration file.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the configuration. A missing file is [`Error::ConfigNotFound`].
    pub fn load(&self) -> Result<VendorConfig> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::ConfigNotFound {
                    path: self.path.display().to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        parse(&content)
    }

    /// Atomically replace the configuration file.
    pub fn save(&self, config: &VendorConfig) -> Result<()> {
        let yaml = serde_yaml::to_string(config)?;
        filesystem::write_atomic(&self.path, yaml.as_bytes())
    }

    /// Create an empty configuration, refusing to overwrite an existing one.
    pub fn init(&self) -> Result<()> {
        if self.path.exists() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("{} already exists", self.path.display()),
            )));
        }
        self.save(&VendorConfig::new())
    }
}

/// Parse configuration YAML. An empty document is an empty configuration.
pub fn parse(content: &str) -> Result<VendorConfig> {
    if content.trim().is_empty() {
        return Ok(VendorConfig::new());
    }
    let mut config: VendorConfig =
        serde_yaml::from_str(content).map_err(|e| Error::ConfigParse {
            message: e.to_string(),
            hint: Some("each vendor needs name, url, ref and at least one mapping".to_string()),
        })?;

    // Paths that fail to normalize are left as written for validate() to report.
    for mapping in config.vendors.iter_mut().flat_map(|v| v.mappings.iter_mut()) {
        if let Ok(from) = path::normalize(&mapping.from, true) {
            mapping.from = from;
        }
        if let Ok(to) = path::normalize(&mapping.to, false) {
            mapping.to = to;
        }
    }
    Ok(config)
}
