//! # Status Engine
//!
//! `status` answers two questions per vendor and judges the answers:
//!
//! - **Local drift**: do the files on disk still hash to what the lock
//!   recorded? Skipped with `remote_only`.
//! - **Remote drift**: has the tracked ref moved away from the locked
//!   commit? Answered with one `list_remote_commit` call and skipped with
//!   `offline`, in which case the git capability is never touched.
//!
//! The results feed [`compliance::evaluate`] under each vendor's compliance
//! level. Vendors are checked in parallel and reported in config order.

use std::path::Path;

use log::{debug, warn};
use rayon::prelude::*;
use serde::Serialize;

use crate::compliance::{self, Evidence, LicenseLookup, LicenseState, Verdict};
use crate::config::{ComplianceLevel, VendorConfig, VendorDefinition};
use crate::error::{Error, Result};
use crate::lock::Lockfile;
use crate::repository::GitOperations;

/// Which checks to run and for which vendors.
#[derive(Debug, Clone)]
pub struct StatusOptions {
    /// Skip the remote check.
    pub offline: bool,
    /// Skip the local check.
    pub remote_only: bool,
    /// Only report vendors at this compliance level.
    pub compliance: Option<ComplianceLevel>,
    pub workers: usize,
}

impl Default for StatusOptions {
    fn default() -> Self {
        Self {
            offline: false,
            remote_only: false,
            compliance: None,
            workers: 4,
        }
    }
}

/// Status of one vendor.
#[derive(Debug, Clone, Serialize)]
pub struct StatusEntry {
    pub vendor: String,
    pub r#ref: String,
    pub compliance: ComplianceLevel,
    pub locked_commit: Option<String>,
    pub remote_commit: Option<String>,
    /// `None` when the local check was skipped or there is no lock entry.
    pub local_drift: Option<bool>,
    /// `None` when the remote check was skipped, failed, or there is no
    /// lock entry to compare with.
    pub remote_drift: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub drifted: Vec<String>,
    pub license: Option<String>,
    pub verdict: Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Status of every selected vendor, in config order.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub vendors: Vec<StatusEntry>,
}

impl StatusReport {
    /// Whether any vendor failed its verdict or could not be checked.
    /// `info` vendors only report, so their check errors do not count.
    pub fn has_failures(&self) -> bool {
        self.vendors.iter().any(|e| {
            e.verdict == Verdict::Fail
                || (e.error.is_some() && e.compliance != ComplianceLevel::Info)
        })
    }

    pub fn count(&self, verdict: Verdict) -> usize {
        self.vendors.iter().filter(|e| e.verdict == verdict).count()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Check every vendor of `config` against `lock`, the files under `root`
/// and the remote.
pub fn run(
    config: &VendorConfig,
    lock: &Lockfile,
    root: &Path,
    git: &dyn GitOperations,
    licenses: &dyn LicenseLookup,
    options: &StatusOptions,
) -> Result<StatusReport> {
    let vendors: Vec<&VendorDefinition> = config
        .vendors
        .iter()
        .filter(|v| options.compliance.map_or(true, |level| v.compliance == level))
        .collect();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.workers.max(1))
        .build()
        .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;

    let vendors: Vec<StatusEntry> = pool.install(|| {
        vendors
            .par_iter()
            .map(|vendor| check_vendor(vendor, lock, root, git, licenses, options))
            .collect()
    });

    Ok(StatusReport { vendors })
}

fn check_vendor(
    vendor: &VendorDefinition,
    lock: &Lockfile,
    root: &Path,
    git: &dyn GitOperations,
    licenses: &dyn LicenseLookup,
    options: &StatusOptions,
) -> StatusEntry {
    let entry = lock.get(&vendor.name);
    let mut errors = Vec::new();

    let mut local_drift = None;
    let mut drifted = Vec::new();
    if !options.remote_only {
        if let Some(entry) = entry {
            match entry.drifted(root, vendor) {
                Ok(paths) => {
                    local_drift = Some(!paths.is_empty());
                    drifted = paths;
                }
                Err(e) => errors.push(format!("local check failed: {}", e)),
            }
        }
    }

    let mut remote_commit = None;
    let mut remote_drift = None;
    if !options.offline {
        match git.list_remote_commit(&vendor.url, &vendor.r#ref) {
            Ok(commit) => {
                remote_drift = entry.map(|e| e.commit != commit);
                remote_commit = Some(commit);
            }
            Err(e) => errors.push(format!("remote check failed: {}", e)),
        }
    }

    let license = match &vendor.license {
        Some(declared) if !declared.trim().is_empty() => LicenseState::Known(declared.clone()),
        _ if vendor.compliance == ComplianceLevel::Info => LicenseState::NotFound,
        _ => match licenses.lookup(root, vendor) {
            Ok(Some(found)) => LicenseState::Known(found),
            Ok(None) => LicenseState::NotFound,
            Err(e) => {
                warn!("{}: license lookup failed: {}", vendor.name, e);
                LicenseState::LookupFailed
            }
        },
    };

    let evidence = Evidence {
        locked: entry.is_some(),
        local_drift,
        remote_drift,
        check_failed: !errors.is_empty(),
        license: license.clone(),
    };
    let verdict = compliance::evaluate(vendor.compliance, &evidence);
    debug!("{}: {:?} -> {}", vendor.name, evidence, verdict);

    StatusEntry {
        vendor: vendor.name.clone(),
        r#ref: vendor.r#ref.clone(),
        compliance: vendor.compliance,
        locked_commit: entry.map(|e| e.commit.clone()),
        remote_commit,
        local_drift,
        remote_drift,
        drifted,
        license: match license {
            LicenseState::Known(id) => Some(id),
            _ => None,
        },
        verdict,
        error: if errors.is_empty() {
            None
        } else {
            Some(errors.join("; "))
        },
    }
}
