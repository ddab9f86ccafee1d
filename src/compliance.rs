//! # Compliance
//!
//! Each vendor declares a [`ComplianceLevel`] that decides how strictly its
//! status is judged:
//!
//! - **strict**: the vendor must be locked, show no drift, and carry a known
//!   license. A license that cannot be determined yields `unknown` rather
//!   than `fail`.
//! - **lenient**: being locked is enough.
//! - **info**: reported, never judged.
//!
//! License discovery sits behind the [`LicenseLookup`] trait so web-based
//! providers can plug in. [`FileLicenseDetector`] reads `LICENSE*` and
//! `COPYING*` files out of the vendored destinations.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use glob::MatchOptions;
use log::debug;
use regex::Regex;
use serde::Serialize;

use crate::config::{ComplianceLevel, VendorDefinition};
use crate::error::Result;

/// Outcome of a compliance evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    Fail,
    Unknown,
    Info,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Verdict::Pass => "pass",
            Verdict::Fail => "fail",
            Verdict::Unknown => "unknown",
            Verdict::Info => "info",
        };
        f.write_str(s)
    }
}

/// Finds the license of a vendored dependency.
pub trait LicenseLookup: Send + Sync {
    /// The SPDX identifier of `vendor`'s license, or `None` if none was found.
    fn lookup(&self, root: &Path, vendor: &VendorDefinition) -> Result<Option<String>>;
}

/// Never finds anything; only declared licenses count.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLicenseLookup;

impl LicenseLookup for NoLicenseLookup {
    fn lookup(&self, _root: &Path, _vendor: &VendorDefinition) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Recognizes common licenses from the license files shipped with a vendor.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileLicenseDetector;

const LICENSE_FILE_PATTERNS: [&str; 3] = ["LICENSE*", "LICENCE*", "COPYING*"];

static SPDX_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"SPDX-License-Identifier:\s*([A-Za-z0-9.+\-]+)").expect("valid regex")
});

static LICENSE_FILE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(licen[cs]e|copying)").expect("valid regex"));

// Order matters: more specific texts come before the ones they contain.
static KNOWN_LICENSES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("AGPL-3.0", r"(?i)GNU AFFERO GENERAL PUBLIC LICENSE\s+Version 3"),
        ("LGPL-3.0", r"(?i)GNU LESSER GENERAL PUBLIC LICENSE\s+Version 3"),
        ("LGPL-2.1", r"(?i)GNU LESSER GENERAL PUBLIC LICENSE\s+Version 2\.1"),
        ("GPL-3.0", r"(?i)GNU GENERAL PUBLIC LICENSE\s+Version 3"),
        ("GPL-2.0", r"(?i)GNU GENERAL PUBLIC LICENSE\s+Version 2"),
        ("Apache-2.0", r"(?i)Apache License,?\s+Version 2\.0"),
        ("MPL-2.0", r"(?i)Mozilla Public License,?\s+(Version|v\.?)\s*2\.0"),
        ("MIT", r"(?i)\bMIT License\b|Permission is hereby granted, free of charge"),
        (
            "ISC",
            r"(?i)\bISC License\b|Permission to use, copy, modify, and(/or)? distribute this software for any purpose",
        ),
        (
            "BSD-3-Clause",
            r"(?is)Redistribution and use in source and binary forms.*Neither the name",
        ),
        ("BSD-2-Clause", r"(?i)Redistribution and use in source and binary forms"),
        (
            "Unlicense",
            r"(?i)This is free and unencumbered software released into the public domain",
        ),
    ]
    .into_iter()
    .map(|(id, pattern)| (id, Regex::new(pattern).expect("valid regex")))
    .collect()
});

/// The SPDX identifier matching a license text, if recognized.
pub fn identify(text: &str) -> Option<String> {
    if let Some(caps) = SPDX_TAG.captures(text) {
        return Some(caps[1].to_string());
    }
    KNOWN_LICENSES
        .iter()
        .find(|(_, pattern)| pattern.is_match(text))
        .map(|(id, _)| id.to_string())
}

impl FileLicenseDetector {
    fn candidates(dest: &Path) -> Vec<std::path::PathBuf> {
        if dest.is_file() {
            let matches = dest
                .file_name()
                .map(|name| LICENSE_FILE_NAME.is_match(&name.to_string_lossy()))
                .unwrap_or(false);
            return if matches { vec![dest.to_path_buf()] } else { Vec::new() };
        }

        let options = MatchOptions {
            case_sensitive: false,
            require_literal_separator: true,
            require_literal_leading_dot: true,
        };
        let base = glob::Pattern::escape(&dest.to_string_lossy());
        let mut found = Vec::new();
        for pattern in LICENSE_FILE_PATTERNS {
            if let Ok(paths) = glob::glob_with(&format!("{}/{}", base, pattern), options) {
                found.extend(paths.filter_map(|p| p.ok()).filter(|p| p.is_file()));
            }
        }
        found.sort();
        found.dedup();
        found
    }
}

impl LicenseLookup for FileLicenseDetector {
    fn lookup(&self, root: &Path, vendor: &VendorDefinition) -> Result<Option<String>> {
        for mapping in &vendor.mappings {
            for candidate in Self::candidates(&root.join(&mapping.to)) {
                let text = String::from_utf8_lossy(&fs::read(&candidate)?).into_owned();
                if let Some(id) = identify(&text) {
                    debug!("{}: {} found in {}", vendor.name, id, candidate.display());
                    return Ok(Some(id));
                }
            }
        }
        Ok(None)
    }
}

/// What is known about a vendor's license.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LicenseState {
    Known(String),
    NotFound,
    LookupFailed,
}

/// Facts a verdict is computed from.
#[derive(Debug, Clone)]
pub struct Evidence {
    pub locked: bool,
    /// `None` when the check was skipped.
    pub local_drift: Option<bool>,
    pub remote_drift: Option<bool>,
    /// A check failed outright.
    pub check_failed: bool,
    pub license: LicenseState,
}

/// Judge `evidence` under `level`.
pub fn evaluate(level: ComplianceLevel, evidence: &Evidence) -> Verdict {
    match level {
        ComplianceLevel::Info => Verdict::Info,
        ComplianceLevel::Lenient => {
            if evidence.locked {
                Verdict::Pass
            } else {
                Verdict::Fail
            }
        }
        ComplianceLevel::Strict => {
            let drifted = evidence.local_drift == Some(true) || evidence.remote_drift == Some(true);
            if !evidence.locked || drifted || evidence.check_failed {
                return Verdict::Fail;
            }
            match evidence.license {
                LicenseState::Known(_) => Verdict::Pass,
                LicenseState::NotFound => Verdict::Fail,
                LicenseState::LookupFailed => Verdict::Unknown,
            }
        }
    }
}
