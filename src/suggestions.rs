//! # Error Suggestions
//!
//! This module provides helper functions for generating helpful error
//! messages with hints and suggestions. Following CLI recommendations,
//! errors should tell users what went wrong AND how to fix it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use git_vendor::suggestions;
//!
//! // Instead of:
//! anyhow::bail!("Vendor '{}' not found", name);
//!
//! // Use:
//! return Err(suggestions::vendor_not_found(name, &known));
//! ```

/// Generate an error for a vendor name that is not configured.
///
/// Suggests the closest configured name when one is near enough.
pub fn vendor_not_found(name: &str, known: &[&str]) -> anyhow::Error {
    let did_you_mean = find_similar(name, known)
        .map(|s| format!("\nhint: Did you mean '{s}'?"))
        .unwrap_or_default();

    anyhow::anyhow!(
        "Vendor '{name}' not found{did_you_mean}\n\n\
         hint: Run 'git-vendor list' to see configured vendors"
    )
}

/// Generate an error for a `--map` value that is not `FROM:TO`.
pub fn invalid_mapping(value: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "Invalid mapping: {value}\n\n\
         hint: Use FROM:TO, e.g. --map src/:vendor/left-pad/\n\
         hint: Use .:DEST to vendor the whole repository"
    )
}

/// Generate an error for when cache clean is called without a selection.
pub fn cache_clean_no_filter() -> anyhow::Error {
    anyhow::anyhow!(
        "Nothing selected for cache clean\n\n\
         hint: Use --all to remove every cached commit\n\
         hint: Use --unused to remove commits no vendor is locked to\n\
         hint: Pass one or more commit hashes to remove specific entries"
    )
}

/// Generate the error ending a pull in which vendors failed.
pub fn vendors_failed(failed: &[&str]) -> anyhow::Error {
    anyhow::anyhow!(
        "{count} vendor(s) failed to sync: {names}\n\n\
         hint: Re-run with --log-level debug for details\n\
         hint: Successfully synced vendors were still locked",
        count = failed.len(),
        names = failed.join(", ")
    )
}

/// Generate the error ending a status run with failing vendors.
pub fn status_failed(failed: usize) -> anyhow::Error {
    anyhow::anyhow!(
        "{failed} vendor(s) failed status checks\n\n\
         hint: Run 'git-vendor pull' to restore drifted files and pins\n\
         hint: Use --offline to skip remote checks"
    )
}

/// Find a similar string from a list of candidates using edit distance.
///
/// Returns Some(candidate) if a close match is found (edit distance <= 2).
fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = edit_distance(input, candidate);
            if distance <= 2 && distance < input.len() {
                Some((candidate, distance))
            } else {
                None
            }
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Calculate the Levenshtein edit distance between two strings.
fn edit_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let a_len = a_chars.len();
    let b_len = b_chars.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut matrix = vec![vec![0usize; b_len + 1]; a_len + 1];

    for (i, row) in matrix.iter_mut().enumerate() {
        row[0] = i;
    }
    for (j, cell) in matrix[0].iter_mut().enumerate() {
        *cell = j;
    }

    for i in 1..=a_len {
        for j in 1..=b_len {
            let cost = if a_chars[i - 1] == b_chars[j - 1] {
                0
            } else {
                1
            };
            matrix[i][j] = (matrix[i - 1][j] + 1)
                .min(matrix[i][j - 1] + 1)
                .min(matrix[i - 1][j - 1] + cost);
        }
    }

    matrix[a_len][b_len]
}
