//! # Output Configuration
//!
//! This module provides utilities for controlling CLI output appearance,
//! including color and emoji support based on terminal capabilities and
//! user preferences, and the labels used in pull and status reports.
//!
//! ## Respecting User Preferences
//!
//! The module respects the following environment variables and flags:
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals
//!
//! ## Usage
//!
//! ```rust,ignore
//! use git_vendor::output::{OutputConfig, emoji};
//!
//! let config = OutputConfig::from_env_and_flag("auto");
//!
//! // Use emoji helper that respects config
//! println!("{} Pulling...", emoji(&config, "📦", "[PULL]"));
//! ```

use std::env;

use console::style;

use crate::compliance::Verdict;
use crate::sync::SyncOutcome;

/// Output configuration for controlling colors and emojis.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors and emojis should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and CLI flag.
    ///
    /// # Arguments
    /// * `color_flag` - The value of the --color CLI flag: "always", "never", or "auto"
    ///
    /// # Behavior
    /// - `--color=always`: Force colors on (overrides NO_COLOR)
    /// - `--color=never`: Force colors off
    /// - `--color=auto`: Detect based on environment
    ///
    /// In auto mode, colors are disabled if:
    /// - `NO_COLOR` environment variable is set (any value, including empty)
    /// - `CLICOLOR=0` is set
    /// - `TERM=dumb` is set
    /// - stdout is not a TTY (unless `CLICOLOR_FORCE=1`)
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    /// Detect whether color output is supported based on environment.
    fn detect_color_support() -> bool {
        // The presence of the variable (even if empty) disables colors
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }

        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }

        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }

        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        console::Term::stdout().features().colors_supported()
    }

    /// Create a configuration with colors always enabled.
    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    /// Create a configuration with colors always disabled.
    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Returns the appropriate string based on color configuration.
///
/// When colors are enabled, returns the emoji. When disabled, returns
/// the plain text alternative.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

/// First seven characters of a commit hash.
pub fn short_commit(commit: &str) -> &str {
    commit.get(..7).unwrap_or(commit)
}

/// `yes`, `no`, or `-` for a check that did not run.
pub fn drift_label(drift: Option<bool>) -> &'static str {
    match drift {
        Some(true) => "yes",
        Some(false) => "no",
        None => "-",
    }
}

/// A pull outcome, colored when enabled. Dry runs say what would happen.
pub fn outcome_label(config: &OutputConfig, outcome: SyncOutcome, dry_run: bool) -> String {
    let text = match (outcome, dry_run) {
        (SyncOutcome::Synced, true) => "would sync".to_string(),
        (other, _) => other.to_string(),
    };
    if !config.use_color {
        return text;
    }
    let styled = match outcome {
        SyncOutcome::Synced => style(text).green(),
        SyncOutcome::Unchanged => style(text).dim(),
        SyncOutcome::Skipped | SyncOutcome::Modified => style(text).yellow(),
        SyncOutcome::Failed => style(text).red().bold(),
    };
    styled.force_styling(true).to_string()
}

/// A compliance verdict, colored when enabled.
pub fn verdict_label(config: &OutputConfig, verdict: Verdict) -> String {
    let text = verdict.to_string();
    if !config.use_color {
        return text;
    }
    let styled = match verdict {
        Verdict::Pass => style(text).green(),
        Verdict::Fail => style(text).red().bold(),
        Verdict::Unknown => style(text).yellow(),
        Verdict::Info => style(text).cyan(),
    };
    styled.force_styling(true).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_always() {
        let config = OutputConfig::from_env_and_flag("always");
        assert!(config.use_color);
    }

    #[test]
    fn test_color_never() {
        let config = OutputConfig::from_env_and_flag("never");
        assert!(!config.use_color);
    }

    #[test]
    fn test_emoji_helper() {
        assert_eq!(emoji(&OutputConfig::with_color(), "📦", "[PULL]"), "📦");
        assert_eq!(emoji(&OutputConfig::without_color(), "📦", "[PULL]"), "[PULL]");
    }

    #[test]
    fn test_short_commit() {
        assert_eq!(short_commit("aaaa111000000000000000000000000000000000"), "aaaa111");
        assert_eq!(short_commit("abc"), "abc");
    }

    #[test]
    fn test_labels_without_color() {
        let plain = OutputConfig::without_color();
        assert_eq!(outcome_label(&plain, SyncOutcome::Synced, true), "would sync");
        assert_eq!(outcome_label(&plain, SyncOutcome::Modified, false), "modified");
        assert_eq!(verdict_label(&plain, Verdict::Unknown), "unknown");
        assert_eq!(drift_label(None), "-");
        assert_eq!(drift_label(Some(true)), "yes");
    }

    #[test]
    fn test_labels_with_color_keep_text() {
        let color = OutputConfig::with_color();
        let label = verdict_label(&color, Verdict::Fail);
        assert!(label.contains("fail"));
        assert!(label.contains('\u{1b}'));
    }
}
