//! # Edit Command Implementation
//!
//! Implements `edit <name>`, which changes the scalar fields of a vendor:
//! url, ref, license, group and compliance level. Mappings have their own
//! commands (`add-mapping`, `remove-mapping`, `update-mapping`).
//!
//! Changing the ref does not touch the lock; the next `pull` resolves it.

use anyhow::{bail, Result};
use clap::Args;

use git_vendor::config::{self, ComplianceLevel, VendorEdit};
use git_vendor::output::emoji;

use super::{explain, Context};

/// Change a vendor's url, ref, license, group or compliance level
#[derive(Args, Debug)]
pub struct EditArgs {
    /// Vendor to edit
    #[arg(value_name = "NAME")]
    pub name: String,

    /// New repository URL
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// New branch, tag or commit
    #[arg(long = "ref", value_name = "REF")]
    pub r#ref: Option<String>,

    /// Declared SPDX license identifier
    #[arg(long, value_name = "SPDX", conflicts_with = "clear_license")]
    pub license: Option<String>,

    /// Remove the declared license
    #[arg(long)]
    pub clear_license: bool,

    /// Group used by `pull --group`
    #[arg(long, value_name = "GROUP", conflicts_with = "clear_group")]
    pub group: Option<String>,

    /// Remove the vendor from its group
    #[arg(long)]
    pub clear_group: bool,

    /// Compliance level
    #[arg(long, value_name = "LEVEL")]
    pub compliance: Option<ComplianceLevel>,
}

impl EditArgs {
    fn to_edit(&self) -> VendorEdit {
        let license = if self.clear_license {
            Some(None)
        } else {
            self.license.clone().map(Some)
        };
        let group = if self.clear_group {
            Some(None)
        } else {
            self.group.clone().map(Some)
        };
        VendorEdit {
            url: self.url.clone(),
            r#ref: self.r#ref.clone(),
            compliance: self.compliance,
            license,
            group,
        }
    }
}

/// Execute the `edit` command.
pub fn execute(args: EditArgs, ctx: &Context) -> Result<()> {
    let edit = args.to_edit();
    if edit.url.is_none()
        && edit.r#ref.is_none()
        && edit.compliance.is_none()
        && edit.license.is_none()
        && edit.group.is_none()
    {
        bail!("Nothing to edit\n\nhint: Pass at least one of --url, --ref, --license, --group or --compliance");
    }
    if let Some(url) = &edit.url {
        config::check_repository_url(url)?;
    }

    let store = ctx.project.config_store();
    let mut vendors = store.load()?;
    vendors
        .edit_vendor(&args.name, edit)
        .map_err(|e| explain(e, &vendors))?;
    store.save(&vendors)?;

    println!("{} Updated {}", emoji(&ctx.out, "✅", "[OK]"), args.name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(name: &str) -> EditArgs {
        EditArgs {
            name: name.to_string(),
            url: None,
            r#ref: None,
            license: None,
            clear_license: false,
            group: None,
            clear_group: false,
            compliance: None,
        }
    }

    #[test]
    fn test_clear_flags_map_to_explicit_none() {
        let mut a = args("left-pad");
        a.clear_license = true;
        a.group = Some("js".to_string());
        let edit = a.to_edit();
        assert_eq!(edit.license, Some(None));
        assert_eq!(edit.group, Some(Some("js".to_string())));
        assert_eq!(edit.url, None);
    }
}
