//! CLI argument parsing and command dispatch

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::warn;

use crate::commands::{self, Context};

/// git-vendor - Vendor external git repositories at pinned commits
#[derive(Parser, Debug)]
#[command(name = "git-vendor")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Project root containing .git-vendor/
    #[arg(
        long,
        global = true,
        value_name = "DIR",
        env = "GIT_VENDOR_ROOT",
        default_value = "."
    )]
    root: PathBuf,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create an empty vendor configuration
    Init(commands::init::InitArgs),

    /// Fetch vendors and write them to their destinations
    Pull(commands::pull::PullArgs),

    /// Report drift and compliance for every vendor
    Status(commands::status::StatusArgs),

    /// Add a vendor
    #[command(visible_alias = "create")]
    Add(commands::add::AddArgs),

    /// Remove a vendor and its lock entry
    #[command(visible_alias = "delete")]
    Remove(commands::remove::RemoveArgs),

    /// Rename a vendor, keeping its lock entry
    Rename(commands::rename::RenameArgs),

    /// Change a vendor's url, ref, license, group or compliance level
    Edit(commands::edit::EditArgs),

    /// Add a path mapping to a vendor
    AddMapping(commands::mapping::AddMappingArgs),

    /// Remove a path mapping from a vendor
    RemoveMapping(commands::mapping::RemoveMappingArgs),

    /// Replace a path mapping of a vendor
    UpdateMapping(commands::mapping::UpdateMappingArgs),

    /// List configured vendors
    List(commands::list::ListArgs),

    /// Check the configuration without touching anything
    Validate(commands::validate::ValidateArgs),

    /// Manage the cache of fetched commits
    Cache(commands::cache::CacheArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),

    /// Deprecated: use `pull --locked`
    #[command(hide = true)]
    Sync(commands::pull::PullArgs),

    /// Deprecated: use `pull`
    #[command(hide = true)]
    Update(commands::pull::PullArgs),

    /// Deprecated: use `status --offline`
    #[command(hide = true)]
    Verify(commands::status::StatusArgs),

    /// Deprecated: use `status --remote-only`
    #[command(hide = true)]
    Outdated(commands::status::StatusArgs),

    /// Deprecated: use `status`
    #[command(hide = true)]
    Diff(commands::status::StatusArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(self.effective_log_level());
        let ctx = Context::new(self.root, &self.color);

        match self.command {
            Commands::Init(args) => commands::init::execute(args, &ctx),
            Commands::Pull(args) => commands::pull::execute(args, &ctx),
            Commands::Status(args) => commands::status::execute(args, &ctx),
            Commands::Add(args) => commands::add::execute(args, &ctx),
            Commands::Remove(args) => commands::remove::execute(args, &ctx),
            Commands::Rename(args) => commands::rename::execute(args, &ctx),
            Commands::Edit(args) => commands::edit::execute(args, &ctx),
            Commands::AddMapping(args) => commands::mapping::execute_add(args, &ctx),
            Commands::RemoveMapping(args) => commands::mapping::execute_remove(args, &ctx),
            Commands::UpdateMapping(args) => commands::mapping::execute_update(args, &ctx),
            Commands::List(args) => commands::list::execute(args, &ctx),
            Commands::Validate(args) => commands::validate::execute(args, &ctx),
            Commands::Cache(args) => commands::cache::execute(args, &ctx),
            Commands::Completions(args) => commands::completions::execute(args),
            Commands::Sync(mut args) => {
                warn!("'sync' is deprecated; use 'pull --locked'");
                args.locked = true;
                commands::pull::execute(args, &ctx)
            }
            Commands::Update(args) => {
                warn!("'update' is deprecated; use 'pull'");
                commands::pull::execute(args, &ctx)
            }
            Commands::Verify(mut args) => {
                warn!("'verify' is deprecated; use 'status --offline'");
                args.offline = true;
                commands::status::execute(args, &ctx)
            }
            Commands::Outdated(mut args) => {
                warn!("'outdated' is deprecated; use 'status --remote-only'");
                args.remote_only = true;
                commands::status::execute(args, &ctx)
            }
            Commands::Diff(args) => {
                warn!("'diff' is deprecated; use 'status'");
                commands::status::execute(args, &ctx)
            }
        }
    }

    /// `-v` on a pull raises logging to debug and `-q` lowers it to errors.
    fn effective_log_level(&self) -> &str {
        match &self.command {
            Commands::Pull(args) | Commands::Sync(args) | Commands::Update(args) => {
                if args.verbose {
                    "debug"
                } else if args.quiet {
                    "error"
                } else {
                    &self.log_level
                }
            }
            _ => &self.log_level,
        }
    }
}

/// Initialize `env_logger`. `RUST_LOG` wins over `level` when set.
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}
