//! CLI definitions using clap derive API
//!
//! This module is organized into submodules for each command's argument
//! types:
//! - install: Install command arguments
//! - update: Update command arguments
//! - cache: Cache command arguments
//! - completions: Completions command arguments

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod cache;
pub mod completions;
pub mod install;
pub mod update;

pub use cache::{CacheArgs, CacheSubcommand};
pub use completions::CompletionsArgs;
pub use install::InstallArgs;
pub use update::UpdateArgs;

/// Vendra - dependency resolver and vendor tree installer
#[derive(Parser, Debug)]
#[command(
    name = "vendra",
    author,
    version,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Dependency resolver and vendor tree installer for source-based packages",
    long_about = "Vendra resolves a manifest of version-constrained dependencies into a \
                  pinned lock file and materializes the resolved graph into a local \
                  vendor/ tree, checking out each dependency at its locked revision.",
    after_help = "Examples:\n   \
                  vendra install                  # Materialize vendor/ from vendra.lock\n   \
                  vendra update                   # Re-resolve vendra.yaml and update the lock\n   \
                  vendra install --delete         # Also remove packages absent from the lock\n   \
                  vendra update --strip-vcs       # Strip VCS metadata from the vendor tree\n   \
                  vendra cache clean              # Purge the shared download cache\n"
)]
pub struct Cli {
    /// Project directory (defaults to the current directory)
    #[arg(long, short = 'w', global = true, env = "VENDRA_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install packages from the lock file into the vendor tree
    Install(InstallArgs),

    /// Re-resolve the dependency graph and rewrite the lock file
    Update(UpdateArgs),

    /// Manage the shared download cache
    Cache(CacheArgs),

    /// Print version information
    Version,

    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_top_level() {
        let cli = Cli::try_parse_from(["vendra", "install"]).unwrap_or_else(|e| {
            panic!("Failed to parse CLI arguments: {}", e);
        });
        assert!(matches!(cli.command, Commands::Install(_)));
        assert!(cli.workspace.is_none());
    }

    #[test]
    fn test_cli_parsing_workspace_flag() {
        let cli = Cli::try_parse_from(["vendra", "-w", "/tmp/project", "update"])
            .unwrap_or_else(|e| {
                panic!("Failed to parse CLI arguments: {}", e);
            });
        assert_eq!(cli.workspace, Some(PathBuf::from("/tmp/project")));
        assert!(matches!(cli.command, Commands::Update(_)));
    }

    #[test]
    fn test_cli_parsing_cache_clean() {
        let cli = Cli::try_parse_from(["vendra", "cache", "clean"]).unwrap_or_else(|e| {
            panic!("Failed to parse CLI arguments: {}", e);
        });
        match cli.command {
            Commands::Cache(args) => {
                assert!(matches!(args.command, CacheSubcommand::Clean));
            }
            _ => panic!("Expected Cache command"),
        }
    }
}
