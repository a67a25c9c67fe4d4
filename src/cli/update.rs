use clap::Parser;

use crate::installer::{DEFAULT_WORKERS, InstallFlags};

/// Arguments for the update command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                   Re-resolve and install:\n    vendra update\n\n\
                   Update and remove unused packages:\n    vendra update --delete\n\n\
                   Update with a larger worker pool:\n    vendra update --workers 16")]
pub struct UpdateArgs {
    /// Delete vendor packages not present in the lock file
    #[arg(long)]
    pub delete: bool,

    /// Remove VCS metadata directories from the vendor tree
    #[arg(long = "strip-vcs")]
    pub strip_vcs: bool,

    /// Remove nested vendor and legacy workspace directories
    #[arg(long = "strip-vendor")]
    pub strip_vendor: bool,

    /// Skip the shared download cache lock
    #[arg(long = "no-cache")]
    pub no_cache: bool,

    /// Number of parallel checkout workers
    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,
}

impl UpdateArgs {
    pub fn to_flags(&self) -> InstallFlags {
        InstallFlags {
            delete_unused: self.delete,
            strip_vcs: self.strip_vcs,
            strip_vendor: self.strip_vendor,
            use_cache: !self.no_cache,
            workers: self.workers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_update() {
        let cli = super::super::Cli::try_parse_from(["vendra", "update", "--delete"])
            .unwrap_or_else(|e| {
                panic!("Failed to parse CLI arguments: {}", e);
            });
        match cli.command {
            super::super::Commands::Update(args) => {
                assert!(args.delete);
                assert_eq!(args.workers, DEFAULT_WORKERS);
            }
            _ => panic!("Expected Update command"),
        }
    }
}
