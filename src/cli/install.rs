use clap::Parser;

use crate::installer::{DEFAULT_WORKERS, InstallFlags};

/// Arguments for the install command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                   Install from the lock file:\n    vendra install\n\n\
                   Install and remove unused packages:\n    vendra install --delete\n\n\
                   Install and strip VCS metadata:\n    vendra install --strip-vcs\n\n\
                   Install without the shared cache lock:\n    vendra install --no-cache")]
pub struct InstallArgs {
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

impl InstallArgs {
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
    fn test_cli_parsing_install_defaults() {
        let cli = super::super::Cli::try_parse_from(["vendra", "install"]).unwrap_or_else(|e| {
            panic!("Failed to parse CLI arguments: {}", e);
        });
        match cli.command {
            super::super::Commands::Install(args) => {
                assert!(!args.delete);
                assert!(!args.strip_vcs);
                assert!(!args.strip_vendor);
                assert!(!args.no_cache);
                assert_eq!(args.workers, DEFAULT_WORKERS);
            }
            _ => panic!("Expected Install command"),
        }
    }

    #[test]
    fn test_cli_parsing_install_with_options() {
        let cli = super::super::Cli::try_parse_from([
            "vendra",
            "install",
            "--delete",
            "--strip-vcs",
            "--strip-vendor",
            "--workers",
            "4",
        ])
        .unwrap_or_else(|e| {
            panic!("Failed to parse CLI arguments: {}", e);
        });
        match cli.command {
            super::super::Commands::Install(args) => {
                let flags = args.to_flags();
                assert!(flags.delete_unused);
                assert!(flags.strip_vcs);
                assert!(flags.strip_vendor);
                assert!(flags.use_cache);
                assert_eq!(flags.workers, 4);
            }
            _ => panic!("Expected Install command"),
        }
    }

    #[test]
    fn test_no_cache_disables_cache_use() {
        let cli = super::super::Cli::try_parse_from(["vendra", "install", "--no-cache"])
            .unwrap_or_else(|e| {
                panic!("Failed to parse CLI arguments: {}", e);
            });
        match cli.command {
            super::super::Commands::Install(args) => {
                assert!(!args.to_flags().use_cache);
            }
            _ => panic!("Expected Install command"),
        }
    }
}
