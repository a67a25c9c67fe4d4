//! Vendra - dependency resolver and vendor tree installer
//!
//! Vendra turns a manifest of version-constrained source dependencies
//! (vendra.yaml) into a pinned, reproducible lock file (vendra.lock) and
//! materializes the resolved graph into a local vendor/ tree, checking out
//! each dependency at its locked revision.

use clap::Parser;

mod cache;
mod cli;
mod commands;
mod error;
mod hash;
mod installer;
mod lockfile;
mod manifest;
mod progress;
mod resolver;
mod ui;
mod vcs;
mod workspace;

#[cfg(test)]
mod test_fixtures;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Install(args) => commands::install::run(cli.workspace, args),
        Commands::Update(args) => commands::update::run(cli.workspace, args),
        Commands::Cache(args) => commands::clean_cache::run(args),
        Commands::Version => commands::version::run(),
        Commands::Completions(args) => commands::completions::run(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
