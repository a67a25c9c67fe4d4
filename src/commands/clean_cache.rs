//! Cache command implementation

use crate::cache::{Cache, CacheGuard};
use crate::cli::{CacheArgs, CacheSubcommand};
use crate::error::Result;
use crate::ui;

pub fn run(args: CacheArgs) -> Result<()> {
    match args.command {
        CacheSubcommand::Clean => clean(),
    }
}

fn clean() -> Result<()> {
    let cache = Cache::new()?;
    // Hold the guard so a concurrent run does not lose its sources mid-install
    let _guard = CacheGuard::acquire(&cache)?;

    let removed = cache.clean()?;
    ui::info(&format!(
        "Removed {} cached source(s) from {}.",
        removed,
        cache.location().display()
    ));
    Ok(())
}
