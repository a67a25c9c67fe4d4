//! Version command implementation

use crate::error::Result;

pub fn run() -> Result<()> {
    println!("vendra {}", env!("CARGO_PKG_VERSION"));
    Ok(())
}
