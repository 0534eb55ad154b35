//! OME-XML metadata validation CLI tool
//!
//! Command-line interface for checking and repairing channel metadata using
//! the ome-metatools library.

#[cfg(feature = "cli")]
use ome_metatools::cli;

#[cfg(feature = "cli")]
fn main() -> anyhow::Result<()> {
    cli::main()
}

#[cfg(not(feature = "cli"))]
fn main() {
    panic!("CLI feature not enabled. Please rebuild with --features cli");
}
