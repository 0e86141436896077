//! pagemark-cli
//!
//! The cli interface is not (yet) stable and could change at any time.

// Modules
pub(crate) mod cli;
pub(crate) mod inspect;
pub(crate) mod replay;
pub(crate) mod validators;

// Renames
extern crate nalgebra as na;

fn main() -> anyhow::Result<()> {
    smol::block_on(async { cli::run().await })
}
