#![deny(clippy::implicit_return)]
#![allow(clippy::needless_return)]

use anyhow::Result;
use vergen::EmitBuilder;

fn main() -> Result<()> {
    // Falls back to idempotent placeholder values when building outside of a
    // git checkout, such as from a published crate tarball.
    EmitBuilder::builder().all_build().all_git().emit()?;

    return Ok(());
}
