// Copyright 2026 Dana Whitfield

//! The Output Root: truncated and recreated once at startup.
//!
//! Unlike the teacher's `mutants.out` (rotated to `.old` and reused across
//! runs), this directory carries no state between invocations — it is
//! wholly derived from the Source Roots, so there is nothing worth keeping.

use std::fs;

use anyhow::Context;
use camino::Utf8Path;
use tracing::debug;

use crate::Result;

/// Delete `output_root` if it exists, then create it fresh.
pub fn prepare(output_root: &Utf8Path) -> Result<()> {
    if output_root.exists() {
        fs::remove_dir_all(output_root)
            .with_context(|| format!("remove existing output root {output_root}"))?;
    }
    fs::create_dir_all(output_root)
        .with_context(|| format!("create output root {output_root}"))?;
    debug!(%output_root, "output root prepared");
    Ok(())
}
