// Copyright 2026 Dana Whitfield

//! Decide, per file, whether it should be passed through the user
//! transformer rather than copied byte-for-byte.

use camino::Utf8Path;
use globset::GlobSet;

use crate::glob::build_glob_set;
use crate::Result;

/// Holds the compiled glob patterns supplied via `--transform`.
#[derive(Debug, Default)]
pub struct TransformGate {
    globs: Option<GlobSet>,
}

impl TransformGate {
    /// Build a gate from the raw `--transform` glob strings.
    ///
    /// An empty list of patterns produces a gate that never transforms
    /// anything, matching the "no patterns configured" default in the spec.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<TransformGate> {
        Ok(TransformGate {
            globs: build_glob_set(patterns)?,
        })
    }

    /// True iff `path` should be run through the transformer.
    pub fn should_transform(&self, path: &Utf8Path) -> bool {
        self.globs
            .as_ref()
            .is_some_and(|globs| globs.is_match(path))
    }
}
