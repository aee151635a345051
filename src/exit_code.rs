// Copyright 2026 Dana Whitfield

//! Exit codes from rebuild-sentinel.
//!
//! Assigned so that CI or other automation can distinguish why the process
//! stopped.

/// Normal shutdown: final port kill completed, or a no-children one-shot
/// mirror finished.
pub const SUCCESS: i32 = 0;

/// Bad or missing command-line flags.
///
/// (1 is also the value returned by Clap.)
pub const USAGE: i32 = 1;

/// The production-dependency resolver could not resolve a declared
/// dependency to a folder on disk.
pub const RESOLVER_FAILED: i32 = 2;

/// The transformer exited non-zero, or its output was not valid file
/// contents.
pub const TRANSFORM_FAILED: i32 = 3;

/// An internal software error.
pub const SOFTWARE: i32 = 70;
