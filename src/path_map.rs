// Copyright 2026 Dana Whitfield

//! Map a path under a Source Root to its counterpart under the Output Root.

use camino::{Utf8Path, Utf8PathBuf};

use crate::path::Utf8PathSlashes;

/// Map a source path to its output path by stripping the first path segment
/// (the Source Root's own name) and joining the remainder under `output_root`.
///
/// `source_path` should be the path as discovered by the watcher or scanner,
/// rooted at (and including) the Source Root's leaf directory name, e.g.
/// `src/components/button.tsx` for a watch root named `src`.
pub fn map_to_output(source_path: &Utf8Path, output_root: &Utf8Path) -> Utf8PathBuf {
    let normalized = source_path.to_slash_path();
    let mut components = Utf8Path::new(&normalized).components();
    components.next(); // drop the Source Root's own leaf segment
    let rest: Utf8PathBuf = components.collect();
    output_root.join(rest)
}
