// Copyright 2026 Dana Whitfield

//! Utilities for file paths shared across the watcher, resolver, and mirror.

use camino::Utf8Path;
use path_slash::PathExt as _;

/// An extension trait that helps Utf8Path print with forward slashes,
/// even on Windows.
///
/// This makes the output more consistent across platforms and so easier
/// to test, and matches the normalized form the Path Mapper expects.
pub trait Utf8PathSlashes {
    fn to_slash_path(&self) -> String;
}

impl Utf8PathSlashes for Utf8Path {
    fn to_slash_path(&self) -> String {
        self.as_std_path().to_slash_lossy().into_owned()
    }
}

#[cfg(test)]
mod test {
    use camino::Utf8PathBuf;

    use super::Utf8PathSlashes;

    #[test]
    fn path_slashes_drops_empty_parts() {
        let mut path = Utf8PathBuf::from("/a/b/c/");
        path.push("d/e/f");
        assert_eq!(path.to_slash_path(), "/a/b/c/d/e/f");
    }
}
