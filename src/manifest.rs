// Copyright 2026 Dana Whitfield

//! Parse package manifests (`package.json`-shaped files) for the
//! production-dependency resolver.
//!
//! Only the fields the resolver needs are modeled; anything else in the
//! manifest is ignored.

use std::collections::BTreeMap;
use std::fs;

use anyhow::Context;
use camino::Utf8Path;
use serde::Deserialize;

use crate::Result;

/// The manifest filename this resolver looks for.
pub const MANIFEST_FILENAME: &str = "package.json";

/// The subset of a package manifest the resolver cares about.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageManifest {
    /// The package's own name. Absent on a malformed or anonymous manifest;
    /// that's fine, it's only used for diagnostics, and a nameless manifest
    /// may still contribute dependency edges.
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,

    /// Merged in as a production dependency too: an optional dependency is
    /// still a dependency that may end up on disk in a vendor tree.
    #[serde(default, rename = "optionalDependencies")]
    pub optional_dependencies: BTreeMap<String, String>,
}

impl PackageManifest {
    /// Read and parse the manifest at `manifest_path`.
    pub fn read(manifest_path: &Utf8Path) -> Result<PackageManifest> {
        let text = fs::read_to_string(manifest_path)
            .with_context(|| format!("read manifest {manifest_path}"))?;
        serde_json::from_str(&text).with_context(|| format!("parse manifest {manifest_path}"))
    }

    /// Iterate over every dependency name this manifest declares, direct or
    /// optional, deduplicated by BTreeMap key union order.
    pub fn dependency_names(&self) -> impl Iterator<Item = &str> {
        self.dependencies
            .keys()
            .chain(self.optional_dependencies.keys())
            .map(String::as_str)
    }
}

#[cfg(test)]
mod test {
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    use super::*;

    fn tmp_manifest(contents: &str) -> (TempDir, Utf8PathBuf) {
        let tmp = TempDir::new().unwrap();
        let path: Utf8PathBuf = Utf8Path::from_path(tmp.path())
            .unwrap()
            .join(MANIFEST_FILENAME);
        fs::write(&path, contents).unwrap();
        (tmp, path)
    }

    #[test]
    fn parses_dependencies_and_optional_dependencies() {
        let (_tmp, path) = tmp_manifest(
            r#"{
                "name": "widget",
                "dependencies": {"left-pad": "^1.0.0"},
                "optionalDependencies": {"fsevents": "^2.0.0"}
            }"#,
        );
        let manifest = PackageManifest::read(&path).unwrap();
        assert_eq!(manifest.name.as_deref(), Some("widget"));
        let mut names: Vec<&str> = manifest.dependency_names().collect();
        names.sort_unstable();
        assert_eq!(names, vec!["fsevents", "left-pad"]);
    }

    #[test]
    fn nameless_manifest_still_parses() {
        let (_tmp, path) = tmp_manifest(r#"{"dependencies": {"x": "1.0.0"}}"#);
        let manifest = PackageManifest::read(&path).unwrap();
        assert_eq!(manifest.name, None);
        assert_eq!(manifest.dependency_names().collect::<Vec<_>>(), vec!["x"]);
    }

    #[test]
    fn manifest_with_no_dependencies_is_empty() {
        let (_tmp, path) = tmp_manifest(r#"{"name": "leaf"}"#);
        let manifest = PackageManifest::read(&path).unwrap();
        assert_eq!(manifest.dependency_names().next(), None);
    }
}
