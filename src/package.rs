// Copyright 2026 Dana Whitfield

//! Represent a top-level package discovered under a watched Source Root.

use camino::Utf8PathBuf;

use crate::manifest::PackageManifest;

/// A package with its own manifest, found somewhere under a Source Root.
///
/// "Top-level" here means the resolver found a manifest there during its
/// directory scan; it says nothing about nesting depth in the watched tree.
#[derive(Debug, Clone)]
pub struct Package {
    /// The package's declared name, if its manifest has one.
    pub name: Option<String>,

    /// The directory containing the manifest, relative to the watch root.
    pub relative_dir: Utf8PathBuf,

    pub manifest: PackageManifest,
}

impl Package {
    pub fn new(relative_dir: Utf8PathBuf, manifest: PackageManifest) -> Package {
        Package {
            name: manifest.name.clone(),
            relative_dir,
            manifest,
        }
    }
}
