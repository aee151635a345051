// Copyright 2026 Dana Whitfield

//! The production-dependency resolver.
//!
//! Decides which folders under `node_modules`-style vendor trees actually
//! participate in the build, by walking package-manifest dependency graphs
//! and symlinks to a fixpoint. Version pinning is deliberately ignored:
//! presence on disk is the source of truth.

use std::collections::HashSet;
use std::fs;

use anyhow::{anyhow, bail};
use camino::{Utf8Path, Utf8PathBuf};
use ignore::WalkBuilder;
use tracing::debug;

use crate::manifest::{PackageManifest, MANIFEST_FILENAME};
use crate::package::Package;
use crate::Result;

const VENDOR_DIR: &str = "node_modules";

/// The Production-Dependency Set: every vendor folder the Filter should
/// let through.
#[derive(Debug, Default)]
pub struct ProductionDeps {
    paths: HashSet<Utf8PathBuf>,
}

impl ProductionDeps {
    #[cfg(test)]
    pub fn from_paths(paths: impl IntoIterator<Item = Utf8PathBuf>) -> ProductionDeps {
        ProductionDeps {
            paths: paths.into_iter().collect(),
        }
    }

    pub fn contains(&self, path: &Utf8Path) -> bool {
        self.paths.contains(path)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.paths.len()
    }
}

/// Compute the Production-Dependency Set for the given watch directories.
///
/// Fails with a fatal diagnostic naming both the missing dependency and the
/// package that declared it, matching the resolver's "missing dependency is
/// fatal" edge case.
pub fn resolve(watch_dirs: &[Utf8PathBuf]) -> Result<ProductionDeps> {
    let mut working_set: Vec<Utf8PathBuf> = Vec::new();
    let mut seen: HashSet<Utf8PathBuf> = HashSet::new();

    for watch_dir in watch_dirs {
        for top_level_dir in discover_top_level_manifest_dirs(watch_dir)? {
            let manifest_path = top_level_dir.join(MANIFEST_FILENAME);
            let manifest = PackageManifest::read(&manifest_path)?;
            let package = Package::new(top_level_dir.clone(), manifest.clone());
            debug!(name = ?package.name, dir = %top_level_dir, "found top-level package");
            for name in manifest.dependency_names() {
                push_new(&top_level_dir.join(VENDOR_DIR).join(name), &mut working_set, &mut seen);
            }
            for linked in symlinked_children(&top_level_dir.join(VENDOR_DIR)) {
                push_new(&linked, &mut working_set, &mut seen);
            }
        }
    }

    // Fixpoint expansion: each newly admitted vendor folder may itself
    // depend on others.
    let mut cursor = 0;
    while cursor < working_set.len() {
        let dep_dir = working_set[cursor].clone();
        cursor += 1;

        let manifest_path = dep_dir.join(MANIFEST_FILENAME);
        if !manifest_path.is_file() {
            // A symlinked-in entry with no manifest of its own contributes
            // no further edges.
            continue;
        }
        let manifest = PackageManifest::read(&manifest_path)?;
        for name in manifest.dependency_names() {
            let resolved = resolve_nested_first(&dep_dir, name)
                .ok_or_else(|| anyhow!("cannot resolve dependency {name:?} of {dep_dir}"))?;
            push_new(&resolved, &mut working_set, &mut seen);
        }
        for linked in symlinked_children(&dep_dir.join(VENDOR_DIR)) {
            push_new(&linked, &mut working_set, &mut seen);
        }
    }

    let mut paths: HashSet<Utf8PathBuf> = working_set.into_iter().collect();

    // Org expansion: a scoped package's parent `@scope` folder is admitted
    // too, so the Filter can accept the whole scope with one lookup.
    let org_parents: Vec<Utf8PathBuf> = paths
        .iter()
        .filter_map(|p| {
            let parent = p.parent()?;
            let scope = parent.file_name()?;
            scope.starts_with('@').then(|| parent.to_owned())
        })
        .collect();
    paths.extend(org_parents);

    debug!(resolved = paths.len(), "production-dependency set resolved");
    Ok(ProductionDeps { paths })
}

fn push_new(path: &Utf8Path, working_set: &mut Vec<Utf8PathBuf>, seen: &mut HashSet<Utf8PathBuf>) {
    if seen.insert(path.to_owned()) {
        working_set.push(path.to_owned());
    }
}

/// Resolve dependency `name` of the package at `dep_dir` with nested-first,
/// flat-fallback: starting from `dep_dir`, ascend parent directories and
/// look for `<ancestor>/node_modules/<name>/package.json`. The first match
/// wins.
fn resolve_nested_first(dep_dir: &Utf8Path, name: &str) -> Option<Utf8PathBuf> {
    let mut ancestor = Some(dep_dir);
    while let Some(dir) = ancestor {
        let candidate = dir.join(VENDOR_DIR).join(name);
        if candidate.join(MANIFEST_FILENAME).is_file() {
            return Some(candidate);
        }
        ancestor = dir.parent();
    }
    None
}

/// Symlink children of `vendor_dir` whose basename does not start with `.`.
fn symlinked_children(vendor_dir: &Utf8Path) -> Vec<Utf8PathBuf> {
    let mut out = Vec::new();
    let Ok(entries) = fs::read_dir(vendor_dir) else {
        return out;
    };
    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with('.') {
            continue;
        }
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_symlink() {
            if let Ok(path) = Utf8PathBuf::try_from(entry.path()) {
                out.push(path);
            }
        }
    }
    out
}

/// Recursively scan `watch_dir`, ignoring dotfiles and any path containing a
/// vendor segment, collecting the directories that directly contain a
/// top-level manifest.
fn discover_top_level_manifest_dirs(watch_dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>> {
    if !watch_dir.is_dir() {
        bail!("watch directory does not exist: {watch_dir}");
    }
    let mut found = Vec::new();
    let mut walker = WalkBuilder::new(watch_dir);
    walker
        .hidden(true) // skip dotfiles
        .git_ignore(false)
        .git_exclude(false)
        .git_global(false)
        .ignore(false)
        .require_git(false)
        .filter_entry(|entry| entry.file_name() != VENDOR_DIR);
    for entry in walker.build() {
        let entry = entry?;
        if entry.file_name() == MANIFEST_FILENAME && entry.file_type().is_some_and(|t| t.is_file()) {
            let manifest_path = Utf8Path::from_path(entry.path())
                .ok_or_else(|| anyhow!("non-UTF-8 manifest path: {:?}", entry.path()))?;
            if let Some(dir) = manifest_path.parent() {
                found.push(dir.to_owned());
            }
        }
    }
    Ok(found)
}
