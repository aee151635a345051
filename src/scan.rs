// Copyright 2026 Dana Whitfield

//! The initial tree scan: walk every Source Root once at startup and feed
//! each discovered path through the Filter and Mirror Pipeline, in
//! discovery order, before the watcher takes over for live changes.

use camino::{Utf8Path, Utf8PathBuf};
use ignore::WalkBuilder;
use tracing::debug;

use crate::debounce::Debouncer;
use crate::depresolver::ProductionDeps;
use crate::filter;
use crate::interrupt::check_interrupted;
use crate::mirror::Mirror;
use crate::path::Utf8PathSlashes;
use crate::Result;

/// Walk every watch directory and mirror every path the Filter accepts.
///
/// Honors the Shutdown Flag: if an interrupt lands mid-scan, the walk
/// breaks out early rather than finishing the tree.
pub fn initial_scan(
    watch_dirs: &[Utf8PathBuf],
    production_deps: &ProductionDeps,
    mirror: &Mirror,
    debouncer: &mut Debouncer,
) -> Result<()> {
    for watch_dir in watch_dirs {
        scan_one_root(watch_dir, production_deps, mirror, debouncer)?;
        if check_interrupted().is_err() {
            debug!("initial scan interrupted");
            break;
        }
    }
    Ok(())
}

fn scan_one_root(
    watch_dir: &Utf8Path,
    production_deps: &ProductionDeps,
    mirror: &Mirror,
    debouncer: &mut Debouncer,
) -> Result<()> {
    let root_name = watch_dir.file_name().unwrap_or(watch_dir.as_str());
    let walker = WalkBuilder::new(watch_dir)
        .hidden(false)
        .git_ignore(false)
        .git_exclude(false)
        .git_global(false)
        .ignore(false)
        .require_git(false)
        .build();
    for entry in walker {
        if check_interrupted().is_err() {
            break;
        }
        let entry = entry?;
        let abs_path = Utf8Path::from_path(entry.path())
            .ok_or_else(|| anyhow::anyhow!("non-UTF-8 path: {:?}", entry.path()))?;
        let relative = abs_path.strip_prefix(watch_dir).unwrap_or(Utf8Path::new(""));
        let source_path: Utf8PathBuf = if relative.as_str().is_empty() {
            Utf8PathBuf::from(root_name)
        } else {
            Utf8PathBuf::from(format!("{root_name}/{}", relative.to_slash_path()))
        };

        if !relative.as_str().is_empty() && !filter::accept(relative, production_deps, watch_dir) {
            continue;
        }

        if mirror.process(&source_path, abs_path)? {
            debouncer.notify();
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use std::fs;

    use tempfile::TempDir;

    use crate::mirror::Mirror;
    use crate::transform_gate::TransformGate;

    use super::*;

    #[test]
    fn mirrors_plain_tree_in_one_pass() {
        let tmp = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(tmp.path().to_owned()).unwrap();
        let src = root.join("src");
        fs::create_dir_all(src.join("b")).unwrap();
        fs::write(src.join("a.txt"), "hi").unwrap();
        fs::write(src.join("b/c.txt"), "bye").unwrap();
        let out = root.join("out");
        fs::create_dir_all(&out).unwrap();

        let mirror = Mirror::new(out.clone(), TransformGate::new(&[] as &[&str]).unwrap(), None);
        let deps = ProductionDeps::from_paths([]);
        let mut debouncer = Debouncer::new();

        initial_scan(&[src], &deps, &mirror, &mut debouncer).unwrap();

        assert_eq!(fs::read_to_string(out.join("a.txt")).unwrap(), "hi");
        assert_eq!(fs::read_to_string(out.join("b/c.txt")).unwrap(), "bye");
    }

    #[test]
    fn rejects_vendor_packages_outside_the_production_set() {
        let tmp = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(tmp.path().to_owned()).unwrap();
        let src = root.join("src");
        let used = src.join("node_modules/used");
        let unused = src.join("node_modules/unused");
        fs::create_dir_all(&used).unwrap();
        fs::create_dir_all(&unused).unwrap();
        fs::write(used.join("index.js"), "used").unwrap();
        fs::write(unused.join("index.js"), "unused").unwrap();
        let out = root.join("out");
        fs::create_dir_all(&out).unwrap();

        let mirror = Mirror::new(out.clone(), TransformGate::new(&[] as &[&str]).unwrap(), None);
        let deps = ProductionDeps::from_paths([src.join("node_modules/used")]);
        let mut debouncer = Debouncer::new();

        initial_scan(&[src], &deps, &mirror, &mut debouncer).unwrap();

        assert!(out.join("node_modules/used/index.js").exists());
        assert!(!out.join("node_modules/unused/index.js").exists());
    }
}
