// Copyright 2026 Dana Whitfield

//! Accept or reject a candidate path before it reaches the Mirror Pipeline.

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};

use crate::depresolver::ProductionDeps;

const VENDOR_DIR: &str = "node_modules";
const BIN_DIR: &str = ".bin";

/// Decide whether `path` should be mirrored.
///
/// `path` is relative to a watch root and uses forward slashes.
pub fn accept(path: &Utf8Path, production_deps: &ProductionDeps, watch_root: &Utf8Path) -> bool {
    if path.as_str().ends_with('~') {
        return false;
    }
    match vendor_package_prefix(path) {
        None => path.file_name() != Some(BIN_DIR),
        Some(VendorPrefix::Package(pkg_prefix)) => {
            if pkg_prefix.file_name() == Some(BIN_DIR) {
                return false;
            }
            production_deps.contains(&watch_root.join(pkg_prefix))
        }
        Some(VendorPrefix::TerminalVendorDir) => true,
    }
}

enum VendorPrefix {
    /// `<anything>/node_modules/[<@scope>/]<name>`
    Package(Utf8PathBuf),
    /// The path is `<anything>/node_modules` itself.
    TerminalVendorDir,
}

/// Find the longest prefix of `path` of the form
/// `<anything>/node_modules/[<@scope>/]<name>`, or note that `path` is
/// itself a terminal `node_modules` directory. Returns `None` for paths
/// that never cross a vendor segment.
fn vendor_package_prefix(path: &Utf8Path) -> Option<VendorPrefix> {
    let components: Vec<Utf8Component> = path.components().collect();
    let vendor_index = components
        .iter()
        .position(|c| c.as_str() == VENDOR_DIR)?;
    if vendor_index + 1 >= components.len() {
        return Some(VendorPrefix::TerminalVendorDir);
    }
    let mut prefix: Utf8PathBuf = components[..=vendor_index + 1].iter().collect();
    if components[vendor_index + 1].as_str().starts_with('@') && vendor_index + 2 < components.len() {
        prefix = components[..=vendor_index + 2].iter().collect();
    }
    Some(VendorPrefix::Package(prefix))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn temp_file_suffix_is_rejected() {
        let root = Utf8PathBuf::from("/watch");
        let deps = ProductionDeps::from_paths([]);
        assert!(!accept(Utf8Path::new("src/foo.js~"), &deps, &root));
    }

    #[test]
    fn non_vendor_bin_is_rejected() {
        let root = Utf8PathBuf::from("/watch");
        let deps = ProductionDeps::from_paths([]);
        assert!(!accept(Utf8Path::new(".bin"), &deps, &root));
    }

    #[test]
    fn non_vendor_regular_file_is_accepted() {
        let root = Utf8PathBuf::from("/watch");
        let deps = ProductionDeps::from_paths([]);
        assert!(accept(Utf8Path::new("src/index.js"), &deps, &root));
    }

    #[test]
    fn terminal_vendor_dir_always_accepted() {
        let root = Utf8PathBuf::from("/watch");
        let deps = ProductionDeps::from_paths([]);
        assert!(accept(Utf8Path::new("node_modules"), &deps, &root));
    }

    #[test]
    fn bin_inside_vendor_package_is_rejected() {
        let root = Utf8PathBuf::from("/watch");
        let deps = ProductionDeps::from_paths([]);
        assert!(!accept(
            Utf8Path::new("node_modules/left-pad/.bin"),
            &deps,
            &root
        ));
    }

    #[test]
    fn vendor_package_in_production_set_is_accepted() {
        let root = Utf8PathBuf::from("/watch");
        let deps = ProductionDeps::from_paths([root.join("node_modules/left-pad")]);
        assert!(accept(
            Utf8Path::new("node_modules/left-pad/index.js"),
            &deps,
            &root
        ));
    }

    #[test]
    fn vendor_package_not_in_production_set_is_rejected() {
        let root = Utf8PathBuf::from("/watch");
        let deps = ProductionDeps::from_paths([root.join("node_modules/left-pad")]);
        assert!(!accept(
            Utf8Path::new("node_modules/unused/index.js"),
            &deps,
            &root
        ));
    }

    #[test]
    fn scoped_vendor_package_prefix_is_scope_plus_name() {
        let root = Utf8PathBuf::from("/watch");
        let deps = ProductionDeps::from_paths([root.join("node_modules/@acme/widget")]);
        assert!(accept(
            Utf8Path::new("node_modules/@acme/widget/index.js"),
            &deps,
            &root
        ));
        assert!(!accept(
            Utf8Path::new("node_modules/@acme/other/index.js"),
            &deps,
            &root
        ));
    }
}
