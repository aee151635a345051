// Copyright 2026 Dana Whitfield

//! The Incremental Mirror Pipeline.
//!
//! Maps an accepted source path to its output path and applies copy-or-
//! transform (§4.E). Directory/symlink entries become plain directories in
//! the output tree — symlinks are never followed or recreated there, so a
//! vendor symlink cycle can't leak into Output Root as a cycle of its own.

use std::fs;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, warn};

use crate::hooks::Transformer;
use crate::path_map::map_to_output;
use crate::transform_gate::TransformGate;
use crate::Result;

/// A fatal error from running the user transformer: a nonzero exit, or
/// (structurally, since [`Transformer::run`] only ever returns a `String`)
/// any failure to invoke it at all. Kept distinct from other mirror I/O
/// errors so the caller can exit with [`crate::exit_code::TRANSFORM_FAILED`]
/// specifically, per §7.
#[derive(Debug)]
pub struct TransformFailed(pub anyhow::Error);

impl std::fmt::Display for TransformFailed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for TransformFailed {}

/// The Mirror Pipeline: given an accepted source path, write its mirrored
/// counterpart under the Output Root.
pub struct Mirror {
    output_root: Utf8PathBuf,
    gate: TransformGate,
    transformer: Option<Transformer>,
}

impl Mirror {
    pub fn new(output_root: Utf8PathBuf, gate: TransformGate, transformer: Option<Transformer>) -> Mirror {
        Mirror {
            output_root,
            gate,
            transformer,
        }
    }

    /// Process one accepted path.
    ///
    /// `source_path` is in the Path Mapper's "root/rest..." form (forward
    /// slashes, including the Source Root's own leaf segment) and is used
    /// both to compute the output path and to match `--transform` globs.
    /// `abs_source_path` is where the file actually lives on disk.
    ///
    /// Returns `true` if the call mutated the output tree and the Debouncer
    /// should be notified.
    pub fn process(&self, source_path: &Utf8Path, abs_source_path: &Utf8Path) -> Result<bool> {
        let out_path = map_to_output(source_path, &self.output_root);
        let meta = fs::symlink_metadata(abs_source_path)
            .with_context(|| format!("stat {abs_source_path}"))?;
        let file_type = meta.file_type();

        if file_type.is_dir() || file_type.is_symlink() {
            if out_path.exists() {
                return Ok(false);
            }
            fs::create_dir_all(&out_path)
                .with_context(|| format!("create output directory {out_path}"))?;
            return Ok(true);
        }

        if self.gate.should_transform(source_path) {
            self.write_transformed(abs_source_path, &out_path)
                .map_err(TransformFailed)?;
        } else {
            fs::copy(abs_source_path, &out_path)
                .with_context(|| format!("copy {abs_source_path} to {out_path}"))?;
        }
        debug!(%source_path, %out_path, "mirrored");
        Ok(true)
    }

    fn write_transformed(&self, abs_source_path: &Utf8Path, out_path: &Utf8Path) -> anyhow::Result<()> {
        let contents = fs::read_to_string(abs_source_path)
            .with_context(|| format!("read {abs_source_path}"))?;
        let transformed = match &self.transformer {
            Some(transformer) => transformer.run(abs_source_path, out_path, &contents)?,
            None => contents,
        };
        write_atomically(out_path, &transformed)
    }

    /// A source path was removed: remove its mirrored counterpart, if any.
    ///
    /// Returns `true` if something was actually removed and a restart
    /// should be notified. Removing a bare directory entry (nothing left to
    /// rebuild against) only logs, per §4.E.
    pub fn remove(&self, source_path: &Utf8Path) -> Result<bool> {
        let out_path = map_to_output(source_path, &self.output_root);
        match fs::symlink_metadata(&out_path) {
            Ok(meta) if meta.is_dir() => {
                if let Err(err) = fs::remove_dir_all(&out_path) {
                    warn!(%out_path, ?err, "failed to remove mirrored directory");
                }
                debug!(%out_path, "removed directory entry, nothing to rebuild against");
                Ok(false)
            }
            Ok(_) => {
                fs::remove_file(&out_path)
                    .with_context(|| format!("remove {out_path}"))?;
                debug!(%out_path, "removed mirrored file");
                Ok(true)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err).with_context(|| format!("stat {out_path}")),
        }
    }
}

/// Write `contents` to `path`, by writing to a sibling temp file and
/// renaming over the destination, so a reader never observes a partial
/// write.
fn write_atomically(path: &Utf8Path, contents: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create directory {parent}"))?;
    }
    let tmp_path = sibling_tmp_path(path);
    fs::write(&tmp_path, contents).with_context(|| format!("write {tmp_path}"))?;
    fs::rename(&tmp_path, path).with_context(|| format!("rename {tmp_path} to {path}"))?;
    Ok(())
}

fn sibling_tmp_path(path: &Utf8Path) -> Utf8PathBuf {
    let file_name = path.file_name().unwrap_or("output");
    path.with_file_name(format!(".{file_name}.tmp"))
}

#[cfg(test)]
mod test {
    use tempfile::TempDir;

    use super::*;

    fn mirror_with_globs(output_root: &Utf8Path, globs: &[&str]) -> Mirror {
        Mirror::new(
            output_root.to_owned(),
            TransformGate::new(globs).unwrap(),
            None,
        )
    }

    #[test]
    fn copies_untransformed_file_byte_for_byte() {
        let tmp = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(tmp.path().to_owned()).unwrap();
        let src_dir = root.join("src");
        fs::create_dir_all(&src_dir).unwrap();
        fs::write(src_dir.join("a.txt"), "hi").unwrap();
        let out = root.join("out");

        let mirror = mirror_with_globs(&out, &[]);
        let notified = mirror
            .process(Utf8Path::new("src/a.txt"), &src_dir.join("a.txt"))
            .unwrap();
        assert!(notified);
        assert_eq!(fs::read_to_string(out.join("a.txt")).unwrap(), "hi");
    }

    #[test]
    fn identity_transform_passes_contents_through_when_no_patterns_match() {
        let tmp = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(tmp.path().to_owned()).unwrap();
        let src_dir = root.join("src");
        fs::create_dir_all(&src_dir).unwrap();
        fs::write(src_dir.join("x.js"), "hi").unwrap();
        let out = root.join("out");

        let mirror = mirror_with_globs(&out, &["src/**/*.js"]);
        mirror
            .process(Utf8Path::new("src/x.js"), &src_dir.join("x.js"))
            .unwrap();
        assert_eq!(fs::read_to_string(out.join("x.js")).unwrap(), "hi");
    }

    #[test]
    fn directory_is_created_once_and_not_renotified() {
        let tmp = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(tmp.path().to_owned()).unwrap();
        let src_dir = root.join("src/b");
        fs::create_dir_all(&src_dir).unwrap();
        let out = root.join("out");

        let mirror = mirror_with_globs(&out, &[]);
        assert!(mirror.process(Utf8Path::new("src/b"), &src_dir).unwrap());
        assert!(out.join("b").is_dir());
        assert!(!mirror.process(Utf8Path::new("src/b"), &src_dir).unwrap());
    }

    #[test]
    fn remove_deletes_mirrored_file_and_notifies() {
        let tmp = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(tmp.path().to_owned()).unwrap();
        let out = root.join("out");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("a.txt"), "hi").unwrap();

        let mirror = mirror_with_globs(&out, &[]);
        assert!(mirror.remove(Utf8Path::new("src/a.txt")).unwrap());
        assert!(!out.join("a.txt").exists());
    }

    #[test]
    fn remove_of_directory_entry_does_not_notify() {
        let tmp = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(tmp.path().to_owned()).unwrap();
        let out = root.join("out");
        fs::create_dir_all(out.join("b")).unwrap();

        let mirror = mirror_with_globs(&out, &[]);
        assert!(!mirror.remove(Utf8Path::new("src/b")).unwrap());
        assert!(!out.join("b").exists());
    }

    #[test]
    fn remove_of_absent_path_is_a_quiet_no_op() {
        let tmp = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(tmp.path().to_owned()).unwrap();
        let out = root.join("out");
        fs::create_dir_all(&out).unwrap();

        let mirror = mirror_with_globs(&out, &[]);
        assert!(!mirror.remove(Utf8Path::new("src/never-existed.txt")).unwrap());
    }
}
