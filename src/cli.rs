// Copyright 2026 Dana Whitfield

//! Command-line surface and the validated [`Config`] derived from it.
//!
//! `Args` is the raw `clap` parse; `Config` is what the rest of the program
//! actually consumes. Validation happens once, here, before any side effect
//! (Output Root truncation, resolver scan, child spawn) takes place, so a
//! bad invocation never leaves a half-touched tree behind.

use std::time::Duration;

use anyhow::{bail, ensure};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;

use crate::Result;

/// Watch, mirror, and supervise a monorepo's dev build across source changes.
#[derive(Parser, Debug)]
#[command(name = "rebuild-sentinel", version, about, long_about = None)]
pub struct Args {
    /// Source root to watch. May be given more than once.
    #[arg(short = 'w', long = "watch", required = true, num_args = 1)]
    pub watch: Vec<Utf8PathBuf>,

    /// Output root. Truncated and recreated at startup.
    #[arg(short = 'o', long = "output", required = true)]
    pub output: Utf8PathBuf,

    /// Glob selecting files to run through the transformer. May be repeated.
    #[arg(short = 't', long = "transform")]
    pub transform: Vec<String>,

    /// Path to a user module/executable implementing the transformer hook.
    #[arg(short = 'u', long = "using")]
    pub using: Option<Utf8PathBuf>,

    /// A command to run as a fork-style child. May be repeated.
    #[arg(short = 'f', long = "fork")]
    pub fork: Vec<String>,

    /// A command to run as a spawn-style child. May be repeated.
    #[arg(short = 's', long = "spawn")]
    pub spawn: Vec<String>,

    /// Path to a user module/executable implementing the cleanup hook.
    #[arg(short = 'c', long = "cleanup")]
    pub cleanup: Option<Utf8PathBuf>,

    /// TCP port to kill on final shutdown. May be repeated.
    #[arg(short = 'k', long = "kill")]
    pub kill: Vec<u16>,

    /// Force-kill deadline, in milliseconds.
    #[arg(long = "wait", default_value_t = 3000)]
    pub wait: u64,

    /// Enable verbose vendor-path logging.
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,
}

/// Validated, immutable configuration wired into every component.
#[derive(Debug, Clone)]
pub struct Config {
    pub watch_dirs: Vec<Utf8PathBuf>,
    pub output: Utf8PathBuf,
    pub transform_globs: Vec<String>,
    pub using: Option<Utf8PathBuf>,
    pub fork_commands: Vec<String>,
    pub spawn_commands: Vec<String>,
    pub cleanup: Option<Utf8PathBuf>,
    pub kill_ports: Vec<u16>,
    pub wait: Duration,
    pub debug: bool,
}

impl Config {
    /// Validate `args` and turn them into a [`Config`]. No filesystem
    /// mutation happens here, only reads.
    pub fn from_args(args: Args) -> Result<Config> {
        ensure!(!args.watch.is_empty(), "at least one --watch is required");
        for watch_dir in &args.watch {
            if !watch_dir.is_dir() {
                bail!("--watch {watch_dir} is not a directory");
            }
        }
        for watch_dir in &args.watch {
            if is_same_or_within(&args.output, watch_dir) {
                bail!(
                    "--output {} conflicts with --watch {watch_dir}: the output root would be \
                     truncated and then immediately rescanned as a source",
                    args.output
                );
            }
            if is_same_or_within(watch_dir, &args.output) {
                bail!(
                    "--watch {watch_dir} conflicts with --output {}: the source root would be \
                     deleted when the output root is recreated",
                    args.output
                );
            }
        }
        if let Some(using) = &args.using {
            if args.transform.is_empty() {
                bail!("--using was given without any --transform globs to apply it to");
            }
            if !using.is_file() {
                bail!("--using {using} is not a file");
            }
        }
        if let Some(cleanup) = &args.cleanup {
            if !cleanup.is_file() {
                bail!("--cleanup {cleanup} is not a file");
            }
        }
        Ok(Config {
            watch_dirs: args.watch,
            output: args.output,
            transform_globs: args.transform,
            using: args.using,
            fork_commands: args.fork,
            spawn_commands: args.spawn,
            cleanup: args.cleanup,
            kill_ports: args.kill,
            wait: Duration::from_millis(args.wait),
            debug: args.debug,
        })
    }
}

/// True if `a` and `b` name the same directory, or `a` is nested under `b`.
/// Compares lexically: neither path need exist for this check, so it runs
/// before the resolver touches the filesystem.
fn is_same_or_within(a: &Utf8Path, b: &Utf8Path) -> bool {
    a == b || a.starts_with(b)
}

#[cfg(test)]
mod test {
    use super::*;

    fn args(watch: &[&str], output: &str) -> Args {
        Args {
            watch: watch.iter().map(Utf8PathBuf::from).collect(),
            output: Utf8PathBuf::from(output),
            transform: Vec::new(),
            using: None,
            fork: Vec::new(),
            spawn: Vec::new(),
            cleanup: None,
            kill: Vec::new(),
            wait: 3000,
            debug: false,
        }
    }

    #[test]
    fn missing_watch_dir_is_rejected() {
        let a = args(&["/definitely/does/not/exist"], "/tmp/out-nonexistent-parent");
        assert!(Config::from_args(a).is_err());
    }

    #[test]
    fn output_nested_inside_watch_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let watch = camino::Utf8PathBuf::try_from(tmp.path().to_owned()).unwrap();
        let output = watch.join("out");
        let a = args(&[watch.as_str()], output.as_str());
        let err = Config::from_args(a).unwrap_err();
        assert!(err.to_string().contains("conflicts"));
    }

    #[test]
    fn using_without_transform_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let watch = camino::Utf8PathBuf::try_from(tmp.path().to_owned()).unwrap();
        let using_path = watch.join("transform.js");
        std::fs::write(&using_path, "").unwrap();
        let mut a = args(&[watch.as_str()], "/tmp/some-unrelated-output-dir");
        a.using = Some(using_path);
        let err = Config::from_args(a).unwrap_err();
        assert!(err.to_string().contains("--transform"));
    }

    #[test]
    fn valid_config_is_accepted() {
        let tmp = tempfile::tempdir().unwrap();
        let watch = camino::Utf8PathBuf::try_from(tmp.path().to_owned()).unwrap();
        let a = args(&[watch.as_str()], "/tmp/some-other-unrelated-output-dir");
        assert!(Config::from_args(a).is_ok());
    }
}
