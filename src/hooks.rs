// Copyright 2026 Dana Whitfield

//! Sidecar-process contracts for the two user extension points: the
//! transformer and the cleanup hook.
//!
//! Both are configured as paths to an executable. Rather than embedding a
//! dynamic module loader, each hook is invoked as a plain child process with
//! a documented stdio contract, the same way the fork/spawn commands
//! themselves are external collaborators rather than embedded code.

use std::io::{Read, Write};

use anyhow::{bail, Context};
use camino::{Utf8Path, Utf8PathBuf};
use subprocess::{Popen, PopenConfig, Redirection};
use tracing::warn;

use crate::exit_code;
use crate::Result;

/// `kind` argument passed to a cleanup hook, mirroring the execution's
/// child kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildKind {
    Fork,
    Spawn,
}

impl ChildKind {
    fn as_str(self) -> &'static str {
        match self {
            ChildKind::Fork => "fork",
            ChildKind::Spawn => "spawn",
        }
    }
}

/// `signal` argument passed to a cleanup hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupSignal {
    Sigint,
    Sigres,
}

impl CleanupSignal {
    fn as_str(self) -> &'static str {
        match self {
            CleanupSignal::Sigint => "SIGINT",
            CleanupSignal::Sigres => "SIGRES",
        }
    }
}

/// The `--using` transformer hook.
///
/// Invoked as `<using_path> <input_abs_path> <output_abs_path>` with the
/// file's contents on stdin; its stdout, read to completion, is the
/// transformed contents. A nonzero exit is a fatal transform error.
pub struct Transformer {
    using_path: Utf8PathBuf,
}

impl Transformer {
    pub fn new(using_path: Utf8PathBuf) -> Transformer {
        Transformer { using_path }
    }

    pub fn run(&self, input_abs_path: &Utf8Path, output_abs_path: &Utf8Path, contents: &str) -> Result<String> {
        let mut child = Popen::create(
            &[
                self.using_path.as_str(),
                input_abs_path.as_str(),
                output_abs_path.as_str(),
            ],
            PopenConfig {
                stdin: Redirection::Pipe,
                stdout: Redirection::Pipe,
                stderr: Redirection::None,
                ..Default::default()
            },
        )
        .with_context(|| format!("start transformer {}", self.using_path))?;

        {
            let stdin = child.stdin.as_mut().expect("stdin is piped");
            stdin
                .write_all(contents.as_bytes())
                .context("write contents to transformer stdin")?;
        }
        child.stdin = None; // close stdin so the transformer sees EOF

        let mut output = String::new();
        child
            .stdout
            .as_mut()
            .expect("stdout is piped")
            .read_to_string(&mut output)
            .context("read transformer stdout")?;

        let status = child.wait().context("wait for transformer")?;
        if !status.success() {
            bail!(
                "transformer {} exited unsuccessfully for {input_abs_path}",
                self.using_path
            );
        }
        Ok(output)
    }
}

/// The `--cleanup` hook. Launched and not waited on: its job is to ask a
/// child to shut itself down, and the supervisor's force-kill timer is what
/// guarantees progress if it doesn't.
pub struct CleanupHook {
    cleanup_path: Utf8PathBuf,
}

impl CleanupHook {
    pub fn new(cleanup_path: Utf8PathBuf) -> CleanupHook {
        CleanupHook { cleanup_path }
    }

    pub fn run(&self, command: &str, kind: ChildKind, signal: CleanupSignal) {
        let result = Popen::create(
            &[
                self.cleanup_path.as_str(),
                command,
                kind.as_str(),
                signal.as_str(),
            ],
            PopenConfig {
                stdin: Redirection::None,
                stdout: Redirection::None,
                stderr: Redirection::None,
                ..Default::default()
            },
        );
        if let Err(err) = result {
            warn!(cleanup_path = %self.cleanup_path, ?err, "failed to launch cleanup hook");
        }
    }
}

/// A fatal transform error's process exit code.
pub const TRANSFORM_FAILED: i32 = exit_code::TRANSFORM_FAILED;
