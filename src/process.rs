// Copyright 2026 Dana Whitfield

//! Start and signal a single fork- or spawn-kind child process.
//!
//! On Unix each child runs in its own process group, so that grandchild
//! processes are reachable for termination too.

use std::fs::File;
use std::io::BufReader;
use std::time::Duration;

use anyhow::{anyhow, Context};
use subprocess::{ExitStatus, Popen, PopenConfig, Redirection};
use tracing::warn;

use crate::hooks::ChildKind;
use crate::ipc;
use crate::Result;

/// A single running fork or spawn child, as registered in the Managed-Child
/// Registry.
pub struct ManagedChild {
    pub command: String,
    pub kind: ChildKind,
    popen: Popen,
    ipc_reader: Option<BufReader<File>>,
}

impl ManagedChild {
    /// Start a fork-kind child: stdin and stdout are piped for IPC,
    /// stderr is inherited for diagnostics.
    pub fn start_fork(command: &str) -> Result<ManagedChild> {
        let argv = tokenize(command);
        let mut popen = Popen::create(
            &argv,
            PopenConfig {
                stdin: Redirection::Pipe,
                stdout: Redirection::Pipe,
                stderr: Redirection::None,
                ..setpgid_on_unix()
            },
        )
        .with_context(|| format!("start fork child {command:?}"))?;
        let stdout = popen.stdout.take().expect("fork child stdout is piped");
        set_nonblocking(&stdout)?;
        Ok(ManagedChild {
            command: command.to_owned(),
            kind: ChildKind::Fork,
            popen,
            ipc_reader: Some(BufReader::new(stdout)),
        })
    }

    /// Start a spawn-kind child: stdout/stderr fully inherited, no IPC.
    pub fn start_spawn(command: &str) -> Result<ManagedChild> {
        let argv = tokenize(command);
        let popen = Popen::create(
            &argv,
            PopenConfig {
                stdin: Redirection::None,
                stdout: Redirection::None,
                stderr: Redirection::None,
                ..setpgid_on_unix()
            },
        )
        .with_context(|| format!("start spawn child {command:?}"))?;
        Ok(ManagedChild {
            command: command.to_owned(),
            kind: ChildKind::Spawn,
            popen,
            ipc_reader: None,
        })
    }

    /// Non-blocking check for process exit. Returns the exit code once,
    /// after which the child is considered reaped.
    pub fn poll_exit(&mut self) -> Option<i32> {
        self.popen.poll().map(exit_code_of)
    }

    pub fn pid(&self) -> Option<u32> {
        self.popen.pid()
    }

    /// Send the Unix interrupt signal, expecting the child to exit on its
    /// own.
    #[cfg(unix)]
    pub fn send_sigint(&mut self) -> Result<()> {
        use nix::errno::Errno;
        use nix::sys::signal::{kill, Signal};
        let Some(pid) = self.popen.pid() else {
            return Ok(()); // already reaped
        };
        let pid = nix::unistd::Pid::from_raw(pid.try_into().expect("pid fits in i32"));
        match kill(pid, Signal::SIGINT) {
            Ok(()) | Err(Errno::ESRCH) => Ok(()),
            Err(errno) => Err(anyhow!("failed to send SIGINT to {}: {errno}", self.command)),
        }
    }

    #[cfg(not(unix))]
    pub fn send_sigint(&mut self) -> Result<()> {
        self.popen.terminate().context("send interrupt to child")
    }

    /// Write the `SIGRES` protocol token to a fork child's IPC channel.
    /// A no-op for spawn children (callers should hard-kill those instead).
    pub fn send_sigres(&mut self) -> Result<()> {
        if let Some(stdin) = self.popen.stdin.as_mut() {
            ipc::send_sigres(stdin)?;
        }
        Ok(())
    }

    /// Drain any IPC messages currently buffered on stdout without
    /// blocking for more.
    pub fn poll_ipc_message(&mut self) -> Result<Option<ipc::ChildMessage>> {
        match self.ipc_reader.as_mut() {
            Some(reader) => ipc::try_read_message(reader),
            None => Ok(None),
        }
    }

    pub fn hard_kill(&mut self) {
        if let Some(pid) = self.popen.pid() {
            if let Err(err) = terminate_process_group(pid) {
                warn!(command = %self.command, ?err, "failed to signal child process group");
            }
        }
        if let Err(err) = self.popen.kill() {
            warn!(command = %self.command, ?err, "failed to hard-kill child");
        }
        let _ = self.popen.wait_timeout(Duration::from_secs(5));
    }
}

fn exit_code_of(status: ExitStatus) -> i32 {
    match status {
        ExitStatus::Exited(code) => code as i32,
        ExitStatus::Signaled(signal) => -(signal as i32),
        ExitStatus::Other(code) => code,
        ExitStatus::Undetermined => -1,
    }
}

/// Split a configured command on single spaces into an argv, per the CLI's
/// documented command-string convention.
pub fn tokenize(command: &str) -> Vec<&str> {
    command.split(' ').filter(|s| !s.is_empty()).collect()
}

#[cfg(unix)]
fn setpgid_on_unix() -> PopenConfig {
    PopenConfig {
        setpgid: true,
        ..Default::default()
    }
}

#[cfg(not(unix))]
fn setpgid_on_unix() -> PopenConfig {
    Default::default()
}

/// Put a fork child's stdout pipe in non-blocking mode, so
/// [`ManagedChild::poll_ipc_message`] can be called from the main loop on
/// every tick without ever stalling it waiting on the child.
#[cfg(unix)]
fn set_nonblocking(file: &File) -> Result<()> {
    use std::os::unix::io::AsRawFd;

    use nix::fcntl::{fcntl, FcntlArg, OFlag};

    let fd = file.as_raw_fd();
    let flags = fcntl(fd, FcntlArg::F_GETFL).context("read fork child stdout flags")?;
    let flags = OFlag::from_bits_truncate(flags) | OFlag::O_NONBLOCK;
    fcntl(fd, FcntlArg::F_SETFL(flags)).context("set fork child stdout non-blocking")?;
    Ok(())
}

#[cfg(not(unix))]
fn set_nonblocking(_file: &File) -> Result<()> {
    Ok(())
}

/// Kill the process group of a child that may have grandchildren, on
/// platforms where that's meaningful.
#[cfg(unix)]
pub fn terminate_process_group(pid: u32) -> Result<()> {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    let pid = nix::unistd::Pid::from_raw(pid.try_into().expect("pid fits in i32"));
    match killpg(pid, Signal::SIGTERM) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(errno) => Err(anyhow!("failed to terminate process group: {errno}")),
    }
}

#[cfg(not(unix))]
pub fn terminate_process_group(_pid: u32) -> Result<()> {
    Ok(())
}
