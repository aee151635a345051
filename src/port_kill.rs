// Copyright 2026 Dana Whitfield

//! Kill whatever process is listening on a configured TCP port, as the
//! last step of shutdown.
//!
//! The port-killer itself is an external collaborator (out of scope per the
//! core's design): on Unix it shells out to `lsof` to find the listening
//! pid and sends it SIGKILL, the common idiom for "free this port" scripts.

use subprocess::{Popen, PopenConfig, Redirection};
use tracing::{debug, warn};

/// Best-effort: kill whatever is listening on `port`. Failures are logged,
/// never fatal, since a stale/already-free port is not an error.
pub fn kill_port(port: u16) {
    debug!(port, "killing port");
    match find_listening_pids(port) {
        Ok(pids) if pids.is_empty() => {
            debug!(port, "nothing listening");
        }
        Ok(pids) => {
            for pid in pids {
                if let Err(err) = kill_pid(pid) {
                    warn!(port, pid, ?err, "failed to kill process on port");
                }
            }
        }
        Err(err) => warn!(port, ?err, "failed to list processes on port"),
    }
}

#[cfg(unix)]
fn find_listening_pids(port: u16) -> anyhow::Result<Vec<u32>> {
    use std::io::Read;

    let mut child = Popen::create(
        &["lsof", "-ti", &format!("tcp:{port}")],
        PopenConfig {
            stdin: Redirection::None,
            stdout: Redirection::Pipe,
            stderr: Redirection::None,
            ..Default::default()
        },
    )?;
    child.wait_timeout(std::time::Duration::from_secs(5))?;
    let mut output = String::new();
    if let Some(stdout) = child.stdout.as_mut() {
        stdout.read_to_string(&mut output)?;
    }
    Ok(output
        .lines()
        .filter_map(|line| line.trim().parse::<u32>().ok())
        .collect())
}

#[cfg(not(unix))]
fn find_listening_pids(_port: u16) -> anyhow::Result<Vec<u32>> {
    Ok(Vec::new())
}

#[cfg(unix)]
fn kill_pid(pid: u32) -> std::io::Result<()> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;
    kill(Pid::from_raw(pid as i32), Signal::SIGKILL)
        .map_err(|errno| std::io::Error::from_raw_os_error(errno as i32))
}

#[cfg(not(unix))]
fn kill_pid(_pid: u32) -> std::io::Result<()> {
    Ok(())
}
