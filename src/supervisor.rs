// Copyright 2026 Dana Whitfield

//! The Child Supervisor: starts fork- and spawn-kind children, keeps them
//! alive across restarts, and runs cleanup on the way out.
//!
//! State per child: idle -> starting -> running -> draining -> gone. This
//! module models "starting"/"running"/"draining" implicitly through
//! [`Execution`] and the force-kill deadline; "idle" and "gone" are simply
//! absence from the registry.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::hooks::{CleanupHook, CleanupSignal, ChildKind};
use crate::process::ManagedChild;
use crate::Result;

const FORK_PAUSE_SAFETY_TIMEOUT: Duration = Duration::from_secs(30);
const FORK_SPAWN_GRACE: Duration = Duration::from_millis(500);

/// A single registered child: the Managed-Child Registry *R* is the
/// supervisor's `executions` vector.
struct Execution {
    child: ManagedChild,
    /// Set once a restart or shutdown has asked this child to exit; after
    /// this deadline passes it is hard-killed.
    force_kill_deadline: Option<Instant>,
}

/// Tracks the fork pause/resume handshake while `make_children` is
/// serially starting fork commands.
enum ForkGate {
    /// No fork child is currently holding up the start sequence.
    Clear,
    /// Waiting for the child's own "spawn" signal (approximated here by a
    /// successful `Popen::create`) plus the 500ms grace window, during
    /// which a pause message may still arrive.
    Grace { deadline: Instant },
    /// A pause message arrived; blocked until resume, the safety timeout,
    /// or child exit.
    Paused { deadline: Instant },
}

pub struct Supervisor {
    fork_commands: Vec<String>,
    spawn_commands: Vec<String>,
    wait: Duration,
    cleanup: Option<CleanupHook>,
    executions: Vec<Execution>,
    crash_flag: bool,
    shutdown_flag: bool,
    fork_gate: ForkGate,
    /// Set by a `restart()` call that found a non-empty registry: the old
    /// children have been asked to exit (cleanup + a force-kill deadline),
    /// and once the last one drains, `tick()` should call `make_children`
    /// to bring the new generation up. This is the "drain-then-rebuild"
    /// intent from a one-shot exit listener stacked on every Execution
    /// during restart (§4.G), reified as a flag since the supervisor
    /// already polls every Execution each tick.
    pending_rebuild: bool,
}

impl Supervisor {
    pub fn new(
        fork_commands: Vec<String>,
        spawn_commands: Vec<String>,
        wait: Duration,
        cleanup: Option<CleanupHook>,
    ) -> Supervisor {
        Supervisor {
            fork_commands,
            spawn_commands,
            wait,
            cleanup,
            executions: Vec::new(),
            crash_flag: false,
            shutdown_flag: false,
            fork_gate: ForkGate::Clear,
            pending_rebuild: false,
        }
    }

    pub fn has_configured_children(&self) -> bool {
        !self.fork_commands.is_empty() || !self.spawn_commands.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.executions.is_empty()
    }

    /// `restart()`: guarded by the Shutdown Flag and by "no configured
    /// children".
    pub fn restart(&mut self) -> Result<()> {
        if self.shutdown_flag || !self.has_configured_children() {
            return Ok(());
        }
        if self.executions.is_empty() {
            if self.crash_flag {
                info!("restarting from crash");
                self.crash_flag = false;
            }
            self.make_children()?;
        } else {
            info!("restarting");
            let deadline = Instant::now() + self.wait;
            let commands: Vec<(String, ChildKind)> = self
                .executions
                .iter()
                .map(|e| (e.child.command.clone(), e.child.kind))
                .collect();
            for (command, kind) in commands {
                self.cleanup_or_default(&command, kind, CleanupSignal::Sigres);
            }
            for execution in &mut self.executions {
                execution.force_kill_deadline = Some(deadline);
            }
            // One-shot exit listener, stacked on every Execution: once the
            // last of these drains away, `tick()` rebuilds the new
            // generation rather than leaving the registry empty until the
            // next unrelated source change happens to call `restart()`.
            self.pending_rebuild = true;
        }
        Ok(())
    }

    /// `makeChildren`: fork commands first, in configuration order, then
    /// spawn commands. Registers each Execution before awaiting any
    /// pause/resume handshake.
    fn make_children(&mut self) -> Result<()> {
        self.fork_gate = ForkGate::Clear;
        for command in self.fork_commands.clone() {
            if self.executions.iter().any(|e| e.child.command == command) {
                continue;
            }
            let child = ManagedChild::start_fork(&command)?;
            self.executions.push(Execution {
                child,
                force_kill_deadline: None,
            });
            // Grant the grace window for a pause message to arrive before
            // starting the next fork command.
            self.fork_gate = ForkGate::Grace {
                deadline: Instant::now() + FORK_SPAWN_GRACE,
            };
            self.drain_fork_gate_blocking()?;
        }
        for command in self.spawn_commands.clone() {
            if self.executions.iter().any(|e| e.child.command == command) {
                continue;
            }
            let child = ManagedChild::start_spawn(&command)?;
            self.executions.push(Execution {
                child,
                force_kill_deadline: None,
            });
        }
        Ok(())
    }

    /// Block (polling) until the fork gate clears: either the grace window
    /// elapses with no pause message, a pause arrives and is then resolved
    /// by resume/safety-timeout/exit, or the child exits outright.
    fn drain_fork_gate_blocking(&mut self) -> Result<()> {
        loop {
            match &self.fork_gate {
                ForkGate::Clear => return Ok(()),
                ForkGate::Grace { deadline } => {
                    let deadline = *deadline;
                    let last = self.executions.last_mut().expect("just pushed a fork child");
                    if let Some(code) = last.child.poll_exit() {
                        debug!(command = %last.child.command, code, "fork child exited during grace window");
                        self.fork_gate = ForkGate::Clear;
                        continue;
                    }
                    if let Some(msg) = last.child.poll_ipc_message()? {
                        self.apply_ipc_message(msg);
                        continue;
                    }
                    if Instant::now() >= deadline {
                        self.fork_gate = ForkGate::Clear;
                        continue;
                    }
                    std::thread::sleep(Duration::from_millis(10));
                }
                ForkGate::Paused { deadline } => {
                    let deadline = *deadline;
                    let last = self.executions.last_mut().expect("just pushed a fork child");
                    if let Some(code) = last.child.poll_exit() {
                        debug!(command = %last.child.command, code, "fork child exited while paused");
                        self.fork_gate = ForkGate::Clear;
                        continue;
                    }
                    if let Some(msg) = last.child.poll_ipc_message()? {
                        self.apply_ipc_message(msg);
                        continue;
                    }
                    if Instant::now() >= deadline {
                        warn!("fork pause safety timeout elapsed, forcing clear");
                        self.fork_gate = ForkGate::Clear;
                        continue;
                    }
                    std::thread::sleep(Duration::from_millis(10));
                }
            }
        }
    }

    fn apply_ipc_message(&mut self, msg: crate::ipc::ChildMessage) {
        use crate::ipc::ChildMessage;
        match msg {
            ChildMessage::PauseForking { .. } => {
                self.fork_gate = ForkGate::Paused {
                    deadline: Instant::now() + FORK_PAUSE_SAFETY_TIMEOUT,
                };
            }
            ChildMessage::ResumeForking { .. } => {
                self.fork_gate = ForkGate::Clear;
            }
        }
    }

    /// Poll every registered child for exit and force-kill deadlines. Call
    /// this from the main event loop on every tick.
    pub fn tick(&mut self) -> Result<()> {
        let mut exited_indices = Vec::new();
        for (index, execution) in self.executions.iter_mut().enumerate() {
            if let Some(code) = execution.child.poll_exit() {
                if code != 0 {
                    self.crash_flag = true;
                    warn!(command = %execution.child.command, code, "child crashed");
                } else {
                    debug!(command = %execution.child.command, "child exited cleanly");
                }
                exited_indices.push(index);
                continue;
            }
            if let Some(deadline) = execution.force_kill_deadline {
                if Instant::now() >= deadline {
                    warn!(command = %execution.child.command, "force-kill deadline elapsed");
                    execution.child.hard_kill();
                    exited_indices.push(index);
                }
            }
        }
        for index in exited_indices.into_iter().rev() {
            self.executions.remove(index);
        }
        // The last Execution a pending restart was waiting on just drained:
        // fire the rebuild now. Guarded by the Shutdown Flag the same way
        // `restart()` itself is, so a shutdown mid-drain never re-enters
        // `make_children`.
        if self.pending_rebuild && self.executions.is_empty() && !self.shutdown_flag {
            self.pending_rebuild = false;
            if self.crash_flag {
                info!("restarting from crash");
                self.crash_flag = false;
            }
            self.make_children()?;
        }
        Ok(())
    }

    /// Shut down every child: invoke cleanup (or the default SIGINT
    /// behavior) and arm a single shutdown force-kill deadline.
    pub fn begin_shutdown(&mut self) {
        self.shutdown_flag = true;
        self.pending_rebuild = false;
        let deadline = Instant::now() + self.wait;
        let commands: Vec<(String, ChildKind)> = self
            .executions
            .iter()
            .map(|e| (e.child.command.clone(), e.child.kind))
            .collect();
        for (command, kind) in commands {
            self.cleanup_or_default(&command, kind, CleanupSignal::Sigint);
        }
        for execution in &mut self.executions {
            execution.force_kill_deadline = Some(deadline);
        }
    }

    fn cleanup_or_default(&mut self, command: &str, kind: ChildKind, signal: CleanupSignal) {
        if let Some(cleanup) = &self.cleanup {
            cleanup.run(command, kind, signal);
            return;
        }
        let Some(execution) = self
            .executions
            .iter_mut()
            .find(|e| e.child.command == command)
        else {
            return;
        };
        match (kind, signal) {
            (_, CleanupSignal::Sigint) => {
                if let Err(err) = execution.child.send_sigint() {
                    warn!(command, ?err, "failed to send SIGINT to child");
                }
            }
            (ChildKind::Fork, CleanupSignal::Sigres) => {
                if let Err(err) = execution.child.send_sigres() {
                    warn!(command, ?err, "failed to send SIGRES to fork child");
                }
            }
            (ChildKind::Spawn, CleanupSignal::Sigres) => {
                execution.child.hard_kill();
            }
        }
    }
}
