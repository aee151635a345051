// Copyright 2026 Dana Whitfield

//! The tail end of the Shutdown Coordinator: the final port-kill sequence.
//!
//! Setting the Shutdown Flag and draining children with cleanup/force-kill
//! is [`crate::supervisor::Supervisor::begin_shutdown`]; this module is just
//! the very last step, guaranteed (§8 invariant 5) to run exactly once per
//! process lifetime regardless of which path reaches it — a clean drain, an
//! empty registry at interrupt time, or an uncaught top-level error.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;

use crate::port_kill;

static FINISHED: AtomicBool = AtomicBool::new(false);

/// Kill every configured port, log, and exit with `code`.
///
/// If called more than once (racing shutdown paths), only the first caller
/// runs the port-kill sequence; later callers just exit.
pub fn finish(kill_ports: &[u16], code: i32) -> ! {
    if FINISHED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_ok()
    {
        for &port in kill_ports {
            port_kill::kill_port(port);
        }
        info!("stopped");
    }
    std::process::exit(code);
}
