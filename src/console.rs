// Copyright 2026 Dana Whitfield

//! Small terminal-output helpers for messages that should reach the user
//! even with `RUST_LOG` unset — startup validation failures and the
//! supervisor's headline log lines. Everything else goes through `tracing`.

use console::style;

/// Print a fatal startup error the way a failed validation or resolver run
/// should be reported: no log timestamps, just the message.
pub fn print_error(msg: &str) {
    eprintln!("{}: {}", style("error").bold().red(), msg);
}
