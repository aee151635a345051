// Copyright 2026 Dana Whitfield

//! Trailing-edge debounce for restart notifications.
//!
//! Exactly one timer is armed at a time; each `notify()` re-arms it to 300ms
//! out. The main loop calls `due()` on every tick and fires the Supervisor's
//! restart entry point when it returns true.

use std::time::{Duration, Instant};

const DEBOUNCE_WINDOW: Duration = Duration::from_millis(300);

#[derive(Debug, Default)]
pub struct Debouncer {
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new() -> Debouncer {
        Debouncer::default()
    }

    /// (Re)arm the timer. Notifications that arrive while a previous window
    /// is still pending simply push the deadline back out.
    pub fn notify(&mut self) {
        self.deadline = Some(Instant::now() + DEBOUNCE_WINDOW);
    }

    /// True at most once per `notify()` burst: returns true the first time
    /// it's polled after the window has elapsed, then clears.
    pub fn due(&mut self) -> bool {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
