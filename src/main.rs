// Copyright 2026 Dana Whitfield

//! `rebuild-sentinel`: watch a monorepo's source trees, mirror accepted
//! paths into an output tree, and supervise the dev processes that build
//! against it.
//!
//! This file is the CLI/Bootstrap component: it owns argument parsing,
//! logging setup, the startup sequence (§4 of the design), and the main
//! event loop (§5) that ties the Debouncer, Supervisor, and watcher
//! together. Everything else lives in its own module.

mod cli;
mod console;
mod debounce;
mod depresolver;
mod exit_code;
mod filter;
mod glob;
mod hooks;
mod interrupt;
mod ipc;
mod manifest;
mod mirror;
mod output;
mod package;
mod path;
mod path_map;
mod port_kill;
mod process;
mod scan;
mod shutdown;
mod supervisor;
mod transform_gate;
mod watch;

use std::thread::sleep;
use std::time::Duration;

use camino::Utf8Path;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Args, Config};
use debounce::Debouncer;
use hooks::{CleanupHook, Transformer};
use mirror::{Mirror, TransformFailed};
use supervisor::Supervisor;
use transform_gate::TransformGate;
use watch::{SourceWatcher, WatchEventKind};

/// The crate-wide fallible-result alias every module is written against.
pub type Result<T> = anyhow::Result<T>;

/// How often the main loop wakes up to poll the watcher, the debouncer, and
/// the supervisor's children.
const MAIN_LOOP_TICK: Duration = Duration::from_millis(50);

fn main() {
    let args = Args::parse();
    init_tracing(args.debug);

    let config = match Config::from_args(args) {
        Ok(config) => config,
        Err(err) => fatal(exit_code::USAGE, err),
    };

    interrupt::install_handler();

    let production_deps = match depresolver::resolve(&config.watch_dirs) {
        Ok(deps) => deps,
        Err(err) => fatal(exit_code::RESOLVER_FAILED, err),
    };

    if let Err(err) = output::prepare(&config.output) {
        fatal(exit_code::SOFTWARE, err);
    }

    let gate = match TransformGate::new(&config.transform_globs) {
        Ok(gate) => gate,
        Err(err) => fatal(exit_code::USAGE, err),
    };
    let transformer = config.using.clone().map(Transformer::new);
    let mirror = Mirror::new(config.output.clone(), gate, transformer);
    let mut debouncer = Debouncer::new();

    if let Err(err) = scan::initial_scan(&config.watch_dirs, &production_deps, &mirror, &mut debouncer) {
        exit_on_mirror_error(&config, err);
    }
    // Whatever the scan touched (even nothing) deserves exactly one restart
    // before the live loop takes over.
    debouncer.notify();

    let cleanup = config.cleanup.clone().map(CleanupHook::new);
    let mut supervisor = Supervisor::new(
        config.fork_commands.clone(),
        config.spawn_commands.clone(),
        config.wait,
        cleanup,
    );

    if !supervisor.has_configured_children() {
        tracing::info!("no --fork or --spawn commands configured, mirroring once and exiting");
        shutdown::finish(&config.kill_ports, exit_code::SUCCESS);
    }

    let watcher = match SourceWatcher::new(&config.watch_dirs) {
        Ok(watcher) => watcher,
        Err(err) => fatal(exit_code::SOFTWARE, err),
    };

    let mut shutting_down = false;
    loop {
        if !shutting_down && interrupt::check_interrupted().is_err() {
            tracing::info!("shutting down");
            shutting_down = true;
            supervisor.begin_shutdown();
        }

        if shutting_down && supervisor.is_empty() {
            shutdown::finish(&config.kill_ports, exit_code::SUCCESS);
        }

        if !shutting_down {
            for event in watcher.drain_events() {
                let relative = event
                    .abs_path
                    .strip_prefix(&event.watch_root)
                    .unwrap_or_else(|_| Utf8Path::new(""));
                if !filter::accept(relative, &production_deps, &event.watch_root) {
                    continue;
                }
                let notified = match event.kind {
                    WatchEventKind::Upsert => mirror.process(&event.source_path, &event.abs_path),
                    WatchEventKind::Remove => mirror.remove(&event.source_path),
                };
                match notified {
                    Ok(true) => debouncer.notify(),
                    Ok(false) => {}
                    Err(err) => exit_on_mirror_error(&config, err),
                }
            }
        }

        if debouncer.due() {
            if let Err(err) = supervisor.restart() {
                tracing::warn!(?err, "restart failed");
            }
        }

        if let Err(err) = supervisor.tick() {
            tracing::warn!(?err, "supervisor tick failed");
        }

        sleep(MAIN_LOOP_TICK);
    }
}

/// A mirror-stage failure during the scan or the live loop: downcast for
/// the transform-specific exit code, otherwise treat it as a generic
/// internal error. Either way this is a runtime-phase failure — ports may
/// already be bound and children may already be running — so it always
/// exits through `shutdown::finish` rather than `fatal`, per §7's "uncaught
/// top-level errors trigger final port kill and exit."
fn exit_on_mirror_error(config: &Config, err: anyhow::Error) -> ! {
    console::print_error(&format!("{err:#}"));
    let code = if err.downcast_ref::<TransformFailed>().is_some() {
        exit_code::TRANSFORM_FAILED
    } else {
        exit_code::SOFTWARE
    };
    shutdown::finish(&config.kill_ports, code);
}

fn fatal(code: i32, err: anyhow::Error) -> ! {
    console::print_error(&format!("{err:#}"));
    std::process::exit(code);
}

/// Install a `tracing` subscriber. `--debug` raises the resolver and filter
/// modules to `debug` without touching everything else, matching the
/// "verbose vendor-path logging" the flag promises rather than a blanket
/// `-vvv`.
fn init_tracing(debug: bool) {
    let default_directives = if debug {
        "warn,rebuild_sentinel::depresolver=debug,rebuild_sentinel::filter=debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));
    tracing_subscriber::fmt()
        .without_time()
        .with_target(false)
        .with_env_filter(filter)
        .init();
}
