// Copyright 2026 Dana Whitfield

//! Live filesystem watching: turns `notify` events for any Source Root into
//! the Path Mapper's "root/rest..." source-path form, so the rest of the
//! pipeline (Filter, Mirror Pipeline, Debouncer) doesn't care whether a path
//! came from the initial scan or a live change.

use std::sync::mpsc::{channel, Receiver};

use camino::{Utf8Path, Utf8PathBuf};
use notify::{Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as _};
use tracing::warn;

use crate::path::Utf8PathSlashes;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEventKind {
    /// A file or directory was created or modified: mirror it.
    Upsert,
    /// A file or directory was removed: remove its mirrored counterpart.
    Remove,
}

#[derive(Debug, Clone)]
pub struct WatchEvent {
    /// The watch root this path was discovered under.
    pub watch_root: Utf8PathBuf,
    /// "root/rest..." form, as the Path Mapper expects.
    pub source_path: Utf8PathBuf,
    /// Where the path actually lives on disk (meaningless for `Remove`).
    pub abs_path: Utf8PathBuf,
    pub kind: WatchEventKind,
}

/// Watches every configured Source Root and turns raw `notify` events into
/// [`WatchEvent`]s addressed against the right root.
pub struct SourceWatcher {
    // Kept alive for the duration of the watch: dropping it stops watching.
    _inner: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    watch_dirs: Vec<Utf8PathBuf>,
}

impl SourceWatcher {
    pub fn new(watch_dirs: &[Utf8PathBuf]) -> Result<SourceWatcher> {
        let (tx, rx) = channel();
        let mut inner: RecommendedWatcher =
            notify::Watcher::new(move |res| {
                let _ = tx.send(res);
            }, NotifyConfig::default())?;
        for watch_dir in watch_dirs {
            inner.watch(watch_dir.as_std_path(), RecursiveMode::Recursive)?;
        }
        Ok(SourceWatcher {
            _inner: inner,
            rx,
            watch_dirs: watch_dirs.to_vec(),
        })
    }

    /// Drain every filesystem event queued since the last call, without
    /// blocking. Call this once per main-loop tick.
    pub fn drain_events(&self) -> Vec<WatchEvent> {
        let mut out = Vec::new();
        while let Ok(result) = self.rx.try_recv() {
            match result {
                Ok(event) => out.extend(self.to_watch_events(event)),
                Err(err) => warn!(?err, "file watcher backend error"),
            }
        }
        out
    }

    fn to_watch_events(&self, event: Event) -> Vec<WatchEvent> {
        let kind = match event.kind {
            EventKind::Create(_) | EventKind::Modify(_) => WatchEventKind::Upsert,
            EventKind::Remove(_) => WatchEventKind::Remove,
            _ => return Vec::new(),
        };
        event
            .paths
            .into_iter()
            .filter_map(|path| self.resolve(path, kind))
            .collect()
    }

    fn resolve(&self, path: std::path::PathBuf, kind: WatchEventKind) -> Option<WatchEvent> {
        let abs_path = match Utf8PathBuf::try_from(path) {
            Ok(p) => p,
            Err(err) => {
                warn!(?err, "non-UTF-8 path from file watcher");
                return None;
            }
        };
        let watch_root = self
            .watch_dirs
            .iter()
            .find(|dir| abs_path.starts_with(dir))?
            .to_owned();
        let root_name = watch_root.file_name().unwrap_or(watch_root.as_str());
        let relative = abs_path
            .strip_prefix(&watch_root)
            .unwrap_or(Utf8Path::new(""));
        let source_path = if relative.as_str().is_empty() {
            Utf8PathBuf::from(root_name)
        } else {
            Utf8PathBuf::from(format!("{root_name}/{}", relative.to_slash_path()))
        };
        Some(WatchEvent {
            watch_root,
            source_path,
            abs_path,
            kind,
        })
    }
}

#[cfg(test)]
mod test {
    use std::fs;
    use std::thread::sleep;
    use std::time::Duration;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn reports_new_file_under_its_own_root() {
        let tmp = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(tmp.path().to_owned()).unwrap();
        let src = root.join("src");
        fs::create_dir_all(&src).unwrap();

        let watcher = SourceWatcher::new(&[src.clone()]).unwrap();
        sleep(Duration::from_millis(100));
        fs::write(src.join("a.txt"), "hi").unwrap();
        sleep(Duration::from_millis(300));

        let events = watcher.drain_events();
        assert!(events
            .iter()
            .any(|e| e.source_path == Utf8PathBuf::from("src/a.txt") && e.kind == WatchEventKind::Upsert));
    }
}
