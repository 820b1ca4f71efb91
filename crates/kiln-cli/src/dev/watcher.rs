//! Filesystem watcher feeding the compiler's watch loop.
//!
//! Watches the project root recursively and forwards changes to module
//! sources and to the config file. Debouncing happens downstream in
//! [`kiln_compiler::WatchLoop`].

use std::path::{Path, PathBuf};

use kiln_graph::SourceKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::error::{CliError, Result};

/// A relevant path changed on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    /// A module source was created, modified or removed.
    Source(PathBuf),
    /// The config file changed.
    Config(PathBuf),
}

/// What the watcher filters on.
#[derive(Debug, Clone)]
pub struct WatchFilter {
    pub root: PathBuf,
    pub config_file: PathBuf,
    /// Path fragments to skip.
    pub ignore: Vec<String>,
    /// Directories kiln writes to.
    pub outputs: Vec<PathBuf>,
}

impl WatchFilter {
    pub fn classify(&self, path: &Path) -> Option<FileChange> {
        if path == self.config_file {
            return Some(FileChange::Config(path.to_path_buf()));
        }
        if !path.starts_with(&self.root) || self.outputs.iter().any(|dir| path.starts_with(dir)) {
            return None;
        }
        let text = path.to_string_lossy();
        if self.ignore.iter().any(|fragment| text.contains(fragment.as_str())) {
            return None;
        }
        let ext = path.extension()?.to_str()?;
        SourceKind::from_extension(ext)
            .is_supported()
            .then(|| FileChange::Source(path.to_path_buf()))
    }
}

/// Keeps the notify watcher alive for as long as it is held.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    root: PathBuf,
}

impl FileWatcher {
    pub fn new(filter: WatchFilter) -> Result<(Self, mpsc::Receiver<FileChange>)> {
        if !filter.root.exists() {
            return Err(CliError::FileNotFound(filter.root));
        }

        let (tx, rx) = mpsc::channel(256);
        let root = filter.root.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!("file watcher error: {}", e);
                    return;
                }
            };
            if !matches!(
                event.kind,
                EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
            ) {
                return;
            }
            for path in &event.paths {
                if let Some(change) = filter.classify(path) {
                    let _ = tx.blocking_send(change);
                }
            }
        })?;
        watcher.watch(&root, RecursiveMode::Recursive)?;

        Ok((
            Self {
                _watcher: watcher,
                root,
            },
            rx,
        ))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> WatchFilter {
        WatchFilter {
            root: PathBuf::from("/project"),
            config_file: PathBuf::from("/project/kiln.toml"),
            ignore: vec!["/node_modules/".to_string()],
            outputs: vec![
                PathBuf::from("/project/dist"),
                PathBuf::from("/project/.kiln/cache"),
            ],
        }
    }

    #[test]
    fn sources_are_forwarded() {
        assert_eq!(
            filter().classify(Path::new("/project/src/app.ts")),
            Some(FileChange::Source(PathBuf::from("/project/src/app.ts")))
        );
        assert!(filter().classify(Path::new("/project/src/style.css")).is_some());
    }

    #[test]
    fn config_changes_are_flagged() {
        assert_eq!(
            filter().classify(Path::new("/project/kiln.toml")),
            Some(FileChange::Config(PathBuf::from("/project/kiln.toml")))
        );
    }

    #[test]
    fn outputs_ignored_paths_and_other_files_are_skipped() {
        let filter = filter();
        assert!(filter.classify(Path::new("/project/dist/main.1234abcd.js")).is_none());
        assert!(filter.classify(Path::new("/project/.kiln/cache/kiln.redb")).is_none());
        assert!(filter.classify(Path::new("/project/node_modules/x/index.js")).is_none());
        assert!(filter.classify(Path::new("/project/README.md")).is_none());
        assert!(filter.classify(Path::new("/elsewhere/app.ts")).is_none());
    }
}
