//! Watch-mode session: file events in, settled modules out.

pub mod watcher;

use std::path::PathBuf;

use kiln_compiler::{ModuleSettled, SourceChanged, WatchLoop};
use kiln_graph::Specifier;
use tokio::sync::mpsc;

pub use watcher::{FileChange, FileWatcher, WatchFilter};

use crate::error::Result;
use crate::project::Project;
use crate::ui;

/// Why a watch session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The config file changed; the caller reloads and starts over.
    ConfigChanged,
    Shutdown,
}

/// Watch the project until the config changes or the user interrupts.
pub async fn watch(project: &Project, config_file: PathBuf) -> Result<SessionEnd> {
    let config = project.config();
    let filter = WatchFilter {
        root: config.root.clone(),
        config_file,
        ignore: config.dev.ignore.clone(),
        outputs: vec![config.out_dir_path(), config.cache_dir_path()],
    };
    let (watcher, mut changes) = FileWatcher::new(filter)?;
    tracing::info!("watching {}", watcher.root().display());

    let (source_tx, source_rx) = mpsc::channel(256);
    let (settled_tx, mut settled_rx) = mpsc::channel(256);
    let watch_loop = WatchLoop::new(project.compiler().clone(), config.dev.debounce());
    let handle = tokio::spawn(async move { watch_loop.run(source_rx, settled_tx).await });

    let end = loop {
        tokio::select! {
            change = changes.recv() => match change {
                Some(FileChange::Source(path)) => match Specifier::from_path(&path) {
                    Ok(specifier) => {
                        if source_tx.send(SourceChanged::new(specifier)).await.is_err() {
                            break SessionEnd::Shutdown;
                        }
                    }
                    Err(e) => tracing::warn!("ignoring change to {}: {}", path.display(), e),
                },
                Some(FileChange::Config(path)) => {
                    ui::info(&format!("{} changed, reloading", path.display()));
                    break SessionEnd::ConfigChanged;
                }
                None => break SessionEnd::Shutdown,
            },
            Some(event) = settled_rx.recv() => report_settled(&event),
            _ = tokio::signal::ctrl_c() => break SessionEnd::Shutdown,
        }
    };

    drop(source_tx);
    drop(settled_rx);
    if let Err(e) = handle.await {
        tracing::warn!("watch loop ended abnormally: {}", e);
    }
    Ok(end)
}

fn report_settled(event: &ModuleSettled) {
    match &event.error {
        Some(error) => ui::error(&format!("{}: {}", event.specifier, error)),
        None if event.hmr_relevant => ui::info(&format!("updated {}", event.specifier)),
        None => tracing::debug!("{} settled unchanged", event.specifier),
    }
}
