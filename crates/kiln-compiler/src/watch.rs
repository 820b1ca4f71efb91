//! Watch-mode event loop.
//!
//! The watcher produces a typed channel of [`SourceChanged`] events; the
//! loop coalesces them per specifier within a debounce window, recompiles
//! and propagates, and emits one [`ModuleSettled`] per affected module for
//! the HMR layer to consume.

use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexSet;
use kiln_graph::Specifier;
use rustc_hash::FxBuildHasher;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::compiler::{Compiler, ModuleSettled};

/// Inbound watch event: the source behind `specifier` changed on disk
/// (modified, created or removed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceChanged {
    pub specifier: Specifier,
}

impl SourceChanged {
    pub fn new(specifier: Specifier) -> Self {
        Self { specifier }
    }
}

/// Debounced recompile loop over a shared [`Compiler`].
pub struct WatchLoop {
    compiler: Arc<Compiler>,
    debounce: Duration,
}

impl WatchLoop {
    pub fn new(compiler: Arc<Compiler>, debounce: Duration) -> Self {
        Self { compiler, debounce }
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Run until the inbound channel closes or the outbound receiver is
    /// dropped.
    ///
    /// Events are batched with a trailing debounce: a batch is processed
    /// once no new event arrived for the debounce window. Repeated events
    /// for one specifier within a batch trigger one recompilation.
    pub async fn run(
        &self,
        mut events: mpsc::Receiver<SourceChanged>,
        settled: mpsc::Sender<ModuleSettled>,
    ) {
        while let Some(first) = events.recv().await {
            let mut batch: IndexSet<Specifier, FxBuildHasher> = IndexSet::default();
            batch.insert(first.specifier);

            let mut closed = false;
            let mut deadline = Instant::now() + self.debounce;
            loop {
                match tokio::time::timeout_at(deadline, events.recv()).await {
                    Ok(Some(event)) => {
                        batch.insert(event.specifier);
                        deadline = Instant::now() + self.debounce;
                    }
                    Ok(None) => {
                        closed = true;
                        break;
                    }
                    Err(_) => break,
                }
            }

            tracing::debug!("processing {} changed module(s)", batch.len());
            for specifier in batch {
                let outcome = self.compiler.source_changed(&specifier).await;
                for event in outcome.settled {
                    if settled.send(event).await.is_err() {
                        tracing::debug!("settle receiver dropped, stopping watch loop");
                        return;
                    }
                }
            }

            if closed {
                break;
            }
        }
    }
}
