//! Source watcher that emits a rebuild on every change.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::FunctionDefinition;
use crate::invoke::Handler;
use crate::reload::loader::{BuildError, BuildEvent, BuildOutput};

/// Resolves an export name to a function.
pub type Resolver = fn(&str) -> Option<Arc<dyn Handler>>;

/// Builds every declared function from a catalog of known exports.
pub struct CatalogBuilder {
    /// (function id, handler reference)
    functions: Vec<(String, String)>,
    resolve: Resolver,
    generation: AtomicU64,
}

impl CatalogBuilder {
    pub fn new(definitions: &[FunctionDefinition], resolve: Resolver) -> Self {
        Self {
            functions: definitions
                .iter()
                .map(|d| (d.name.clone(), d.handler.clone()))
                .collect(),
            resolve,
            generation: AtomicU64::new(0),
        }
    }

    /// Run one build. Every call gets a new generation number.
    pub fn build(&self) -> BuildEvent {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let mut output = BuildOutput::new(generation);

        for (id, reference) in &self.functions {
            let export = reference.rsplit('.').next().unwrap_or(reference);
            let handler = (self.resolve)(export).ok_or_else(|| {
                BuildError::new(format!("function {}: no export {:?} in {}", id, export, reference))
            })?;
            output.insert(id.clone(), handler);
        }

        Ok(output)
    }
}

/// A watcher that rebuilds when the watched path changes.
pub struct BuildWatcher {
    path: PathBuf,
    builder: Arc<CatalogBuilder>,
    build_tx: mpsc::UnboundedSender<BuildEvent>,
}

impl BuildWatcher {
    /// Create a new BuildWatcher.
    ///
    /// Returns the watcher and a receiver for build notifications.
    pub fn new(path: &Path, builder: CatalogBuilder) -> (Self, mpsc::UnboundedReceiver<BuildEvent>) {
        let (build_tx, build_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                builder: Arc::new(builder),
                build_tx,
            },
            build_rx,
        )
    }

    /// Emit the initial build, then watch the path in a background thread.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let _ = self.build_tx.send(self.builder.build());

        let tx = self.build_tx.clone();
        let builder = self.builder.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!(paths = ?event.paths, "Source change detected, rebuilding...");
                        let _ = tx.send(builder.build());
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::Recursive)?;

        tracing::info!(path = ?self.path, "Build watcher started");
        Ok(watcher)
    }
}
