//! Hot-reload coordinator.
//!
//! # Responsibilities
//! - Apply each finished build to every served function
//! - Tell the loader which function is the first of its module this cycle
//! - Stop on the first failed build
//!
//! # Design Decisions
//! - Functions are visited in declaration order
//! - A swap is a single atomic store; requests in flight keep the function
//!   they already loaded
//! - A failed build is fatal: stale functions are never served silently

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::reload::loader::{BuildError, BuildEvent, BuildOutput, FunctionLoader, LoadError};
use crate::routing::FunctionConfig;

/// A rebuild that cannot be applied. Ends the reload loop.
#[derive(Debug, Error)]
pub enum ReloadError {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Result of one reload cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReloadReport {
    pub generation: u64,
    pub functions: usize,
    pub modules: usize,
}

/// Swaps served functions on every finished build.
pub struct HotReloader {
    functions: Vec<Arc<FunctionConfig>>,
    loader: Arc<dyn FunctionLoader>,
}

impl HotReloader {
    pub fn new(functions: Vec<Arc<FunctionConfig>>, loader: Arc<dyn FunctionLoader>) -> Self {
        Self { functions, loader }
    }

    /// Apply one build to every function.
    pub fn apply(&self, build: &BuildOutput) -> Result<ReloadReport, ReloadError> {
        let mut loaded_modules: HashSet<&str> = HashSet::new();

        for function in &self.functions {
            let fresh_module = loaded_modules.insert(function.module_name.as_str());
            let loaded = self.loader.load(build, function, fresh_module)?;
            function.replace(loaded);
        }

        Ok(ReloadReport {
            generation: build.generation,
            functions: self.functions.len(),
            modules: loaded_modules.len(),
        })
    }

    /// Apply builds as they arrive until the channel closes or a build fails.
    pub async fn run(self, mut builds: mpsc::UnboundedReceiver<BuildEvent>) -> Result<(), ReloadError> {
        while let Some(event) = builds.recv().await {
            let build = event.inspect_err(|e| tracing::error!(error = %e, "Build failed"))?;
            let report = self
                .apply(&build)
                .inspect_err(|e| tracing::error!(error = %e, "Reload failed"))?;
            tracing::info!(
                generation = report.generation,
                functions = report.functions,
                modules = report.modules,
                "Functions reloaded"
            );
        }

        tracing::debug!("Build channel closed, reloads stopped");
        Ok(())
    }
}
