//! Build output and the loader that turns it into served functions.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use thiserror::Error;

use crate::invoke::Handler;
use crate::routing::{FunctionConfig, LoadedFunction};

/// Failure reported by the build collaborator.
#[derive(Debug, Clone, Error)]
#[error("build failed: {message}")]
pub struct BuildError {
    pub message: String,
}

impl BuildError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The loader could not produce a function from a build.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    #[error("build {generation} has no output for function {function}")]
    MissingFunction { function: String, generation: u64 },
}

/// One completed build: compiled functions keyed by function id.
#[derive(Clone, Default)]
pub struct BuildOutput {
    pub generation: u64,
    handlers: HashMap<String, Arc<dyn Handler>>,
}

impl BuildOutput {
    pub fn new(generation: u64) -> Self {
        Self {
            generation,
            handlers: HashMap::new(),
        }
    }

    pub fn with_handler(mut self, function_id: impl Into<String>, handler: Arc<dyn Handler>) -> Self {
        self.insert(function_id, handler);
        self
    }

    pub fn insert(&mut self, function_id: impl Into<String>, handler: Arc<dyn Handler>) {
        self.handlers.insert(function_id.into(), handler);
    }

    pub fn handler(&self, function_id: &str) -> Option<&Arc<dyn Handler>> {
        self.handlers.get(function_id)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for BuildOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildOutput")
            .field("generation", &self.generation)
            .field("functions", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A build notification: a finished build or a build failure.
pub type BuildEvent = Result<BuildOutput, BuildError>;

/// Produces the function a config should serve from a build.
pub trait FunctionLoader: Send + Sync {
    /// `fresh_module` is true for the first function of its module in this
    /// build cycle; later functions of the same module reuse that instance.
    fn load(
        &self,
        build: &BuildOutput,
        function: &FunctionConfig,
        fresh_module: bool,
    ) -> Result<LoadedFunction, LoadError>;
}

/// Loader that takes functions straight from the build output.
#[derive(Debug, Default)]
pub struct OutputLoader {
    instantiations: AtomicUsize,
}

impl OutputLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Module instances created so far.
    pub fn instantiations(&self) -> usize {
        self.instantiations.load(Ordering::Relaxed)
    }
}

impl FunctionLoader for OutputLoader {
    fn load(
        &self,
        build: &BuildOutput,
        function: &FunctionConfig,
        fresh_module: bool,
    ) -> Result<LoadedFunction, LoadError> {
        if fresh_module {
            self.instantiations.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(module = %function.module_name, generation = build.generation, "Instantiating module");
        }

        build
            .handler(&function.id)
            .map(|handler| LoadedFunction::new(handler.clone(), build.generation))
            .ok_or_else(|| LoadError::MissingFunction {
                function: function.id.clone(),
                generation: build.generation,
            })
    }
}
