//! Function configs derived from the declared service.
//!
//! # Responsibilities
//! - Keep only functions with at least one HTTP event
//! - Derive the source module name used to group reloads
//! - Own the live function slot each route reads through
//!
//! # Design Decisions
//! - Declaration order is preserved
//! - The slot is an `ArcSwapOption`: readers see the old or the new
//!   function, never a torn value, and never take a lock

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::config::{FunctionDefinition, HttpEventConfig};
use crate::invoke::Handler;

/// A function as produced by one build.
pub struct LoadedFunction {
    pub handler: Arc<dyn Handler>,
    /// Build generation the function came from.
    pub generation: u64,
}

impl LoadedFunction {
    pub fn new(handler: Arc<dyn Handler>, generation: u64) -> Self {
        Self {
            handler,
            generation,
        }
    }
}

impl fmt::Debug for LoadedFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedFunction")
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

/// A served function and its HTTP events.
#[derive(Debug)]
pub struct FunctionConfig {
    pub id: String,
    pub module_name: String,
    pub events: Vec<HttpEventConfig>,
    current: ArcSwapOption<LoadedFunction>,
}

impl FunctionConfig {
    pub fn new(id: impl Into<String>, module_name: impl Into<String>, events: Vec<HttpEventConfig>) -> Self {
        Self {
            id: id.into(),
            module_name: module_name.into(),
            events,
            current: ArcSwapOption::empty(),
        }
    }

    /// The function currently serving requests, if any build produced one.
    pub fn current(&self) -> Option<Arc<LoadedFunction>> {
        self.current.load_full()
    }

    /// Swap in a newly built function. Later requests use it.
    pub fn replace(&self, function: LoadedFunction) {
        self.current.store(Some(Arc::new(function)));
    }
}

/// Module part of a handler reference: everything before the first `.`.
pub fn module_name(handler: &str) -> &str {
    handler.split('.').next().unwrap_or(handler)
}

/// Build one config per function with HTTP events, in declaration order.
pub fn function_configs(definitions: &[FunctionDefinition]) -> Vec<Arc<FunctionConfig>> {
    definitions
        .iter()
        .filter_map(|definition| {
            let events: Vec<HttpEventConfig> = definition
                .events
                .iter()
                .filter_map(|event| event.http.clone())
                .map(|http| http.into_config())
                .collect();

            if events.is_empty() {
                tracing::debug!(function = %definition.name, "No HTTP events, not served");
                return None;
            }

            Some(Arc::new(FunctionConfig::new(
                definition.name.clone(),
                module_name(&definition.handler),
                events,
            )))
        })
        .collect()
}
