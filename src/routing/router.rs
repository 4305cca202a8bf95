//! Route table: one descriptor per (function, HTTP event) pair.
//!
//! # Responsibilities
//! - Resolve method, path pattern and CORS policy for every event
//! - Reject configurations the router cannot serve deterministically
//! - Keep the back-reference each route reads its function through
//!
//! # Design Decisions
//! - Immutable after construction except for the function slots
//! - Duplicate (method, path) pairs are rejected, not silently shadowed
//! - Function names are unique; builds are keyed by name
//! - Preflight for a path uses the CORS policy of the first event declared there

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;

use crate::config::{FunctionDefinition, IntegrationMode};
use crate::http::cors::{CorsHeaders, CorsPolicy};
use crate::routing::method::HttpMethod;
use crate::routing::path::{resource_path, PathPattern};
use crate::routing::table::{function_configs, FunctionConfig};

/// Configuration the route table cannot be built from.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("function {function}: unsupported HTTP method {method:?}")]
    UnsupportedMethod { function: String, method: String },

    #[error("function {function}: invalid path {path:?}: {reason}")]
    InvalidPath {
        function: String,
        path: String,
        reason: &'static str,
    },

    #[error("function {function}: {method} {path} is already served by function {existing}")]
    DuplicateRoute {
        function: String,
        existing: String,
        method: HttpMethod,
        path: String,
    },

    #[error("function {function}: path {path} conflicts with {existing}; parameters at the same position must share name and kind")]
    ConflictingPath {
        function: String,
        path: String,
        existing: String,
    },

    #[error("function {function} is declared more than once")]
    DuplicateFunction { function: String },

    #[error("function {function}: invalid CORS header value {value:?}")]
    InvalidCorsValue { function: String, value: String },
}

/// A resolved, registrable route.
#[derive(Debug)]
pub struct RouteDescriptor {
    pub method: HttpMethod,
    pub pattern: PathPattern,
    /// `/` + the event path, without stage.
    pub resource: String,
    pub integration: IntegrationMode,
    pub cors: Option<Arc<CorsHeaders>>,
    pub function: Arc<FunctionConfig>,
}

/// The synthetic OPTIONS route at a path.
#[derive(Debug)]
pub struct PreflightRoute {
    pub pattern: PathPattern,
    pub cors: Option<Arc<CorsHeaders>>,
}

/// All routes derived from one configuration load.
#[derive(Debug, Default)]
pub struct RouteTable {
    functions: Vec<Arc<FunctionConfig>>,
    routes: Vec<Arc<RouteDescriptor>>,
    preflights: Vec<PreflightRoute>,
}

impl RouteTable {
    /// Build the table from declared functions.
    pub fn build(definitions: &[FunctionDefinition], stage: Option<&str>) -> Result<Self, RouteError> {
        let mut names = HashSet::new();
        if let Some(duplicate) = definitions.iter().find(|d| !names.insert(d.name.as_str())) {
            return Err(RouteError::DuplicateFunction {
                function: duplicate.name.clone(),
            });
        }

        let functions = function_configs(definitions);
        let mut routes: Vec<Arc<RouteDescriptor>> = Vec::new();
        // one entry per distinct path
        let mut preflights: Vec<PreflightRoute> = Vec::new();

        for function in &functions {
            for event in &function.events {
                let method: HttpMethod =
                    event.method.parse().map_err(|_| RouteError::UnsupportedMethod {
                        function: function.id.clone(),
                        method: event.method.clone(),
                    })?;

                let pattern = PathPattern::compile(stage, &event.path).map_err(|e| {
                    RouteError::InvalidPath {
                        function: function.id.clone(),
                        path: e.template,
                        reason: e.reason,
                    }
                })?;
                let path = pattern.router_path();

                if let Some(existing) = preflights.iter().find(|p| p.pattern.conflicts_with(&pattern)) {
                    return Err(RouteError::ConflictingPath {
                        function: function.id.clone(),
                        path,
                        existing: existing.pattern.router_path(),
                    });
                }

                if let Some(existing) = routes
                    .iter()
                    .find(|r| r.method == method && r.pattern == pattern)
                {
                    return Err(RouteError::DuplicateRoute {
                        function: function.id.clone(),
                        existing: existing.function.id.clone(),
                        method,
                        path,
                    });
                }

                let cors = CorsPolicy::resolve(event.cors.as_ref())
                    .map(|policy| policy.to_headers())
                    .transpose()
                    .map_err(|value| RouteError::InvalidCorsValue {
                        function: function.id.clone(),
                        value,
                    })?
                    .map(Arc::new);

                if !preflights.iter().any(|p| p.pattern == pattern) {
                    preflights.push(PreflightRoute {
                        pattern: pattern.clone(),
                        cors: cors.clone(),
                    });
                }

                routes.push(Arc::new(RouteDescriptor {
                    method,
                    pattern,
                    resource: resource_path(&event.path),
                    integration: event.integration,
                    cors,
                    function: function.clone(),
                }));
            }
        }

        // A declared OPTIONS event takes the place of the synthetic handler.
        preflights.retain(|p| {
            !routes
                .iter()
                .any(|r| r.method == HttpMethod::Options && r.pattern == p.pattern)
        });

        Ok(Self {
            functions,
            routes,
            preflights,
        })
    }

    /// Served functions in declaration order.
    pub fn functions(&self) -> &[Arc<FunctionConfig>] {
        &self.functions
    }

    pub fn routes(&self) -> &[Arc<RouteDescriptor>] {
        &self.routes
    }

    pub fn preflights(&self) -> &[PreflightRoute] {
        &self.preflights
    }
}
