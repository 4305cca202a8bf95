//! Synthetic invocation event built for each request.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::config::IntegrationMode;

/// Path or query parameters by name.
pub type Params = BTreeMap<String, String>;

/// The event a function receives for one HTTP request.
///
/// Proxy integration exposes parameters as `pathParameters` and
/// `queryStringParameters`; lambda integration as `path` and `query`.
/// The values are identical in both modes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvocationEvent {
    pub method: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
    pub resource: String,
    #[serde(flatten)]
    pub parameters: RequestParameters,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RequestParameters {
    Proxy {
        #[serde(rename = "pathParameters")]
        path_parameters: Params,
        #[serde(rename = "queryStringParameters")]
        query_string_parameters: Params,
    },
    Lambda {
        path: Params,
        query: Params,
    },
}

impl RequestParameters {
    pub fn new(mode: IntegrationMode, path: Params, query: Params) -> Self {
        match mode {
            IntegrationMode::Proxy => RequestParameters::Proxy {
                path_parameters: path,
                query_string_parameters: query,
            },
            IntegrationMode::Lambda => RequestParameters::Lambda { path, query },
        }
    }
}

impl InvocationEvent {
    /// Path parameters regardless of integration mode.
    pub fn path_params(&self) -> &Params {
        match &self.parameters {
            RequestParameters::Proxy { path_parameters, .. } => path_parameters,
            RequestParameters::Lambda { path, .. } => path,
        }
    }

    /// Query parameters regardless of integration mode.
    pub fn query_params(&self) -> &Params {
        match &self.parameters {
            RequestParameters::Proxy {
                query_string_parameters,
                ..
            } => query_string_parameters,
            RequestParameters::Lambda { query, .. } => query,
        }
    }

    pub fn integration(&self) -> IntegrationMode {
        match self.parameters {
            RequestParameters::Proxy { .. } => IntegrationMode::Proxy,
            RequestParameters::Lambda { .. } => IntegrationMode::Lambda,
        }
    }

    /// The event as a JSON value, in the shape a function runtime would see.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl Default for InvocationEvent {
    fn default() -> Self {
        Self {
            method: "GET".to_string(),
            headers: BTreeMap::new(),
            body: None,
            resource: "/".to_string(),
            parameters: RequestParameters::new(
                IntegrationMode::Proxy,
                Params::new(),
                Params::new(),
            ),
        }
    }
}
