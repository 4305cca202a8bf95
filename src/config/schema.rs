//! Configuration schema definitions.
//!
//! This module defines the declarative service description the simulator serves.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the simulator.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Deployment stage prepended to every route path (e.g. "dev").
    pub stage: Option<String>,

    /// Port the local server listens on.
    pub port: u16,

    /// Optional per-request timeout in seconds. Absent means requests wait
    /// for the function indefinitely.
    pub timeout_secs: Option<u64>,

    /// Function definitions in declaration order.
    pub functions: Vec<FunctionDefinition>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            stage: None,
            port: 8000,
            timeout_secs: None,
            functions: Vec::new(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl ServeConfig {
    /// The stage segment, if one is configured and non-empty.
    pub fn stage(&self) -> Option<&str> {
        self.stage.as_deref().filter(|s| !s.is_empty())
    }
}

/// One declared function.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FunctionDefinition {
    /// Unique function identifier.
    pub name: String,

    /// Handler reference, `<module>.<export>`.
    pub handler: String,

    /// Trigger events of any kind.
    #[serde(default)]
    pub events: Vec<EventDefinition>,
}

/// A trigger event. Only the `http` kind is served; every other kind is kept
/// verbatim and ignored.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EventDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpEventSetting>,

    #[serde(flatten)]
    pub other: BTreeMap<String, serde_json::Value>,
}

/// HTTP event as written by the user: a table or a `"METHOD path"` shorthand.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum HttpEventSetting {
    Shorthand(String),
    Full(HttpEventConfig),
}

impl HttpEventSetting {
    /// Normalize either form into a full event config.
    pub fn into_config(self) -> HttpEventConfig {
        match self {
            HttpEventSetting::Full(config) => config,
            HttpEventSetting::Shorthand(line) => {
                let mut parts = line.split_whitespace();
                let method = parts.next().unwrap_or_default().to_string();
                let path = parts.next().unwrap_or_default().to_string();
                HttpEventConfig {
                    method,
                    path,
                    integration: IntegrationMode::default(),
                    cors: None,
                }
            }
        }
    }
}

/// One HTTP trigger on a function.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpEventConfig {
    /// HTTP method, case-insensitive (`ANY` matches every method).
    pub method: String,

    /// Raw path template, may contain `{name}` and `{name+}` placeholders.
    #[serde(default)]
    pub path: String,

    /// Integration mode (proxy unless `lambda`).
    #[serde(default)]
    pub integration: IntegrationMode,

    /// CORS setting for this event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cors: Option<CorsSetting>,
}

/// Request/response shape used when invoking the function.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum IntegrationMode {
    /// Raw parameters in, explicit `statusCode`/`body` out.
    #[default]
    Proxy,
    /// Parameters under `path`/`query`, return value sent as a 200 body.
    Lambda,
}

impl From<String> for IntegrationMode {
    fn from(value: String) -> Self {
        if value == "lambda" {
            IntegrationMode::Lambda
        } else {
            IntegrationMode::Proxy
        }
    }
}

impl From<IntegrationMode> for String {
    fn from(mode: IntegrationMode) -> Self {
        match mode {
            IntegrationMode::Proxy => "lambda-proxy".to_string(),
            IntegrationMode::Lambda => "lambda".to_string(),
        }
    }
}

/// `cors: true`, `cors: false` or a policy table.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CorsSetting {
    Enabled(bool),
    Policy(CorsConfig),
}

/// User-facing CORS policy; unset fields take defaults when resolved.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorsConfig {
    pub allow_credentials: Option<bool>,
    pub origins: Option<Vec<String>>,
    pub headers: Option<Vec<String>>,
    pub methods: Option<Vec<String>>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error), overridden by `RUST_LOG`.
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json_logs: bool,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
