//! Invocation context passed to functions alongside the event.

use serde::Serialize;
use uuid::Uuid;

/// Execution context for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationContext {
    pub function_name: String,
    pub function_version: String,
    #[serde(rename = "memoryLimitInMB")]
    pub memory_limit_in_mb: u32,
    pub aws_request_id: String,
    pub log_group_name: String,
    pub log_stream_name: String,
}

/// Produces the context for a function invocation.
pub trait ContextProvider: Send + Sync {
    /// Build a context for `function_id`. `request_id` is the request's
    /// correlation id when the transport assigned one.
    fn context(&self, function_id: &str, request_id: Option<&str>) -> InvocationContext;
}

/// Context provider for local serving.
#[derive(Debug, Clone)]
pub struct LocalContextProvider {
    memory_limit_in_mb: u32,
}

impl LocalContextProvider {
    pub fn new() -> Self {
        Self {
            memory_limit_in_mb: 1024,
        }
    }

    pub fn with_memory_limit(mut self, memory_limit_in_mb: u32) -> Self {
        self.memory_limit_in_mb = memory_limit_in_mb;
        self
    }
}

impl Default for LocalContextProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextProvider for LocalContextProvider {
    fn context(&self, function_id: &str, request_id: Option<&str>) -> InvocationContext {
        let aws_request_id = request_id
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        InvocationContext {
            function_name: function_id.to_string(),
            function_version: "$LATEST".to_string(),
            memory_limit_in_mb: self.memory_limit_in_mb,
            aws_request_id,
            log_group_name: format!("/aws/lambda/{}", function_id),
            log_stream_name: "local".to_string(),
        }
    }
}
