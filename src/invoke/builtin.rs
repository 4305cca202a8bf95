//! Built-in functions the binary can serve without an external bundler.
//!
//! Handler references resolve by export name: `handler.echo` → `echo`.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::config::IntegrationMode;
use crate::invoke::{handler_fn, Handler, InvocationContext, InvocationEvent, Outcome};

/// Names of the built-in exports.
pub const EXPORTS: &[&str] = &["echo", "hello", "fail"];

/// Resolve a built-in function by export name.
pub fn lookup(export: &str) -> Option<Arc<dyn Handler>> {
    let handler: Arc<dyn Handler> = match export {
        "echo" => Arc::new(handler_fn(|event, ctx| async move { echo(event, ctx) })),
        "hello" => Arc::new(handler_fn(|event, _| async move { hello(event) })),
        "fail" => Arc::new(handler_fn(|_, ctx: InvocationContext| async move {
            Err(json!({ "errorMessage": format!("{} failed", ctx.function_name) }))
        })),
        _ => return None,
    };
    Some(handler)
}

fn echo(event: InvocationEvent, ctx: InvocationContext) -> Outcome {
    let payload = json!({ "event": event.to_value(), "context": ctx });
    match event.integration() {
        IntegrationMode::Lambda => Ok(payload),
        IntegrationMode::Proxy => Ok(json!({
            "statusCode": 200,
            "headers": { "content-type": "application/json" },
            "body": payload.to_string(),
        })),
    }
}

fn hello(event: InvocationEvent) -> Outcome {
    let name = event
        .path_params()
        .get("name")
        .or_else(|| event.query_params().get("name"))
        .cloned()
        .or_else(|| {
            event
                .body
                .as_ref()
                .and_then(|b| b.get("name"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| "world".to_string());

    let greeting = format!("Hello, {}!", name);
    match event.integration() {
        IntegrationMode::Lambda => Ok(json!({ "message": greeting })),
        IntegrationMode::Proxy => Ok(json!({ "statusCode": 200, "body": greeting })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoke::{Callback, Params, RequestParameters};

    async fn run(export: &str, event: InvocationEvent) -> Outcome {
        let (callback, rx) = Callback::channel();
        lookup(export)
            .unwrap()
            .invoke(event, InvocationContext::default(), callback)
            .await;
        rx.await.unwrap()
    }

    #[tokio::test]
    async fn test_hello_uses_query_name() {
        let mut query = Params::new();
        query.insert("name".into(), "Ada".into());
        let event = InvocationEvent {
            parameters: RequestParameters::new(IntegrationMode::Proxy, Params::new(), query),
            ..Default::default()
        };
        let outcome = run("hello", event).await.unwrap();
        assert_eq!(outcome["body"], "Hello, Ada!");
    }

    #[tokio::test]
    async fn test_fail_reports_error() {
        assert!(run("fail", InvocationEvent::default()).await.is_err());
    }

    #[test]
    fn test_unknown_export() {
        assert!(lookup("nope").is_none());
        assert!(EXPORTS.iter().all(|e| lookup(e).is_some()));
    }
}
