//! Invocation adapter: request in, function call, response out.

use std::collections::HashMap;
use std::time::Instant;

use axum::{
    extract::{FromRequestParts, Path, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::http::request::{header_map, json_body, query_map, request_id, MAX_JSON_BODY};
use crate::http::response::outcome_response;
use crate::invoke::context::ContextProvider;
use crate::invoke::event::{InvocationEvent, Params, RequestParameters};
use crate::invoke::handler::Callback;
use crate::observability::metrics;
use crate::routing::RouteDescriptor;

/// Serve one request matched to `route`.
///
/// The function is read from the route's slot on every call, so a function
/// swapped in by a rebuild serves the next request. The response goes out as
/// soon as the function calls back; the function itself runs on its own task
/// and may keep working afterwards.
pub async fn dispatch(route: &RouteDescriptor, contexts: &dyn ContextProvider, req: Request) -> Response {
    let start = Instant::now();
    let function_id = route.function.id.as_str();
    let (mut parts, body) = req.into_parts();

    let path_params: Params = Path::<HashMap<String, String>>::from_request_parts(&mut parts, &())
        .await
        .map(|Path(params)| params.into_iter().collect())
        .unwrap_or_default();

    let body = match json_body(&parts.headers, body, MAX_JSON_BODY).await {
        Ok(body) => body,
        Err(rejection) => {
            tracing::debug!(function = %function_id, error = %rejection, "Rejected request body");
            return rejection.into_response();
        }
    };

    let Some(function) = route.function.current() else {
        tracing::warn!(function = %function_id, "Function has not been built yet");
        let res = (
            StatusCode::SERVICE_UNAVAILABLE,
            format!("function {} has not been built yet", function_id),
        )
            .into_response();
        metrics::record_invocation(function_id, res.status().as_u16(), start);
        return res;
    };

    let request_id = request_id(&parts.headers);
    let context = contexts.context(function_id, request_id);
    let event = InvocationEvent {
        method: parts.method.as_str().to_string(),
        headers: header_map(&parts.headers),
        body,
        resource: route.resource.clone(),
        parameters: RequestParameters::new(route.integration, path_params, query_map(parts.uri.query())),
    };

    tracing::debug!(
        function = %function_id,
        request_id = %context.aws_request_id,
        generation = function.generation,
        integration = ?route.integration,
        "Invoking function"
    );

    let (callback, outcome) = Callback::channel();
    let handler = function.handler.clone();
    tokio::spawn(async move { handler.invoke(event, context, callback).await });

    let res = match outcome.await {
        Ok(Err(err)) => {
            tracing::warn!(function = %function_id, error = %err, "Function returned an error");
            outcome_response(route.integration, Err(err))
        }
        Ok(ok) => outcome_response(route.integration, ok),
        Err(_) => {
            tracing::error!(function = %function_id, "Function finished without calling back");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("function {} finished without calling back", function_id),
            )
                .into_response()
        }
    };

    metrics::record_invocation(function_id, res.status().as_u16(), start);
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EventDefinition, FunctionDefinition, HttpEventConfig, HttpEventSetting, IntegrationMode};
    use crate::invoke::{handler_fn, LocalContextProvider};
    use crate::routing::{LoadedFunction, RouteTable};
    use axum::body::Body;
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn table(integration: IntegrationMode) -> RouteTable {
        RouteTable::build(
            &[FunctionDefinition {
                name: "echo".into(),
                handler: "handler.echo".into(),
                events: vec![EventDefinition {
                    http: Some(HttpEventSetting::Full(HttpEventConfig {
                        method: "POST".into(),
                        path: "items/{id}".into(),
                        integration,
                        cors: None,
                    })),
                    ..Default::default()
                }],
            }],
            None,
        )
        .unwrap()
    }

    fn request(content_type: &str, body: &str) -> Request {
        axum::http::Request::builder()
            .method("POST")
            .uri("/items/7?q=x")
            .header("content-type", content_type)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn install_echo(table: &RouteTable) {
        table.functions()[0].replace(LoadedFunction::new(
            Arc::new(handler_fn(|event: InvocationEvent, _| async move {
                Ok(json!({"statusCode": 200, "body": event.to_value()}))
            })),
            1,
        ));
    }

    async fn json_of(res: Response) -> Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_unbuilt_function_is_503() {
        let table = table(IntegrationMode::Proxy);
        let res = dispatch(&table.routes()[0], &LocalContextProvider::new(), request("application/json", "{}")).await;
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_event_built_from_request() {
        // Called outside a router, so no path params are matched.
        let table = table(IntegrationMode::Proxy);
        install_echo(&table);

        let res = dispatch(&table.routes()[0], &LocalContextProvider::new(), request("application/json", r#"{"a":1}"#)).await;
        assert_eq!(res.status(), StatusCode::OK);

        let event = json_of(res).await;
        assert_eq!(event["method"], "POST");
        assert_eq!(event["body"], json!({"a": 1}));
        assert_eq!(event["resource"], "/items/{id}");
        assert_eq!(event["queryStringParameters"], json!({"q": "x"}));
        assert_eq!(event["headers"]["content-type"], "application/json");
    }

    #[tokio::test]
    async fn test_dropped_callback_is_500() {
        let table = table(IntegrationMode::Lambda);
        struct Silent;
        #[async_trait::async_trait]
        impl crate::invoke::Handler for Silent {
            async fn invoke(&self, _: InvocationEvent, _: crate::invoke::InvocationContext, _: Callback) {}
        }
        table.functions()[0].replace(LoadedFunction::new(Arc::new(Silent), 1));

        let res = dispatch(&table.routes()[0], &LocalContextProvider::new(), request("text/plain", "")).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_response_sent_once_called_back() {
        let table = table(IntegrationMode::Lambda);
        struct Lingering;
        #[async_trait::async_trait]
        impl crate::invoke::Handler for Lingering {
            async fn invoke(&self, _: InvocationEvent, _: crate::invoke::InvocationContext, callback: Callback) {
                callback.succeed(json!({"done": true}));
                std::future::pending::<()>().await;
            }
        }
        table.functions()[0].replace(LoadedFunction::new(Arc::new(Lingering), 1));

        let res = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            dispatch(&table.routes()[0], &LocalContextProvider::new(), request("text/plain", "")),
        )
        .await
        .expect("response should not wait for the function to return");
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json_of(res).await, json!({"done": true}));
    }

    #[tokio::test]
    async fn test_bad_json_never_reaches_function() {
        let table = table(IntegrationMode::Proxy);
        install_echo(&table);
        let res = dispatch(&table.routes()[0], &LocalContextProvider::new(), request("application/json", "{oops")).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
