//! Response translation.
//!
//! # Responsibilities
//! - Turn a function outcome into an HTTP response per integration mode
//! - Render JSON values as response bodies
//! - Copy proxy-mode `headers` onto the response
//!
//! # Design Decisions
//! - Errors are always 500 with the error value as body
//! - Strings are sent as HTML text, other values as JSON, null as no body
//! - An unusable `statusCode` is a function error, answered with 500

use axum::{
    http::{header::CONTENT_TYPE, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use crate::config::IntegrationMode;
use crate::invoke::Outcome;

/// Build the HTTP response for a function outcome.
pub fn outcome_response(mode: IntegrationMode, outcome: Outcome) -> Response {
    match (outcome, mode) {
        (Err(err), _) => body_response(StatusCode::INTERNAL_SERVER_ERROR, &err),
        (Ok(response), IntegrationMode::Lambda) => body_response(StatusCode::OK, &response),
        (Ok(response), IntegrationMode::Proxy) => proxy_response(&response),
    }
}

fn proxy_response(response: &Value) -> Response {
    let status = match status_code(response.get("statusCode")) {
        Ok(status) => status,
        Err(raw) => {
            tracing::warn!(status_code = %raw, "Function returned an invalid status code");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("invalid status code: {}", raw),
            )
                .into_response();
        }
    };

    let mut res = body_response(status, response.get("body").unwrap_or(&Value::Null));
    if let Some(Value::Object(headers)) = response.get("headers") {
        for (name, value) in headers {
            let value = match value {
                Value::String(s) => s.clone(),
                Value::Number(_) | Value::Bool(_) => value.to_string(),
                _ => continue,
            };
            match (HeaderName::try_from(name.as_str()), HeaderValue::try_from(value)) {
                (Ok(name), Ok(value)) => {
                    res.headers_mut().insert(name, value);
                }
                _ => tracing::warn!(header = %name, "Skipping invalid response header"),
            }
        }
    }
    res
}

/// Falsy or absent means 200. Anything else must be a valid status code.
fn status_code(raw: Option<&Value>) -> Result<StatusCode, Value> {
    let code = match raw {
        None | Some(Value::Null) | Some(Value::Bool(false)) => return Ok(StatusCode::OK),
        Some(Value::String(s)) if s.is_empty() => return Ok(StatusCode::OK),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => return Ok(StatusCode::OK),
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        Some(_) => None,
    };

    code.and_then(|c| u16::try_from(c).ok())
        .and_then(|c| StatusCode::from_u16(c).ok())
        .ok_or_else(|| raw.cloned().unwrap_or(Value::Null))
}

/// Response with `body` rendered the way a JS `send` would.
pub fn body_response(status: StatusCode, body: &Value) -> Response {
    match body {
        Value::Null => status.into_response(),
        Value::String(s) => (
            status,
            [(CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"))],
            s.clone(),
        )
            .into_response(),
        other => (status, Json(other.clone())).into_response(),
    }
}
