//! Request handling and transformation.
//!
//! # Responsibilities
//! - Parse JSON bodies (content type containing `json`, at most 5 MB)
//! - Flatten headers and query strings into string maps
//! - Reject oversized or malformed JSON before the function runs
//!
//! # Design Decisions
//! - Bodies of any other content type are not read; the function sees no body
//! - Repeated headers are joined with `, `; repeated query keys keep the last value

use std::collections::BTreeMap;

use axum::{
    body::{to_bytes, Body},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use http_body_util::LengthLimitError;
use serde_json::Value;
use thiserror::Error;

/// Largest JSON body accepted, in bytes.
pub const MAX_JSON_BODY: usize = 5 * 1024 * 1024;

/// Header carrying the request correlation id.
pub const X_REQUEST_ID: &str = "x-request-id";

/// A body rejected before reaching the function.
#[derive(Debug, Error)]
pub enum BodyRejection {
    #[error("request body exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("failed to read request body: {0}")]
    Unreadable(axum::Error),

    #[error("invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl BodyRejection {
    fn from_read_error(err: axum::Error, limit: usize) -> Self {
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            if cause.is::<LengthLimitError>() {
                return BodyRejection::TooLarge { limit };
            }
            source = cause.source();
        }
        BodyRejection::Unreadable(err)
    }
}

impl IntoResponse for BodyRejection {
    fn into_response(self) -> Response {
        let status = match self {
            BodyRejection::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            BodyRejection::Unreadable(_) | BodyRejection::InvalidJson(_) => StatusCode::BAD_REQUEST,
        };
        (status, self.to_string()).into_response()
    }
}

/// True when the content type mentions `json`, in any case.
pub fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("json"))
}

/// Read and parse a JSON body. Returns `None` for non-JSON requests and for
/// JSON requests with an empty body.
pub async fn json_body(headers: &HeaderMap, body: Body, limit: usize) -> Result<Option<Value>, BodyRejection> {
    if !is_json(headers) {
        return Ok(None);
    }

    let bytes = to_bytes(body, limit)
        .await
        .map_err(|err| BodyRejection::from_read_error(err, limit))?;
    if bytes.is_empty() {
        return Ok(None);
    }

    Ok(Some(serde_json::from_slice(&bytes)?))
}

/// Header map with lower-case names and lossy UTF-8 values.
pub fn header_map(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut out: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        out.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    out
}

/// Decoded query string parameters.
pub fn query_map(query: Option<&str>) -> BTreeMap<String, String> {
    query
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .into_owned()
                .collect()
        })
        .unwrap_or_default()
}

/// The request's correlation id, if the request id layer assigned one.
pub fn request_id(headers: &HeaderMap) -> Option<&str> {
    headers.get(X_REQUEST_ID).and_then(|v| v.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;
    use http_body_util::BodyExt;

    fn headers(content_type: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_str(content_type).unwrap());
        headers
    }

    #[tokio::test]
    async fn test_json_body_parsed() {
        let body = json_body(&headers("application/json"), Body::from(r#"{"a":1}"#), MAX_JSON_BODY)
            .await
            .unwrap();
        assert_eq!(body, Some(json!({"a": 1})));
    }

    #[tokio::test]
    async fn test_vendor_json_case_insensitive() {
        let body = json_body(
            &headers("Application/Vnd.Api+JSON; charset=utf-8"),
            Body::from("[1,2]"),
            MAX_JSON_BODY,
        )
        .await
        .unwrap();
        assert_eq!(body, Some(json!([1, 2])));
    }

    #[tokio::test]
    async fn test_text_body_not_parsed() {
        let body = json_body(&headers("text/plain"), Body::from(r#"{"a":1}"#), MAX_JSON_BODY)
            .await
            .unwrap();
        assert_eq!(body, None);

        let body = json_body(&HeaderMap::new(), Body::from(r#"{"a":1}"#), MAX_JSON_BODY)
            .await
            .unwrap();
        assert_eq!(body, None);
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let err = json_body(&headers("application/json"), Body::from("[1,2,3,4]"), 4)
            .await
            .unwrap_err();
        assert!(matches!(err, BodyRejection::TooLarge { limit: 4 }));
        assert_eq!(err.into_response().status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_read_failure_is_not_too_large() {
        let err = BodyRejection::from_read_error(
            axum::Error::new(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
            MAX_JSON_BODY,
        );
        assert!(matches!(err, BodyRejection::Unreadable(_)));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);

        // `LengthLimitError` is `#[non_exhaustive]`; obtain one from `Limited`.
        let limit_err = http_body_util::Limited::new(Body::from("12345"), 4)
            .collect()
            .await
            .unwrap_err();
        assert!(limit_err.is::<LengthLimitError>());
        let err = BodyRejection::from_read_error(axum::Error::new(limit_err), 4);
        assert!(matches!(err, BodyRejection::TooLarge { limit: 4 }));
    }

    #[tokio::test]
    async fn test_malformed_json_rejected() {
        let err = json_body(&headers("application/json"), Body::from("{oops"), MAX_JSON_BODY)
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_header_map_joins_repeats() {
        let mut headers = HeaderMap::new();
        headers.append("X-Tag", HeaderValue::from_static("a"));
        headers.append("x-tag", HeaderValue::from_static("b"));
        headers.insert("Host", HeaderValue::from_static("localhost"));

        let map = header_map(&headers);
        assert_eq!(map["x-tag"], "a, b");
        assert_eq!(map["host"], "localhost");
    }

    #[test]
    fn test_query_map() {
        let map = query_map(Some("name=J%C3%BCrgen&page=2&page=3&q=a+b"));
        assert_eq!(map["name"], "Jürgen");
        assert_eq!(map["page"], "3");
        assert_eq!(map["q"], "a b");
        assert!(query_map(None).is_empty());
    }
}
