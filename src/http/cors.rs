//! CORS policy resolution and the middleware that applies it.
//!
//! A policy is resolved once per event when the route table is built. The
//! middleware wraps either a route handler or the synthetic preflight handler
//! and sets the `Access-Control-*` headers on whatever the inner handler
//! returns, leaving the request untouched. Headers the inner handler already
//! set are kept.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::{self, Next},
    response::Response,
    routing::MethodRouter,
};

use crate::config::{CorsConfig, CorsSetting};

const DEFAULT_ORIGINS: &[&str] = &["*"];
const DEFAULT_HEADERS: &[&str] = &["Authorization,Content-Type,x-amz-date,x-amz-security-token"];
const DEFAULT_METHODS: &[&str] = &["GET,PUT,HEAD,PATCH,POST,DELETE,OPTIONS"];

/// A CORS policy with every default filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsPolicy {
    pub allow_credentials: bool,
    pub origins: Vec<String>,
    pub headers: Vec<String>,
    pub methods: Vec<String>,
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self::from_config(&CorsConfig::default())
    }
}

impl CorsPolicy {
    /// Resolve an event's setting. `false` and absence both mean no policy.
    pub fn resolve(setting: Option<&CorsSetting>) -> Option<Self> {
        match setting? {
            CorsSetting::Enabled(false) => None,
            CorsSetting::Enabled(true) => Some(Self::default()),
            CorsSetting::Policy(config) => Some(Self::from_config(config)),
        }
    }

    fn from_config(config: &CorsConfig) -> Self {
        let or_default = |values: &Option<Vec<String>>, default: &[&str]| {
            values
                .clone()
                .unwrap_or_else(|| default.iter().map(|s| s.to_string()).collect())
        };

        Self {
            allow_credentials: config.allow_credentials.unwrap_or(false),
            origins: or_default(&config.origins, DEFAULT_ORIGINS),
            headers: or_default(&config.headers, DEFAULT_HEADERS),
            methods: or_default(&config.methods, DEFAULT_METHODS),
        }
    }

    /// Compile to response headers. Fails on a value that is not a legal
    /// header value.
    pub fn to_headers(&self) -> Result<CorsHeaders, String> {
        let mut pairs = Vec::with_capacity(4);
        if self.allow_credentials {
            pairs.push((
                HeaderName::from_static("access-control-allow-credentials"),
                HeaderValue::from_static("true"),
            ));
        }

        for (name, values) in [
            ("access-control-allow-origin", &self.origins),
            ("access-control-allow-headers", &self.headers),
            ("access-control-allow-methods", &self.methods),
        ] {
            let joined = values.join(",");
            let value = HeaderValue::from_str(&joined).map_err(|_| joined.clone())?;
            pairs.push((HeaderName::from_static(name), value));
        }

        Ok(CorsHeaders { pairs })
    }
}

/// Precompiled `Access-Control-*` response headers for one event.
#[derive(Debug, Clone)]
pub struct CorsHeaders {
    pairs: Vec<(HeaderName, HeaderValue)>,
}

impl CorsHeaders {
    /// Insert each header unless the response already carries it.
    pub fn inject(&self, headers: &mut HeaderMap) {
        for (name, value) in &self.pairs {
            if !headers.contains_key(name) {
                headers.insert(name.clone(), value.clone());
            }
        }
    }

    /// Wrap `route` so every response it produces carries these headers.
    pub fn wrap(self: &Arc<Self>, route: MethodRouter) -> MethodRouter {
        route.layer(middleware::from_fn_with_state(self.clone(), cors_middleware))
    }
}

async fn cors_middleware(
    State(cors): State<Arc<CorsHeaders>>,
    req: Request,
    next: Next,
) -> Response {
    let mut response = next.run(req).await;
    cors.inject(response.headers_mut());
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, routing::get, Router};
    use tower::ServiceExt;

    fn policy(credentials: bool, origins: &[&str]) -> CorsPolicy {
        CorsPolicy::resolve(Some(&CorsSetting::Policy(CorsConfig {
            allow_credentials: Some(credentials),
            origins: Some(origins.iter().map(|s| s.to_string()).collect()),
            ..Default::default()
        })))
        .unwrap()
    }

    #[test]
    fn test_resolve_defaults() {
        let resolved = CorsPolicy::resolve(Some(&CorsSetting::Enabled(true))).unwrap();
        assert!(!resolved.allow_credentials);
        assert_eq!(resolved.origins, vec!["*"]);
        assert_eq!(resolved.methods, vec!["GET,PUT,HEAD,PATCH,POST,DELETE,OPTIONS"]);

        assert!(CorsPolicy::resolve(Some(&CorsSetting::Enabled(false))).is_none());
        assert!(CorsPolicy::resolve(None).is_none());
    }

    #[test]
    fn test_defaults_not_shared() {
        let mut a = CorsPolicy::resolve(Some(&CorsSetting::Enabled(true))).unwrap();
        a.origins.push("https://mutated".into());
        let b = CorsPolicy::resolve(Some(&CorsSetting::Enabled(true))).unwrap();
        assert_eq!(b.origins, vec!["*"]);
    }

    #[test]
    fn test_headers_without_credentials() {
        let mut headers = HeaderMap::new();
        policy(false, &["https://a", "https://b"])
            .to_headers()
            .unwrap()
            .inject(&mut headers);

        assert!(headers.get("access-control-allow-credentials").is_none());
        assert_eq!(headers["access-control-allow-origin"], "https://a,https://b");
        assert_eq!(
            headers["access-control-allow-headers"],
            "Authorization,Content-Type,x-amz-date,x-amz-security-token"
        );
    }

    #[test]
    fn test_existing_header_kept() {
        let mut headers = HeaderMap::new();
        headers.insert("access-control-allow-origin", HeaderValue::from_static("https://own"));
        policy(true, &["https://x"]).to_headers().unwrap().inject(&mut headers);

        assert_eq!(headers["access-control-allow-origin"], "https://own");
        assert_eq!(headers["access-control-allow-credentials"], "true");
    }

    #[test]
    fn test_invalid_value_rejected() {
        assert!(policy(false, &["bad\nvalue"]).to_headers().is_err());
    }

    #[tokio::test]
    async fn test_wrap_keeps_body_and_status() {
        let cors = Arc::new(policy(true, &["https://x"]).to_headers().unwrap());
        let route = cors.wrap(get(|| async { (StatusCode::CREATED, "inner") }));
        let app = Router::new().route("/", route);

        let res = app
            .oneshot(axum::http::Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::CREATED);
        assert_eq!(res.headers()["access-control-allow-credentials"], "true");
        assert_eq!(res.headers()["access-control-allow-origin"], "https://x");
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"inner");
    }
}
