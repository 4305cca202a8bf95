//! Supported HTTP methods and their router registration.

use std::fmt;
use std::str::FromStr;

use axum::handler::Handler;
use axum::routing::{MethodFilter, MethodRouter};

/// HTTP methods an event may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    /// Every method not registered explicitly at the same path.
    Any,
}

/// Lookup table from lower-cased method name to method.
const METHODS: &[(&str, HttpMethod)] = &[
    ("get", HttpMethod::Get),
    ("post", HttpMethod::Post),
    ("put", HttpMethod::Put),
    ("patch", HttpMethod::Patch),
    ("delete", HttpMethod::Delete),
    ("head", HttpMethod::Head),
    ("options", HttpMethod::Options),
    ("any", HttpMethod::Any),
];

/// Error for a method name outside [`METHODS`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMethod(pub String);

impl FromStr for HttpMethod {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        METHODS
            .iter()
            .find(|(name, _)| *name == lower)
            .map(|(_, method)| *method)
            .ok_or_else(|| UnknownMethod(s.to_string()))
    }
}

impl HttpMethod {
    /// Lower-case name, as the router sees it.
    pub fn as_str(&self) -> &'static str {
        METHODS
            .iter()
            .find(|(_, method)| method == self)
            .map(|(name, _)| *name)
            .unwrap_or("any")
    }

    fn filter(&self) -> Option<MethodFilter> {
        match self {
            HttpMethod::Get => Some(MethodFilter::GET),
            HttpMethod::Post => Some(MethodFilter::POST),
            HttpMethod::Put => Some(MethodFilter::PUT),
            HttpMethod::Patch => Some(MethodFilter::PATCH),
            HttpMethod::Delete => Some(MethodFilter::DELETE),
            HttpMethod::Head => Some(MethodFilter::HEAD),
            HttpMethod::Options => Some(MethodFilter::OPTIONS),
            HttpMethod::Any => None,
        }
    }

    /// A method router serving `handler` for this method only.
    pub fn route<H, T>(&self, handler: H) -> MethodRouter
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        match self.filter() {
            Some(filter) => MethodRouter::new().on(filter, handler),
            None => MethodRouter::new().fallback(handler),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}
