//! Local HTTP simulator for declaratively defined serverless functions.
//!
//! Functions declared with HTTP events are served on a local port. Each
//! request is turned into an invocation event, the function's callback
//! result is turned back into an HTTP response, and finished builds swap
//! function implementations in place without restarting the server.

pub mod config;
pub mod http;
pub mod invoke;
pub mod lifecycle;
pub mod observability;
pub mod reload;
pub mod routing;

pub use config::schema::ServeConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
