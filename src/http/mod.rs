//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, one route per event, OPTIONS per path)
//!     → cors.rs (Access-Control-* headers, when the event has a policy)
//!     → request.rs (JSON body, headers, query)
//!     → invoke::adapter (event, context, function call)
//!     → response.rs (status/body per integration mode)
//!     → Send to client
//! ```

pub mod cors;
pub mod request;
pub mod response;
pub mod server;

pub use cors::{CorsHeaders, CorsPolicy};
pub use request::{BodyRejection, MAX_JSON_BODY, X_REQUEST_ID};
pub use server::{HttpServer, ServeError};
