//! Function invocation subsystem.
//!
//! # Data Flow
//! ```text
//! matched request
//!     → adapter.rs (read live function, build event + context)
//!     → handler.rs (Handler::invoke, answers via Callback)
//!     → http::response (status/body per integration mode)
//! ```

pub mod adapter;
pub mod builtin;
pub mod context;
pub mod event;
pub mod handler;

pub use context::{ContextProvider, InvocationContext, LocalContextProvider};
pub use event::{InvocationEvent, Params, RequestParameters};
pub use handler::{handler_fn, Callback, Handler, HandlerFn, Outcome};
