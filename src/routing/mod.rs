//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup):
//!     FunctionDefinition[]
//!     → table.rs (keep functions with HTTP events, derive module names)
//!     → path.rs (compile {name} templates, stage prefix)
//!     → method.rs (method name → router registration)
//!     → router.rs (RouteTable: descriptors + preflight routes)
//!
//! On rebuild:
//!     reload coordinator → FunctionConfig::replace
//!     → routes observe the new function on their next request
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Unsupported methods and ambiguous routes fail the build, not a request
//! - Deterministic: same input always yields the same table

pub mod method;
pub mod path;
pub mod router;
pub mod table;

pub use method::HttpMethod;
pub use path::PathPattern;
pub use router::{PreflightRoute, RouteDescriptor, RouteError, RouteTable};
pub use table::{FunctionConfig, LoadedFunction};
