//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! service file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → ServeConfig (stage, port, functions)
//!     → routing (route table built once at startup)
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Semantic checks (methods, duplicate routes) belong to the route table
//!   builder, not to deserialization

pub mod loader;
pub mod schema;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    CorsConfig, CorsSetting, EventDefinition, FunctionDefinition, HttpEventConfig,
    HttpEventSetting, IntegrationMode, ObservabilityConfig, ServeConfig,
};
