//! Hot-reload subsystem.
//!
//! # Data Flow
//! ```text
//! source change (watcher.rs or an external bundler)
//!     → BuildEvent over an mpsc channel
//!     → coordinator.rs (one cycle per build, declaration order)
//!     → loader.rs (function per config, fresh-module flag)
//!     → FunctionConfig::replace (atomic swap)
//! ```

pub mod coordinator;
pub mod loader;
pub mod watcher;

pub use coordinator::{HotReloader, ReloadError, ReloadReport};
pub use loader::{BuildError, BuildEvent, BuildOutput, FunctionLoader, LoadError, OutputLoader};
pub use watcher::{BuildWatcher, CatalogBuilder};
