// Core infrastructure shared by the graph, state and import layers

pub mod config;
pub mod errors;
pub mod telemetry;

// Re-export commonly used types
pub use config::{WalkConfig, WalkConfigBuilder};
pub use errors::{Diagnostics, ImportError, Result};
pub use telemetry::init_tracing;
