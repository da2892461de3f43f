// Core infrastructure modules
pub mod core;

// Addresses, configuration and the collaborators imports talk to
pub mod addrs;
pub mod configs;
pub mod providers;
pub mod states;

// Graph construction and the concurrent walker
pub mod graph;

// Import-to-state
pub mod import;

// Re-exports for convenience
pub use core::errors::{Diagnostics, ImportError, Result};
pub use core::{init_tracing, WalkConfig};
pub use import::{ImportReport, ImportTarget, Importer};
pub use providers::{ProviderClient, ProviderRegistry};
pub use states::StateStore;
