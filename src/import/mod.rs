//! Importing existing remote objects into managed state.
//!
//! [`ImportStateTransformer`] adds one [`ImportStateNode`] per target. During
//! the walk each coordinator discovers the remote objects behind its external
//! id, then expands into one [`ImportStateSubNode`] per object, which
//! refreshes the object and writes it to state.

mod addresses;
mod importer;
mod node;
mod sub;
mod target;
mod transform;

pub use addresses::resolve_target_addresses;
pub use importer::{ImportReport, Importer};
pub use node::ImportStateNode;
pub use sub::ImportStateSubNode;
pub use target::{ImportTarget, ProviderSelection};
pub use transform::ImportStateTransformer;
