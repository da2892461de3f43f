//! Dependency graphs, transformers and the concurrent walker.

pub mod context;
#[allow(clippy::module_inception)]
pub mod graph;
pub mod hooks;
pub mod node;
pub mod transform;
pub mod types;
pub mod walker;

pub use context::EvalContext;
pub use graph::{Graph, NodeId};
pub use hooks::{CompositeHook, EventHook, HookContext, LoggingHook};
pub use node::{DynamicExpandable, Evalable, GraphNode, ProviderConsumer, RootNode, ROOT_NODE_NAME};
pub use transform::{
    DependencyTransformer, GraphBuilder, GraphTransformer, ProviderTransformer, RootTransformer,
};
pub use types::{ExecutionEvent, NodeRef};
pub use walker::Walker;
