//! Node capabilities
//!
//! A node advertises what it can do through the `as_*` accessors. The walker
//! evaluates a node that is [`Evalable`], then walks the subgraph of one that
//! is [`DynamicExpandable`]. [`ProviderConsumer`] nodes get their provider
//! configuration wired in by the provider transformer.

use async_trait::async_trait;

use super::context::EvalContext;
use super::graph::Graph;
use crate::addrs::{AbsProviderConfig, ModuleInstance, ModulePath};
use crate::core::errors::{Diagnostics, Result};

pub trait GraphNode: Send + Sync {
    /// Human-readable name, unique within a graph
    fn name(&self) -> String;

    /// Module instance the node is evaluated in
    fn path(&self) -> ModuleInstance {
        ModuleInstance::root()
    }

    /// Names of nodes that must complete first
    fn depends_on(&self) -> Vec<String> {
        Vec::new()
    }

    fn as_evalable(&self) -> Option<&dyn Evalable> {
        None
    }

    fn as_dynamic_expandable(&self) -> Option<&dyn DynamicExpandable> {
        None
    }

    fn as_provider_consumer(&self) -> Option<&dyn ProviderConsumer> {
        None
    }
}

#[async_trait]
pub trait Evalable: Send + Sync {
    async fn evaluate(&self, ctx: &EvalContext) -> Result<()>;
}

/// Produces a subgraph at walk time, after its own evaluation
#[async_trait]
pub trait DynamicExpandable: Send + Sync {
    async fn dynamic_expand(&self, ctx: &EvalContext) -> std::result::Result<Graph, Diagnostics>;
}

pub trait ProviderConsumer: Send + Sync {
    /// Module whose configuration the node belongs to
    fn module_path(&self) -> ModulePath;

    /// Provider configuration wanted, and whether only that exact address will do
    fn provided_by(&self) -> (AbsProviderConfig, bool);

    /// Record the configuration the node will use; called once before the walk
    fn set_provider(&self, addr: AbsProviderConfig);

    fn resolved_provider(&self) -> Option<AbsProviderConfig>;
}

/// Single sink every other node of a graph feeds into
pub struct RootNode;

pub const ROOT_NODE_NAME: &str = "root";

impl GraphNode for RootNode {
    fn name(&self) -> String {
        ROOT_NODE_NAME.to_string()
    }
}
