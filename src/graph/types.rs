//! Events emitted while walking a graph

use crate::addrs::{AbsProviderConfig, AbsResourceInstance};
use crate::core::errors::Diagnostics;

/// Reference to a node in a walked graph
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeRef {
    /// Module instance path of the graph the node belongs to
    pub graph_path: String,
    pub node_id: usize,
    pub name: String,
}

/// Events that occur during a walk
#[derive(Clone, Debug)]
pub enum ExecutionEvent {
    NodeStarted {
        node: NodeRef,
    },
    NodeCompleted {
        node: NodeRef,
    },
    NodeFailed {
        node: NodeRef,
        diagnostics: Diagnostics,
    },
    /// A dependency failed or was skipped, so the node never ran
    NodeSkipped {
        node: NodeRef,
        reason: String,
    },
    /// The node produced a subgraph that is walked before it completes
    GraphExpanded {
        node: NodeRef,
        nodes: usize,
    },
    ImportStarted {
        address: AbsResourceInstance,
        id: String,
    },
    ImportDiscovered {
        address: AbsResourceInstance,
        id: String,
        /// Type names of the discovered objects, in provider order
        objects: Vec<String>,
    },
    InstanceCommitted {
        address: AbsResourceInstance,
        provider: AbsProviderConfig,
    },
}

impl ExecutionEvent {
    /// The node this event concerns, for node lifecycle events
    pub fn node(&self) -> Option<&NodeRef> {
        match self {
            ExecutionEvent::NodeStarted { node }
            | ExecutionEvent::NodeCompleted { node }
            | ExecutionEvent::NodeFailed { node, .. }
            | ExecutionEvent::NodeSkipped { node, .. }
            | ExecutionEvent::GraphExpanded { node, .. } => Some(node),
            _ => None,
        }
    }
}
