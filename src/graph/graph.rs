//! Dependency graph of evaluable nodes
//!
//! Edges point from a dependency to its dependent, so a node is ready once
//! every incoming neighbor has completed.

use petgraph::algo::toposort;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::Direction;
use std::fmt;
use std::sync::Arc;

use super::node::GraphNode;
use crate::addrs::ModuleInstance;
use crate::core::errors::{ImportError, Result};

pub type NodeId = NodeIndex;

/// A graph of nodes scoped to one module instance
pub struct Graph {
    path: ModuleInstance,
    inner: StableDiGraph<Arc<dyn GraphNode>, ()>,
}

impl Graph {
    pub fn new(path: ModuleInstance) -> Self {
        Self {
            path,
            inner: StableDiGraph::new(),
        }
    }

    /// Module instance this graph is evaluated in
    pub fn path(&self) -> &ModuleInstance {
        &self.path
    }

    pub fn add<N: GraphNode + 'static>(&mut self, node: N) -> NodeId {
        self.inner.add_node(Arc::new(node))
    }

    pub fn add_arc(&mut self, node: Arc<dyn GraphNode>) -> NodeId {
        self.inner.add_node(node)
    }

    /// Make `dependent` wait for `dependency`
    pub fn connect(&mut self, dependency: NodeId, dependent: NodeId) {
        self.inner.update_edge(dependency, dependent, ());
    }

    pub fn node(&self, id: NodeId) -> Option<Arc<dyn GraphNode>> {
        self.inner.node_weight(id).cloned()
    }

    /// Node ids in insertion order
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.inner.node_indices().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.inner.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.node_count() == 0
    }

    /// Nodes that must complete before `id`
    pub fn dependencies(&self, id: NodeId) -> Vec<NodeId> {
        self.inner.neighbors_directed(id, Direction::Incoming).collect()
    }

    /// Nodes waiting on `id`
    pub fn dependents(&self, id: NodeId) -> Vec<NodeId> {
        self.inner.neighbors_directed(id, Direction::Outgoing).collect()
    }

    /// Nodes nothing depends on
    pub fn sinks(&self) -> Vec<NodeId> {
        self.node_ids()
            .into_iter()
            .filter(|id| self.dependents(*id).is_empty())
            .collect()
    }

    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.node_ids()
            .into_iter()
            .find(|id| self.inner[*id].name() == name)
    }

    /// Node names in insertion order
    pub fn names(&self) -> Vec<String> {
        self.node_ids()
            .into_iter()
            .map(|id| self.inner[id].name())
            .collect()
    }

    /// Reject graphs that contain a cycle
    pub fn validate(&self) -> Result<()> {
        toposort(&self.inner, None).map(|_| ()).map_err(|cycle| {
            ImportError::invalid_graph(format!(
                "cycle detected involving {}",
                self.inner[cycle.node_id()].name()
            ))
        })
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("path", &self.path.to_string())
            .field("nodes", &self.names())
            .finish()
    }
}
