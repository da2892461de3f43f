//! Graph transformers
//!
//! A graph is built by running an ordered list of transformers over an empty
//! graph, then checking the result for cycles.

use super::graph::Graph;
use super::node::{RootNode, ROOT_NODE_NAME};
use crate::addrs::ModuleInstance;
use crate::core::errors::{ImportError, Result};
use crate::providers::ProviderRegistry;

pub trait GraphTransformer {
    fn transform(&self, graph: &mut Graph) -> Result<()>;
}

/// Turns each node's `depends_on` names into edges
pub struct DependencyTransformer;

impl GraphTransformer for DependencyTransformer {
    fn transform(&self, graph: &mut Graph) -> Result<()> {
        for id in graph.node_ids() {
            let Some(node) = graph.node(id) else { continue };
            for dep_name in node.depends_on() {
                let dep = graph.find_by_name(&dep_name).ok_or_else(|| {
                    ImportError::invalid_graph(format!(
                        "{} depends on unknown node {}",
                        node.name(),
                        dep_name
                    ))
                })?;
                graph.connect(dep, id);
            }
        }
        Ok(())
    }
}

/// Resolves the provider configuration of every provider consumer.
///
/// Consumers that accept inheritance may be served by the same provider
/// configured in an ancestor module.
pub struct ProviderTransformer {
    providers: ProviderRegistry,
}

impl ProviderTransformer {
    pub fn new(providers: ProviderRegistry) -> Self {
        Self { providers }
    }
}

impl GraphTransformer for ProviderTransformer {
    fn transform(&self, graph: &mut Graph) -> Result<()> {
        let mut missing = Vec::new();
        for id in graph.node_ids() {
            let Some(node) = graph.node(id) else { continue };
            let Some(consumer) = node.as_provider_consumer() else { continue };
            let (wanted, exact) = consumer.provided_by();
            match self.providers.resolve(&wanted, !exact) {
                Some(addr) => {
                    tracing::debug!("{} uses provider {}", node.name(), addr);
                    consumer.set_provider(addr);
                }
                None => missing.push(format!("provider {} for {} is not configured", wanted, node.name())),
            }
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ImportError::configuration(missing.join("; ")))
        }
    }
}

/// Adds a single root node that every sink feeds into
pub struct RootTransformer;

impl GraphTransformer for RootTransformer {
    fn transform(&self, graph: &mut Graph) -> Result<()> {
        if graph.find_by_name(ROOT_NODE_NAME).is_some() {
            return Ok(());
        }
        let sinks = graph.sinks();
        let root = graph.add(RootNode);
        for sink in sinks {
            graph.connect(sink, root);
        }
        Ok(())
    }
}

/// Builds a graph by applying transformers in order
pub struct GraphBuilder<'a> {
    path: ModuleInstance,
    steps: Vec<Box<dyn GraphTransformer + 'a>>,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(path: ModuleInstance) -> Self {
        Self {
            path,
            steps: Vec::new(),
        }
    }

    pub fn step(mut self, transformer: impl GraphTransformer + 'a) -> Self {
        self.steps.push(Box::new(transformer));
        self
    }

    pub fn build(self) -> Result<Graph> {
        let mut graph = Graph::new(self.path);
        for step in &self.steps {
            step.transform(&mut graph)?;
        }
        graph.validate()?;
        Ok(graph)
    }
}
