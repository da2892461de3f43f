//! Event hook system for graph walks
//!
//! Hooks observe events; they never mutate the graph or the state.

use async_trait::async_trait;
use std::sync::Arc;

use super::types::ExecutionEvent;

/// Context provided to hooks for processing events
#[derive(Clone, Debug)]
pub struct HookContext {
    /// Run ID for this walk
    pub run_id: String,
    /// Module instance path of the graph being walked
    pub graph_path: String,
}

impl HookContext {
    /// Create a new hook context
    pub fn new(run_id: impl Into<String>, graph_path: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            graph_path: graph_path.into(),
        }
    }
}

/// Event hook trait
#[async_trait]
pub trait EventHook: Send + Sync {
    /// Handle an execution event
    async fn handle(&self, ctx: &HookContext, event: &ExecutionEvent);

    /// Optional: Called when a top-level walk starts
    async fn on_start(&self, _ctx: &HookContext) {}

    /// Optional: Called when a top-level walk finishes
    async fn on_complete(&self, _ctx: &HookContext, _success: bool) {}
}

/// Composite hook that chains multiple hooks
#[derive(Default)]
pub struct CompositeHook {
    hooks: Vec<Arc<dyn EventHook>>,
}

impl CompositeHook {
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    pub fn add_hook(&mut self, hook: Arc<dyn EventHook>) {
        self.hooks.push(hook);
    }
}

#[async_trait]
impl EventHook for CompositeHook {
    async fn handle(&self, ctx: &HookContext, event: &ExecutionEvent) {
        for hook in &self.hooks {
            hook.handle(ctx, event).await;
        }
    }

    async fn on_start(&self, ctx: &HookContext) {
        for hook in &self.hooks {
            hook.on_start(ctx).await;
        }
    }

    async fn on_complete(&self, ctx: &HookContext, success: bool) {
        for hook in &self.hooks {
            hook.on_complete(ctx, success).await;
        }
    }
}

/// Logging hook
pub struct LoggingHook;

#[async_trait]
impl EventHook for LoggingHook {
    async fn handle(&self, ctx: &HookContext, event: &ExecutionEvent) {
        match event {
            ExecutionEvent::NodeStarted { node } => {
                tracing::debug!("[{}] node started: {}", ctx.run_id, node.name);
            }
            ExecutionEvent::NodeCompleted { node } => {
                tracing::debug!("[{}] node completed: {}", ctx.run_id, node.name);
            }
            ExecutionEvent::NodeFailed { node, diagnostics } => {
                tracing::error!("[{}] node failed: {}\n{}", ctx.run_id, node.name, diagnostics);
            }
            ExecutionEvent::NodeSkipped { node, reason } => {
                tracing::debug!("[{}] node skipped: {} ({})", ctx.run_id, node.name, reason);
            }
            ExecutionEvent::GraphExpanded { node, nodes } => {
                tracing::info!("[{}] {} expanded into {} node(s)", ctx.run_id, node.name, nodes);
            }
            ExecutionEvent::ImportStarted { address, id } => {
                tracing::info!("[{}] {}: importing from id {:?}", ctx.run_id, address, id);
            }
            ExecutionEvent::ImportDiscovered { address, objects, .. } => {
                tracing::info!(
                    "[{}] {}: provider found {} object(s): {:?}",
                    ctx.run_id,
                    address,
                    objects.len(),
                    objects
                );
            }
            ExecutionEvent::InstanceCommitted { address, provider } => {
                tracing::info!("[{}] {}: written to state ({})", ctx.run_id, address, provider);
            }
        }
    }

    async fn on_complete(&self, ctx: &HookContext, success: bool) {
        tracing::info!("[{}] walk complete (success: {})", ctx.run_id, success);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::types::NodeRef;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counter {
        events: AtomicUsize,
        completions: AtomicUsize,
    }

    #[async_trait]
    impl EventHook for Counter {
        async fn handle(&self, _ctx: &HookContext, _event: &ExecutionEvent) {
            self.events.fetch_add(1, Ordering::SeqCst);
        }

        async fn on_complete(&self, _ctx: &HookContext, _success: bool) {
            self.completions.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_composite_forwards_to_every_hook() {
        let first = Arc::new(Counter::default());
        let second = Arc::new(Counter::default());
        let mut composite = CompositeHook::new();
        composite.add_hook(first.clone());
        composite.add_hook(Arc::new(LoggingHook));
        composite.add_hook(second.clone());

        let ctx = HookContext::new("run-1", "");
        let event = ExecutionEvent::NodeSkipped {
            node: NodeRef {
                graph_path: String::new(),
                node_id: 0,
                name: "a".to_string(),
            },
            reason: "dependency failed".to_string(),
        };
        composite.on_start(&ctx).await;
        composite.handle(&ctx, &event).await;
        composite.on_complete(&ctx, false).await;

        for counter in [&first, &second] {
            assert_eq!(counter.events.load(Ordering::SeqCst), 1);
            assert_eq!(counter.completions.load(Ordering::SeqCst), 1);
        }
        assert_eq!(event.node().map(|n| n.name.as_str()), Some("a"));
    }
}
