//! Graph walker - concurrent, dependency-ordered evaluation
//!
//! Each ready node runs on its own task and reports back over an mpsc channel.
//! The walk loop is the only place that tracks node status, so scheduling
//! needs no locks. A semaphore bounds how many nodes evaluate at once; a node
//! holds its permit only while evaluating, never while its subgraph is walked.
//!
//! Node tasks live in a `JoinSet` owned by the walk that spawned them, and a
//! walk never returns before all of them have finished. Dropping a walk
//! aborts its tasks, including those of nested subgraph walks.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::{HashMap, HashSet};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use super::context::EvalContext;
use super::graph::{Graph, NodeId};
use super::node::GraphNode;
use super::types::{ExecutionEvent, NodeRef};
use crate::core::config::WalkConfig;
use crate::core::errors::{Diagnostics, ImportError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeStatus {
    Completed,
    Failed,
    Skipped,
}

/// Walks graphs, expanding dynamic nodes into subgraphs as it goes
#[derive(Clone)]
pub struct Walker {
    semaphore: Arc<Semaphore>,
    event_capacity: usize,
    cancel: Option<watch::Receiver<bool>>,
}

impl Walker {
    pub fn new(config: &WalkConfig) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(config.parallelism.max(1))),
            event_capacity: config.event_capacity.max(1),
            cancel: None,
        }
    }

    /// Stop scheduling and interrupt in-flight nodes once `true` is sent on `cancel`
    pub fn with_cancel(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().map(|rx| *rx.borrow()).unwrap_or(false)
    }

    /// Walk `graph` to completion and return everything that went wrong.
    ///
    /// Failures never stop independent nodes; only dependents of a failed
    /// node are skipped.
    #[instrument(skip_all, fields(run_id = %ctx.run_id(), path = %graph.path()))]
    pub async fn walk(&self, graph: Graph, ctx: EvalContext) -> Diagnostics {
        ctx.notify_start().await;
        let mut diags = self.walk_graph(Arc::new(graph), ctx.clone()).await;

        // Nested walks may each have reported the cancellation
        if diags.of_category("cancelled").next().is_some() {
            let mut deduped: Diagnostics = diags
                .into_iter()
                .filter(|e| e.category() != "cancelled")
                .collect::<Vec<_>>()
                .into();
            deduped.push(ImportError::cancelled("graph walk"));
            diags = deduped;
        }

        ctx.notify_complete(!diags.has_errors()).await;
        info!("walk finished with {} diagnostic(s)", diags.len());
        diags
    }

    fn walk_graph(&self, graph: Arc<Graph>, ctx: EvalContext) -> BoxFuture<'static, Diagnostics> {
        let walker = self.clone();
        async move { walker.walk_inner(graph, ctx).await }.boxed()
    }

    async fn walk_inner(&self, graph: Arc<Graph>, ctx: EvalContext) -> Diagnostics {
        let (evt_tx, mut evt_rx) = mpsc::channel::<ExecutionEvent>(self.event_capacity);
        let mut cancel_rx = self.cancel.clone();
        let mut status: HashMap<NodeId, NodeStatus> = HashMap::new();
        let mut in_flight: HashSet<NodeId> = HashSet::new();
        let mut tasks: JoinSet<()> = JoinSet::new();
        let mut diags = Diagnostics::new();
        let graph_path = graph.path().to_string();

        debug!("walking {} node(s) in {}", graph.len(), display_path(&graph_path));

        if self.is_cancelled() {
            diags.push(ImportError::cancelled("graph walk"));
            return diags;
        }
        self.schedule_ready(&graph, &ctx, &mut status, &mut in_flight, &mut tasks, &evt_tx)
            .await;

        loop {
            if in_flight.is_empty() {
                break;
            }

            tokio::select! {
                Some(event) = evt_rx.recv() => {
                    ctx.emit(event.clone()).await;

                    let settled = match event {
                        ExecutionEvent::NodeCompleted { node } => Some((node.node_id, NodeStatus::Completed)),
                        ExecutionEvent::NodeFailed { node, diagnostics } => {
                            diags.extend(diagnostics);
                            Some((node.node_id, NodeStatus::Failed))
                        }
                        _ => None,
                    };

                    if let Some((idx, outcome)) = settled {
                        let id = NodeId::new(idx);
                        in_flight.remove(&id);
                        status.insert(id, outcome);
                        self.schedule_ready(&graph, &ctx, &mut status, &mut in_flight, &mut tasks, &evt_tx)
                            .await;
                    }
                }

                _ = wait_cancelled(&mut cancel_rx) => {
                    warn!("walk of {} cancelled with {} node(s) in flight", display_path(&graph_path), in_flight.len());
                    diags.push(ImportError::cancelled("graph walk"));
                    break;
                }
            }
        }

        // In-flight nodes see the same cancel signal and return promptly.
        // Their final events are no longer needed once the receiver is gone.
        drop(evt_rx);
        while let Some(joined) = tasks.join_next().await {
            if let Err(err) = joined {
                warn!("node task in {} ended abnormally: {}", display_path(&graph_path), err);
            }
        }

        diags
    }

    /// Spawn every node whose dependencies all completed, and skip every node
    /// with a failed or skipped dependency, until nothing changes.
    async fn schedule_ready(
        &self,
        graph: &Arc<Graph>,
        ctx: &EvalContext,
        status: &mut HashMap<NodeId, NodeStatus>,
        in_flight: &mut HashSet<NodeId>,
        tasks: &mut JoinSet<()>,
        evt_tx: &mpsc::Sender<ExecutionEvent>,
    ) {
        loop {
            let mut progressed = false;

            for id in graph.node_ids() {
                if status.contains_key(&id) || in_flight.contains(&id) {
                    continue;
                }
                let Some(node) = graph.node(id) else { continue };
                let deps = graph.dependencies(id);

                let blocked = deps.iter().find(|dep| {
                    matches!(
                        status.get(*dep),
                        Some(NodeStatus::Failed) | Some(NodeStatus::Skipped)
                    )
                });
                if let Some(dep) = blocked {
                    let reason = match graph.node(*dep) {
                        Some(dep_node) => format!("dependency {} did not complete", dep_node.name()),
                        None => "dependency did not complete".to_string(),
                    };
                    debug!("skipping {}: {}", node.name(), reason);
                    status.insert(id, NodeStatus::Skipped);
                    ctx.emit(ExecutionEvent::NodeSkipped {
                        node: node_ref(graph, id, node.as_ref()),
                        reason,
                    })
                    .await;
                    progressed = true;
                    continue;
                }

                if deps
                    .iter()
                    .all(|dep| status.get(dep) == Some(&NodeStatus::Completed))
                {
                    tasks.spawn(run_node(
                        self.clone(),
                        node_ref(graph, id, node.as_ref()),
                        node,
                        ctx.clone(),
                        evt_tx.clone(),
                    ));
                    in_flight.insert(id);
                }
            }

            if !progressed {
                break;
            }
        }
    }

    /// Evaluate the node, then walk its subgraph if it expands into one
    async fn execute_node(
        &self,
        node_ref: NodeRef,
        node: Arc<dyn GraphNode>,
        ctx: EvalContext,
    ) -> Diagnostics {
        let ctx = ctx.with_path(node.path());
        let mut cancel = self.cancel.clone();

        if let Some(evalable) = node.as_evalable() {
            let _permit = tokio::select! {
                permit = self.semaphore.acquire() => match permit {
                    Ok(permit) => permit,
                    Err(_) => return ImportError::internal("walk semaphore closed").into(),
                },
                _ = wait_cancelled(&mut cancel) => return ImportError::cancelled(node.name()).into(),
            };
            if self.is_cancelled() {
                return ImportError::cancelled(node.name()).into();
            }
            let result = tokio::select! {
                result = evalable.evaluate(&ctx) => result,
                _ = wait_cancelled(&mut cancel) => Err(ImportError::cancelled(node.name())),
            };
            if let Err(err) = result {
                return err.into();
            }
        }

        if let Some(expandable) = node.as_dynamic_expandable() {
            let expanded = tokio::select! {
                expanded = expandable.dynamic_expand(&ctx) => expanded,
                _ = wait_cancelled(&mut cancel) => return ImportError::cancelled(node.name()).into(),
            };
            let subgraph = match expanded {
                Ok(subgraph) => subgraph,
                Err(diags) => return diags,
            };
            ctx.emit(ExecutionEvent::GraphExpanded {
                node: node_ref,
                nodes: subgraph.len(),
            })
            .await;
            let sub_ctx = ctx.with_path(subgraph.path().clone());
            return self.walk_graph(Arc::new(subgraph), sub_ctx).await;
        }

        Diagnostics::new()
    }
}

async fn run_node(
    walker: Walker,
    node_ref: NodeRef,
    node: Arc<dyn GraphNode>,
    ctx: EvalContext,
    evt_tx: mpsc::Sender<ExecutionEvent>,
) {
    let _ = evt_tx
        .send(ExecutionEvent::NodeStarted {
            node: node_ref.clone(),
        })
        .await;

    let name = node.name();
    let outcome = AssertUnwindSafe(walker.execute_node(node_ref.clone(), node, ctx))
        .catch_unwind()
        .await;

    let event = match outcome {
        Ok(diagnostics) if diagnostics.is_empty() => ExecutionEvent::NodeCompleted { node: node_ref },
        Ok(diagnostics) => ExecutionEvent::NodeFailed {
            node: node_ref,
            diagnostics,
        },
        Err(panic) => ExecutionEvent::NodeFailed {
            node: node_ref,
            diagnostics: ImportError::internal(format!(
                "{} panicked: {}",
                name,
                panic_message(panic.as_ref())
            ))
            .into(),
        },
    };
    let _ = evt_tx.send(event).await;
}

fn node_ref(graph: &Graph, id: NodeId, node: &dyn GraphNode) -> NodeRef {
    NodeRef {
        graph_path: graph.path().to_string(),
        node_id: id.index(),
        name: node.name(),
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "root module"
    } else {
        path
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Resolves once cancellation is requested; never resolves without a cancel channel
async fn wait_cancelled(cancel: &mut Option<watch::Receiver<bool>>) {
    match cancel {
        Some(rx) => loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                futures::future::pending::<()>().await;
            }
        },
        None => futures::future::pending::<()>().await,
    }
}
