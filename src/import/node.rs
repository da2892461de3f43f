//! Import coordinator node
//!
//! Evaluating the node asks the provider which remote objects an external id
//! refers to. Expanding it turns those objects into one worker node each,
//! after every target address has been claimed in the state store.

use async_trait::async_trait;
use std::sync::OnceLock;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use super::addresses::resolve_target_addresses;
use super::sub::ImportStateSubNode;
use super::target::ProviderSelection;
use crate::addrs::{AbsProviderConfig, AbsResourceInstance, ModuleInstance, ModulePath};
use crate::core::errors::{Diagnostics, ImportError, Result};
use crate::graph::{
    DynamicExpandable, EvalContext, Evalable, ExecutionEvent, Graph, GraphNode, GraphTransformer,
    ProviderConsumer, RootTransformer,
};
use crate::providers::{DiscoverRequest, ImportedResource};

pub struct ImportStateNode {
    addr: AbsResourceInstance,
    id: String,
    selection: ProviderSelection,
    resolved_provider: OnceLock<AbsProviderConfig>,
    /// Objects found by the latest evaluation
    discovered: Mutex<Vec<ImportedResource>>,
}

impl ImportStateNode {
    pub fn new(addr: AbsResourceInstance, id: String, selection: ProviderSelection) -> Self {
        Self {
            addr,
            id,
            selection,
            resolved_provider: OnceLock::new(),
            discovered: Mutex::new(Vec::new()),
        }
    }

    pub fn addr(&self) -> &AbsResourceInstance {
        &self.addr
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn selection(&self) -> &ProviderSelection {
        &self.selection
    }

    fn provider_addr(&self) -> Result<AbsProviderConfig> {
        self.resolved_provider.get().cloned().ok_or_else(|| {
            ImportError::configuration(format!("no provider configuration resolved for {}", self.name()))
        })
    }
}

impl GraphNode for ImportStateNode {
    fn name(&self) -> String {
        format!("{} (import id {:?})", self.addr, self.id)
    }

    fn path(&self) -> ModuleInstance {
        self.addr.module.clone()
    }

    fn as_evalable(&self) -> Option<&dyn Evalable> {
        Some(self)
    }

    fn as_dynamic_expandable(&self) -> Option<&dyn DynamicExpandable> {
        Some(self)
    }

    fn as_provider_consumer(&self) -> Option<&dyn ProviderConsumer> {
        Some(self)
    }
}

impl ProviderConsumer for ImportStateNode {
    fn module_path(&self) -> ModulePath {
        self.addr.module.module()
    }

    fn provided_by(&self) -> (AbsProviderConfig, bool) {
        (self.selection.resolve().clone(), false)
    }

    fn set_provider(&self, addr: AbsProviderConfig) {
        if self.resolved_provider.set(addr).is_err() {
            warn!("{}: provider already resolved, keeping the first", self.name());
        }
    }

    fn resolved_provider(&self) -> Option<AbsProviderConfig> {
        self.resolved_provider.get().cloned()
    }
}

#[async_trait]
impl Evalable for ImportStateNode {
    #[instrument(skip_all, fields(addr = %self.addr, id = %self.id))]
    async fn evaluate(&self, ctx: &EvalContext) -> Result<()> {
        let mut discovered = self.discovered.lock().await;
        discovered.clear();

        let provider_addr = self.provider_addr()?;
        let provider = ctx.provider(&provider_addr)?;

        ctx.emit(ExecutionEvent::ImportStarted {
            address: self.addr.clone(),
            id: self.id.clone(),
        })
        .await;

        let objects = provider
            .discover(DiscoverRequest {
                address: self.addr.clone(),
                type_name: self.addr.type_name().to_string(),
                id: self.id.clone(),
            })
            .await
            .map_err(|e| ImportError::provider_call("discover", &self.addr, e))?;

        info!("provider found {} object(s) for id {:?}", objects.len(), self.id);
        ctx.emit(ExecutionEvent::ImportDiscovered {
            address: self.addr.clone(),
            id: self.id.clone(),
            objects: objects.iter().map(|o| o.type_name.clone()).collect(),
        })
        .await;

        *discovered = objects;
        Ok(())
    }
}

#[async_trait]
impl DynamicExpandable for ImportStateNode {
    async fn dynamic_expand(&self, ctx: &EvalContext) -> std::result::Result<Graph, Diagnostics> {
        let objects = self.discovered.lock().await.clone();
        let provider_addr = self.provider_addr()?;
        let addrs = resolve_target_addresses(&self.addr, &objects);

        // Reserve every address before any worker exists, reporting all collisions at once
        ctx.state().claim(ctx.run_id(), &addrs).await?;

        let mut graph = Graph::new(ctx.path().clone());
        for (addr, object) in addrs.iter().cloned().zip(objects) {
            graph.add(ImportStateSubNode::new(addr, object, provider_addr.clone()));
        }

        if let Err(err) = RootTransformer.transform(&mut graph) {
            for addr in &addrs {
                ctx.state().release(addr).await;
            }
            return Err(err.into());
        }
        Ok(graph)
    }
}
