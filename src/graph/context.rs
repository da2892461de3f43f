//! Evaluation context handed to every node

use std::sync::Arc;

use super::hooks::{EventHook, HookContext};
use super::types::ExecutionEvent;
use crate::addrs::{AbsProviderConfig, ModuleInstance};
use crate::core::errors::Result;
use crate::providers::{ProviderClient, ProviderRegistry, ProviderSchema};
use crate::states::StateStore;

/// Everything a node needs while it evaluates: the module path it runs in,
/// the shared state store, configured providers and the run's hooks.
///
/// Cloning is cheap; all shared parts sit behind `Arc`s.
#[derive(Clone)]
pub struct EvalContext {
    path: ModuleInstance,
    run_id: Arc<str>,
    state: StateStore,
    providers: ProviderRegistry,
    hooks: Arc<Vec<Arc<dyn EventHook>>>,
    validate_schemas: bool,
}

impl EvalContext {
    pub fn new(run_id: impl Into<String>, state: StateStore, providers: ProviderRegistry) -> Self {
        let run_id: String = run_id.into();
        Self {
            path: ModuleInstance::root(),
            run_id: Arc::from(run_id),
            state,
            providers,
            hooks: Arc::new(Vec::new()),
            validate_schemas: true,
        }
    }

    pub fn with_hooks(mut self, hooks: Vec<Arc<dyn EventHook>>) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }

    pub fn with_validate_schemas(mut self, enabled: bool) -> Self {
        self.validate_schemas = enabled;
        self
    }

    /// Same context scoped to another module instance
    pub fn with_path(&self, path: ModuleInstance) -> Self {
        Self {
            path,
            ..self.clone()
        }
    }

    pub fn path(&self) -> &ModuleInstance {
        &self.path
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn state(&self) -> &StateStore {
        &self.state
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    pub fn validate_schemas(&self) -> bool {
        self.validate_schemas
    }

    pub fn provider(&self, addr: &AbsProviderConfig) -> Result<Arc<dyn ProviderClient>> {
        self.providers.require(addr)
    }

    pub async fn provider_schema(&self, addr: &AbsProviderConfig) -> Result<Arc<ProviderSchema>> {
        self.providers.schema(addr).await
    }

    pub fn hook_context(&self) -> HookContext {
        HookContext::new(self.run_id.to_string(), self.path.to_string())
    }

    /// Deliver an event to every hook, in registration order
    pub async fn emit(&self, event: ExecutionEvent) {
        if self.hooks.is_empty() {
            return;
        }
        let hook_ctx = self.hook_context();
        for hook in self.hooks.iter() {
            hook.handle(&hook_ctx, &event).await;
        }
    }

    pub(crate) async fn notify_start(&self) {
        let hook_ctx = self.hook_context();
        for hook in self.hooks.iter() {
            hook.on_start(&hook_ctx).await;
        }
    }

    pub(crate) async fn notify_complete(&self, success: bool) {
        let hook_ctx = self.hook_context();
        for hook in self.hooks.iter() {
            hook.on_complete(&hook_ctx, success).await;
        }
    }
}
