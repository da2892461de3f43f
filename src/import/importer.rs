//! Entry point: build an import graph for a batch of targets and walk it.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::target::ImportTarget;
use super::transform::ImportStateTransformer;
use crate::addrs::{AbsResourceInstance, ModuleInstance};
use crate::configs::Config;
use crate::core::config::WalkConfig;
use crate::core::errors::{Diagnostics, ImportError, Result};
use crate::graph::{
    EvalContext, EventHook, ExecutionEvent, Graph, GraphBuilder, HookContext, ProviderTransformer,
    RootTransformer, Walker,
};
use crate::providers::ProviderRegistry;
use crate::states::StateStore;

/// Outcome of one import run
#[derive(Debug, Clone)]
pub struct ImportReport {
    pub run_id: String,
    /// Addresses written to state, sorted
    pub imported: Vec<AbsResourceInstance>,
    /// Every failure; successful imports stay committed regardless
    pub diagnostics: Diagnostics,
}

impl ImportReport {
    pub fn success(&self) -> bool {
        !self.diagnostics.has_errors()
    }

    /// Failures that stopped a whole request rather than a single discovered object
    pub fn batch_failures(&self) -> impl Iterator<Item = &ImportError> + '_ {
        self.diagnostics.iter().filter(|e| e.is_fatal_for_batch())
    }
}

pub struct Importer {
    config: Option<Config>,
    providers: ProviderRegistry,
    walk_config: WalkConfig,
    hooks: Vec<Arc<dyn EventHook>>,
}

impl Importer {
    pub fn new(config: Option<Config>, providers: ProviderRegistry) -> Self {
        Self {
            config,
            providers,
            walk_config: WalkConfig::default(),
            hooks: Vec::new(),
        }
    }

    pub fn with_walk_config(mut self, walk_config: WalkConfig) -> Self {
        self.walk_config = walk_config;
        self
    }

    pub fn with_hook(mut self, hook: Arc<dyn EventHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// One coordinator per target, providers attached, single root
    pub fn build_graph(&self, targets: &[ImportTarget]) -> Result<Graph> {
        GraphBuilder::new(ModuleInstance::root())
            .step(ImportStateTransformer::new(targets, self.config.as_ref()))
            .step(ProviderTransformer::new(self.providers.clone()))
            .step(RootTransformer)
            .build()
    }

    /// Import every target into `state`.
    ///
    /// Graph construction problems are returned as `Err` before anything
    /// runs; failures during the walk end up in the report's diagnostics.
    pub async fn import(&self, state: &StateStore, targets: &[ImportTarget]) -> Result<ImportReport> {
        self.run(state, targets, None).await
    }

    /// Like [`Importer::import`], stopping early once `true` is sent on `cancel`
    pub async fn import_with_cancel(
        &self,
        state: &StateStore,
        targets: &[ImportTarget],
        cancel: watch::Receiver<bool>,
    ) -> Result<ImportReport> {
        self.run(state, targets, Some(cancel)).await
    }

    #[instrument(skip_all, fields(targets = targets.len()))]
    async fn run(
        &self,
        state: &StateStore,
        targets: &[ImportTarget],
        cancel: Option<watch::Receiver<bool>>,
    ) -> Result<ImportReport> {
        self.walk_config.validate()?;
        let graph = self.build_graph(targets)?;

        let run_id = Uuid::new_v4().to_string();
        let recorder = Arc::new(CommitRecorder::default());
        let mut hooks = self.hooks.clone();
        hooks.push(recorder.clone());

        let ctx = EvalContext::new(run_id.clone(), state.clone(), self.providers.clone())
            .with_hooks(hooks)
            .with_validate_schemas(self.walk_config.validate_schemas);

        let mut walker = Walker::new(&self.walk_config);
        if let Some(cancel) = cancel {
            walker = walker.with_cancel(cancel);
        }

        info!("import run {} started for {} target(s)", run_id, targets.len());
        let diagnostics = walker.walk(graph, ctx).await;

        let released = state.release_claims(&run_id).await;
        if released > 0 {
            debug!("released {} unused address claim(s)", released);
        }

        let mut imported = recorder.committed.lock().await.clone();
        imported.sort();

        let report = ImportReport {
            run_id,
            imported,
            diagnostics,
        };
        if report.diagnostics.has_errors() {
            let batch = report.batch_failures().count();
            warn!(
                "import run {} imported {} instance(s); {} request(s) failed, {} object(s) failed",
                report.run_id,
                report.imported.len(),
                batch,
                report.diagnostics.len() - batch
            );
        } else {
            info!("import run {} imported {} instance(s)", report.run_id, report.imported.len());
        }
        Ok(report)
    }
}

/// Records every address written to state during a run
#[derive(Default)]
struct CommitRecorder {
    committed: Mutex<Vec<AbsResourceInstance>>,
}

#[async_trait]
impl EventHook for CommitRecorder {
    async fn handle(&self, _ctx: &HookContext, event: &ExecutionEvent) {
        if let ExecutionEvent::InstanceCommitted { address, .. } = event {
            self.committed.lock().await.push(address.clone());
        }
    }
}
