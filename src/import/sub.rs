use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use crate::addrs::{AbsProviderConfig, AbsResourceInstance, ModuleInstance};
use crate::core::errors::{ImportError, Result};
use crate::graph::{EvalContext, Evalable, ExecutionEvent, GraphNode};
use crate::providers::{ImportedResource, RefreshRequest};
use crate::states::{ObjectStatus, ResourceInstanceObject};

/// Worker for one discovered object: refresh it, verify it still exists and
/// write it to state at its resolved address.
pub struct ImportStateSubNode {
    target_addr: AbsResourceInstance,
    object: ImportedResource,
    resolved_provider: AbsProviderConfig,
}

impl ImportStateSubNode {
    pub fn new(
        target_addr: AbsResourceInstance,
        object: ImportedResource,
        resolved_provider: AbsProviderConfig,
    ) -> Self {
        Self {
            target_addr,
            object,
            resolved_provider,
        }
    }

    pub fn target_addr(&self) -> &AbsResourceInstance {
        &self.target_addr
    }

    async fn import(&self, ctx: &EvalContext) -> Result<()> {
        if self.object.type_name.is_empty() {
            return Err(ImportError::ImportTypeMissing {
                address: self.target_addr.to_string(),
            });
        }

        let provider = ctx.provider(&self.resolved_provider)?;
        let schema = ctx.provider_schema(&self.resolved_provider).await?;
        let type_name = self.target_addr.type_name();
        let type_schema = schema.resource_type(type_name).ok_or_else(|| {
            ImportError::UnsupportedResourceType {
                provider: self.resolved_provider.to_string(),
                type_name: type_name.to_string(),
            }
        })?;

        let draft = self.object.as_instance_object(type_schema.version);
        let response = provider
            .refresh(RefreshRequest {
                address: self.target_addr.clone(),
                provider: self.resolved_provider.clone(),
                type_name: type_name.to_string(),
                prior: draft.clone(),
                provider_meta: self.object.provider_meta.clone(),
            })
            .await
            .map_err(|e| ImportError::provider_call("refresh", &self.target_addr, e))?;

        for warning in &response.warnings {
            warn!("{}: {}", self.target_addr, warning);
        }

        // The object can disappear between discovery and refresh
        let new_state = response.existing_state().ok_or_else(|| ImportError::ImportVerify {
            address: self.target_addr.to_string(),
        })?;

        if ctx.validate_schemas() {
            type_schema.validate(&self.target_addr, new_state)?;
        }

        let object = ResourceInstanceObject {
            value: new_state.clone(),
            status: ObjectStatus::Ready,
            private: response.private.clone().unwrap_or(draft.private),
            schema_version: type_schema.version,
        };
        ctx.state()
            .set_resource_instance_current(&self.target_addr, object, &self.resolved_provider)
            .await;
        debug!("{} written to state", self.target_addr);

        ctx.emit(ExecutionEvent::InstanceCommitted {
            address: self.target_addr.clone(),
            provider: self.resolved_provider.clone(),
        })
        .await;
        Ok(())
    }
}

impl GraphNode for ImportStateSubNode {
    fn name(&self) -> String {
        format!("import {} result", self.target_addr)
    }

    fn path(&self) -> ModuleInstance {
        self.target_addr.module.clone()
    }

    fn as_evalable(&self) -> Option<&dyn Evalable> {
        Some(self)
    }
}

#[async_trait]
impl Evalable for ImportStateSubNode {
    #[instrument(skip_all, fields(addr = %self.target_addr))]
    async fn evaluate(&self, ctx: &EvalContext) -> Result<()> {
        let result = self.import(ctx).await;
        if result.is_err() {
            ctx.state().release(&self.target_addr).await;
        }
        result
    }
}
