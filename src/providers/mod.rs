//! Provider interface consumed by the import machinery.
//!
//! Only three calls are needed: `discover` turns an external id into one or
//! more remote objects, `refresh` reads an object back in canonical shape, and
//! `schema` describes the resource types the provider manages.

pub mod registry;
pub mod schema;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::addrs::{AbsProviderConfig, AbsResourceInstance};
use crate::states::{ObjectStatus, ResourceInstanceObject};

pub use registry::ProviderRegistry;
pub use schema::{ProviderSchema, ResourceTypeSchema};

/// One remote object found by discovery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedResource {
    /// Resource type of the object; overrides the target's type when non-empty
    pub type_name: String,
    /// Attributes as known at discovery time
    pub state: Value,
    /// Opaque provider-private data
    #[serde(default)]
    pub private: Vec<u8>,
    /// Provider metadata passed back on refresh
    #[serde(default)]
    pub provider_meta: Option<Value>,
}

impl ImportedResource {
    pub fn new(type_name: impl Into<String>, state: Value) -> Self {
        Self {
            type_name: type_name.into(),
            state,
            private: Vec::new(),
            provider_meta: None,
        }
    }

    pub fn with_private(mut self, private: Vec<u8>) -> Self {
        self.private = private;
        self
    }

    /// Draft object handed to refresh
    pub fn as_instance_object(&self, schema_version: u64) -> ResourceInstanceObject {
        ResourceInstanceObject {
            value: self.state.clone(),
            status: ObjectStatus::Ready,
            private: self.private.clone(),
            schema_version,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DiscoverRequest {
    /// Address the caller wants the object imported into
    pub address: AbsResourceInstance,
    /// Resource type named by the address
    pub type_name: String,
    /// External identifier of the remote object
    pub id: String,
}

#[derive(Debug, Clone)]
pub struct RefreshRequest {
    pub address: AbsResourceInstance,
    pub provider: AbsProviderConfig,
    pub type_name: String,
    pub prior: ResourceInstanceObject,
    pub provider_meta: Option<Value>,
}

#[derive(Debug, Clone, Default)]
pub struct RefreshResponse {
    /// Canonical attributes, `None` (or JSON null) when the object no longer exists
    pub new_state: Option<Value>,
    /// Replacement private data, keeps the prior private data when `None`
    pub private: Option<Vec<u8>>,
    /// Non-fatal messages from the provider
    pub warnings: Vec<String>,
}

impl RefreshResponse {
    pub fn found(state: Value) -> Self {
        Self {
            new_state: Some(state),
            ..Default::default()
        }
    }

    pub fn gone() -> Self {
        Self::default()
    }

    /// The refreshed attributes, treating JSON null as absent
    pub fn existing_state(&self) -> Option<&Value> {
        self.new_state.as_ref().filter(|v| !v.is_null())
    }
}

/// A configured provider instance
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Resource type schemas
    async fn schema(&self) -> anyhow::Result<ProviderSchema>;

    /// Find the remote objects identified by `request.id`
    async fn discover(&self, request: DiscoverRequest) -> anyhow::Result<Vec<ImportedResource>>;

    /// Read the current state of an object
    async fn refresh(&self, request: RefreshRequest) -> anyhow::Result<RefreshResponse>;
}
