//! Shared in-memory provider for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use import_graph::addrs::{AbsProviderConfig, ModulePath, Provider};
use import_graph::providers::{
    DiscoverRequest, ImportedResource, ProviderClient, ProviderSchema, RefreshRequest,
    RefreshResponse, ResourceTypeSchema,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Provider whose discovery and refresh answers are configured up front.
///
/// Unless told otherwise, refresh echoes the discovered attributes back.
#[derive(Default)]
pub struct MockProvider {
    schema: ProviderSchema,
    discoveries: HashMap<String, Result<Vec<ImportedResource>, String>>,
    refreshes: HashMap<String, Result<RefreshResponse, String>>,
    delay: Option<Duration>,
    refresh_delay: Option<Duration>,
    pub discover_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl MockProvider {
    /// Provider that accepts any object for each of `types`
    pub fn with_types(types: &[&str]) -> Self {
        let mut provider = Self::default();
        for type_name in types {
            provider.schema = provider
                .schema
                .with_resource_type(*type_name, ResourceTypeSchema::any_object(0));
        }
        provider
    }

    pub fn with_schema(mut self, type_name: &str, schema: ResourceTypeSchema) -> Self {
        self.schema = self.schema.with_resource_type(type_name, schema);
        self
    }

    pub fn discovers(mut self, id: &str, objects: Vec<ImportedResource>) -> Self {
        self.discoveries.insert(id.to_string(), Ok(objects));
        self
    }

    pub fn discover_fails(mut self, id: &str, message: &str) -> Self {
        self.discoveries.insert(id.to_string(), Err(message.to_string()));
        self
    }

    pub fn refreshes_to(mut self, address: &str, state: Value) -> Self {
        self.refreshes
            .insert(address.to_string(), Ok(RefreshResponse::found(state)));
        self
    }

    pub fn refresh_response(mut self, address: &str, response: RefreshResponse) -> Self {
        self.refreshes.insert(address.to_string(), Ok(response));
        self
    }

    pub fn refresh_fails(mut self, address: &str, message: &str) -> Self {
        self.refreshes
            .insert(address.to_string(), Err(message.to_string()));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_refresh_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay = Some(delay);
        self
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl ProviderClient for MockProvider {
    async fn schema(&self) -> anyhow::Result<ProviderSchema> {
        Ok(self.schema.clone())
    }

    async fn discover(&self, request: DiscoverRequest) -> anyhow::Result<Vec<ImportedResource>> {
        self.discover_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        self.pause().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.discoveries.get(&request.id) {
            Some(Ok(objects)) => Ok(objects.clone()),
            Some(Err(message)) => Err(anyhow::anyhow!("{}", message)),
            None => Err(anyhow::anyhow!("no object with id {:?}", request.id)),
        }
    }

    async fn refresh(&self, request: RefreshRequest) -> anyhow::Result<RefreshResponse> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.refresh_delay {
            tokio::time::sleep(delay).await;
        }
        match self.refreshes.get(&request.address.to_string()) {
            Some(Ok(response)) => Ok(response.clone()),
            Some(Err(message)) => Err(anyhow::anyhow!("{}", message)),
            None => Ok(RefreshResponse::found(request.prior.value)),
        }
    }
}

pub fn provider_config(module: &[&str], type_name: &str) -> AbsProviderConfig {
    AbsProviderConfig::new(
        ModulePath::new(module.iter().copied()),
        Provider::new_default(type_name),
    )
}
