//! Registry of configured provider instances
//!
//! Providers are keyed by their absolute configuration address. Schemas are
//! fetched lazily and cached per configuration.

use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

use super::{ProviderClient, ProviderSchema};
use crate::addrs::AbsProviderConfig;
use crate::core::errors::{ImportError, Result};

/// Registry for configured providers
#[derive(Clone)]
pub struct ProviderRegistry {
    providers: Arc<DashMap<AbsProviderConfig, Arc<dyn ProviderClient>>>,
    schemas: Arc<DashMap<AbsProviderConfig, Arc<ProviderSchema>>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            providers: Arc::new(DashMap::new()),
            schemas: Arc::new(DashMap::new()),
        }
    }

    /// Register a provider under its configuration address, replacing any previous one
    pub fn register(&self, addr: AbsProviderConfig, provider: Arc<dyn ProviderClient>) {
        self.schemas.remove(&addr);
        self.providers.insert(addr, provider);
    }

    /// Get a provider by configuration address
    pub fn get(&self, addr: &AbsProviderConfig) -> Option<Arc<dyn ProviderClient>> {
        self.providers.get(addr).map(|entry| entry.value().clone())
    }

    /// Check if a provider is configured at this address
    pub fn contains(&self, addr: &AbsProviderConfig) -> bool {
        self.providers.contains_key(addr)
    }

    /// List all configured addresses
    pub fn list(&self) -> Vec<AbsProviderConfig> {
        let mut addrs: Vec<_> = self.providers.iter().map(|e| e.key().clone()).collect();
        addrs.sort();
        addrs
    }

    /// Find the configuration serving `wanted`.
    ///
    /// An exact match always wins. With `inherit`, the same provider and alias
    /// configured in an ancestor module is accepted, nearest ancestor first.
    pub fn resolve(&self, wanted: &AbsProviderConfig, inherit: bool) -> Option<AbsProviderConfig> {
        if self.contains(wanted) {
            return Some(wanted.clone());
        }
        if !inherit {
            return None;
        }
        let mut module = wanted.module.parent();
        while let Some(current) = module {
            let candidate = wanted.in_module(current.clone());
            if self.contains(&candidate) {
                debug!("{} inherits provider configuration {}", wanted, candidate);
                return Some(candidate);
            }
            module = current.parent();
        }
        None
    }

    /// Provider handle, or a configuration error naming the address
    pub fn require(&self, addr: &AbsProviderConfig) -> Result<Arc<dyn ProviderClient>> {
        self.get(addr).ok_or_else(|| {
            ImportError::configuration(format!("provider {} is not configured", addr))
        })
    }

    /// Schema for a configured provider, fetched once and cached
    pub async fn schema(&self, addr: &AbsProviderConfig) -> Result<Arc<ProviderSchema>> {
        if let Some(schema) = self.schemas.get(addr) {
            return Ok(schema.value().clone());
        }
        let provider = self.require(addr)?;
        let schema = provider
            .schema()
            .await
            .map_err(|e| ImportError::provider_call("schema", addr, e))?;
        let schema = Arc::new(schema);
        self.schemas.insert(addr.clone(), schema.clone());
        Ok(schema)
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
