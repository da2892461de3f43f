//! Managed state store.
//!
//! The store maps resource instance addresses to the object currently managed
//! there. Every read and write takes the store lock for the duration of that
//! one operation. Address claims give importers an atomic reserve-then-write
//! sequence: a batch of addresses is checked and reserved under one lock, and
//! each reservation is released by the write that fills it (or explicitly on
//! failure).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, trace};

use crate::addrs::{AbsProviderConfig, AbsResourceInstance};
use crate::core::errors::{ImportError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectStatus {
    #[default]
    Ready,
    Tainted,
}

/// A remote object as recorded in state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceInstanceObject {
    pub value: Value,
    pub status: ObjectStatus,
    #[serde(default)]
    pub private: Vec<u8>,
    #[serde(default)]
    pub schema_version: u64,
}

impl ResourceInstanceObject {
    pub fn ready(value: Value) -> Self {
        Self {
            value,
            status: ObjectStatus::Ready,
            private: Vec::new(),
            schema_version: 0,
        }
    }
}

/// Store entry: the current object plus the provider configuration that manages it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceInstanceState {
    pub current: ResourceInstanceObject,
    pub provider: AbsProviderConfig,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct StateInner {
    resources: BTreeMap<AbsResourceInstance, ResourceInstanceState>,
    /// Address -> owner of an outstanding claim
    claims: BTreeMap<AbsResourceInstance, String>,
    serial: u64,
}

/// Shared managed-state store
#[derive(Debug, Clone, Default)]
pub struct StateStore {
    inner: Arc<RwLock<StateInner>>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the entry at `addr`
    pub async fn resource_instance(&self, addr: &AbsResourceInstance) -> Option<ResourceInstanceState> {
        self.inner.read().await.resources.get(addr).cloned()
    }

    pub async fn contains(&self, addr: &AbsResourceInstance) -> bool {
        self.inner.read().await.resources.contains_key(addr)
    }

    /// Replace the current object at `addr` wholesale, releasing any claim on it
    pub async fn set_resource_instance_current(
        &self,
        addr: &AbsResourceInstance,
        object: ResourceInstanceObject,
        provider: &AbsProviderConfig,
    ) {
        let mut inner = self.inner.write().await;
        inner.claims.remove(addr);
        inner.resources.insert(
            addr.clone(),
            ResourceInstanceState {
                current: object,
                provider: provider.clone(),
                updated_at: Utc::now(),
            },
        );
        inner.serial += 1;
        debug!("state: set {} (serial {})", addr, inner.serial);
    }

    pub async fn remove(&self, addr: &AbsResourceInstance) -> Option<ResourceInstanceState> {
        let mut inner = self.inner.write().await;
        let removed = inner.resources.remove(addr);
        if removed.is_some() {
            inner.serial += 1;
        }
        removed
    }

    /// Reserve every address in `addrs` for `owner`, or none of them.
    ///
    /// All addresses are checked; the error lists one conflict per address that
    /// is already managed or already claimed.
    pub async fn claim(
        &self,
        owner: &str,
        addrs: &[AbsResourceInstance],
    ) -> std::result::Result<(), Vec<ImportError>> {
        let mut inner = self.inner.write().await;
        let conflicts: Vec<ImportError> = addrs
            .iter()
            .filter_map(|addr| {
                if inner.resources.contains_key(addr) {
                    Some(ImportError::state_conflict(addr))
                } else if inner.claims.contains_key(addr) {
                    Some(ImportError::claim_conflict(addr))
                } else {
                    None
                }
            })
            .collect();
        if !conflicts.is_empty() {
            return Err(conflicts);
        }
        for addr in addrs {
            inner.claims.insert(addr.clone(), owner.to_string());
        }
        trace!("state: {} claimed {} address(es)", owner, addrs.len());
        Ok(())
    }

    /// Drop the claim on a single address
    pub async fn release(&self, addr: &AbsResourceInstance) {
        self.inner.write().await.claims.remove(addr);
    }

    /// Drop every claim still held by `owner`, returning how many there were
    pub async fn release_claims(&self, owner: &str) -> usize {
        let mut inner = self.inner.write().await;
        let before = inner.claims.len();
        inner.claims.retain(|_, held_by| held_by != owner);
        before - inner.claims.len()
    }

    pub async fn is_claimed(&self, addr: &AbsResourceInstance) -> bool {
        self.inner.read().await.claims.contains_key(addr)
    }

    /// All managed addresses in order
    pub async fn addresses(&self) -> Vec<AbsResourceInstance> {
        self.inner.read().await.resources.keys().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.resources.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.resources.is_empty()
    }

    /// Number of writes applied so far
    pub async fn serial(&self) -> u64 {
        self.inner.read().await.serial
    }

    /// Point-in-time copy of every entry
    pub async fn snapshot(&self) -> StateSnapshot {
        let inner = self.inner.read().await;
        StateSnapshot {
            serial: inner.serial,
            resources: inner
                .resources
                .iter()
                .map(|(addr, entry)| SnapshotEntry {
                    address: addr.to_string(),
                    provider: entry.provider.to_string(),
                    object: entry.current.clone(),
                    updated_at: entry.updated_at,
                })
                .collect(),
        }
    }

    pub async fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.snapshot().await)?)
    }

    /// Rebuild a store from a JSON snapshot
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: StateSnapshot = serde_json::from_str(json)?;
        let mut inner = StateInner {
            serial: snapshot.serial,
            ..Default::default()
        };
        for entry in snapshot.resources {
            let addr: AbsResourceInstance = entry.address.parse()?;
            let provider: AbsProviderConfig = entry.provider.parse()?;
            inner.resources.insert(
                addr,
                ResourceInstanceState {
                    current: entry.object,
                    provider,
                    updated_at: entry.updated_at,
                },
            );
        }
        Ok(Self {
            inner: Arc::new(RwLock::new(inner)),
        })
    }
}

/// Serializable form of the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub serial: u64,
    pub resources: Vec<SnapshotEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub address: String,
    pub provider: String,
    pub object: ResourceInstanceObject,
    pub updated_at: DateTime<Utc>,
}
