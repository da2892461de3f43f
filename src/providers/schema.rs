use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::addrs::AbsResourceInstance;
use crate::core::errors::{ImportError, Result};

/// Attribute schema for one resource type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceTypeSchema {
    /// Schema version recorded on every object written for this type
    pub version: u64,
    /// JSON Schema describing the object's attributes
    pub attributes: Value,
}

impl ResourceTypeSchema {
    pub fn new(version: u64, attributes: Value) -> Self {
        Self {
            version,
            attributes,
        }
    }

    /// Schema that accepts any JSON object
    pub fn any_object(version: u64) -> Self {
        Self::new(version, serde_json::json!({ "type": "object" }))
    }

    /// Check a refreshed object against this schema, reporting every violation at once
    pub fn validate(&self, addr: &AbsResourceInstance, value: &Value) -> Result<()> {
        let validator = jsonschema::validator_for(&self.attributes).map_err(|e| {
            ImportError::internal(format!("invalid schema for {}: {}", addr.type_name(), e))
        })?;
        let problems: Vec<String> = validator
            .iter_errors(value)
            .map(|e| {
                let path = e.instance_path.to_string();
                if path.is_empty() {
                    e.to_string()
                } else {
                    format!("{}: {}", path, e)
                }
            })
            .collect();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(ImportError::SchemaViolation {
                address: addr.to_string(),
                message: problems.join("; "),
            })
        }
    }
}

/// Per-resource-type schemas exposed by a provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderSchema {
    pub resource_types: HashMap<String, ResourceTypeSchema>,
}

impl ProviderSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resource_type(mut self, type_name: impl Into<String>, schema: ResourceTypeSchema) -> Self {
        self.resource_types.insert(type_name.into(), schema);
        self
    }

    pub fn resource_type(&self, type_name: &str) -> Option<&ResourceTypeSchema> {
        self.resource_types.get(type_name)
    }
}
