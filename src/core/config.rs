use serde::{Deserialize, Serialize};

use crate::core::errors::{ImportError, Result};

/// Tuning for graph walks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkConfig {
    /// Maximum number of nodes evaluating at the same time
    pub parallelism: usize,
    /// Capacity of the per-walk execution event channel
    pub event_capacity: usize,
    /// Validate refreshed attributes against the provider's resource schema before writing
    pub validate_schemas: bool,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            parallelism: 10,
            event_capacity: 256,
            validate_schemas: true,
        }
    }
}

impl WalkConfig {
    /// Create a new builder for WalkConfig
    pub fn builder() -> WalkConfigBuilder {
        WalkConfigBuilder::new()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.parallelism == 0 {
            return Err(ImportError::configuration("parallelism must be greater than 0"));
        }
        if self.event_capacity == 0 {
            return Err(ImportError::configuration("event_capacity must be greater than 0"));
        }
        Ok(())
    }

    /// Parse and validate a YAML document; missing fields take their defaults
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: WalkConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }
}

/// Builder for WalkConfig
pub struct WalkConfigBuilder {
    config: WalkConfig,
}

impl WalkConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            config: WalkConfig::default(),
        }
    }

    pub fn parallelism(mut self, parallelism: usize) -> Self {
        self.config.parallelism = parallelism;
        self
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.config.event_capacity = capacity;
        self
    }

    pub fn validate_schemas(mut self, enabled: bool) -> Self {
        self.config.validate_schemas = enabled;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<WalkConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for WalkConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WalkConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.parallelism, 10);
        assert!(config.validate_schemas);
    }

    #[test]
    fn test_validation_errors() {
        let mut config = WalkConfig::default();
        config.parallelism = 0;
        assert!(matches!(config.validate(), Err(ImportError::Configuration { .. })));

        config.parallelism = 4;
        config.event_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_builder() {
        let config = WalkConfig::builder()
            .parallelism(2)
            .event_capacity(16)
            .validate_schemas(false)
            .build()
            .unwrap();

        assert_eq!(config.parallelism, 2);
        assert_eq!(config.event_capacity, 16);
        assert!(!config.validate_schemas);
        assert!(WalkConfig::builder().parallelism(0).build().is_err());
    }

    #[test]
    fn test_from_yaml() {
        let config = WalkConfig::from_yaml_str("parallelism: 3\n").unwrap();
        assert_eq!(config.parallelism, 3);
        assert_eq!(config.event_capacity, 256);

        assert!(WalkConfig::from_yaml_str("parallelism: 0\n").is_err());
        assert!(WalkConfig::from_yaml_str("parallelism: [").is_err());
    }
}
