//! Module configuration tree.
//!
//! Configurations are loaded from YAML documents describing each module's
//! resources, provider requirements and child module calls:
//!
//! ```yaml
//! required_providers:
//!   aws: hashicorp/aws
//! resources:
//!   - { type: aws_instance, name: web, provider: aws.west }
//! modules:
//!   network:
//!     resources:
//!       - { type: aws_vpc, name: main }
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;

use crate::addrs::{LocalProviderConfig, ModulePath, Provider, Resource, ResourceMode};
use crate::core::errors::{ImportError, Result};

/// A resource block declared in a module
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceConfig {
    pub mode: ResourceMode,
    pub type_name: String,
    pub name: String,
    /// Fully-qualified provider this resource belongs to
    pub provider: Provider,
    /// Explicit `provider = local.alias` reference, if any
    pub provider_ref: Option<LocalProviderConfig>,
}

impl ResourceConfig {
    pub fn addr(&self) -> Resource {
        Resource {
            mode: self.mode,
            type_name: self.type_name.clone(),
            name: self.name.clone(),
        }
    }

    /// Provider configuration this resource uses, falling back to the implied unaliased one
    pub fn provider_config_addr(&self) -> LocalProviderConfig {
        match &self.provider_ref {
            Some(local) => local.clone(),
            None => LocalProviderConfig::new(self.addr().implied_provider()),
        }
    }
}

/// The contents of one module
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Module {
    pub resources: Vec<ResourceConfig>,
    /// Local provider names mapped to their fully-qualified sources
    pub required_providers: BTreeMap<String, Provider>,
}

impl Module {
    pub fn resource_by_addr(&self, addr: &Resource) -> Option<&ResourceConfig> {
        self.resources
            .iter()
            .find(|r| r.mode == addr.mode && r.type_name == addr.type_name && r.name == addr.name)
    }

    /// Provider for a local name, honoring this module's requirements first
    pub fn implied_provider_for_unqualified_type(&self, local_name: &str) -> Provider {
        match self.required_providers.get(local_name) {
            Some(provider) => provider.clone(),
            None => Provider::implied_for_unqualified_type(local_name),
        }
    }
}

/// A node in the static module tree
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub path: ModulePath,
    pub module: Module,
    pub children: BTreeMap<String, Config>,
}

impl Config {
    /// Load a configuration tree from a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let raw: RawModule = serde_yaml::from_str(yaml)?;
        raw.build(ModulePath::root())
    }

    /// The configuration at `path` relative to this node, if it exists
    pub fn descendent(&self, path: &ModulePath) -> Option<&Config> {
        let mut current = self;
        for name in path.segments() {
            current = current.children.get(name)?;
        }
        Some(current)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawModule {
    #[serde(default)]
    required_providers: BTreeMap<String, String>,
    #[serde(default)]
    resources: Vec<RawResource>,
    #[serde(default)]
    modules: BTreeMap<String, RawModule>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawResource {
    #[serde(rename = "type")]
    type_name: String,
    name: String,
    #[serde(default)]
    mode: ResourceMode,
    #[serde(default)]
    provider: Option<String>,
}

impl RawModule {
    fn build(self, path: ModulePath) -> Result<Config> {
        let mut module = Module::default();
        for (local_name, source) in self.required_providers {
            let provider = source.parse::<Provider>().map_err(|e| {
                ImportError::configuration(format!(
                    "invalid source for provider {:?} in {}: {}",
                    local_name,
                    describe(&path),
                    e
                ))
            })?;
            module.required_providers.insert(local_name, provider);
        }

        for raw in self.resources {
            let provider_ref = match raw.provider.as_deref() {
                Some(reference) => Some(reference.parse::<LocalProviderConfig>().map_err(|e| {
                    ImportError::configuration(format!(
                        "invalid provider reference on {}.{} in {}: {}",
                        raw.type_name,
                        raw.name,
                        describe(&path),
                        e
                    ))
                })?),
                None => None,
            };
            let addr = Resource {
                mode: raw.mode,
                type_name: raw.type_name,
                name: raw.name,
            };
            if module.resource_by_addr(&addr).is_some() {
                return Err(ImportError::configuration(format!(
                    "duplicate resource {} in {}",
                    addr,
                    describe(&path)
                )));
            }
            let local_name = match &provider_ref {
                Some(local) => local.local_name.clone(),
                None => addr.implied_provider(),
            };
            let provider = module.implied_provider_for_unqualified_type(&local_name);
            module.resources.push(ResourceConfig {
                mode: addr.mode,
                type_name: addr.type_name,
                name: addr.name,
                provider,
                provider_ref,
            });
        }

        let mut children = BTreeMap::new();
        for (name, raw_child) in self.modules {
            let child = raw_child.build(path.child(name.clone()))?;
            children.insert(name, child);
        }

        Ok(Config {
            path,
            module,
            children,
        })
    }
}

fn describe(path: &ModulePath) -> String {
    if path.is_root() {
        "the root module".to_string()
    } else {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CONFIG: &str = r#"
required_providers:
  aws: hashicorp/aws
  widget: acme/widget
resources:
  - { type: aws_instance, name: web, provider: aws.west }
  - { type: widget_thing, name: a }
modules:
  network:
    resources:
      - { type: aws_vpc, name: main }
    modules:
      edge: {}
"#;

    #[test]
    fn test_load_tree() {
        let config = Config::from_yaml_str(CONFIG).unwrap();
        assert_eq!(config.children.len(), 1);

        let edge = config.descendent(&ModulePath::new(["network", "edge"])).unwrap();
        assert_eq!(edge.path, ModulePath::new(["network", "edge"]));
        assert!(config.descendent(&ModulePath::new(["missing"])).is_none());
    }

    #[test]
    fn test_resource_provider_resolution() {
        let config = Config::from_yaml_str(CONFIG).unwrap();
        let web = config
            .module
            .resource_by_addr(&Resource::managed("aws_instance", "web"))
            .unwrap();
        assert_eq!(web.provider, Provider::new_default("aws"));
        assert_eq!(web.provider_config_addr().alias.as_deref(), Some("west"));

        let thing = config
            .module
            .resource_by_addr(&Resource::managed("widget_thing", "a"))
            .unwrap();
        assert_eq!(thing.provider.namespace, "acme");
        assert_eq!(thing.provider_config_addr(), LocalProviderConfig::new("widget"));
    }

    #[test]
    fn test_implied_provider_uses_requirements() {
        let config = Config::from_yaml_str(CONFIG).unwrap();
        assert_eq!(
            config.module.implied_provider_for_unqualified_type("widget").namespace,
            "acme"
        );
        assert_eq!(
            config.module.implied_provider_for_unqualified_type("google"),
            Provider::new_default("google")
        );
    }

    #[test]
    fn test_invalid_configs() {
        let dup = "resources:\n  - { type: a_b, name: x }\n  - { type: a_b, name: x }\n";
        assert!(matches!(
            Config::from_yaml_str(dup),
            Err(ImportError::Configuration { .. })
        ));

        let bad_ref = "resources:\n  - { type: a_b, name: x, provider: 'a.b.c' }\n";
        assert!(Config::from_yaml_str(bad_ref).is_err());

        let bad_source = "required_providers: { a: 'x//y' }\n";
        assert!(Config::from_yaml_str(bad_source).is_err());

        assert!(Config::from_yaml_str("unknown_key: 1\n").is_err());
    }
}
