use std::fmt;

use crate::addrs::{AbsProviderConfig, AbsResourceInstance, ModulePath};
use crate::configs::Module;

/// One request to bring an existing remote object under management
#[derive(Debug, Clone, PartialEq)]
pub struct ImportTarget {
    /// Address to import into
    pub addr: AbsResourceInstance,
    /// External identifier understood by the provider
    pub id: String,
    /// Provider configuration the caller asked for explicitly
    pub provider_addr: Option<AbsProviderConfig>,
}

impl ImportTarget {
    pub fn new(addr: AbsResourceInstance, id: impl Into<String>) -> Self {
        Self {
            addr,
            id: id.into(),
            provider_addr: None,
        }
    }

    pub fn with_provider(mut self, provider_addr: AbsProviderConfig) -> Self {
        self.provider_addr = Some(provider_addr);
        self
    }
}

impl fmt::Display for ImportTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (id {:?})", self.addr, self.id)
    }
}

/// Where an import's provider configuration came from.
///
/// `configured` holds an explicit choice, either declared by the caller or
/// taken from the resource's configuration block; `implied` is derived from
/// the resource type name. An explicit choice always wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSelection {
    pub configured: Option<AbsProviderConfig>,
    pub implied: AbsProviderConfig,
}

impl ProviderSelection {
    /// Compute the selection for `target`, whose owning module is `module` at `module_path`
    pub fn for_target(target: &ImportTarget, module: &Module, module_path: &ModulePath) -> Self {
        let resource = &target.addr.resource.resource;

        let implied = AbsProviderConfig::new(
            module_path.clone(),
            module.implied_provider_for_unqualified_type(&resource.implied_provider()),
        );

        let configured = target.provider_addr.clone().or_else(|| {
            module.resource_by_addr(resource).map(|rc| AbsProviderConfig {
                module: module_path.clone(),
                provider: rc.provider.clone(),
                alias: rc.provider_config_addr().alias,
            })
        });

        Self {
            configured,
            implied,
        }
    }

    pub fn resolve(&self) -> &AbsProviderConfig {
        self.configured.as_ref().unwrap_or(&self.implied)
    }
}
