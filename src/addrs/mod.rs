//! Typed addresses for modules, resources and provider configurations.

mod module;
mod parse;
mod provider;
mod resource;

pub use module::{InstanceKey, ModuleInstance, ModuleInstanceStep, ModulePath};
pub use provider::{
    AbsProviderConfig, LocalProviderConfig, Provider, BUILTIN_HOST, BUILTIN_NAMESPACE,
    DEFAULT_NAMESPACE, DEFAULT_REGISTRY_HOST,
};
pub use resource::{AbsResourceInstance, Resource, ResourceInstance, ResourceMode};
