use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::parse::Cursor;
use super::{InstanceKey, ModuleInstance};
use crate::core::errors::ImportError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceMode {
    #[default]
    Managed,
    Data,
}

/// A resource block address within a module
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Resource {
    pub mode: ResourceMode,
    pub type_name: String,
    pub name: String,
}

impl Resource {
    pub fn managed(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            mode: ResourceMode::Managed,
            type_name: type_name.into(),
            name: name.into(),
        }
    }

    pub fn instance(self, key: InstanceKey) -> ResourceInstance {
        ResourceInstance {
            resource: self,
            key,
        }
    }

    /// Local provider name implied by the type: everything before the first underscore
    pub fn implied_provider(&self) -> String {
        match self.type_name.split_once('_') {
            Some((prefix, _)) => prefix.to_string(),
            None => self.type_name.clone(),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            ResourceMode::Managed => write!(f, "{}.{}", self.type_name, self.name),
            ResourceMode::Data => write!(f, "data.{}.{}", self.type_name, self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceInstance {
    pub resource: Resource,
    pub key: InstanceKey,
}

impl ResourceInstance {
    pub fn absolute(self, module: ModuleInstance) -> AbsResourceInstance {
        AbsResourceInstance {
            module,
            resource: self,
        }
    }
}

impl fmt::Display for ResourceInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.resource, self.key)
    }
}

/// Fully-qualified resource instance address, e.g. `module.net[0].aws_instance.web["a"]`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AbsResourceInstance {
    pub module: ModuleInstance,
    pub resource: ResourceInstance,
}

impl AbsResourceInstance {
    /// Managed, unkeyed instance in the root module
    pub fn root_managed(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Resource::managed(type_name, name)
            .instance(InstanceKey::NoKey)
            .absolute(ModuleInstance::root())
    }

    pub fn type_name(&self) -> &str {
        &self.resource.resource.type_name
    }

    pub fn name(&self) -> &str {
        &self.resource.resource.name
    }

    pub fn mode(&self) -> ResourceMode {
        self.resource.resource.mode
    }

    /// Same address with the resource type replaced
    pub fn with_type(&self, type_name: impl Into<String>) -> Self {
        let mut addr = self.clone();
        addr.resource.resource.type_name = type_name.into();
        addr
    }

    /// Same address with `-N` appended to the resource name
    pub fn with_name_suffix(&self, n: usize) -> Self {
        let mut addr = self.clone();
        addr.resource.resource.name = format!("{}-{}", addr.resource.resource.name, n);
        addr
    }
}

impl fmt::Display for AbsResourceInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.module.is_root() {
            write!(f, "{}", self.resource)
        } else {
            write!(f, "{}.{}", self.module, self.resource)
        }
    }
}

impl FromStr for AbsResourceInstance {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut cursor = Cursor::new(s.trim());
        let mut module = ModuleInstance::root();

        while cursor.peek_keyword("module") {
            cursor.expect("module.")?;
            let name = cursor.ident()?.to_string();
            let key = cursor.instance_key()?;
            module = module.child(name, key);
            cursor.expect(".")?;
        }

        let mode = if cursor.peek_keyword("data") {
            cursor.expect("data.")?;
            ResourceMode::Data
        } else {
            ResourceMode::Managed
        };
        let type_name = cursor.ident()?.to_string();
        cursor.expect(".")?;
        let name = cursor.ident()?.to_string();
        let key = cursor.instance_key()?;
        if !cursor.is_done() {
            return Err(cursor.error("unexpected trailing characters"));
        }

        Ok(Resource {
            mode,
            type_name,
            name,
        }
        .instance(key)
        .absolute(module))
    }
}
