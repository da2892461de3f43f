use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::parse::Cursor;
use super::ModulePath;
use crate::core::errors::ImportError;

pub const DEFAULT_REGISTRY_HOST: &str = "registry.terraform.io";
pub const DEFAULT_NAMESPACE: &str = "hashicorp";
pub const BUILTIN_HOST: &str = "terraform.io";
pub const BUILTIN_NAMESPACE: &str = "builtin";

/// Fully-qualified provider name: `host/namespace/type`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Provider {
    pub hostname: String,
    pub namespace: String,
    pub type_name: String,
}

impl Provider {
    pub fn new(
        hostname: impl Into<String>,
        namespace: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            namespace: namespace.into(),
            type_name: type_name.into(),
        }
    }

    /// Provider in the default registry namespace
    pub fn new_default(type_name: impl Into<String>) -> Self {
        Self::new(DEFAULT_REGISTRY_HOST, DEFAULT_NAMESPACE, type_name)
    }

    pub fn new_builtin(type_name: impl Into<String>) -> Self {
        Self::new(BUILTIN_HOST, BUILTIN_NAMESPACE, type_name)
    }

    /// Provider for a bare local type name with no explicit requirement
    pub fn implied_for_unqualified_type(type_name: &str) -> Self {
        if type_name == "terraform" {
            Self::new_builtin(type_name)
        } else {
            Self::new_default(type_name)
        }
    }

    pub fn is_builtin(&self) -> bool {
        self.hostname == BUILTIN_HOST && self.namespace == BUILTIN_NAMESPACE
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.hostname, self.namespace, self.type_name)
    }
}

impl FromStr for Provider {
    type Err = ImportError;

    /// Accepts `type`, `namespace/type` or `host/namespace/type`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('/').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(ImportError::invalid_address(s, "empty provider source segment"));
        }
        match parts.as_slice() {
            [type_name] => Ok(Self::implied_for_unqualified_type(type_name)),
            [namespace, type_name] => Ok(Self::new(DEFAULT_REGISTRY_HOST, *namespace, *type_name)),
            [host, namespace, type_name] => Ok(Self::new(*host, *namespace, *type_name)),
            _ => Err(ImportError::invalid_address(
                s,
                "provider source must have at most three segments",
            )),
        }
    }
}

/// Provider configuration reference as written inside a module: `local_name[.alias]`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalProviderConfig {
    pub local_name: String,
    pub alias: Option<String>,
}

impl LocalProviderConfig {
    pub fn new(local_name: impl Into<String>) -> Self {
        Self {
            local_name: local_name.into(),
            alias: None,
        }
    }
}

impl fmt::Display for LocalProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.alias {
            Some(alias) => write!(f, "{}.{}", self.local_name, alias),
            None => write!(f, "{}", self.local_name),
        }
    }
}

impl FromStr for LocalProviderConfig {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut cursor = Cursor::new(s.trim());
        let local_name = cursor.ident()?.to_string();
        let alias = if cursor.eat(".") {
            Some(cursor.ident()?.to_string())
        } else {
            None
        };
        if !cursor.is_done() {
            return Err(cursor.error("unexpected trailing characters"));
        }
        Ok(Self { local_name, alias })
    }
}

/// Absolute provider configuration address: `[module.a.]provider["fqn"][.alias]`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AbsProviderConfig {
    pub module: ModulePath,
    pub provider: Provider,
    pub alias: Option<String>,
}

impl AbsProviderConfig {
    pub fn new(module: ModulePath, provider: Provider) -> Self {
        Self {
            module,
            provider,
            alias: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Same provider and alias, configured in another module
    pub fn in_module(&self, module: ModulePath) -> Self {
        Self {
            module,
            provider: self.provider.clone(),
            alias: self.alias.clone(),
        }
    }
}

impl fmt::Display for AbsProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.module.is_root() {
            write!(f, "{}.", self.module)?;
        }
        write!(f, "provider[\"{}\"]", self.provider)?;
        if let Some(alias) = &self.alias {
            write!(f, ".{}", alias)?;
        }
        Ok(())
    }
}

impl FromStr for AbsProviderConfig {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut cursor = Cursor::new(s.trim());
        let mut module = ModulePath::root();
        while cursor.peek_keyword("module") {
            cursor.expect("module.")?;
            module = module.child(cursor.ident()?);
            cursor.expect(".")?;
        }
        cursor.expect("provider[")?;
        let provider: Provider = cursor.quoted()?.parse()?;
        cursor.expect("]")?;
        let alias = if cursor.eat(".") {
            Some(cursor.ident()?.to_string())
        } else {
            None
        };
        if !cursor.is_done() {
            return Err(cursor.error("unexpected trailing characters"));
        }
        Ok(Self {
            module,
            provider,
            alias,
        })
    }
}
