use std::fmt;
use thiserror::Error;

/// Unified error type for graph construction, walking and import
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ImportError {
    /// Missing or invalid configuration (module tree, provider wiring, walk tuning)
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// A provider round-trip failed
    #[error("Provider {operation} failed for {address}: {message}")]
    ProviderCall {
        operation: String,
        address: String,
        message: String,
    },

    /// The target address is already managed or already claimed by a running import
    #[error("{}", state_conflict_message(address, *in_progress))]
    StateConflict { address: String, in_progress: bool },

    /// The provider returned a discovered object without a resource type
    #[error("import of {address} did not set a resource type")]
    ImportTypeMissing { address: String },

    /// Refresh found no remote object for a freshly discovered one
    #[error("Cannot import non-existent remote object: while attempting to import an existing object to {address}, the provider detected that no object exists with the given id")]
    ImportVerify { address: String },

    /// The provider schema has no entry for the resource type
    #[error("Provider {provider} does not support resource type {type_name:?}")]
    UnsupportedResourceType { provider: String, type_name: String },

    /// Refreshed attributes do not conform to the resource type schema
    #[error("Provider produced invalid object for {address}: {message}")]
    SchemaViolation { address: String, message: String },

    /// An address string could not be parsed
    #[error("Invalid address {input:?}: {message}")]
    InvalidAddress { input: String, message: String },

    /// Structural graph problems (cycles, dangling dependencies)
    #[error("Invalid graph: {message}")]
    InvalidGraph { message: String },

    /// The walk was cancelled
    #[error("Operation was cancelled: {operation}")]
    Cancelled { operation: String },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

fn state_conflict_message(address: &str, in_progress: bool) -> String {
    if in_progress {
        format!(
            "Resource already being imported: another import is already claiming {}",
            address
        )
    } else {
        format!(
            "Resource already managed: a remote object is already managed for {}. To import to this address you must first remove the existing object from the state.",
            address
        )
    }
}

impl ImportError {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Wrap a provider failure, keeping the whole anyhow context chain
    pub fn provider_call(
        operation: impl Into<String>,
        address: impl fmt::Display,
        err: anyhow::Error,
    ) -> Self {
        Self::ProviderCall {
            operation: operation.into(),
            address: address.to_string(),
            message: format!("{:#}", err),
        }
    }

    /// Create a state conflict for an already-managed address
    pub fn state_conflict(address: impl fmt::Display) -> Self {
        Self::StateConflict {
            address: address.to_string(),
            in_progress: false,
        }
    }

    /// Create a state conflict for an address claimed by another running import
    pub fn claim_conflict(address: impl fmt::Display) -> Self {
        Self::StateConflict {
            address: address.to_string(),
            in_progress: true,
        }
    }

    pub fn invalid_address<I: Into<String>, M: Into<String>>(input: I, message: M) -> Self {
        Self::InvalidAddress {
            input: input.into(),
            message: message.into(),
        }
    }

    pub fn invalid_graph<S: Into<String>>(message: S) -> Self {
        Self::InvalidGraph {
            message: message.into(),
        }
    }

    pub fn cancelled<S: Into<String>>(operation: S) -> Self {
        Self::Cancelled {
            operation: operation.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Short, stable summary line suitable for a diagnostic heading
    pub fn summary(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "Invalid configuration",
            Self::ProviderCall { .. } => "Provider call failed",
            Self::StateConflict {
                in_progress: false, ..
            } => "Resource already managed",
            Self::StateConflict {
                in_progress: true, ..
            } => "Resource already being imported",
            Self::ImportTypeMissing { .. } => "Import did not set a resource type",
            Self::ImportVerify { .. } => "Cannot import non-existent remote object",
            Self::UnsupportedResourceType { .. } => "Unsupported resource type",
            Self::SchemaViolation { .. } => "Provider produced invalid object",
            Self::InvalidAddress { .. } => "Invalid address",
            Self::InvalidGraph { .. } => "Invalid graph",
            Self::Cancelled { .. } => "Operation cancelled",
            Self::Internal { .. } => "Internal error",
        }
    }

    /// Get error category for metrics/logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "configuration",
            Self::ProviderCall { .. } => "provider_call",
            Self::StateConflict { .. } => "state_conflict",
            Self::ImportTypeMissing { .. } => "import_type_missing",
            Self::ImportVerify { .. } => "import_verify",
            Self::UnsupportedResourceType { .. } => "unsupported_resource_type",
            Self::SchemaViolation { .. } => "schema_violation",
            Self::InvalidAddress { .. } => "invalid_address",
            Self::InvalidGraph { .. } => "invalid_graph",
            Self::Cancelled { .. } => "cancelled",
            Self::Internal { .. } => "internal",
        }
    }

    /// Whether the error aborts a whole coordinator batch rather than a single object
    pub fn is_fatal_for_batch(&self) -> bool {
        match self {
            Self::Configuration { .. }
            | Self::StateConflict { .. }
            | Self::InvalidGraph { .. }
            | Self::Cancelled { .. } => true,
            Self::ImportTypeMissing { .. }
            | Self::ImportVerify { .. }
            | Self::UnsupportedResourceType { .. }
            | Self::SchemaViolation { .. } => false,
            // Discovery failures abort the coordinator, refresh failures only the worker
            Self::ProviderCall { operation, .. } => operation != "refresh",
            _ => false,
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ImportError>;

impl From<serde_json::Error> for ImportError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal(format!("json: {}", err))
    }
}

impl From<serde_yaml::Error> for ImportError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::configuration(format!("yaml: {}", err))
    }
}

/// Ordered collection of errors reported together
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    errors: Vec<ImportError>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, err: ImportError) {
        self.errors.push(err);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.errors.extend(other.errors);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ImportError> {
        self.errors.iter()
    }

    /// Errors of the given category, in report order
    pub fn of_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a ImportError> + 'a {
        self.errors.iter().filter(move |e| e.category() == category)
    }

    /// `Ok(())` when empty, the whole collection otherwise
    pub fn into_result(self) -> std::result::Result<(), Diagnostics> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<ImportError> for Diagnostics {
    fn from(err: ImportError) -> Self {
        Self { errors: vec![err] }
    }
}

impl From<Vec<ImportError>> for Diagnostics {
    fn from(errors: Vec<ImportError>) -> Self {
        Self { errors }
    }
}

impl IntoIterator for Diagnostics {
    type Item = ImportError;
    type IntoIter = std::vec::IntoIter<ImportError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a ImportError;
    type IntoIter = std::slice::Iter<'a, ImportError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "Error: {}: {}", err.summary(), err)?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostics {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = ImportError::state_conflict("aws_instance.web");
        assert!(matches!(err, ImportError::StateConflict { in_progress: false, .. }));
        assert_eq!(err.category(), "state_conflict");
        assert!(err.to_string().contains("aws_instance.web"));
    }

    #[test]
    fn test_provider_call_keeps_context() {
        let source = anyhow::anyhow!("connection reset").context("importing i-123");
        let err = ImportError::provider_call("discover", "aws_instance.web", source);
        let text = err.to_string();
        assert!(text.contains("importing i-123"));
        assert!(text.contains("connection reset"));
        assert!(err.is_fatal_for_batch());
    }

    #[test]
    fn test_batch_fatality() {
        assert!(ImportError::state_conflict("a.b").is_fatal_for_batch());
        assert!(!ImportError::ImportVerify { address: "a.b".into() }.is_fatal_for_batch());
        let refresh = ImportError::provider_call("refresh", "a.b", anyhow::anyhow!("boom"));
        assert!(!refresh.is_fatal_for_batch());
    }

    #[test]
    fn test_diagnostics_collect() {
        let mut diags = Diagnostics::new();
        assert!(!diags.has_errors());
        diags.push(ImportError::state_conflict("a.b"));
        diags.extend(ImportError::claim_conflict("a.b-1").into());
        assert_eq!(diags.len(), 2);
        assert_eq!(diags.of_category("state_conflict").count(), 2);

        let rendered = diags.to_string();
        assert!(rendered.contains("Resource already managed"));
        assert!(rendered.contains("Resource already being imported"));
        assert!(diags.into_result().is_err());
        assert!(Diagnostics::new().into_result().is_ok());
    }
}
