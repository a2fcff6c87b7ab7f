//! Error types for ExperimentFramework core
//!
//! Provides error handling for:
//! - Type name parsing
//! - Registry mutation refusals
//! - Experiment definition checks
//! - Configuration loading

use std::path::PathBuf;

/// Errors while parsing a textual type name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeParseError {
    /// Input was empty or whitespace
    #[error("empty type name")]
    Empty,

    /// A namespace or name segment is empty or contains invalid characters
    #[error("invalid type name: '{0}'")]
    InvalidName(String),

    /// Generic brackets do not pair up
    #[error("unbalanced generic brackets in '{0}'")]
    UnbalancedGenerics(String),

    /// `Name<>` with nothing inside
    #[error("empty generic argument list in '{0}'")]
    EmptyGenericArguments(String),

    /// Mix of `_` and concrete arguments, e.g. `Map<_, Key>`
    #[error("generic arguments mix open and closed parameters in '{0}'")]
    PartiallyOpen(String),
}

/// Errors raised by a [`ServiceRegistry`](crate::ServiceRegistry) when it
/// refuses a mutation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Positional access past the end of the registry
    #[error("index {index} out of range for registry of {len} descriptors")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Registry length at the time of the call
        len: usize,
    },

    /// Registry no longer accepts mutation (e.g. container already built)
    #[error("registry is read-only: {0}")]
    ReadOnly(String),

    /// Host container rejected a specific descriptor
    #[error("registry rejected descriptor for {service_type}: {reason}")]
    Rejected {
        /// Service type key of the rejected descriptor
        service_type: String,
        /// Host-supplied reason
        reason: String,
    },
}

impl RegistryError {
    /// Create rejection error
    pub fn rejected(service_type: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rejected {
            service_type: service_type.into(),
            reason: reason.into(),
        }
    }
}

/// Malformed experiment definitions
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DefinitionError {
    /// Experiment has no name
    #[error("experiment for {service_type} has an empty name")]
    EmptyName {
        /// Service type key
        service_type: String,
    },

    /// A trial has an empty key
    #[error("experiment '{experiment}' has a trial with an empty key")]
    EmptyTrialKey {
        /// Experiment name
        experiment: String,
    },

    /// Two trials share a key
    #[error("experiment '{experiment}' declares trial '{key}' more than once")]
    DuplicateTrialKey {
        /// Experiment name
        experiment: String,
        /// Duplicated key
        key: String,
    },

    /// Trial implementation cannot stand in for the service
    #[error(
        "experiment '{experiment}' trial '{key}': {implementation} is not assignable to {service_type}"
    )]
    NotAssignable {
        /// Experiment name
        experiment: String,
        /// Trial key
        key: String,
        /// Implementation type key
        implementation: String,
        /// Service type key
        service_type: String,
    },
}

/// Errors while loading a declarative configuration file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error during file read
    #[error("io error reading {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// YAML syntax or shape error
    #[error("yaml error in {path}: {source}")]
    Yaml {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_yaml::Error,
    },

    /// JSON syntax or shape error
    #[error("json error in {path}: {source}")]
    Json {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },

    /// File extension is neither yaml/yml nor json
    #[error("unsupported configuration format: '{0}'")]
    UnsupportedFormat(String),
}

impl ConfigError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_error_display() {
        let err = RegistryError::IndexOutOfRange { index: 4, len: 2 };
        assert_eq!(
            err.to_string(),
            "index 4 out of range for registry of 2 descriptors"
        );
    }

    #[test]
    fn rejected_helper() {
        let err = RegistryError::rejected("Shop.IPricing", "frozen");
        assert!(err.to_string().contains("Shop.IPricing"));
        assert!(err.to_string().contains("frozen"));
    }

    #[test]
    fn definition_error_display() {
        let err = DefinitionError::DuplicateTrialKey {
            experiment: "pricing".to_string(),
            key: "control".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "experiment 'pricing' declares trial 'control' more than once"
        );
    }

    #[test]
    fn config_error_unsupported() {
        let err = ConfigError::UnsupportedFormat("toml".to_string());
        assert_eq!(err.to_string(), "unsupported configuration format: 'toml'");
    }
}
