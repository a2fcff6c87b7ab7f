//! Error types for plan construction
//!
//! Only configuration errors are raised as `Err`. Validation findings are
//! collected into the plan, and execution failures are reported through
//! [`PlanExecutionResult`](crate::PlanExecutionResult).

use expframe_core::DefinitionError;

/// Errors raised while building a plan
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    /// Experiment targets a service with no registration in the snapshot
    #[error("service not registered: {service_type} has no descriptor to layer an experiment over")]
    ServiceNotRegistered {
        /// Service type key
        service_type: String,
    },

    /// Experiment definition is malformed
    #[error("invalid experiment definition: {0}")]
    InvalidDefinition(#[from] DefinitionError),

    /// Patch operation with nothing to register
    #[error("patch operation for {service_type} has no replacement descriptors")]
    EmptyReplacement {
        /// Service type key
        service_type: String,
    },
}

impl PlanError {
    /// Create service-not-registered error
    pub fn service_not_registered(service_type: impl Into<String>) -> Self {
        Self::ServiceNotRegistered {
            service_type: service_type.into(),
        }
    }
}
