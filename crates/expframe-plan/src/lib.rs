//! ExperimentFramework Registration Plans
//!
//! Safe mutation of a DI service registry in two phases:
//!
//! 1. **Construction**: [`RegistrationPlanBuilder`] stages patch operations
//!    (by hand or synthesized from experiment definitions), runs every
//!    [`RegistrationValidator`] against an immutable snapshot, and freezes a
//!    [`RegistrationPlan`].
//! 2. **Execution**: [`RegistrationPlanExecutor`] applies a valid plan to a
//!    live registry, rolling back every applied operation if one fails.
//!
//! The executor never re-validates. Whether findings block execution is
//! decided once, at build time, by the plan's
//! [`ValidationMode`](expframe_core::ValidationMode).

#![warn(unreachable_pub)]
#![warn(missing_docs)]

pub mod builder;
pub mod error;
pub mod executor;
pub mod finding;
pub mod operation;
pub mod plan;
pub mod proxy;
pub mod report;
pub mod validators;

pub use builder::RegistrationPlanBuilder;
pub use error::PlanError;
pub use executor::{PlanExecutionResult, PlanOutcome, RegistrationPlanExecutor, RollbackFailure};
pub use finding::{Severity, ValidationFinding};
pub use operation::{
    DescriptorPredicate, MatchPredicate, OperationMetadata, OperationResult,
    ServiceGraphPatchOperation,
};
pub use plan::RegistrationPlan;
pub use proxy::{is_experiment_proxy, proxy_type_for, FRAMEWORK_NAMESPACE, PROXY_TYPE_SUFFIX};
pub use report::RegistrationPlanReport;
pub use validators::{
    default_validators, is_dangerous_lifetime_change, AssignabilityValidator,
    IdempotencyValidator, LifetimeSafetyValidator, MultiRegistrationValidator,
    OpenGenericValidator, RegistrationValidator,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for building and applying plans
    pub use crate::{
        PlanError, PlanOutcome, RegistrationPlan, RegistrationPlanBuilder,
        RegistrationPlanExecutor, RegistrationPlanReport, ServiceGraphPatchOperation, Severity,
    };
    pub use expframe_core::{
        MultiRegistrationBehavior, ServiceCollection, ServiceDescriptor, ServiceGraphSnapshot,
        ServiceRegistry, TypeRef, ValidationMode,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
