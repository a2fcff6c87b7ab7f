//! Registration validators
//!
//! Each validator is an independent, side-effect-free rule over one
//! operation and the snapshot it will be applied to. Findings from all
//! validators are pooled by the plan builder; validators never see each
//! other's output.

mod assignability;
mod idempotency;
mod lifetime;
mod multi_registration;
mod open_generic;

pub use assignability::AssignabilityValidator;
pub use idempotency::IdempotencyValidator;
pub use lifetime::{is_dangerous_lifetime_change, LifetimeSafetyValidator};
pub use multi_registration::MultiRegistrationValidator;
pub use open_generic::OpenGenericValidator;

use crate::finding::ValidationFinding;
use crate::operation::ServiceGraphPatchOperation;
use expframe_core::ServiceGraphSnapshot;
use std::fmt::Debug;

/// A rule check over a patch operation
pub trait RegistrationValidator: Debug + Send + Sync {
    /// Rule name stamped on every finding
    fn name(&self) -> &str;

    /// Findings for `operation` against `snapshot`, in discovery order
    fn validate(
        &self,
        operation: &ServiceGraphPatchOperation,
        snapshot: &ServiceGraphSnapshot,
    ) -> Vec<ValidationFinding>;
}

/// The five built-in rules
#[must_use]
pub fn default_validators() -> Vec<Box<dyn RegistrationValidator>> {
    vec![
        Box::new(AssignabilityValidator),
        Box::new(LifetimeSafetyValidator),
        Box::new(OpenGenericValidator),
        Box::new(IdempotencyValidator),
        Box::new(MultiRegistrationValidator),
    ]
}
