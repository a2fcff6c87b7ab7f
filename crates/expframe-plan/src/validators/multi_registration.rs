use super::RegistrationValidator;
use crate::finding::ValidationFinding;
use crate::operation::ServiceGraphPatchOperation;
use expframe_core::{MultiRegistrationBehavior, ServiceGraphSnapshot};

const RULE: &str = "MultiRegistration";

/// Warns when Replace would collapse several registrations into one
#[derive(Debug, Clone, Copy, Default)]
pub struct MultiRegistrationValidator;

impl RegistrationValidator for MultiRegistrationValidator {
    fn name(&self) -> &str {
        RULE
    }

    fn validate(
        &self,
        operation: &ServiceGraphPatchOperation,
        snapshot: &ServiceGraphSnapshot,
    ) -> Vec<ValidationFinding> {
        if operation.operation_type() != MultiRegistrationBehavior::Replace {
            return Vec::new();
        }

        let existing = snapshot.descriptors_for(operation.service_type()).count();
        if existing <= 1 {
            return Vec::new();
        }

        vec![ValidationFinding::warning(
            RULE,
            operation.service_type().key(),
            format!(
                "{existing} registrations exist; Replace drops them all and enumeration loses entries"
            ),
        )
        .with_recommendation("Use Merge, Insert or Append to keep the other registrations")]
    }
}
