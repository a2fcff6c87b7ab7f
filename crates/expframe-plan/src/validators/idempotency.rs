use super::RegistrationValidator;
use crate::finding::ValidationFinding;
use crate::operation::ServiceGraphPatchOperation;
use crate::proxy::is_experiment_proxy;
use expframe_core::ServiceGraphSnapshot;

const RULE: &str = "Idempotency";

/// Warns when the service is already wrapped by an experiment proxy
#[derive(Debug, Clone, Copy, Default)]
pub struct IdempotencyValidator;

impl RegistrationValidator for IdempotencyValidator {
    fn name(&self) -> &str {
        RULE
    }

    fn validate(
        &self,
        operation: &ServiceGraphPatchOperation,
        snapshot: &ServiceGraphSnapshot,
    ) -> Vec<ValidationFinding> {
        let service_key = operation.service_type().key();

        snapshot
            .descriptors_for(operation.service_type())
            .filter_map(|d| d.implementation_type())
            .filter(|ty| is_experiment_proxy(ty))
            .map(|proxy| {
                ValidationFinding::warning(
                    RULE,
                    &service_key,
                    format!("{proxy} already looks like an experiment proxy; applying again would double-wrap"),
                )
                .with_recommendation("Skip this operation or remove the earlier proxy registration")
            })
            .collect()
    }
}
