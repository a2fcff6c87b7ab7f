use super::RegistrationValidator;
use crate::finding::ValidationFinding;
use crate::operation::ServiceGraphPatchOperation;
use expframe_core::{Implementation, ServiceGraphSnapshot};

const RULE: &str = "Assignability";

/// Every new descriptor must produce something usable as the service type
///
/// Factories can only be trusted, so they get a warning. Instances are
/// checked by runtime type, type registrations by static type.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssignabilityValidator;

impl RegistrationValidator for AssignabilityValidator {
    fn name(&self) -> &str {
        RULE
    }

    fn validate(
        &self,
        operation: &ServiceGraphPatchOperation,
        _snapshot: &ServiceGraphSnapshot,
    ) -> Vec<ValidationFinding> {
        let service = operation.service_type();
        let service_key = service.key();

        operation
            .new_descriptors()
            .iter()
            .filter_map(|descriptor| match descriptor.implementation() {
                Implementation::Factory(factory) => Some(
                    ValidationFinding::warning(
                        RULE,
                        &service_key,
                        format!(
                            "factory '{}' return type cannot be verified statically",
                            factory.name
                        ),
                    )
                    .with_recommendation("Prefer a type registration so assignability can be checked"),
                ),
                Implementation::Instance(instance)
                    if !instance.runtime_type.is_assignable_to(service) =>
                {
                    Some(
                        ValidationFinding::error(
                            RULE,
                            &service_key,
                            format!(
                                "instance '{}' of type {} is not assignable to {service_key}",
                                instance.label, instance.runtime_type
                            ),
                        )
                        .with_recommendation(format!("Register an instance that implements {service_key}")),
                    )
                }
                Implementation::Type(ty) if !ty.is_assignable_to(service) => Some(
                    ValidationFinding::error(
                        RULE,
                        &service_key,
                        format!("implementation type {ty} is not assignable to {service_key}"),
                    )
                    .with_recommendation(format!("Use an implementation type that implements {service_key}")),
                ),
                _ => None,
            })
            .collect()
    }
}
