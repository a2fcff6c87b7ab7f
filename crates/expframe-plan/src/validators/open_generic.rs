use super::RegistrationValidator;
use crate::finding::ValidationFinding;
use crate::operation::ServiceGraphPatchOperation;
use expframe_core::{Implementation, ServiceGraphSnapshot};

const RULE: &str = "OpenGeneric";

/// Open generic services need open generic implementations of equal arity
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenGenericValidator;

impl RegistrationValidator for OpenGenericValidator {
    fn name(&self) -> &str {
        RULE
    }

    fn validate(
        &self,
        operation: &ServiceGraphPatchOperation,
        _snapshot: &ServiceGraphSnapshot,
    ) -> Vec<ValidationFinding> {
        let service = operation.service_type();
        if !service.is_open_generic() {
            return Vec::new();
        }

        let service_key = service.key();
        let mut findings = Vec::new();

        for descriptor in operation.new_descriptors() {
            let Implementation::Type(implementation) = descriptor.implementation() else {
                findings.push(ValidationFinding::warning(
                    RULE,
                    &service_key,
                    format!(
                        "{} cannot be checked against an open generic service",
                        descriptor.implementation()
                    ),
                ));
                continue;
            };

            if !implementation.is_open_generic() {
                findings.push(
                    ValidationFinding::error(
                        RULE,
                        &service_key,
                        format!("implementation {implementation} is not an open generic definition"),
                    )
                    .with_recommendation("Register the generic definition, not a constructed type"),
                );
            } else if implementation.generic_arity() != service.generic_arity() {
                findings.push(
                    ValidationFinding::error(
                        RULE,
                        &service_key,
                        format!(
                            "implementation {implementation} has {} type parameter(s), service has {}",
                            implementation.generic_arity(),
                            service.generic_arity()
                        ),
                    )
                    .with_recommendation("Match the service's generic parameter count"),
                );
            }
        }

        findings
    }
}
