use super::RegistrationValidator;
use crate::finding::ValidationFinding;
use crate::operation::ServiceGraphPatchOperation;
use expframe_core::{ServiceGraphSnapshot, ServiceLifetime};

const RULE: &str = "LifetimeSafety";

/// Whether replacing `original` with `replacement` narrows a singleton
///
/// Only singleton to non-singleton is flagged. Scoped and transient
/// originals may be replaced by anything.
#[inline]
#[must_use]
pub fn is_dangerous_lifetime_change(original: ServiceLifetime, replacement: ServiceLifetime) -> bool {
    original == ServiceLifetime::Singleton && replacement != ServiceLifetime::Singleton
}

/// Flags replacements that narrow a singleton's lifetime
#[derive(Debug, Clone, Copy, Default)]
pub struct LifetimeSafetyValidator;

impl RegistrationValidator for LifetimeSafetyValidator {
    fn name(&self) -> &str {
        RULE
    }

    fn validate(
        &self,
        operation: &ServiceGraphPatchOperation,
        snapshot: &ServiceGraphSnapshot,
    ) -> Vec<ValidationFinding> {
        let service_key = operation.service_type().key();
        let mut findings = Vec::new();

        for existing in snapshot.descriptors_for(operation.service_type()) {
            for replacement in operation.new_descriptors() {
                if is_dangerous_lifetime_change(existing.lifetime(), replacement.lifetime()) {
                    findings.push(
                        ValidationFinding::error(
                            RULE,
                            &service_key,
                            format!(
                                "replacing {} registration ({}) with {} ({}) may capture shorter-lived dependencies",
                                existing.lifetime(),
                                existing.implementation(),
                                replacement.lifetime(),
                                replacement.implementation()
                            ),
                        )
                        .with_recommendation("Register the replacement as Singleton"),
                    );
                }
            }
        }

        findings
    }
}
