//! The validated plan artifact

use crate::finding::{Severity, ValidationFinding};
use crate::operation::ServiceGraphPatchOperation;
use chrono::{DateTime, Utc};
use expframe_core::{ServiceGraphSnapshot, ValidationMode};
use uuid::Uuid;

/// Immutable result of plan building
///
/// Only [`RegistrationPlanBuilder`](crate::RegistrationPlanBuilder) can
/// create one, so validity always reflects the findings it was built with.
#[derive(Debug, Clone)]
pub struct RegistrationPlan {
    plan_id: String,
    snapshot: ServiceGraphSnapshot,
    operations: Vec<ServiceGraphPatchOperation>,
    findings: Vec<ValidationFinding>,
    is_valid: bool,
    created_at: DateTime<Utc>,
    validation_mode: ValidationMode,
}

impl RegistrationPlan {
    pub(crate) fn new(
        snapshot: ServiceGraphSnapshot,
        operations: Vec<ServiceGraphPatchOperation>,
        findings: Vec<ValidationFinding>,
        validation_mode: ValidationMode,
        created_at: DateTime<Utc>,
    ) -> Self {
        let is_valid = compute_validity(validation_mode, &findings);
        Self {
            plan_id: Uuid::new_v4().to_string(),
            snapshot,
            operations,
            findings,
            is_valid,
            created_at,
            validation_mode,
        }
    }

    /// Plan id (UUID v4)
    #[inline]
    #[must_use]
    pub fn plan_id(&self) -> &str {
        &self.plan_id
    }

    /// Snapshot the plan was validated against
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> &ServiceGraphSnapshot {
        &self.snapshot
    }

    /// Operations in execution order
    #[inline]
    #[must_use]
    pub fn operations(&self) -> &[ServiceGraphPatchOperation] {
        &self.operations
    }

    /// Findings in (operation, validator) order
    #[inline]
    #[must_use]
    pub fn findings(&self) -> &[ValidationFinding] {
        &self.findings
    }

    /// Whether the executor may apply this plan
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// Build time
    #[inline]
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Validation mode the plan was built under
    #[inline]
    #[must_use]
    pub fn validation_mode(&self) -> ValidationMode {
        self.validation_mode
    }

    /// Number of error findings
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    /// Number of warning findings
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    /// Whether any finding is an error
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Whether any finding is a warning
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        self.warning_count() > 0
    }

    /// Findings produced by `rule_name`
    pub fn findings_for<'a>(&'a self, rule_name: &'a str) -> impl Iterator<Item = &'a ValidationFinding> + 'a {
        self.findings.iter().filter(move |f| f.rule_name() == rule_name)
    }

    fn count(&self, severity: Severity) -> usize {
        self.findings.iter().filter(|f| f.severity() == severity).count()
    }
}

/// Off and Warn are always valid; Strict is valid iff there is no error
pub(crate) fn compute_validity(mode: ValidationMode, findings: &[ValidationFinding]) -> bool {
    match mode {
        ValidationMode::Off | ValidationMode::Warn => true,
        ValidationMode::Strict => findings.iter().all(|f| f.severity() != Severity::Error),
    }
}
