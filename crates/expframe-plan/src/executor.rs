//! Plan execution with rollback
//!
//! # Guarantee
//!
//! From the caller's view execution is all-or-nothing. The registry state
//! is checkpointed before every operation; on the first failed operation or
//! registry refusal every checkpoint is restored in reverse order, so the
//! registry ends exactly as it started. Rollback is best effort: a failed
//! restore is logged and recorded, and the remaining restores still run.

use crate::finding::ValidationFinding;
use crate::operation::OperationResult;
use crate::plan::RegistrationPlan;
use expframe_core::{RegistryError, ServiceDescriptor, ServiceRegistry};
use serde::Serialize;
use std::fmt::{self, Display, Formatter};

/// Terminal state of one execute call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlanOutcome {
    /// Plan was invalid; nothing ran
    Invalid,
    /// Dry run of a valid plan; nothing ran
    DryRunValidated,
    /// Every operation applied
    Applied,
    /// An operation failed and the registry was restored
    RolledBack,
}

impl Display for PlanOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PlanOutcome::Invalid => "Invalid",
            PlanOutcome::DryRunValidated => "DryRunValidated",
            PlanOutcome::Applied => "Applied",
            PlanOutcome::RolledBack => "RolledBack",
        })
    }
}

/// A checkpoint that could not be restored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackFailure {
    /// Operation whose pre-state was being restored
    pub operation_id: String,
    /// Registry refusal
    pub error: RegistryError,
}

impl Display for RollbackFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "restoring state before {}: {}", self.operation_id, self.error)
    }
}

/// Outcome of [`RegistrationPlanExecutor::execute`]
#[derive(Debug, Clone)]
pub struct PlanExecutionResult {
    plan_id: String,
    outcome: PlanOutcome,
    is_dry_run: bool,
    error_message: Option<String>,
    operation_results: Vec<OperationResult>,
    validation_findings: Option<Vec<ValidationFinding>>,
    error: Option<RegistryError>,
    failed_operation_id: Option<String>,
    rollback_errors: Vec<RollbackFailure>,
}

impl PlanExecutionResult {
    fn new(plan: &RegistrationPlan, outcome: PlanOutcome) -> Self {
        Self {
            plan_id: plan.plan_id().to_string(),
            outcome,
            is_dry_run: false,
            error_message: None,
            operation_results: Vec::new(),
            validation_findings: None,
            error: None,
            failed_operation_id: None,
            rollback_errors: Vec::new(),
        }
    }

    /// Plan id
    #[inline]
    #[must_use]
    pub fn plan_id(&self) -> &str {
        &self.plan_id
    }

    /// Terminal state
    #[inline]
    #[must_use]
    pub fn outcome(&self) -> PlanOutcome {
        self.outcome
    }

    /// Applied, or validated in a dry run
    #[must_use]
    pub fn success(&self) -> bool {
        matches!(self.outcome, PlanOutcome::Applied | PlanOutcome::DryRunValidated)
    }

    /// Whether this was a dry run
    #[inline]
    #[must_use]
    pub fn is_dry_run(&self) -> bool {
        self.is_dry_run
    }

    /// Primary failure reason
    #[inline]
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Per-operation results, including the failing one
    #[inline]
    #[must_use]
    pub fn operation_results(&self) -> &[OperationResult] {
        &self.operation_results
    }

    /// Plan findings, present only when the plan was invalid
    #[inline]
    #[must_use]
    pub fn validation_findings(&self) -> Option<&[ValidationFinding]> {
        self.validation_findings.as_deref()
    }

    /// Registry refusal that aborted execution
    #[inline]
    #[must_use]
    pub fn error(&self) -> Option<&RegistryError> {
        self.error.as_ref()
    }

    /// Operation that failed or was refused
    #[inline]
    #[must_use]
    pub fn failed_operation_id(&self) -> Option<&str> {
        self.failed_operation_id.as_deref()
    }

    /// Restores that failed during rollback
    #[inline]
    #[must_use]
    pub fn rollback_errors(&self) -> &[RollbackFailure] {
        &self.rollback_errors
    }
}

/// Applies plans to live registries
#[derive(Debug, Clone, Copy, Default)]
pub struct RegistrationPlanExecutor;

impl RegistrationPlanExecutor {
    /// Create executor
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Apply `plan` to `registry`, or only check it when `dry_run`
    ///
    /// The registry is borrowed for this call only and must not be mutated
    /// concurrently. A failed or refused operation rolls back every earlier
    /// one; a panic in a [`MatchPredicate::Custom`](crate::MatchPredicate::Custom)
    /// callback does not.
    pub fn execute<R: ServiceRegistry + ?Sized>(
        &self,
        plan: &RegistrationPlan,
        registry: &mut R,
        dry_run: bool,
    ) -> PlanExecutionResult {
        if !plan.is_valid() {
            tracing::warn!(
                "Plan {} is invalid ({} errors); not executing",
                plan.plan_id(),
                plan.error_count()
            );
            let mut result = PlanExecutionResult::new(plan, PlanOutcome::Invalid);
            result.is_dry_run = dry_run;
            result.error_message = Some(format!(
                "plan validation failed with {} error(s)",
                plan.error_count()
            ));
            result.validation_findings = Some(plan.findings().to_vec());
            return result;
        }

        if dry_run {
            tracing::info!(
                "Dry run of plan {}: {} operations validated",
                plan.plan_id(),
                plan.operations().len()
            );
            let mut result = PlanExecutionResult::new(plan, PlanOutcome::DryRunValidated);
            result.is_dry_run = true;
            return result;
        }

        let mut checkpoints: Vec<(String, Vec<ServiceDescriptor>)> = Vec::new();
        let mut operation_results = Vec::new();

        for operation in plan.operations() {
            let operation_id = operation.operation_id().to_string();
            checkpoints.push((operation_id.clone(), registry.descriptors()));

            match operation.execute(&mut *registry) {
                Ok(op_result) if op_result.success => {
                    tracing::info!("Applied operation {} on {}", operation_id, operation.service_type());
                    operation_results.push(op_result);
                }
                Ok(op_result) => {
                    let message = op_result
                        .error_message
                        .clone()
                        .unwrap_or_else(|| "operation reported failure".to_string());
                    tracing::warn!("Operation {} failed: {}; rolling back", operation_id, message);
                    operation_results.push(op_result);

                    let mut result = PlanExecutionResult::new(plan, PlanOutcome::RolledBack);
                    result.error_message = Some(format!("operation {operation_id} failed: {message}"));
                    result.operation_results = operation_results;
                    result.failed_operation_id = Some(operation_id);
                    result.rollback_errors = rollback(registry, checkpoints);
                    return result;
                }
                Err(error) => {
                    tracing::error!(
                        "Registry refused operation {}: {}; rolling back",
                        operation_id,
                        error
                    );

                    let mut result = PlanExecutionResult::new(plan, PlanOutcome::RolledBack);
                    result.error_message = Some(format!("unexpected error in operation {operation_id}: {error}"));
                    result.operation_results = operation_results;
                    result.failed_operation_id = Some(operation_id);
                    result.error = Some(error);
                    result.rollback_errors = rollback(registry, checkpoints);
                    return result;
                }
            }
        }

        tracing::info!(
            "Plan {} applied: {} operations",
            plan.plan_id(),
            operation_results.len()
        );
        let mut result = PlanExecutionResult::new(plan, PlanOutcome::Applied);
        result.operation_results = operation_results;
        result
    }
}

/// Restore checkpoints newest first; keep going past failures
fn rollback<R: ServiceRegistry + ?Sized>(
    registry: &mut R,
    checkpoints: Vec<(String, Vec<ServiceDescriptor>)>,
) -> Vec<RollbackFailure> {
    let mut failures = Vec::new();

    for (operation_id, descriptors) in checkpoints.into_iter().rev() {
        match registry.replace_all(descriptors) {
            Ok(()) => tracing::debug!("Restored registry state before operation {}", operation_id),
            Err(error) => {
                tracing::error!(
                    "Rollback of operation {} failed: {}; continuing",
                    operation_id,
                    error
                );
                failures.push(RollbackFailure { operation_id, error });
            }
        }
    }

    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::RegistrationPlanBuilder;
    use crate::operation::{MatchPredicate, ServiceGraphPatchOperation};
    use expframe_core::{
        MultiRegistrationBehavior, ServiceCollection, ServiceGraphSnapshot, TypeRef, ValidationMode,
    };
    use pretty_assertions::assert_eq;

    fn service(name: &str) -> TypeRef {
        TypeRef::new("Shop", name)
    }

    fn registry() -> ServiceCollection {
        ServiceCollection::new()
            .with(ServiceDescriptor::singleton(service("IA"), service("A")))
            .with(ServiceDescriptor::singleton(service("IB"), service("B")))
    }

    fn replace(svc: &str, imp: &str) -> ServiceGraphPatchOperation {
        ServiceGraphPatchOperation::new(
            MultiRegistrationBehavior::Replace,
            service(svc),
            vec![ServiceDescriptor::singleton(
                service(svc),
                service(imp).implements(&service(svc)),
            )],
        )
        .unwrap()
    }

    #[test]
    fn applies_in_order() {
        let mut registry = registry();
        let plan = RegistrationPlanBuilder::new()
            .add_operation(replace("IA", "A2"))
            .add_operation(replace("IB", "B2"))
            .build(ServiceGraphSnapshot::capture(&registry));

        let result = RegistrationPlanExecutor::new().execute(&plan, &mut registry, false);
        assert_eq!(result.outcome(), PlanOutcome::Applied);
        assert!(result.success());
        assert_eq!(result.operation_results().len(), 2);
        assert_eq!(
            registry.as_slice()[1],
            ServiceDescriptor::singleton(service("IB"), service("B2"))
        );
    }

    #[test]
    fn failed_operation_restores_registry() {
        let mut registry = registry();
        let before = registry.clone();
        let plan = RegistrationPlanBuilder::new()
            .with_validation_mode(ValidationMode::Off)
            .add_operation(replace("IA", "A2"))
            .add_operation(replace("IMissing", "M"))
            .build(ServiceGraphSnapshot::capture(&registry));

        let result = RegistrationPlanExecutor::new().execute(&plan, &mut registry, false);
        assert_eq!(result.outcome(), PlanOutcome::RolledBack);
        assert!(!result.success());
        assert_eq!(result.failed_operation_id(), Some(plan.operations()[1].operation_id()));
        assert_eq!(result.operation_results().len(), 2);
        assert!(result.error().is_none());
        assert!(result.rollback_errors().is_empty());
        assert_eq!(registry, before);
    }

    #[test]
    fn invalid_plan_is_untouched() {
        let mut registry = registry();
        let before = registry.clone();
        let unrelated = ServiceGraphPatchOperation::new(
            MultiRegistrationBehavior::Replace,
            service("IA"),
            vec![ServiceDescriptor::singleton(service("IA"), service("Unrelated"))],
        )
        .unwrap();
        let plan = RegistrationPlanBuilder::new()
            .add_operation(unrelated)
            .build(ServiceGraphSnapshot::capture(&registry));

        let result = RegistrationPlanExecutor::new().execute(&plan, &mut registry, false);
        assert_eq!(result.outcome(), PlanOutcome::Invalid);
        assert_eq!(result.validation_findings().map(<[_]>::len), Some(1));
        assert_eq!(registry, before);
    }

    #[test]
    fn dry_run_is_noop() {
        let mut registry = registry();
        let before = registry.clone();
        let plan = RegistrationPlanBuilder::new()
            .add_operation(replace("IA", "A2"))
            .build(ServiceGraphSnapshot::capture(&registry));

        let result = RegistrationPlanExecutor::new().execute(&plan, &mut registry, true);
        assert!(result.is_dry_run());
        assert_eq!(result.outcome(), PlanOutcome::DryRunValidated);
        assert!(result.operation_results().is_empty());
        assert_eq!(registry, before);
    }

    #[test]
    fn panicking_predicate_skips_rollback() {
        let mut registry = registry();
        let exploding = replace("IB", "B2").with_predicate(MatchPredicate::custom("explodes", |_| {
            panic!("predicate exploded")
        }));
        let plan = RegistrationPlanBuilder::new()
            .with_validation_mode(ValidationMode::Off)
            .add_operation(replace("IA", "A2"))
            .add_operation(exploding)
            .build(ServiceGraphSnapshot::capture(&registry));

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            RegistrationPlanExecutor::new().execute(&plan, &mut registry, false)
        }));

        assert!(outcome.is_err());
        assert_eq!(
            registry.as_slice()[0],
            ServiceDescriptor::singleton(service("IA"), service("A2"))
        );
    }
}
