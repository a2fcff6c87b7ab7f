//! Plan builder
//!
//! The builder is a staging area: operations and validators accumulate
//! without any checks, and [`RegistrationPlanBuilder::build`] consumes it to
//! run every validator once and freeze the result.
//!
//! ```rust
//! use expframe_core::{ServiceCollection, ServiceDescriptor, ServiceGraphSnapshot, TypeRef, ValidationMode};
//! use expframe_plan::{RegistrationPlanBuilder, ServiceGraphPatchOperation};
//! use expframe_core::MultiRegistrationBehavior;
//!
//! let service = TypeRef::new("Shop", "IClock");
//! let clock = TypeRef::new("Shop", "SystemClock").implements(&service);
//! let registry = ServiceCollection::new().with(ServiceDescriptor::singleton(service.clone(), clock.clone()));
//!
//! let operation = ServiceGraphPatchOperation::new(
//!     MultiRegistrationBehavior::Replace,
//!     service.clone(),
//!     vec![ServiceDescriptor::singleton(service, clock)],
//! )?;
//!
//! let plan = RegistrationPlanBuilder::new()
//!     .with_validation_mode(ValidationMode::Strict)
//!     .add_operation(operation)
//!     .build(ServiceGraphSnapshot::capture(&registry));
//! assert!(plan.is_valid());
//! # Ok::<(), expframe_plan::PlanError>(())
//! ```

use crate::error::PlanError;
use crate::finding::ValidationFinding;
use crate::operation::ServiceGraphPatchOperation;
use crate::plan::RegistrationPlan;
use crate::proxy::proxy_type_for;
use chrono::{DateTime, Utc};
use crate::validators::{default_validators, RegistrationValidator};
use expframe_core::{
    ExperimentDefinition, MultiRegistrationBehavior, RegistrationSettings, ServiceDescriptor,
    ServiceGraphSnapshot, ValidationMode,
};

/// Accumulates operations and validators, then builds a [`RegistrationPlan`]
#[derive(Debug)]
pub struct RegistrationPlanBuilder {
    operations: Vec<ServiceGraphPatchOperation>,
    validators: Vec<Box<dyn RegistrationValidator>>,
    validation_mode: ValidationMode,
    default_behavior: MultiRegistrationBehavior,
    created_at: Option<DateTime<Utc>>,
}

impl Default for RegistrationPlanBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistrationPlanBuilder {
    /// Create builder with the five default validators, strict mode, Replace
    #[must_use]
    pub fn new() -> Self {
        Self {
            operations: Vec::new(),
            validators: default_validators(),
            validation_mode: ValidationMode::default(),
            default_behavior: MultiRegistrationBehavior::default(),
            created_at: None,
        }
    }

    /// Set validation mode
    #[inline]
    #[must_use]
    pub fn with_validation_mode(mut self, mode: ValidationMode) -> Self {
        self.validation_mode = mode;
        self
    }

    /// Set behavior for operations synthesized from definitions
    #[inline]
    #[must_use]
    pub fn with_default_behavior(mut self, behavior: MultiRegistrationBehavior) -> Self {
        self.default_behavior = behavior;
        self
    }

    /// Pin the plan's creation time instead of reading the clock at build
    #[inline]
    #[must_use]
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Stage an operation; nothing is validated yet
    #[must_use]
    pub fn add_operation(mut self, operation: ServiceGraphPatchOperation) -> Self {
        self.operations.push(operation);
        self
    }

    /// Register an additional validator
    #[must_use]
    pub fn add_validator(mut self, validator: impl RegistrationValidator + 'static) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    /// Staged operation count
    #[inline]
    #[must_use]
    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }

    /// Registered validator count
    #[inline]
    #[must_use]
    pub fn validator_count(&self) -> usize {
        self.validators.len()
    }

    /// Synthesize one proxy operation per definition, then [`build`](Self::build)
    ///
    /// `settings` override this builder's validation mode and default behavior.
    ///
    /// # Errors
    /// - `PlanError::InvalidDefinition` for a malformed definition
    /// - `PlanError::ServiceNotRegistered` when the snapshot has no descriptor
    ///   for a definition's service type
    pub fn build_from_definitions(
        mut self,
        snapshot: ServiceGraphSnapshot,
        definitions: &[ExperimentDefinition],
        settings: &RegistrationSettings,
    ) -> Result<RegistrationPlan, PlanError> {
        self.validation_mode = settings.validation_mode;
        self.default_behavior = settings.multi_registration_behavior;

        for definition in definitions {
            let operation = self.operation_from_definition(&snapshot, definition)?;
            self.operations.push(operation);
        }

        Ok(self.build(snapshot))
    }

    /// Run validators (unless mode is Off) and freeze the plan
    #[must_use]
    pub fn build(self, snapshot: ServiceGraphSnapshot) -> RegistrationPlan {
        let findings = if self.validation_mode == ValidationMode::Off {
            tracing::debug!("Validation disabled; skipping {} validators", self.validators.len());
            Vec::new()
        } else {
            self.run_validators(&snapshot)
        };

        let created_at = self.created_at.unwrap_or_else(Utc::now);
        let plan = RegistrationPlan::new(
            snapshot,
            self.operations,
            findings,
            self.validation_mode,
            created_at,
        );
        tracing::info!(
            "Built plan {}: {} operations, {} errors, {} warnings, valid: {}",
            plan.plan_id(),
            plan.operations().len(),
            plan.error_count(),
            plan.warning_count(),
            plan.is_valid()
        );
        plan
    }

    fn run_validators(&self, snapshot: &ServiceGraphSnapshot) -> Vec<ValidationFinding> {
        let mut findings = Vec::new();
        for operation in &self.operations {
            for validator in &self.validators {
                let found = validator.validate(operation, snapshot);
                tracing::debug!(
                    "Validator {} on {}: {} finding(s)",
                    validator.name(),
                    operation.service_type(),
                    found.len()
                );
                findings.extend(found);
            }
        }
        findings
    }

    fn operation_from_definition(
        &self,
        snapshot: &ServiceGraphSnapshot,
        definition: &ExperimentDefinition,
    ) -> Result<ServiceGraphPatchOperation, PlanError> {
        definition.validate()?;

        let service = &definition.service_type;
        if !snapshot.contains_service(service) {
            return Err(PlanError::service_not_registered(service.key()));
        }

        // Proxies are always singleton
        let proxy = ServiceDescriptor::singleton(service.clone(), proxy_type_for(service));
        let behavior = definition.behavior.unwrap_or(self.default_behavior);

        Ok(
            ServiceGraphPatchOperation::new(behavior, service.clone(), vec![proxy])?
                .with_expected_match_count(1)
                .with_description(format!(
                    "Wrap {service} with experiment '{}'",
                    definition.name
                ))
                .with_property("experiment", definition.name.as_str())
                .with_property("selection", definition.selection.to_string())
                .with_property("trials", definition.trial_keys().join(",")),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::Severity;
    use expframe_core::{SelectionMode, ServiceCollection, TrialImplementation, TypeRef};

    #[derive(Debug)]
    struct AlwaysInfo;

    impl RegistrationValidator for AlwaysInfo {
        fn name(&self) -> &str {
            "AlwaysInfo"
        }

        fn validate(
            &self,
            operation: &ServiceGraphPatchOperation,
            _snapshot: &ServiceGraphSnapshot,
        ) -> Vec<ValidationFinding> {
            vec![ValidationFinding::info("AlwaysInfo", operation.service_type().key(), "seen")]
        }
    }

    fn service() -> TypeRef {
        TypeRef::new("Shop", "IClock")
    }

    fn snapshot() -> ServiceGraphSnapshot {
        let registry = ServiceCollection::new().with(ServiceDescriptor::scoped(
            service(),
            TypeRef::new("Shop", "SystemClock").implements(&service()),
        ));
        ServiceGraphSnapshot::capture(&registry)
    }

    fn definition() -> ExperimentDefinition {
        let control = TypeRef::new("Shop", "SystemClock").implements(&service());
        ExperimentDefinition::new(
            "clock-skew",
            service(),
            TrialImplementation::new("control", control),
            SelectionMode::ConfigurationKey {
                key: "Clock:Trial".to_string(),
            },
        )
    }

    #[test]
    fn defaults() {
        let builder = RegistrationPlanBuilder::new();
        assert_eq!(builder.validator_count(), 5);
        assert_eq!(builder.operation_count(), 0);
        assert_eq!(builder.validation_mode, ValidationMode::Strict);
        assert_eq!(builder.default_behavior, MultiRegistrationBehavior::Replace);
    }

    #[test]
    fn pinned_creation_time() {
        let at = Utc::now() - chrono::Duration::hours(1);
        let plan = RegistrationPlanBuilder::new()
            .with_created_at(at)
            .build(snapshot());
        assert_eq!(plan.created_at(), at);
    }

    #[test]
    fn custom_validator_runs_per_operation() {
        let plan = RegistrationPlanBuilder::new()
            .add_validator(AlwaysInfo)
            .build_from_definitions(snapshot(), &[definition()], &RegistrationSettings::default())
            .unwrap();

        let infos: Vec<_> = plan.findings_for("AlwaysInfo").collect();
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].severity(), Severity::Info);
    }

    #[test]
    fn synthesized_operation_shape() {
        let plan = RegistrationPlanBuilder::new()
            .build_from_definitions(snapshot(), &[definition()], &RegistrationSettings::default())
            .unwrap();

        let operation = &plan.operations()[0];
        assert_eq!(operation.expected_match_count(), Some(1));
        assert!(!operation.allows_no_matches());
        assert_eq!(operation.new_descriptors()[0].lifetime(), expframe_core::ServiceLifetime::Singleton);
        assert_eq!(
            operation.metadata().properties.get("selection").map(String::as_str),
            Some("configurationKey:Clock:Trial")
        );
        assert_eq!(
            operation.metadata().properties.get("trials").map(String::as_str),
            Some("control")
        );
    }

    #[test]
    fn settings_override_builder() {
        let settings = RegistrationSettings {
            validation_mode: ValidationMode::Off,
            multi_registration_behavior: MultiRegistrationBehavior::Append,
        };
        let plan = RegistrationPlanBuilder::new()
            .add_validator(AlwaysInfo)
            .build_from_definitions(snapshot(), &[definition()], &settings)
            .unwrap();

        assert_eq!(plan.validation_mode(), ValidationMode::Off);
        assert!(plan.findings().is_empty());
        assert_eq!(plan.operations()[0].operation_type(), MultiRegistrationBehavior::Append);
    }

    #[test]
    fn definition_behavior_wins_over_default() {
        let plan = RegistrationPlanBuilder::new()
            .build_from_definitions(
                snapshot(),
                &[definition().with_behavior(MultiRegistrationBehavior::Merge)],
                &RegistrationSettings::default(),
            )
            .unwrap();
        assert_eq!(plan.operations()[0].operation_type(), MultiRegistrationBehavior::Merge);
    }

    #[test]
    fn unregistered_service_fails_loud() {
        let empty = ServiceGraphSnapshot::from_descriptors(Vec::new());
        let err = RegistrationPlanBuilder::new()
            .build_from_definitions(empty, &[definition()], &RegistrationSettings::default())
            .unwrap_err();
        assert_eq!(err, PlanError::service_not_registered("Shop.IClock"));
    }

    #[test]
    fn malformed_definition_fails() {
        let mut bad = definition();
        bad.name = String::new();
        let err = RegistrationPlanBuilder::new()
            .build_from_definitions(snapshot(), &[bad], &RegistrationSettings::default())
            .unwrap_err();
        assert!(matches!(err, PlanError::InvalidDefinition(_)));
    }
}
