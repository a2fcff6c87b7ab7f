//! Plan build → validate → execute scenarios

use expframe_core::{
    ExperimentDefinition, MultiRegistrationBehavior, RegistrationSettings, SelectionMode,
    ServiceCollection, ServiceDescriptor, ServiceGraphSnapshot, ServiceLifetime, ServiceRegistry,
    TrialImplementation, TypeRef, ValidationMode,
};
use expframe_plan::prelude::*;
use expframe_plan::{is_experiment_proxy, Severity};
use expframe_test_utils::*;
use pretty_assertions::assert_eq;

fn build(registry: &ServiceCollection, definitions: &[ExperimentDefinition]) -> RegistrationPlan {
    RegistrationPlanBuilder::new()
        .build_from_definitions(
            ServiceGraphSnapshot::capture(registry),
            definitions,
            &RegistrationSettings::default(),
        )
        .unwrap()
}

fn unassignable_operation() -> ServiceGraphPatchOperation {
    ServiceGraphPatchOperation::new(
        MultiRegistrationBehavior::Replace,
        pricing_service(),
        vec![ServiceDescriptor::singleton(
            pricing_service(),
            TypeRef::new("Shop", "Unrelated"),
        )],
    )
    .unwrap()
}

#[test]
fn pricing_proxy_end_to_end() {
    let mut registry = pricing_registry();
    let plan = build(&registry, &[pricing_experiment()]);

    assert!(plan.findings_for("Assignability").next().is_none());
    assert!(plan.findings_for("LifetimeSafety").next().is_none());
    assert!(plan.is_valid());
    assert_eq!(plan.validation_mode(), ValidationMode::Strict);

    let result = RegistrationPlanExecutor::new().execute(&plan, &mut registry, false);
    assert_eq!(result.outcome(), PlanOutcome::Applied);

    let pricing: Vec<&ServiceDescriptor> = registry.services_of(&pricing_service()).collect();
    assert_eq!(pricing.len(), 1);
    assert_eq!(pricing[0].lifetime(), ServiceLifetime::Singleton);
    assert!(is_experiment_proxy(pricing[0].implementation_type().unwrap()));
}

#[test]
fn strict_blocks_warn_allows() {
    let snapshot = ServiceGraphSnapshot::capture(&pricing_registry());

    let strict = RegistrationPlanBuilder::new()
        .with_validation_mode(ValidationMode::Strict)
        .add_operation(unassignable_operation())
        .build(snapshot.clone());
    assert!(strict.has_errors());
    assert!(!strict.is_valid());

    let warn = RegistrationPlanBuilder::new()
        .with_validation_mode(ValidationMode::Warn)
        .add_operation(unassignable_operation())
        .build(snapshot);
    assert!(warn.has_errors());
    assert!(warn.is_valid());
}

#[test]
fn off_mode_skips_validation() {
    let plan = RegistrationPlanBuilder::new()
        .with_validation_mode(ValidationMode::Off)
        .add_operation(unassignable_operation())
        .build(ServiceGraphSnapshot::capture(&pricing_registry()));

    assert!(plan.is_valid());
    assert!(plan.findings().is_empty());
}

#[test]
fn lifetime_directionality() {
    let registry = shop_registry();
    let narrowing = ServiceGraphPatchOperation::new(
        MultiRegistrationBehavior::Replace,
        clock_service(),
        vec![ServiceDescriptor::scoped(clock_service(), system_clock())],
    )
    .unwrap();

    let plan = RegistrationPlanBuilder::new()
        .add_operation(narrowing)
        .build(ServiceGraphSnapshot::capture(&registry));
    let lifetime: Vec<_> = plan.findings_for("LifetimeSafety").collect();
    assert_eq!(lifetime.len(), 1);
    assert_eq!(lifetime[0].severity(), Severity::Error);

    let widening = build(&registry, &[pricing_experiment()]);
    assert_eq!(widening.findings_for("LifetimeSafety").count(), 0);
}

#[test]
fn dry_run_never_mutates() {
    let mut registry = shop_registry();
    let before = registry.clone();
    let plan = build(&registry, &[pricing_experiment(), clock_experiment()]);

    let result = RegistrationPlanExecutor::new().execute(&plan, &mut registry, true);
    assert!(result.is_dry_run());
    assert!(result.success());
    assert_eq!(registry, before);
}

#[test]
fn reapplying_warns_about_double_wrap() {
    let mut registry = pricing_registry();
    let first = build(&registry, &[pricing_experiment()]);
    RegistrationPlanExecutor::new().execute(&first, &mut registry, false);

    let second = build(&registry, &[pricing_experiment()]);
    let idempotency: Vec<_> = second.findings_for("Idempotency").collect();
    assert_eq!(idempotency.len(), 1);
    assert_eq!(idempotency[0].severity(), Severity::Warning);
    assert!(second.is_valid());
}

#[test]
fn replace_over_multi_registration_warns_then_rolls_back() {
    let mut registry = shop_registry();
    let before = registry.clone();
    let definition = ExperimentDefinition::new(
        "notify-channel",
        notifier_service(),
        TrialImplementation::new("control", notifier("EmailNotifier")),
        SelectionMode::StickyRouting {
            identity_key: "userId".to_string(),
        },
    );

    let plan = build(&registry, &[definition]);
    assert_eq!(plan.findings_for("MultiRegistration").count(), 1);
    assert!(plan.is_valid());

    let result = RegistrationPlanExecutor::new().execute(&plan, &mut registry, false);
    assert_eq!(result.outcome(), PlanOutcome::RolledBack);
    assert!(result.error_message().unwrap().contains("expected 1"));
    assert_eq!(registry, before);
}

#[test]
fn open_generic_experiment_is_clean() {
    let definition = ExperimentDefinition::new(
        "repo-cache",
        repository_service(),
        TrialImplementation::new("control", sql_repository()),
        SelectionMode::Custom {
            provider: "tenant".to_string(),
        },
    );
    let plan = build(&shop_registry(), &[definition]);

    assert_eq!(plan.findings_for("OpenGeneric").count(), 0);
    assert!(plan.operations()[0].new_descriptors()[0]
        .implementation_type()
        .unwrap()
        .is_open_generic());
}

#[test]
fn report_is_deterministic() {
    let plan = build(&shop_registry(), &[pricing_experiment(), clock_experiment()]);
    let first = RegistrationPlanReport::generate_text_report(&plan);
    let second = RegistrationPlanReport::generate_text_report(&plan);
    assert_eq!(first, second);
    assert_eq!(
        RegistrationPlanReport::generate_json_report(&plan).unwrap(),
        RegistrationPlanReport::generate_json_report(&plan).unwrap()
    );
}

#[test]
fn applied_registry_len_is_stable() {
    let mut registry = shop_registry();
    let len = registry.len();
    let plan = build(&registry, &[pricing_experiment(), clock_experiment()]);

    let result = RegistrationPlanExecutor::new().execute(&plan, &mut registry, false);
    assert_eq!(result.outcome(), PlanOutcome::Applied);
    assert_eq!(registry.len(), len);
    assert!(RegistrationPlanReport::generate_execution_summary(&result).starts_with("✓"));
}
