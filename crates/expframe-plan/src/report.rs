//! Plan reports
//!
//! Rendering is pure and deterministic for a given plan: the only timestamps
//! shown are the ones carried on the plan and its snapshot. The text layout
//! has a fixed section order (header, snapshot, operations, findings by
//! descending severity, end marker) so reports diff cleanly.

use crate::executor::{PlanExecutionResult, PlanOutcome};
use crate::finding::{Severity, ValidationFinding};
use crate::operation::ServiceGraphPatchOperation;
use crate::plan::RegistrationPlan;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// First line of every text report
pub const REPORT_HEADER: &str = "=== ExperimentFramework Registration Plan Report ===";

/// Last line of every text report
pub const REPORT_FOOTER: &str = "=== End of Report ===";

/// Renders plans and execution results
#[derive(Debug, Clone, Copy, Default)]
pub struct RegistrationPlanReport;

impl RegistrationPlanReport {
    /// Human-readable multi-section report
    #[must_use]
    pub fn generate_text_report(plan: &RegistrationPlan) -> String {
        let mut report = String::new();

        report.push_str(REPORT_HEADER);
        report.push_str("\n\n");
        report.push_str(&format!("Plan ID: {}\n", plan.plan_id()));
        report.push_str(&format!("Created: {}\n", timestamp(plan.created_at())));
        report.push_str(&format!("Validation Mode: {}\n", plan.validation_mode()));
        report.push_str(&format!("Valid: {}\n", if plan.is_valid() { "Yes" } else { "No" }));

        let snapshot = plan.snapshot();
        report.push_str("\n--- Snapshot ---\n");
        report.push_str(&format!("Snapshot ID: {}\n", snapshot.snapshot_id()));
        report.push_str(&format!("Timestamp: {}\n", timestamp(snapshot.timestamp())));
        report.push_str(&format!("Descriptors: {}\n", snapshot.descriptor_count()));
        report.push_str(&format!("Fingerprint: {}\n", snapshot.fingerprint()));

        report.push_str(&format!("\n--- Operations ({}) ---\n", plan.operations().len()));
        if plan.operations().is_empty() {
            report.push_str("No operations.\n");
        }
        for (i, operation) in plan.operations().iter().enumerate() {
            push_operation(&mut report, i + 1, operation);
        }

        report.push_str(&format!(
            "\n--- Findings ({}: {} errors, {} warnings) ---\n",
            plan.findings().len(),
            plan.error_count(),
            plan.warning_count()
        ));
        if plan.findings().is_empty() {
            report.push_str("No findings.\n");
        }
        for (severity, heading) in [
            (Severity::Error, "Errors"),
            (Severity::Warning, "Warnings"),
            (Severity::Info, "Info"),
        ] {
            let group: Vec<&ValidationFinding> = plan
                .findings()
                .iter()
                .filter(|f| f.severity() == severity)
                .collect();
            if group.is_empty() {
                continue;
            }
            report.push_str(&format!("{heading}:\n"));
            for (i, finding) in group.iter().enumerate() {
                report.push_str(&format!(
                    "  {}. [{}] {}: {}\n",
                    i + 1,
                    finding.rule_name(),
                    finding.service_type(),
                    finding.description()
                ));
                if let Some(action) = finding.recommended_action() {
                    report.push_str(&format!("     Recommended: {action}\n"));
                }
            }
        }

        report.push('\n');
        report.push_str(REPORT_FOOTER);
        report.push('\n');
        report
    }

    /// Machine-readable report, pretty-printed with camelCase keys
    ///
    /// # Errors
    /// Serialization failure from `serde_json`
    pub fn generate_json_report(plan: &RegistrationPlan) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&PlanView::from(plan))
    }

    /// One-line plan summary
    #[must_use]
    pub fn generate_summary(plan: &RegistrationPlan) -> String {
        format!(
            "{} Plan {}: {} | {} operations | {} errors | {} warnings",
            if plan.is_valid() { '✓' } else { '✗' },
            plan.plan_id(),
            if plan.is_valid() { "VALID" } else { "INVALID" },
            plan.operations().len(),
            plan.error_count(),
            plan.warning_count()
        )
    }

    /// One-line execution summary
    #[must_use]
    pub fn generate_execution_summary(result: &PlanExecutionResult) -> String {
        let label = match result.outcome() {
            PlanOutcome::Invalid => "NOT EXECUTED (invalid plan)",
            PlanOutcome::DryRunValidated => "DRY RUN OK",
            PlanOutcome::Applied => "APPLIED",
            PlanOutcome::RolledBack => "ROLLED BACK",
        };

        let mut summary = format!(
            "{} Plan {}: {} | {} operation results",
            if result.success() { '✓' } else { '✗' },
            result.plan_id(),
            label,
            result.operation_results().len()
        );
        if let Some(message) = result.error_message() {
            summary.push_str(&format!(" | {message}"));
        }
        if !result.rollback_errors().is_empty() {
            summary.push_str(&format!(
                " | {} rollback errors",
                result.rollback_errors().len()
            ));
        }
        summary
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn push_operation(report: &mut String, index: usize, operation: &ServiceGraphPatchOperation) {
    report.push_str(&format!(
        "{index}. [{}] {} ({})\n",
        operation.operation_type(),
        operation.service_type(),
        operation.operation_id()
    ));
    report.push_str(&format!("   Match: {}\n", operation.predicate().describe()));
    report.push_str(&format!(
        "   Expected Matches: {}\n",
        operation
            .expected_match_count()
            .map_or_else(|| "any".to_string(), |n| n.to_string())
    ));
    report.push_str(&format!("   Allow No Matches: {}\n", operation.allows_no_matches()));

    let metadata = operation.metadata();
    if !metadata.description.is_empty() {
        report.push_str(&format!("   Description: {}\n", metadata.description));
    }
    for (key, value) in &metadata.properties {
        report.push_str(&format!("   {key}: {value}\n"));
    }
    for descriptor in operation.new_descriptors() {
        report.push_str(&format!("   New: {descriptor}\n"));
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanView<'a> {
    plan_id: &'a str,
    created_at: String,
    validation_mode: String,
    is_valid: bool,
    snapshot: SnapshotView<'a>,
    operations: Vec<OperationView<'a>>,
    findings: &'a [ValidationFinding],
    summary: SummaryView,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotView<'a> {
    snapshot_id: &'a str,
    timestamp: String,
    descriptor_count: usize,
    fingerprint: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OperationView<'a> {
    operation_id: &'a str,
    operation_type: String,
    service_type: String,
    match_predicate: String,
    expected_match_count: Option<usize>,
    allow_no_matches: bool,
    description: &'a str,
    properties: &'a BTreeMap<String, String>,
    new_descriptors: Vec<DescriptorView>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DescriptorView {
    service_type: String,
    implementation: String,
    lifetime: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SummaryView {
    operation_count: usize,
    error_count: usize,
    warning_count: usize,
    has_errors: bool,
    has_warnings: bool,
}

impl<'a> From<&'a RegistrationPlan> for PlanView<'a> {
    fn from(plan: &'a RegistrationPlan) -> Self {
        let snapshot = plan.snapshot();
        Self {
            plan_id: plan.plan_id(),
            created_at: timestamp(plan.created_at()),
            validation_mode: plan.validation_mode().to_string(),
            is_valid: plan.is_valid(),
            snapshot: SnapshotView {
                snapshot_id: snapshot.snapshot_id(),
                timestamp: timestamp(snapshot.timestamp()),
                descriptor_count: snapshot.descriptor_count(),
                fingerprint: snapshot.fingerprint(),
            },
            operations: plan.operations().iter().map(OperationView::from).collect(),
            findings: plan.findings(),
            summary: SummaryView {
                operation_count: plan.operations().len(),
                error_count: plan.error_count(),
                warning_count: plan.warning_count(),
                has_errors: plan.has_errors(),
                has_warnings: plan.has_warnings(),
            },
        }
    }
}

impl<'a> From<&'a ServiceGraphPatchOperation> for OperationView<'a> {
    fn from(operation: &'a ServiceGraphPatchOperation) -> Self {
        Self {
            operation_id: operation.operation_id(),
            operation_type: operation.operation_type().to_string(),
            service_type: operation.service_type().key(),
            match_predicate: operation.predicate().describe(),
            expected_match_count: operation.expected_match_count(),
            allow_no_matches: operation.allows_no_matches(),
            description: &operation.metadata().description,
            properties: &operation.metadata().properties,
            new_descriptors: operation
                .new_descriptors()
                .iter()
                .map(|d| DescriptorView {
                    service_type: d.service_type().key(),
                    implementation: d.implementation().to_string(),
                    lifetime: d.lifetime().to_string(),
                })
                .collect(),
        }
    }
}
