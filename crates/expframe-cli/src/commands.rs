//! `plan export`, `plan validate` and `plan apply`
//!
//! Every command returns `Ok(true)` when the plan (or its execution) is
//! acceptable, `Ok(false)` when it is not, and `Err` when the configuration
//! could not be loaded or turned into a plan at all.

use anyhow::{Context, Result};
use chrono::Utc;
use expframe_core::{ExperimentConfig, ServiceCollection, ServiceGraphSnapshot};
use expframe_plan::{
    RegistrationPlan, RegistrationPlanBuilder, RegistrationPlanExecutor, RegistrationPlanReport,
    Severity,
};
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

/// Output format for `plan export`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for ReportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            other => anyhow::bail!("unknown report format '{other}' (expected text or json)"),
        }
    }
}

fn load_plan(config_path: &Path) -> Result<(ServiceCollection, RegistrationPlan)> {
    let config = ExperimentConfig::load(config_path)
        .with_context(|| format!("failed to load configuration {}", config_path.display()))?;

    let registry = config.to_registry();
    let now = Utc::now();
    let snapshot = ServiceGraphSnapshot::capture_at(&registry, now);
    let plan = RegistrationPlanBuilder::new()
        .with_created_at(now)
        .build_from_definitions(snapshot, &config.definitions(), &config.registration)
        .context("failed to build registration plan")?;

    tracing::info!(
        "Plan {} built from {}",
        plan.plan_id(),
        config_path.display()
    );
    Ok((registry, plan))
}

/// Render the plan for `config_path`; the report is written even when invalid
///
/// # Errors
/// Configuration or plan-building failure, or a write error
pub fn export(config_path: &Path, format: ReportFormat, out: &mut dyn Write) -> Result<bool> {
    let (_, plan) = load_plan(config_path)?;

    let rendered = match format {
        ReportFormat::Text => RegistrationPlanReport::generate_text_report(&plan),
        ReportFormat::Json => {
            let mut json = RegistrationPlanReport::generate_json_report(&plan)
                .context("failed to serialize plan report")?;
            json.push('\n');
            json
        }
    };
    out.write_all(rendered.as_bytes())
        .context("failed to write report")?;

    Ok(plan.is_valid())
}

/// Print each error and warning finding, then the summary line
///
/// # Errors
/// Configuration or plan-building failure, or a write error
pub fn validate(config_path: &Path, out: &mut dyn Write) -> Result<bool> {
    let (_, plan) = load_plan(config_path)?;

    for finding in plan
        .findings()
        .iter()
        .filter(|f| f.severity() >= Severity::Warning)
    {
        writeln!(out, "{finding}")?;
    }
    writeln!(out, "{}", RegistrationPlanReport::generate_summary(&plan))?;

    Ok(plan.is_valid())
}

/// Execute the plan against the configured in-memory registry
///
/// # Errors
/// Configuration or plan-building failure, or a write error
pub fn apply(config_path: &Path, dry_run: bool, out: &mut dyn Write) -> Result<bool> {
    let (mut registry, plan) = load_plan(config_path)?;

    let result = RegistrationPlanExecutor::new().execute(&plan, &mut registry, dry_run);

    if let Some(findings) = result.validation_findings() {
        for finding in findings.iter().filter(|f| f.severity() >= Severity::Warning) {
            writeln!(out, "{finding}")?;
        }
    }
    for failure in result.rollback_errors() {
        writeln!(out, "rollback: {failure}")?;
    }
    writeln!(out, "{}", RegistrationPlanReport::generate_execution_summary(&result))?;

    Ok(result.success())
}
