//! End-to-end runs of the `expframe` binary

use pretty_assertions::assert_eq;
use std::fs;
use std::process::{Command, Output};
use tempfile::TempDir;

const VALID: &str = r#"{
  "registration": { "validationMode": "strict" },
  "services": [
    { "service": "Shop.Pricing.IPricingService", "implementation": "Shop.Pricing.DefaultPricing", "lifetime": "scoped" },
    { "service": "Shop.IClock", "implementation": "Shop.SystemClock", "lifetime": "singleton" }
  ],
  "experiments": [
    {
      "name": "pricing-v2",
      "service": "Shop.Pricing.IPricingService",
      "control": { "key": "control", "implementation": "Shop.Pricing.DefaultPricing" },
      "conditions": [ { "key": "discount", "implementation": "Shop.Pricing.DiscountPricing" } ],
      "selection": { "kind": "featureFlag", "flag": "PricingV2" }
    }
  ]
}"#;

const MULTI_NOTIFIER: &str = r"
registration:
  validationMode: strict
services:
  - { service: Shop.Notify.INotifier, implementation: Shop.Notify.Email, lifetime: singleton }
  - { service: Shop.Notify.INotifier, implementation: Shop.Notify.Sms, lifetime: singleton }
experiments:
  - name: notify
    service: Shop.Notify.INotifier
    control: { key: control, implementation: Shop.Notify.Email }
    selection: { kind: stickyRouting, identityKey: userId }
";

fn expframe(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_expframe"))
        .args(args)
        .output()
        .unwrap()
}

fn write(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn export_writes_json_report() {
    let dir = TempDir::new().unwrap();
    let config = write(&dir, "experiments.json", VALID);
    let out = dir.path().join("plan.json");

    let output = expframe(&[
        "plan",
        "export",
        "--config",
        &config,
        "--format",
        "json",
        "--out",
        &out.to_string_lossy(),
    ]);

    assert_eq!(output.status.code(), Some(0));
    let report = fs::read_to_string(&out).unwrap();
    assert!(report.contains("\"fingerprint\": \"2:Shop.IClock,Shop.Pricing.IPricingService\""));
}

#[test]
fn export_text_to_stdout() {
    let dir = TempDir::new().unwrap();
    let config = write(&dir, "experiments.json", VALID);

    let output = expframe(&["plan", "export", "--config", &config]);
    let stdout = String::from_utf8(output.stdout).unwrap();

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        stdout.lines().next(),
        Some("=== ExperimentFramework Registration Plan Report ===")
    );
}

#[test]
fn missing_config_exits_one() {
    let output = expframe(&["plan", "validate", "--config", "/nonexistent/experiments.yaml"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to load configuration"));
}

#[test]
fn unsupported_extension_exits_one() {
    let dir = TempDir::new().unwrap();
    let config = write(&dir, "experiments.toml", "");
    let output = expframe(&["plan", "export", "--config", &config]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn apply_rolls_back_multi_registration() {
    let dir = TempDir::new().unwrap();
    let config = write(&dir, "notify.yaml", MULTI_NOTIFIER);

    let validate = expframe(&["plan", "validate", "--config", &config]);
    let stdout = String::from_utf8(validate.stdout).unwrap();
    assert_eq!(validate.status.code(), Some(0));
    assert!(stdout.contains("[Warning] MultiRegistration Shop.Notify.INotifier"));

    let apply = expframe(&["plan", "apply", "--config", &config]);
    let stdout = String::from_utf8(apply.stdout).unwrap();
    assert_eq!(apply.status.code(), Some(1));
    assert!(stdout.contains("ROLLED BACK"));
}

#[test]
fn dry_run_exits_zero() {
    let dir = TempDir::new().unwrap();
    let config = write(&dir, "experiments.json", VALID);
    let output = expframe(&["plan", "apply", "--config", &config, "--dry-run"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("DRY RUN OK"));
}
