//! Declarative experiment configuration
//!
//! A configuration document lists the baseline service registrations, the
//! experiments layered over them, and the registration policy. YAML and JSON
//! are both accepted, chosen by file extension.
//!
//! Declaring a registration or a trial in the document is taken as the
//! assignability fact for that implementation: the document is the
//! registration table.

use crate::descriptor::{Implementation, ServiceDescriptor, ServiceLifetime};
use crate::error::ConfigError;
use crate::experiment::ExperimentDefinition;
use crate::registry::ServiceCollection;
use crate::types::TypeRef;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::path::Path;

/// Validation policy for plan building
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidationMode {
    /// Skip validation; plans are always valid
    Off,
    /// Validate, but errors do not block execution
    Warn,
    /// Any error finding makes the plan invalid
    #[default]
    Strict,
}

impl Display for ValidationMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValidationMode::Off => "Off",
            ValidationMode::Warn => "Warn",
            ValidationMode::Strict => "Strict",
        })
    }
}

/// How an operation treats several existing registrations of one service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MultiRegistrationBehavior {
    /// Remove every match; new descriptors take the first match's position
    #[default]
    Replace,
    /// Insert before the first match; originals keep winning single resolution
    Insert,
    /// Insert after the last match; new descriptors win single resolution
    Append,
    /// Swap only the last match; enumeration keeps the others
    Merge,
}

impl Display for MultiRegistrationBehavior {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MultiRegistrationBehavior::Replace => "Replace",
            MultiRegistrationBehavior::Insert => "Insert",
            MultiRegistrationBehavior::Append => "Append",
            MultiRegistrationBehavior::Merge => "Merge",
        })
    }
}

/// Registration policy section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationSettings {
    /// Validation mode (default strict)
    pub validation_mode: ValidationMode,
    /// Default behavior for synthesized operations (default replace)
    pub multi_registration_behavior: MultiRegistrationBehavior,
}

/// Baseline service registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRegistration {
    /// Service type
    pub service: TypeRef,
    /// Implementation type
    pub implementation: TypeRef,
    /// Lifetime
    pub lifetime: ServiceLifetime,
}

impl ServiceRegistration {
    /// Descriptor for this registration, implementation declared assignable
    #[must_use]
    pub fn to_descriptor(&self) -> ServiceDescriptor {
        let implementation = self.implementation.clone().implements(&self.service);
        ServiceDescriptor::new(
            self.service.clone(),
            Implementation::Type(implementation),
            self.lifetime,
        )
    }
}

/// Whole configuration document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentConfig {
    /// Registration policy
    #[serde(default)]
    pub registration: RegistrationSettings,
    /// Baseline registrations
    #[serde(default)]
    pub services: Vec<ServiceRegistration>,
    /// Experiments
    #[serde(default)]
    pub experiments: Vec<ExperimentDefinition>,
}

impl ExperimentConfig {
    /// Load from a `.yaml`, `.yml` or `.json` file
    ///
    /// # Errors
    /// - `ConfigError::Io` if the file cannot be read
    /// - `ConfigError::Yaml` / `ConfigError::Json` on parse failure
    /// - `ConfigError::UnsupportedFormat` for other extensions
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        if !matches!(extension.as_str(), "yaml" | "yml" | "json") {
            return Err(ConfigError::UnsupportedFormat(extension));
        }

        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::io_error(path, e))?;

        let config = if extension == "json" {
            Self::from_json_str(&content).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            Self::from_yaml_str(&content).map_err(|source| ConfigError::Yaml {
                path: path.to_path_buf(),
                source,
            })?
        };

        tracing::debug!(
            "Loaded configuration {}: {} services, {} experiments",
            path.display(),
            config.services.len(),
            config.experiments.len()
        );
        Ok(config)
    }

    /// Parse YAML text
    ///
    /// # Errors
    /// YAML syntax or shape error
    pub fn from_yaml_str(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// Parse JSON text
    ///
    /// # Errors
    /// JSON syntax or shape error
    pub fn from_json_str(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Materialize the baseline registrations into a registry
    #[must_use]
    pub fn to_registry(&self) -> ServiceCollection {
        self.services
            .iter()
            .map(ServiceRegistration::to_descriptor)
            .collect()
    }

    /// Experiment definitions with trial implementations declared assignable
    #[must_use]
    pub fn definitions(&self) -> Vec<ExperimentDefinition> {
        self.experiments
            .iter()
            .map(|experiment| {
                let mut definition = experiment.clone();
                let service = definition.service_type.clone();
                let declare = |ty: &TypeRef| ty.clone().implements(&service);

                definition.control.implementation = declare(&definition.control.implementation);
                for condition in &mut definition.conditions {
                    condition.implementation = declare(&condition.implementation);
                }
                definition
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::SelectionMode;
    use crate::registry::ServiceRegistry;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const YAML: &str = r"
registration:
  validationMode: warn
  multiRegistrationBehavior: merge
services:
  - service: Shop.Pricing.IPricingService
    implementation: Shop.Pricing.DefaultPricing
    lifetime: scoped
experiments:
  - name: pricing-v2
    service: Shop.Pricing.IPricingService
    control: { key: control, implementation: Shop.Pricing.DefaultPricing }
    conditions:
      - { key: discount, implementation: Shop.Pricing.DiscountPricing }
    selection: { kind: featureFlag, flag: PricingV2 }
";

    #[test]
    fn parse_yaml() {
        let config = ExperimentConfig::from_yaml_str(YAML).unwrap();
        assert_eq!(config.registration.validation_mode, ValidationMode::Warn);
        assert_eq!(
            config.registration.multi_registration_behavior,
            MultiRegistrationBehavior::Merge
        );
        assert_eq!(config.services.len(), 1);
        assert_eq!(
            config.experiments[0].selection,
            SelectionMode::FeatureFlag {
                flag: "PricingV2".to_string()
            }
        );
    }

    #[test]
    fn defaults_when_sections_missing() {
        let config = ExperimentConfig::from_yaml_str("services: []").unwrap();
        assert_eq!(config.registration, RegistrationSettings::default());
        assert_eq!(config.registration.validation_mode, ValidationMode::Strict);
        assert!(config.experiments.is_empty());
    }

    #[test]
    fn registry_declares_assignability() {
        let config = ExperimentConfig::from_yaml_str(YAML).unwrap();
        let registry = config.to_registry();
        let descriptors = registry.descriptors();

        assert_eq!(descriptors.len(), 1);
        let implementation = descriptors[0].implementation_type().unwrap();
        assert!(implementation.is_assignable_to(descriptors[0].service_type()));
        assert_eq!(descriptors[0].lifetime(), ServiceLifetime::Scoped);
    }

    #[test]
    fn definitions_are_valid() {
        let config = ExperimentConfig::from_yaml_str(YAML).unwrap();
        let definitions = config.definitions();
        assert_eq!(definitions.len(), 1);
        assert!(definitions[0].validate().is_ok());
    }

    #[test]
    fn load_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"services":[{{"service":"Shop.IClock","implementation":"Shop.SystemClock","lifetime":"singleton"}}]}}"#
        )
        .unwrap();

        let config = ExperimentConfig::load(file.path()).unwrap();
        assert_eq!(config.services.len(), 1);
    }

    #[test]
    fn load_rejects_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        assert!(matches!(
            ExperimentConfig::load(file.path()),
            Err(ConfigError::UnsupportedFormat(ext)) if ext == "toml"
        ));
    }

    #[test]
    fn load_missing_file() {
        assert!(matches!(
            ExperimentConfig::load("/nonexistent/expframe.yaml"),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn load_reports_bad_type_names() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "services:\n  - service: 'Shop.<'\n    implementation: Shop.A\n    lifetime: scoped"
        )
        .unwrap();
        assert!(matches!(
            ExperimentConfig::load(file.path()),
            Err(ConfigError::Yaml { .. })
        ));
    }

    #[test]
    fn display_names() {
        assert_eq!(ValidationMode::Strict.to_string(), "Strict");
        assert_eq!(MultiRegistrationBehavior::Append.to_string(), "Append");
    }
}
