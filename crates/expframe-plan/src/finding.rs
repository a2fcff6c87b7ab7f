//! Validation findings

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Finding severity, ordered `Info < Warning < Error`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Informational
    Info,
    /// Worth a look; never blocks
    Warning,
    /// Blocks execution under strict validation
    Error,
}

impl Severity {
    /// Display name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "Info",
            Severity::Warning => "Warning",
            Severity::Error => "Error",
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One rule-check result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationFinding {
    severity: Severity,
    rule_name: String,
    service_type: String,
    description: String,
    recommended_action: Option<String>,
}

impl ValidationFinding {
    /// Create finding
    #[must_use]
    pub fn new(
        severity: Severity,
        rule_name: impl Into<String>,
        service_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            rule_name: rule_name.into(),
            service_type: service_type.into(),
            description: description.into(),
            recommended_action: None,
        }
    }

    /// Create info finding
    #[must_use]
    pub fn info(
        rule_name: impl Into<String>,
        service_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self::new(Severity::Info, rule_name, service_type, description)
    }

    /// Create warning finding
    #[must_use]
    pub fn warning(
        rule_name: impl Into<String>,
        service_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self::new(Severity::Warning, rule_name, service_type, description)
    }

    /// Create error finding
    #[must_use]
    pub fn error(
        rule_name: impl Into<String>,
        service_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self::new(Severity::Error, rule_name, service_type, description)
    }

    /// Attach a recommended action
    #[inline]
    #[must_use]
    pub fn with_recommendation(mut self, action: impl Into<String>) -> Self {
        self.recommended_action = Some(action.into());
        self
    }

    /// Severity
    #[inline]
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Name of the rule that produced this finding
    #[inline]
    #[must_use]
    pub fn rule_name(&self) -> &str {
        &self.rule_name
    }

    /// Service type key the finding is about
    #[inline]
    #[must_use]
    pub fn service_type(&self) -> &str {
        &self.service_type
    }

    /// What is wrong
    #[inline]
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// What to do about it
    #[inline]
    #[must_use]
    pub fn recommended_action(&self) -> Option<&str> {
        self.recommended_action.as_deref()
    }
}

impl Display for ValidationFinding {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {}: {}",
            self.severity, self.rule_name, self.service_type, self.description
        )?;
        if let Some(action) = &self.recommended_action {
            write!(f, " (recommended: {action})")?;
        }
        Ok(())
    }
}
