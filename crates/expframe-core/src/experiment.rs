//! Experiment definitions
//!
//! An experiment binds one service type to a control implementation and any
//! number of named condition implementations ("trials"), plus the selection
//! strategy that routes calls between them. Selection is only carried as
//! metadata here; evaluating it is the proxy's job.

use crate::config::MultiRegistrationBehavior;
use crate::error::DefinitionError;
use crate::types::TypeRef;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::{self, Display, Formatter};

/// One trial: a key and the implementation it routes to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialImplementation {
    /// Trial key (`control`, `discount`, ...)
    pub key: String,
    /// Implementation type
    pub implementation: TypeRef,
}

impl TrialImplementation {
    /// Create trial
    #[inline]
    #[must_use]
    pub fn new(key: impl Into<String>, implementation: TypeRef) -> Self {
        Self {
            key: key.into(),
            implementation,
        }
    }
}

/// How the proxy picks a trial per call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SelectionMode {
    /// Boolean feature flag: on routes to the first condition
    FeatureFlag {
        /// Flag name
        flag: String,
    },

    /// Configuration value names the trial key
    ConfigurationKey {
        /// Configuration key
        key: String,
    },

    /// Stable hash of a caller identity picks the trial
    StickyRouting {
        /// Identity attribute to hash
        #[serde(rename = "identityKey")]
        identity_key: String,
    },

    /// Host-provided selector
    Custom {
        /// Provider name
        provider: String,
    },
}

impl Display for SelectionMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SelectionMode::FeatureFlag { flag } => write!(f, "featureFlag:{flag}"),
            SelectionMode::ConfigurationKey { key } => write!(f, "configurationKey:{key}"),
            SelectionMode::StickyRouting { identity_key } => write!(f, "stickyRouting:{identity_key}"),
            SelectionMode::Custom { provider } => write!(f, "custom:{provider}"),
        }
    }
}

/// Experiment over one service type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentDefinition {
    /// Experiment name
    pub name: String,
    /// Service type the proxy will stand in for
    #[serde(rename = "service")]
    pub service_type: TypeRef,
    /// Control trial
    pub control: TrialImplementation,
    /// Condition trials
    #[serde(default)]
    pub conditions: Vec<TrialImplementation>,
    /// Selection strategy
    pub selection: SelectionMode,
    /// Overrides the plan's default multi-registration behavior
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behavior: Option<MultiRegistrationBehavior>,
}

impl ExperimentDefinition {
    /// Create definition with no conditions
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        service_type: TypeRef,
        control: TrialImplementation,
        selection: SelectionMode,
    ) -> Self {
        Self {
            name: name.into(),
            service_type,
            control,
            conditions: Vec::new(),
            selection,
            behavior: None,
        }
    }

    /// Add a condition trial
    #[must_use]
    pub fn with_condition(mut self, condition: TrialImplementation) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Override the multi-registration behavior
    #[must_use]
    pub fn with_behavior(mut self, behavior: MultiRegistrationBehavior) -> Self {
        self.behavior = Some(behavior);
        self
    }

    /// Control followed by conditions
    pub fn trials(&self) -> impl Iterator<Item = &TrialImplementation> {
        std::iter::once(&self.control).chain(self.conditions.iter())
    }

    /// Trial keys in declaration order
    #[must_use]
    pub fn trial_keys(&self) -> Vec<&str> {
        self.trials().map(|t| t.key.as_str()).collect()
    }

    /// Check the definition is well formed
    ///
    /// # Errors
    /// - `EmptyName`, `EmptyTrialKey`, `DuplicateTrialKey`
    /// - `NotAssignable` when a trial cannot stand in for the service
    pub fn validate(&self) -> Result<(), DefinitionError> {
        if self.name.trim().is_empty() {
            return Err(DefinitionError::EmptyName {
                service_type: self.service_type.key(),
            });
        }

        let mut seen = HashSet::new();
        for trial in self.trials() {
            if trial.key.trim().is_empty() {
                return Err(DefinitionError::EmptyTrialKey {
                    experiment: self.name.clone(),
                });
            }
            if !seen.insert(trial.key.as_str()) {
                return Err(DefinitionError::DuplicateTrialKey {
                    experiment: self.name.clone(),
                    key: trial.key.clone(),
                });
            }
            if !trial.implementation.is_assignable_to(&self.service_type) {
                return Err(DefinitionError::NotAssignable {
                    experiment: self.name.clone(),
                    key: trial.key.clone(),
                    implementation: trial.implementation.key(),
                    service_type: self.service_type.key(),
                });
            }
        }

        Ok(())
    }
}
