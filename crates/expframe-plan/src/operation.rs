//! Patch operations
//!
//! A [`ServiceGraphPatchOperation`] is one declarative mutation of a registry:
//! which descriptors of a service type to match, what to put in their place,
//! and how to treat multiple existing registrations.

use crate::error::PlanError;
use expframe_core::{
    MultiRegistrationBehavior, RegistryError, ServiceDescriptor, ServiceLifetime, ServiceRegistry,
    TypeRef,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Predicate callback for [`MatchPredicate::Custom`]
pub type DescriptorPredicate = Arc<dyn Fn(&ServiceDescriptor) -> bool + Send + Sync>;

/// Which descriptors of the operation's service type an operation targets
///
/// Predicates must be pure: validators and the executor may evaluate them
/// any number of times.
#[derive(Clone)]
pub enum MatchPredicate {
    /// Every descriptor of the service type
    ServiceType,
    /// Descriptors whose implementation type has this key
    ImplementationType(String),
    /// Descriptors with this lifetime
    Lifetime(ServiceLifetime),
    /// Host-supplied predicate, labelled for reports
    ///
    /// A panicking predicate is not caught. It unwinds out of
    /// [`RegistrationPlanExecutor::execute`](crate::RegistrationPlanExecutor::execute)
    /// before rollback runs, so operations already applied stay applied.
    Custom {
        /// Label shown in reports
        label: String,
        /// Predicate callback
        predicate: DescriptorPredicate,
    },
}

impl MatchPredicate {
    /// Create custom predicate
    pub fn custom<F>(label: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&ServiceDescriptor) -> bool + Send + Sync + 'static,
    {
        Self::Custom {
            label: label.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// Evaluate against a descriptor already known to have the right service type
    #[must_use]
    pub fn matches(&self, descriptor: &ServiceDescriptor) -> bool {
        match self {
            MatchPredicate::ServiceType => true,
            MatchPredicate::ImplementationType(key) => descriptor
                .implementation_type()
                .is_some_and(|ty| ty.key() == *key),
            MatchPredicate::Lifetime(lifetime) => descriptor.lifetime() == *lifetime,
            MatchPredicate::Custom { predicate, .. } => predicate(descriptor),
        }
    }

    /// Human-readable form for reports
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            MatchPredicate::ServiceType => "any descriptor of the service type".to_string(),
            MatchPredicate::ImplementationType(key) => format!("implementation type {key}"),
            MatchPredicate::Lifetime(lifetime) => format!("lifetime {lifetime}"),
            MatchPredicate::Custom { label, .. } => format!("custom: {label}"),
        }
    }
}

impl fmt::Debug for MatchPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchPredicate::ServiceType => f.write_str("ServiceType"),
            MatchPredicate::ImplementationType(key) => {
                f.debug_tuple("ImplementationType").field(key).finish()
            }
            MatchPredicate::Lifetime(lifetime) => f.debug_tuple("Lifetime").field(lifetime).finish(),
            MatchPredicate::Custom { label, .. } => {
                f.debug_struct("Custom").field("label", label).finish_non_exhaustive()
            }
        }
    }
}

/// Free-form description and properties carried for audit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OperationMetadata {
    /// Description
    pub description: String,
    /// Key/value properties, sorted by key
    pub properties: BTreeMap<String, String>,
}

/// Outcome of executing one operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResult {
    /// Operation id
    pub operation_id: String,
    /// Whether the mutation was applied
    pub success: bool,
    /// Why it was not
    pub error_message: Option<String>,
    /// Descriptors that matched before mutation
    pub matched_count: usize,
    /// Descriptors removed
    pub removed_count: usize,
    /// Descriptors added
    pub added_count: usize,
}

impl OperationResult {
    fn failed(operation_id: &str, matched_count: usize, message: String) -> Self {
        Self {
            operation_id: operation_id.to_string(),
            success: false,
            error_message: Some(message),
            matched_count,
            removed_count: 0,
            added_count: 0,
        }
    }
}

/// One declarative registry mutation
#[derive(Debug, Clone)]
pub struct ServiceGraphPatchOperation {
    operation_id: String,
    operation_type: MultiRegistrationBehavior,
    service_type: TypeRef,
    predicate: MatchPredicate,
    new_descriptors: Vec<ServiceDescriptor>,
    expected_match_count: Option<usize>,
    allow_no_matches: bool,
    metadata: OperationMetadata,
}

impl ServiceGraphPatchOperation {
    /// Create operation matching every descriptor of `service_type`
    ///
    /// # Errors
    /// `PlanError::EmptyReplacement` if `new_descriptors` is empty
    pub fn new(
        operation_type: MultiRegistrationBehavior,
        service_type: TypeRef,
        new_descriptors: Vec<ServiceDescriptor>,
    ) -> Result<Self, PlanError> {
        if new_descriptors.is_empty() {
            return Err(PlanError::EmptyReplacement {
                service_type: service_type.key(),
            });
        }

        Ok(Self {
            operation_id: Uuid::new_v4().to_string(),
            operation_type,
            service_type,
            predicate: MatchPredicate::ServiceType,
            new_descriptors,
            expected_match_count: None,
            allow_no_matches: false,
            metadata: OperationMetadata::default(),
        })
    }

    /// Narrow the match predicate
    #[inline]
    #[must_use]
    pub fn with_predicate(mut self, predicate: MatchPredicate) -> Self {
        self.predicate = predicate;
        self
    }

    /// Require exactly `count` matches
    #[inline]
    #[must_use]
    pub fn with_expected_match_count(mut self, count: usize) -> Self {
        self.expected_match_count = Some(count);
        self
    }

    /// Succeed even when nothing matches
    #[inline]
    #[must_use]
    pub fn allow_no_matches(mut self) -> Self {
        self.allow_no_matches = true;
        self
    }

    /// Set metadata description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.metadata.description = description.into();
        self
    }

    /// Add a metadata property
    #[inline]
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.properties.insert(key.into(), value.into());
        self
    }

    /// Operation id (UUID v4)
    #[inline]
    #[must_use]
    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    /// Multi-registration behavior
    #[inline]
    #[must_use]
    pub fn operation_type(&self) -> MultiRegistrationBehavior {
        self.operation_type
    }

    /// Target service type
    #[inline]
    #[must_use]
    pub fn service_type(&self) -> &TypeRef {
        &self.service_type
    }

    /// Match predicate
    #[inline]
    #[must_use]
    pub fn predicate(&self) -> &MatchPredicate {
        &self.predicate
    }

    /// Replacement descriptors, never empty
    #[inline]
    #[must_use]
    pub fn new_descriptors(&self) -> &[ServiceDescriptor] {
        &self.new_descriptors
    }

    /// Required match count, if any
    #[inline]
    #[must_use]
    pub fn expected_match_count(&self) -> Option<usize> {
        self.expected_match_count
    }

    /// Whether zero matches is acceptable
    #[inline]
    #[must_use]
    pub fn allows_no_matches(&self) -> bool {
        self.allow_no_matches
    }

    /// Audit metadata
    #[inline]
    #[must_use]
    pub fn metadata(&self) -> &OperationMetadata {
        &self.metadata
    }

    /// Whether `descriptor` is targeted by this operation
    #[must_use]
    pub fn matches(&self, descriptor: &ServiceDescriptor) -> bool {
        descriptor.service_type() == &self.service_type && self.predicate.matches(descriptor)
    }

    /// Apply to a live registry
    ///
    /// A failed [`OperationResult`] means the match expectations did not hold
    /// and the registry was not touched.
    ///
    /// # Errors
    /// Registry refusals; the registry may then be partially mutated
    pub fn execute<R: ServiceRegistry + ?Sized>(
        &self,
        registry: &mut R,
    ) -> Result<OperationResult, RegistryError> {
        let current = registry.descriptors();
        let matches: Vec<usize> = current
            .iter()
            .enumerate()
            .filter(|(_, d)| self.matches(d))
            .map(|(i, _)| i)
            .collect();

        if matches.is_empty() && !self.allow_no_matches {
            return Ok(OperationResult::failed(
                &self.operation_id,
                0,
                format!(
                    "no descriptors matched {} ({})",
                    self.service_type,
                    self.predicate.describe()
                ),
            ));
        }

        if let Some(expected) = self.expected_match_count {
            if expected != matches.len() {
                return Ok(OperationResult::failed(
                    &self.operation_id,
                    matches.len(),
                    format!(
                        "expected {expected} descriptor(s) for {} but found {}",
                        self.service_type,
                        matches.len()
                    ),
                ));
            }
        }

        let end = current.len();
        let (position, removed) = match self.operation_type {
            MultiRegistrationBehavior::Replace => {
                for &index in matches.iter().rev() {
                    registry.remove_at(index)?;
                }
                (matches.first().copied().unwrap_or(end), matches.len())
            }
            MultiRegistrationBehavior::Insert => (matches.first().copied().unwrap_or(end), 0),
            MultiRegistrationBehavior::Append => (matches.last().map_or(end, |last| last + 1), 0),
            MultiRegistrationBehavior::Merge => match matches.last() {
                Some(&last) => {
                    registry.remove_at(last)?;
                    (last, 1)
                }
                None => (end, 0),
            },
        };

        for (offset, descriptor) in self.new_descriptors.iter().enumerate() {
            registry.insert(position + offset, descriptor.clone())?;
        }

        tracing::debug!(
            "Applied {} operation {} on {}: matched {}, removed {}, added {}",
            self.operation_type,
            self.operation_id,
            self.service_type,
            matches.len(),
            removed,
            self.new_descriptors.len()
        );

        Ok(OperationResult {
            operation_id: self.operation_id.clone(),
            success: true,
            error_message: None,
            matched_count: matches.len(),
            removed_count: removed,
            added_count: self.new_descriptors.len(),
        })
    }
}
