//! Immutable service graph snapshots
//!
//! A [`ServiceGraphSnapshot`] is captured once per plan-build cycle and never
//! mutated afterwards. Validators reason over it instead of the live registry.

use crate::descriptor::ServiceDescriptor;
use crate::registry::ServiceRegistry;
use crate::types::TypeRef;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Point-in-time capture of every registered descriptor
#[derive(Debug, Clone)]
pub struct ServiceGraphSnapshot {
    snapshot_id: String,
    timestamp: DateTime<Utc>,
    descriptors: Vec<ServiceDescriptor>,
    fingerprint: String,
}

impl ServiceGraphSnapshot {
    /// Capture the registry's current descriptors in declaration order
    ///
    /// Read-only with respect to the registry. O(n) in descriptor count.
    pub fn capture<R: ServiceRegistry + ?Sized>(registry: &R) -> Self {
        Self::capture_at(registry, Utc::now())
    }

    /// Capture with a caller-supplied timestamp
    pub fn capture_at<R: ServiceRegistry + ?Sized>(registry: &R, timestamp: DateTime<Utc>) -> Self {
        let mut snapshot = Self::from_descriptors(registry.descriptors());
        snapshot.timestamp = timestamp;
        tracing::debug!(
            "Captured snapshot {}: {} descriptors, fingerprint {}",
            snapshot.snapshot_id,
            snapshot.descriptors.len(),
            snapshot.fingerprint
        );
        snapshot
    }

    /// Build a snapshot from an explicit descriptor list
    #[must_use]
    pub fn from_descriptors(descriptors: Vec<ServiceDescriptor>) -> Self {
        let fingerprint = Self::compute_fingerprint(&descriptors);
        Self {
            snapshot_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            descriptors,
            fingerprint,
        }
    }

    /// `"{count}:{sorted distinct service type keys joined by comma}"`
    ///
    /// For change detection only. Closed generic keys contain `", "`
    /// (`Shop.IMap<Shop.Key, Shop.Value>`), so the string cannot be split
    /// back into service names; use [`distinct_service_types`](Self::distinct_service_types).
    #[must_use]
    pub fn compute_fingerprint(descriptors: &[ServiceDescriptor]) -> String {
        let names: BTreeSet<String> = descriptors
            .iter()
            .map(|d| d.service_type().key())
            .collect();
        let joined: Vec<String> = names.into_iter().collect();
        format!("{}:{}", descriptors.len(), joined.join(","))
    }

    /// Opaque snapshot identifier
    #[inline]
    #[must_use]
    pub fn snapshot_id(&self) -> &str {
        &self.snapshot_id
    }

    /// Capture time
    #[inline]
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Captured descriptors, duplicates included
    #[inline]
    #[must_use]
    pub fn descriptors(&self) -> &[ServiceDescriptor] {
        &self.descriptors
    }

    /// Number of captured descriptors
    #[inline]
    #[must_use]
    pub fn descriptor_count(&self) -> usize {
        self.descriptors.len()
    }

    /// Deterministic content summary
    #[inline]
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Descriptors registered for `service_type`, in order
    ///
    /// The key is only borrowed while iterating; collected items live as
    /// long as `self`.
    pub fn descriptors_for<'a, 'b>(
        &'a self,
        service_type: &'b TypeRef,
    ) -> impl Iterator<Item = &'a ServiceDescriptor> + 'b
    where
        'a: 'b,
    {
        self.descriptors
            .iter()
            .filter(move |d| d.service_type() == service_type)
    }

    /// Whether at least one descriptor exists for `service_type`
    #[must_use]
    pub fn contains_service(&self, service_type: &TypeRef) -> bool {
        self.descriptors_for(service_type).next().is_some()
    }

    /// Distinct service types, sorted
    #[must_use]
    pub fn distinct_service_types(&self) -> Vec<&TypeRef> {
        let set: BTreeSet<&TypeRef> = self.descriptors.iter().map(ServiceDescriptor::service_type).collect();
        set.into_iter().collect()
    }
}
