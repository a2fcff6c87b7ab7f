//! Testing utilities for the ExperimentFramework workspace
//!
//! Shared fixtures and a fault-injecting registry.

#![allow(missing_docs)]

use expframe_core::{
    ExperimentDefinition, RegistryError, SelectionMode, ServiceCollection, ServiceDescriptor,
    ServiceRegistry, TrialImplementation, TypeRef,
};

pub fn pricing_service() -> TypeRef {
    TypeRef::new("Shop.Pricing", "IPricingService")
}

pub fn default_pricing() -> TypeRef {
    TypeRef::new("Shop.Pricing", "DefaultPricing").implements(&pricing_service())
}

pub fn discount_pricing() -> TypeRef {
    TypeRef::new("Shop.Pricing", "DiscountPricing").implements(&pricing_service())
}

pub fn notifier_service() -> TypeRef {
    TypeRef::new("Shop.Notify", "INotifier")
}

pub fn notifier(name: &str) -> TypeRef {
    TypeRef::new("Shop.Notify", name).implements(&notifier_service())
}

pub fn clock_service() -> TypeRef {
    TypeRef::new("Shop", "IClock")
}

pub fn system_clock() -> TypeRef {
    TypeRef::new("Shop", "SystemClock").implements(&clock_service())
}

pub fn repository_service() -> TypeRef {
    TypeRef::open_generic("Shop.Data", "IRepository", 1)
}

pub fn sql_repository() -> TypeRef {
    TypeRef::open_generic("Shop.Data", "SqlRepository", 1).implements(&repository_service())
}

/// One scoped `IPricingService -> DefaultPricing`
pub fn pricing_registry() -> ServiceCollection {
    ServiceCollection::new().with(ServiceDescriptor::scoped(pricing_service(), default_pricing()))
}

/// Pricing (scoped), clock (singleton), two notifiers (singleton)
pub fn shop_registry() -> ServiceCollection {
    ServiceCollection::new()
        .with(ServiceDescriptor::scoped(pricing_service(), default_pricing()))
        .with(ServiceDescriptor::singleton(clock_service(), system_clock()))
        .with(ServiceDescriptor::singleton(notifier_service(), notifier("EmailNotifier")))
        .with(ServiceDescriptor::singleton(notifier_service(), notifier("SmsNotifier")))
        .with(ServiceDescriptor::scoped(repository_service(), sql_repository()))
}

/// `pricing-v2`: control `DefaultPricing`, condition `discount`
pub fn pricing_experiment() -> ExperimentDefinition {
    ExperimentDefinition::new(
        "pricing-v2",
        pricing_service(),
        TrialImplementation::new("control", default_pricing()),
        SelectionMode::FeatureFlag {
            flag: "PricingV2".to_string(),
        },
    )
    .with_condition(TrialImplementation::new("discount", discount_pricing()))
}

pub fn clock_experiment() -> ExperimentDefinition {
    ExperimentDefinition::new(
        "clock-skew",
        clock_service(),
        TrialImplementation::new("control", system_clock()),
        SelectionMode::ConfigurationKey {
            key: "Clock:Trial".to_string(),
        },
    )
}

/// Registry that refuses mutations on demand
///
/// Wraps a [`ServiceCollection`]. `fail_on_insert(n)` makes the n-th
/// `insert` call (1-based) fail with `Rejected`. With `break_restore`, every
/// `clear` after that fault fails too, so rollback cannot restore.
#[derive(Debug, Clone, Default)]
pub struct FaultyRegistry {
    inner: ServiceCollection,
    fail_on_insert: Option<usize>,
    inserts: usize,
    tripped: bool,
    break_restore: bool,
}

impl FaultyRegistry {
    pub fn new(inner: ServiceCollection) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn fail_on_insert(mut self, call: usize) -> Self {
        self.fail_on_insert = Some(call);
        self
    }

    #[must_use]
    pub fn break_restore(mut self) -> Self {
        self.break_restore = true;
        self
    }

    pub fn inner(&self) -> &ServiceCollection {
        &self.inner
    }

    pub fn tripped(&self) -> bool {
        self.tripped
    }
}

impl ServiceRegistry for FaultyRegistry {
    fn descriptors(&self) -> Vec<ServiceDescriptor> {
        self.inner.descriptors()
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn clear(&mut self) -> Result<(), RegistryError> {
        if self.tripped && self.break_restore {
            return Err(RegistryError::ReadOnly("restore disabled".to_string()));
        }
        self.inner.clear()
    }

    fn add(&mut self, descriptor: ServiceDescriptor) -> Result<(), RegistryError> {
        self.inner.add(descriptor)
    }

    fn insert(&mut self, index: usize, descriptor: ServiceDescriptor) -> Result<(), RegistryError> {
        self.inserts += 1;
        if self.fail_on_insert == Some(self.inserts) {
            self.tripped = true;
            return Err(RegistryError::rejected(
                descriptor.service_type().key(),
                format!("injected fault on insert #{}", self.inserts),
            ));
        }
        self.inner.insert(index, descriptor)
    }

    fn remove_at(&mut self, index: usize) -> Result<ServiceDescriptor, RegistryError> {
        self.inner.remove_at(index)
    }
}
