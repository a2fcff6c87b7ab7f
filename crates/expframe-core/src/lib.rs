//! ExperimentFramework Core
//!
//! The data model the registration-plan subsystem reasons over:
//! - Type identities with explicit assignability facts
//! - Service descriptors and the mutable registry seam
//! - Immutable service graph snapshots
//! - Experiment definitions and declarative configuration
//!
//! # Example
//!
//! ```rust
//! use expframe_core::{ServiceCollection, ServiceDescriptor, ServiceGraphSnapshot, TypeRef};
//!
//! let service = TypeRef::new("Shop.Pricing", "IPricingService");
//! let implementation = TypeRef::new("Shop.Pricing", "DefaultPricing").implements(&service);
//!
//! let registry = ServiceCollection::new()
//!     .with(ServiceDescriptor::scoped(service.clone(), implementation));
//!
//! let snapshot = ServiceGraphSnapshot::capture(&registry);
//! assert_eq!(snapshot.fingerprint(), "1:Shop.Pricing.IPricingService");
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

pub mod config;
pub mod descriptor;
pub mod error;
pub mod experiment;
pub mod registry;
pub mod snapshot;
pub mod types;

pub use config::{
    ExperimentConfig, MultiRegistrationBehavior, RegistrationSettings, ServiceRegistration,
    ValidationMode,
};
pub use descriptor::{FactoryRef, Implementation, InstanceRef, ServiceDescriptor, ServiceLifetime};
pub use error::{ConfigError, DefinitionError, RegistryError, TypeParseError};
pub use experiment::{ExperimentDefinition, SelectionMode, TrialImplementation};
pub use registry::{ServiceCollection, ServiceRegistry};
pub use snapshot::ServiceGraphSnapshot;
pub use types::{GenericShape, TypeRef};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
