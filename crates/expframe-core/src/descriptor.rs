//! Service descriptors
//!
//! A [`ServiceDescriptor`] is one registration record in a DI registry:
//! service type, how the implementation is produced, and its lifetime.

use crate::types::TypeRef;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Lifetime of a registered service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceLifetime {
    /// One instance for the container's lifetime
    Singleton,
    /// One instance per scope (typically per request)
    Scoped,
    /// New instance per resolution
    Transient,
}

impl ServiceLifetime {
    /// Display name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceLifetime::Singleton => "Singleton",
            ServiceLifetime::Scoped => "Scoped",
            ServiceLifetime::Transient => "Transient",
        }
    }
}

impl Display for ServiceLifetime {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque factory registration
///
/// The factory body lives in the host; only its name is known here, so its
/// return type cannot be checked statically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FactoryRef {
    /// Host-visible factory name
    pub name: String,
}

/// Pre-built instance registration
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceRef {
    /// Host-visible label for the instance
    pub label: String,
    /// Concrete type of the instance
    #[serde(with = "crate::types::with_facts")]
    pub runtime_type: TypeRef,
}

/// How a descriptor produces its implementation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Implementation {
    /// Container constructs this type
    Type(#[serde(with = "crate::types::with_facts")] TypeRef),
    /// Container calls a factory
    Factory(FactoryRef),
    /// Container hands out a pre-built instance
    Instance(InstanceRef),
}

impl Display for Implementation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Implementation::Type(ty) => write!(f, "{ty}"),
            Implementation::Factory(factory) => write!(f, "factory:{}", factory.name),
            Implementation::Instance(instance) => {
                write!(f, "instance:{} ({})", instance.label, instance.runtime_type)
            }
        }
    }
}

/// One registration record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDescriptor {
    #[serde(with = "crate::types::with_facts")]
    service_type: TypeRef,
    implementation: Implementation,
    lifetime: ServiceLifetime,
}

impl ServiceDescriptor {
    /// Create descriptor
    #[must_use]
    pub fn new(service_type: TypeRef, implementation: Implementation, lifetime: ServiceLifetime) -> Self {
        Self {
            service_type,
            implementation,
            lifetime,
        }
    }

    /// Type registration with singleton lifetime
    #[must_use]
    pub fn singleton(service_type: TypeRef, implementation_type: TypeRef) -> Self {
        Self::new(
            service_type,
            Implementation::Type(implementation_type),
            ServiceLifetime::Singleton,
        )
    }

    /// Type registration with scoped lifetime
    #[must_use]
    pub fn scoped(service_type: TypeRef, implementation_type: TypeRef) -> Self {
        Self::new(
            service_type,
            Implementation::Type(implementation_type),
            ServiceLifetime::Scoped,
        )
    }

    /// Type registration with transient lifetime
    #[must_use]
    pub fn transient(service_type: TypeRef, implementation_type: TypeRef) -> Self {
        Self::new(
            service_type,
            Implementation::Type(implementation_type),
            ServiceLifetime::Transient,
        )
    }

    /// Factory registration
    #[must_use]
    pub fn factory(service_type: TypeRef, name: impl Into<String>, lifetime: ServiceLifetime) -> Self {
        Self::new(
            service_type,
            Implementation::Factory(FactoryRef { name: name.into() }),
            lifetime,
        )
    }

    /// Instance registration (always singleton)
    #[must_use]
    pub fn instance(service_type: TypeRef, label: impl Into<String>, runtime_type: TypeRef) -> Self {
        Self::new(
            service_type,
            Implementation::Instance(InstanceRef {
                label: label.into(),
                runtime_type,
            }),
            ServiceLifetime::Singleton,
        )
    }

    /// Service type
    #[inline]
    #[must_use]
    pub fn service_type(&self) -> &TypeRef {
        &self.service_type
    }

    /// Implementation source
    #[inline]
    #[must_use]
    pub fn implementation(&self) -> &Implementation {
        &self.implementation
    }

    /// Lifetime
    #[inline]
    #[must_use]
    pub fn lifetime(&self) -> ServiceLifetime {
        self.lifetime
    }

    /// Concrete type behind this registration, if known
    ///
    /// Static type for type registrations, runtime type for instances,
    /// `None` for factories.
    #[must_use]
    pub fn implementation_type(&self) -> Option<&TypeRef> {
        match &self.implementation {
            Implementation::Type(ty) => Some(ty),
            Implementation::Instance(instance) => Some(&instance.runtime_type),
            Implementation::Factory(_) => None,
        }
    }

    /// Whether the descriptor is backed by a factory
    #[inline]
    #[must_use]
    pub fn is_factory(&self) -> bool {
        matches!(self.implementation, Implementation::Factory(_))
    }
}

impl Display for ServiceDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} ({})",
            self.service_type, self.implementation, self.lifetime
        )
    }
}
