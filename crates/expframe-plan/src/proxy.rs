//! Experiment proxy naming convention
//!
//! Proxies are recognised by name alone: a type is a proxy when its name
//! ends in [`PROXY_TYPE_SUFFIX`] or its namespace lies under
//! [`FRAMEWORK_NAMESPACE`].

use expframe_core::{GenericShape, TypeRef};

/// Name suffix carried by every generated proxy type
pub const PROXY_TYPE_SUFFIX: &str = "ExperimentProxy";

/// Root namespace of framework-owned types
pub const FRAMEWORK_NAMESPACE: &str = "ExperimentFramework";

/// Namespace the builder places placeholder proxies in
pub const PROXY_NAMESPACE: &str = "ExperimentFramework.Proxies";

/// Whether `ty` follows the proxy naming convention
#[must_use]
pub fn is_experiment_proxy(ty: &TypeRef) -> bool {
    ty.name().ends_with(PROXY_TYPE_SUFFIX) || ty.namespace().contains(FRAMEWORK_NAMESPACE)
}

/// Placeholder proxy type standing in for `service_type`
///
/// Same generic shape as the service, declared assignable to it.
#[must_use]
pub fn proxy_type_for(service_type: &TypeRef) -> TypeRef {
    let generic: GenericShape = service_type.generic().clone();
    TypeRef::with_generic(
        PROXY_NAMESPACE,
        format!("{}{PROXY_TYPE_SUFFIX}", service_type.name()),
        generic,
    )
    .implements(service_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proxy_naming() {
        let service = TypeRef::new("Shop.Pricing", "IPricingService");
        let proxy = proxy_type_for(&service);

        assert_eq!(
            proxy.key(),
            "ExperimentFramework.Proxies.IPricingServiceExperimentProxy"
        );
        assert!(proxy.is_assignable_to(&service));
        assert!(is_experiment_proxy(&proxy));
    }

    #[test]
    fn proxy_keeps_generic_shape() {
        let service = TypeRef::open_generic("Shop.Data", "IRepository", 1);
        let proxy = proxy_type_for(&service);
        assert!(proxy.is_open_generic());
        assert_eq!(proxy.generic_arity(), 1);
        assert!(proxy.is_assignable_to(&service));
    }

    #[test]
    fn detection_by_suffix_or_namespace() {
        assert!(is_experiment_proxy(&TypeRef::new("Shop", "PricingExperimentProxy")));
        assert!(is_experiment_proxy(&TypeRef::new("Acme.ExperimentFramework.Gen", "Pricing")));
        assert!(!is_experiment_proxy(&TypeRef::new("Shop.Pricing", "DefaultPricing")));
    }
}
