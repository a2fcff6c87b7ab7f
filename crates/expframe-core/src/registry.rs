//! Mutable service registry seam
//!
//! [`ServiceRegistry`] is what the host DI container exposes to the plan
//! executor. [`ServiceCollection`] is the in-memory reference implementation.

use crate::descriptor::ServiceDescriptor;
use crate::error::RegistryError;
use crate::types::TypeRef;

/// Ordered, mutable collection of service descriptors owned by the host
///
/// Callers borrow a registry for the duration of one call and never retain
/// it. Implementations are not expected to be thread-safe.
pub trait ServiceRegistry {
    /// All descriptors in declaration order
    fn descriptors(&self) -> Vec<ServiceDescriptor>;

    /// Number of descriptors
    fn len(&self) -> usize;

    /// Whether the registry holds no descriptors
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every descriptor
    ///
    /// # Errors
    /// Host-specific refusal
    fn clear(&mut self) -> Result<(), RegistryError>;

    /// Append a descriptor
    ///
    /// # Errors
    /// Host-specific refusal
    fn add(&mut self, descriptor: ServiceDescriptor) -> Result<(), RegistryError>;

    /// Insert a descriptor at `index` (`index == len()` appends)
    ///
    /// # Errors
    /// `IndexOutOfRange` past the end, or a host-specific refusal
    fn insert(&mut self, index: usize, descriptor: ServiceDescriptor) -> Result<(), RegistryError>;

    /// Remove and return the descriptor at `index`
    ///
    /// # Errors
    /// `IndexOutOfRange` past the end, or a host-specific refusal
    fn remove_at(&mut self, index: usize) -> Result<ServiceDescriptor, RegistryError>;

    /// Replace the whole content by clearing and re-adding, in order
    ///
    /// # Errors
    /// First refusal from `clear` or `add`; the registry may then be partially filled
    fn replace_all(&mut self, descriptors: Vec<ServiceDescriptor>) -> Result<(), RegistryError> {
        self.clear()?;
        for descriptor in descriptors {
            self.add(descriptor)?;
        }
        Ok(())
    }
}

/// In-memory registry backed by a `Vec`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceCollection {
    descriptors: Vec<ServiceDescriptor>,
}

impl ServiceCollection {
    /// Create empty collection
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a descriptor (builder style)
    #[must_use]
    pub fn with(mut self, descriptor: ServiceDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    /// Append a descriptor
    pub fn register(&mut self, descriptor: ServiceDescriptor) -> &mut Self {
        self.descriptors.push(descriptor);
        self
    }

    /// Descriptors registered for `service_type`, in order
    ///
    /// The key is only borrowed while iterating; collected items live as
    /// long as `self`.
    pub fn services_of<'a, 'b>(
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

    /// Borrow all descriptors
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[ServiceDescriptor] {
        &self.descriptors
    }

    /// Iterate over all descriptors
    pub fn iter(&self) -> impl Iterator<Item = &ServiceDescriptor> {
        self.descriptors.iter()
    }
}

impl From<Vec<ServiceDescriptor>> for ServiceCollection {
    fn from(descriptors: Vec<ServiceDescriptor>) -> Self {
        Self { descriptors }
    }
}

impl FromIterator<ServiceDescriptor> for ServiceCollection {
    fn from_iter<I: IntoIterator<Item = ServiceDescriptor>>(iter: I) -> Self {
        Self {
            descriptors: iter.into_iter().collect(),
        }
    }
}

impl ServiceRegistry for ServiceCollection {
    fn descriptors(&self) -> Vec<ServiceDescriptor> {
        self.descriptors.clone()
    }

    fn len(&self) -> usize {
        self.descriptors.len()
    }

    fn clear(&mut self) -> Result<(), RegistryError> {
        self.descriptors.clear();
        Ok(())
    }

    fn add(&mut self, descriptor: ServiceDescriptor) -> Result<(), RegistryError> {
        self.descriptors.push(descriptor);
        Ok(())
    }

    fn insert(&mut self, index: usize, descriptor: ServiceDescriptor) -> Result<(), RegistryError> {
        if index > self.descriptors.len() {
            return Err(RegistryError::IndexOutOfRange {
                index,
                len: self.descriptors.len(),
            });
        }
        self.descriptors.insert(index, descriptor);
        Ok(())
    }

    fn remove_at(&mut self, index: usize) -> Result<ServiceDescriptor, RegistryError> {
        if index >= self.descriptors.len() {
            return Err(RegistryError::IndexOutOfRange {
                index,
                len: self.descriptors.len(),
            });
        }
        Ok(self.descriptors.remove(index))
    }
}
