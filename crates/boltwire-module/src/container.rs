//! A minimal host container: typed providers resolved by type.
//!
//! The container stands in for a dependency-injection host. It keeps every
//! provider in registration order, which is the order discovery walks them.

use std::any::{Any, TypeId, type_name};
use std::sync::Arc;

use boltwire_core::Instance;
use parking_lot::RwLock;

use crate::error::ContainerError;

/// A registered provider.
#[derive(Clone)]
pub struct ProviderEntry {
    pub type_id: TypeId,
    pub type_name: &'static str,
    pub instance: Instance,
}

impl ProviderEntry {
    pub fn new<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            instance: value,
        }
    }

    fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.instance).downcast::<T>().ok()
    }
}

impl std::fmt::Debug for ProviderEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderEntry")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// Typed provider registry, one instance per type.
#[derive(Default)]
pub struct Container {
    providers: RwLock<Vec<ProviderEntry>>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `value` as the provider for `T`.
    pub fn register<T: Any + Send + Sync>(&self, value: T) -> Arc<T> {
        let value = Arc::new(value);
        self.register_arc(Arc::clone(&value));
        value
    }

    /// Registers a shared instance as the provider for `T`.
    ///
    /// A provider already registered for `T` is replaced in place and keeps
    /// its position.
    pub fn register_arc<T: Any + Send + Sync>(&self, value: Arc<T>) {
        self.insert(ProviderEntry::new(value));
    }

    pub(crate) fn insert(&self, entry: ProviderEntry) {
        let mut providers = self.providers.write();
        match providers.iter_mut().find(|p| p.type_id == entry.type_id) {
            Some(existing) => *existing = entry,
            None => providers.push(entry),
        }
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.providers
            .read()
            .iter()
            .find(|p| p.type_id == TypeId::of::<T>())
            .and_then(ProviderEntry::downcast::<T>)
    }

    /// Like [`get`](Self::get), failing with [`ContainerError::MissingProvider`].
    pub fn resolve<T: Any + Send + Sync>(&self) -> Result<Arc<T>, ContainerError> {
        self.get().ok_or(ContainerError::MissingProvider {
            type_name: type_name::<T>(),
        })
    }

    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.contains_id(TypeId::of::<T>())
    }

    fn contains_id(&self, type_id: TypeId) -> bool {
        self.providers.read().iter().any(|p| p.type_id == type_id)
    }

    fn entry(&self, dependency: &Dependency) -> Result<ProviderEntry, ContainerError> {
        self.providers
            .read()
            .iter()
            .find(|p| p.type_id == dependency.type_id)
            .cloned()
            .ok_or(ContainerError::MissingProvider {
                type_name: dependency.type_name,
            })
    }

    /// Snapshot of every provider, in registration order.
    pub fn providers(&self) -> Vec<ProviderEntry> {
        self.providers.read().clone()
    }

    pub fn len(&self) -> usize {
        self.providers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.read().is_empty()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.providers.read().iter().map(|p| p.type_name))
            .finish()
    }
}

// =============================================================================
// Dependencies
// =============================================================================

/// A dependency declared by an options factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependency {
    type_id: TypeId,
    type_name: &'static str,
}

impl Dependency {
    pub fn of<T: Any + Send + Sync>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

/// Dependencies resolved for an options factory, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Injected {
    values: Vec<ProviderEntry>,
}

impl Injected {
    /// Resolves every dependency, failing on the first missing one.
    pub fn resolve(container: &Container, dependencies: &[Dependency]) -> Result<Self, ContainerError> {
        let values = dependencies
            .iter()
            .map(|dependency| container.entry(dependency))
            .collect::<Result<_, _>>()?;
        Ok(Self { values })
    }

    /// Returns the injected instance of `T`.
    pub fn get<T: Any + Send + Sync>(&self) -> Result<Arc<T>, ContainerError> {
        self.values
            .iter()
            .find(|p| p.type_id == TypeId::of::<T>())
            .and_then(ProviderEntry::downcast::<T>)
            .ok_or(ContainerError::MissingProvider {
                type_name: type_name::<T>(),
            })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Config(&'static str);

    #[derive(Debug)]
    struct Greeter;

    #[test]
    fn test_register_and_resolve() {
        let container = Container::new();
        container.register(Config("a"));

        assert!(container.contains::<Config>());
        assert_eq!(*container.resolve::<Config>().unwrap(), Config("a"));
        assert!(container.get::<Greeter>().is_none());
    }

    #[test]
    fn test_missing_provider_names_type() {
        let container = Container::new();
        let err = container.resolve::<Greeter>().unwrap_err();
        assert!(err.to_string().contains("Greeter"));
    }

    #[test]
    fn test_replacing_keeps_registration_order() {
        let container = Container::new();
        container.register(Config("a"));
        container.register(Greeter);
        container.register(Config("b"));

        let names: Vec<_> = container.providers().iter().map(|p| p.type_name).collect();
        assert_eq!(names.len(), 2);
        assert!(names[0].ends_with("Config"));
        assert_eq!(*container.resolve::<Config>().unwrap(), Config("b"));
    }

    #[test]
    fn test_injected_resolution() {
        let container = Container::new();
        container.register(Config("a"));

        let injected = Injected::resolve(&container, &[Dependency::of::<Config>()]).unwrap();
        assert_eq!(injected.len(), 1);
        assert_eq!(*injected.get::<Config>().unwrap(), Config("a"));
        assert!(injected.get::<Greeter>().is_err());

        let missing = Injected::resolve(&container, &[Dependency::of::<Greeter>()]);
        assert!(matches!(missing, Err(ContainerError::MissingProvider { .. })));
    }
}
