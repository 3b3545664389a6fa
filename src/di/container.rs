use crate::di::Injectable;
use crate::error::{Result, TachiError};
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::sync::Arc;

/// Factory that constructs one service, resolving its dependencies
/// through the resolver it is handed.
pub(crate) type ProviderFn = Arc<
    dyn for<'a, 'b> Fn(&'a mut Resolver<'b>) -> Result<Arc<dyn Any + Send + Sync>> + Send + Sync,
>;

/// Thread-safe provider registry.
///
/// Maps a token (the service's `TypeId`) to the factory that constructs it.
/// The registry is populated once through [`ContainerBuilder`] and only read
/// afterwards, so concurrent lookups need no further synchronization.
///
/// Resolution is always fresh: every call walks the dependency graph and
/// invokes each factory again. Applications that want singleton semantics
/// register a factory that clones a captured `Arc`.
///
/// [`ContainerBuilder`]: crate::di::ContainerBuilder
pub struct Container {
    providers: DashMap<TypeId, ProviderFn>,
}

impl Container {
    pub fn new() -> Self {
        Self {
            providers: DashMap::new(),
        }
    }

    pub(crate) fn insert<T: 'static>(&self, provider: ProviderFn) {
        self.providers.insert(TypeId::of::<T>(), provider);
    }

    /// Resolve a registered service, constructing its full dependency graph.
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        Resolver::new(self).resolve::<T>()
    }

    /// Construct an [`Injectable`] type against this container without the
    /// type itself being registered. This is how controllers are built: their
    /// dependencies come from the container, the controller does not.
    pub fn construct<T: Injectable>(&self) -> Result<T> {
        T::inject(&mut Resolver::new(self))
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.providers.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("providers", &self.providers.len())
            .finish()
    }
}

/// One depth-first construction walk over the container.
///
/// Carries the stack of tokens currently being constructed so that a
/// dependency cycle surfaces as [`TachiError::CircularDependency`] with the
/// full chain instead of recursing forever.
pub struct Resolver<'c> {
    container: &'c Container,
    visiting: Vec<(TypeId, &'static str)>,
}

impl<'c> Resolver<'c> {
    pub(crate) fn new(container: &'c Container) -> Self {
        Self {
            container,
            visiting: Vec::new(),
        }
    }

    /// Resolve one dependency by token, recursively constructing whatever it
    /// needs. A token with no provider fails fast, naming the token.
    pub fn resolve<T: Send + Sync + 'static>(&mut self) -> Result<Arc<T>> {
        let token = TypeId::of::<T>();
        let name = std::any::type_name::<T>();

        if self.visiting.iter().any(|(id, _)| *id == token) {
            let mut chain: Vec<&str> = self.visiting.iter().map(|(_, n)| *n).collect();
            chain.push(name);
            return Err(TachiError::CircularDependency {
                cycle: chain.join(" -> "),
            });
        }

        // Clone the factory out so the map guard is not held across recursion.
        let provider = {
            let entry = self
                .container
                .providers
                .get(&token)
                .ok_or(TachiError::DependencyNotFound { token: name })?;
            entry.value().clone()
        };

        self.visiting.push((token, name));
        let constructed = (provider.as_ref())(self);
        self.visiting.pop();

        constructed?
            .downcast::<T>()
            .map_err(|_| TachiError::DowncastFailed { type_name: name })
    }
}
