use crate::di::container::{Container, ProviderFn, Resolver};
use crate::di::Injectable;
use crate::error::Result;
use std::any::Any;
use std::sync::Arc;

/// Builder for the provider registry.
///
/// Register every service before building; the resulting [`Container`] is
/// read-only and handed to [`App::builder`](crate::app::App::builder).
///
/// # Example
/// ```rust,ignore
/// let container = ContainerBuilder::new()
///     .provide::<ChildService>()
///     .provide::<MyService>()
///     .provide_with(|_| Ok(HttpClient::new(timeout)))
///     .build();
/// ```
pub struct ContainerBuilder {
    container: Container,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self {
            container: Container::new(),
        }
    }

    /// Register a type whose [`Injectable`] impl is its own factory.
    pub fn provide<T: Injectable>(self) -> Self {
        self.provide_with(|resolver: &mut Resolver<'_>| T::inject(resolver))
    }

    /// Register a hand-written factory, for services that need runtime
    /// configuration on top of (or instead of) resolved dependencies.
    pub fn provide_with<T, F>(self, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: for<'a, 'b> Fn(&'a mut Resolver<'b>) -> Result<T> + Send + Sync + 'static,
    {
        let provider: ProviderFn = Arc::new(move |resolver| {
            factory(resolver).map(|instance| Arc::new(instance) as Arc<dyn Any + Send + Sync>)
        });
        self.container.insert::<T>(provider);
        tracing::debug!(token = std::any::type_name::<T>(), "provider registered");
        self
    }

    pub fn build(self) -> Container {
        self.container
    }
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
