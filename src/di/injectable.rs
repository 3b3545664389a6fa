use crate::di::Resolver;
use crate::error::Result;

/// Constructor-injection contract.
///
/// A type lists its dependencies by resolving them in `inject`; the resolver
/// walks the container depth-first and hands back fully-constructed instances.
///
/// # Example
/// ```rust,ignore
/// struct MyService {
///     child: Arc<ChildService>,
/// }
///
/// impl Injectable for MyService {
///     fn inject(resolver: &mut Resolver<'_>) -> tachi::Result<Self> {
///         Ok(Self {
///             child: resolver.resolve()?,
///         })
///     }
/// }
/// ```
pub trait Injectable: Sized + Send + Sync + 'static {
    /// Create an instance by resolving dependencies from the container.
    ///
    /// # Errors
    /// Fails if a dependency has no provider or the graph is cyclic.
    fn inject(resolver: &mut Resolver<'_>) -> Result<Self>;
}
