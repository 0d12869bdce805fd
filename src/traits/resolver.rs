//! Locator and container traits.

use std::any::Any;
use std::sync::Arc;

use crate::container::Container;
use crate::error::DiResult;
use crate::key::Key;
use crate::reflect::Inject;

/// Object-safe resolution surface of a container.
///
/// Every call runs in its own fresh invocation scope: invoke-managed
/// instances built for one `resolve_any` are never seen by another.
///
/// Invocation is not part of this trait. `invoke` is generic over the target's
/// parameter list, which no object-safe method can express; code that needs to
/// invoke depends on [`Container`] itself, which resolves like any other
/// parameter.
///
/// ```
/// use ferrous_ioc::{Constant, Container};
/// use std::sync::Arc;
///
/// struct Job;
///
/// let container = Container::new();
/// container.register(Constant::new(5u8)).unwrap();
/// container
///     .register(|c: Container| {
///         c.invoke(|n: Arc<u8>| assert_eq!(*n, 5)).unwrap();
///         Job
///     })
///     .unwrap();
/// container.invoke(|_job: Arc<Job>| {}).unwrap();
/// ```
///
/// Factories can depend on `Arc<dyn ServiceLocator>` to look things up lazily:
///
/// ```
/// use ferrous_ioc::{Constant, Container, Key, Resolver, ServiceLocator};
/// use std::sync::Arc;
///
/// struct Lazy {
///     locator: Arc<dyn ServiceLocator>,
/// }
///
/// let container = Container::new();
/// container.register(Constant::new(3u32)).unwrap();
/// container.register(|locator: Arc<dyn ServiceLocator>| Lazy { locator }).unwrap();
///
/// let lazy = container.get_required::<Lazy>();
/// assert_eq!(*lazy.locator.get_required::<u32>(), 3);
/// assert!(lazy.locator.resolve_any(&Key::of::<u64>()).is_err());
/// ```
pub trait ServiceLocator: Send + Sync {
    /// Resolves `key` to its type-erased instance.
    ///
    /// The returned value holds an `Arc<T>` for the type `T` the key denotes.
    fn resolve_any(&self, key: &Key) -> DiResult<Arc<dyn Any + Send + Sync>>;

    /// Resolves every binding of the container's own registry.
    fn verify(&self) -> DiResult<()>;
}

/// Hierarchy surface of a container.
pub trait IocContainer: ServiceLocator {
    /// Creates a child that delegates misses to this container.
    fn create_child_container(&self) -> Container;
}

/// Typed resolution helpers for every [`ServiceLocator`].
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{Constant, Container, Resolver};
///
/// let container = Container::new();
/// container.register(Constant::new("configuration".to_string())).unwrap();
///
/// let config = container.get::<String>().unwrap();
/// assert_eq!(&*config, "configuration");
/// assert!(container.get::<u8>().is_err());
/// ```
pub trait Resolver: ServiceLocator {
    /// Resolves `T`, which may be a concrete type or a `dyn Trait` interface.
    fn get<T>(&self) -> DiResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let any = self.resolve_any(&Key::of::<T>())?;
        <Arc<T> as Inject>::from_instance(&any)
    }

    /// Resolves `T`, panicking on failure.
    fn get_required<T>(&self) -> Arc<T>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.get::<T>()
            .unwrap_or_else(|e| panic!("Failed to resolve {}: {}", std::any::type_name::<T>(), e))
    }
}

impl<L: ServiceLocator + ?Sized> Resolver for L {}
