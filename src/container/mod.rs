//! The container: registration, invocation, hierarchy and verification.
//!
//! A [`Container`] owns one registry and one container-level instance cache.
//! Factories and constants are registered up front; work is then done by
//! [`invoke`](Container::invoke)-ing a function whose parameters the container
//! resolves, building and caching dependencies as their lifetime scopes
//! dictate.

use std::any::type_name;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;

use crate::cache::InstanceCache;
use crate::config::ContainerOptions;
use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::lifetime::LifetimeScope;
use crate::observer::{DiObserver, Observers};
use crate::reflect::{AnyArc, Construction, Inject, Invocable, Target, TargetKind, TypeReflector};
use crate::registration::{Recipe, RegisterOptions, Registry, TargetRecipe};
use crate::traits::{IocContainer, ServiceLocator};

mod resolve;

pub(crate) use resolve::Resolution;

/// Inversion-of-control container.
///
/// `Container` is a cheap handle around shared state: clones refer to the
/// same registry and caches, and the handle is `Send + Sync`.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{Container, Interface, LifetimeScope, RegisterOptions};
/// use std::sync::Arc;
///
/// trait Repository: Send + Sync {
///     fn find(&self, id: u32) -> String;
/// }
///
/// struct Database {
///     url: String,
/// }
///
/// struct UserRepository {
///     db: Arc<Database>,
/// }
///
/// impl Repository for UserRepository {
///     fn find(&self, id: u32) -> String {
///         format!("user {} from {}", id, self.db.url)
///     }
/// }
///
/// let container = Container::new();
/// container
///     .register_with(
///         || Database { url: "postgres://localhost".to_string() },
///         [RegisterOptions::new().lifetime_scope(LifetimeScope::ContainerManaged)],
///     )
///     .unwrap();
/// container
///     .register_with(
///         |db: Arc<Database>| UserRepository { db },
///         [RegisterOptions::new().interface(Interface::new::<UserRepository, dyn Repository>(|r| r))],
///     )
///     .unwrap();
///
/// container
///     .invoke(|repo: Arc<dyn Repository>| {
///         assert_eq!(repo.find(7), "user 7 from postgres://localhost");
///     })
///     .unwrap();
/// ```
pub struct Container {
    inner: Arc<ContainerInner>,
}

pub(crate) struct ContainerInner {
    name: String,
    default_scope: LifetimeScope,
    registry: RwLock<Registry>,
    instances: InstanceCache,
    // Children hold their parent alive; a parent never references its children.
    parent: Option<Container>,
    observers: Observers,
}

impl Container {
    /// Creates an empty root container with default options.
    pub fn new() -> Self {
        Self::with_options(ContainerOptions::default())
    }

    /// Creates an empty root container.
    pub fn with_options(options: ContainerOptions) -> Self {
        Self::from_parts(options, Observers::new(), None)
    }

    /// Starts a [`ContainerBuilder`].
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    fn from_parts(options: ContainerOptions, observers: Observers, parent: Option<Container>) -> Self {
        let name = options.name_or_default().to_string();
        tracing::debug!(
            container = %name,
            default_scope = %options.default_lifetime_scope,
            observers = observers.len(),
            "container created"
        );
        Self {
            inner: Arc::new(ContainerInner {
                name,
                default_scope: options.default_lifetime_scope,
                registry: RwLock::new(Registry::new()),
                instances: InstanceCache::new(),
                parent,
                observers,
            }),
        }
    }

    /// Registers a factory or [`Constant`](crate::Constant) with default options.
    ///
    /// Equivalent to `register_with(target, [])`.
    pub fn register<M, T>(&self, target: T) -> DiResult<()>
    where
        T: Target<M>,
    {
        self.register_with(target, [])
    }

    /// Registers a factory or [`Constant`](crate::Constant).
    ///
    /// `options` may hold at most one [`RegisterOptions`] value. The target is
    /// bound under every declared interface and, unless its type is a
    /// pointer-like wrapper, under its own type. A later registration for the
    /// same key replaces the earlier one and discards any instance cached for it.
    ///
    /// # Errors
    ///
    /// * [`DiError::MultipleOptionsNotAllowed`] for more than one options value
    /// * [`DiError::InvalidConstructorShape`] for factories returning `()` or a tuple
    /// * [`DiError::TypeMismatch`] for an interface whose source type is not the target's type
    /// * [`DiError::InterfaceRequiredForIndirectTarget`] when nothing could be bound
    pub fn register_with<M, T>(&self, target: T, options: impl IntoIterator<Item = RegisterOptions>) -> DiResult<()>
    where
        T: Target<M>,
    {
        let options = RegisterOptions::single(options)?;
        let classification = TypeReflector::classify(&target)?;
        let own = classification.own;

        let lifetime = if classification.is_factory() {
            options.scope().unwrap_or(self.inner.default_scope)
        } else {
            LifetimeScope::ContainerManaged
        };

        if let Some(interface) = options.interfaces().iter().find(|i| i.source() != own) {
            return Err(DiError::TypeMismatch(interface.source().display_name()));
        }

        let bind_own = classification.kind == TargetKind::Value;
        if options.interfaces().is_empty() && !bind_own {
            return Err(DiError::InterfaceRequiredForIndirectTarget(own.display_name()));
        }

        let Construction(body) = target.into_construction();
        let parameters = classification.parameters.unwrap_or_default();
        let recipe = Arc::new(TargetRecipe::new(own, parameters, body, lifetime));

        let mut registry = self.inner.registry.write();
        let mut replaced = Vec::new();
        for interface in options.interfaces() {
            replaced.extend(registry.insert(interface.key(), Recipe::exposed(recipe.clone(), interface)));
        }
        if bind_own {
            replaced.extend(registry.insert(own, Recipe::own(recipe.clone())));
        }
        for old in replaced {
            if !registry.references(old.target.id) {
                self.inner.instances.evict(old.target.id);
            }
        }
        drop(registry);

        tracing::debug!(
            container = %self.inner.name,
            target = %own,
            lifetime = %lifetime,
            factory = recipe.is_factory(),
            interfaces = options.interfaces().len(),
            "registered"
        );
        Ok(())
    }

    /// Resolves every parameter of `target` and calls it.
    ///
    /// Invoke-managed dependencies are built once for this call and dropped
    /// when it returns. A target returning `Result` fails the call with its
    /// error: a `DiError` is passed through unchanged, anything else is wrapped
    /// in [`DiError::Invocation`].
    ///
    /// # Errors
    ///
    /// * [`DiError::TargetMustBeCallable`] for a [`Constant`](crate::Constant)
    /// * [`DiError::NoResolvableParameters`] for a target without parameters
    /// * the first resolution failure among the parameters
    pub fn invoke<M, F>(&self, target: F) -> DiResult<()>
    where
        F: Invocable<M>,
    {
        if !TypeReflector::is_callable(&target) {
            return Err(DiError::TargetMustBeCallable(type_name::<F>()));
        }
        let parameters = TypeReflector::parameter_types_of(&target);
        if parameters.is_empty() {
            return Err(DiError::NoResolvableParameters);
        }

        let started = Instant::now();
        let mut resolution = Resolution::new();
        let result = self
            .resolve_all(&parameters, &mut resolution)
            .and_then(|arguments| target.call(&arguments));

        let elapsed = started.elapsed();
        tracing::debug!(
            container = %self.inner.name,
            parameters = parameters.len(),
            scoped_instances = resolution.scoped_instances(),
            ok = result.is_ok(),
            elapsed_us = elapsed.as_micros() as u64,
            "invoked"
        );
        self.inner.observers.invoked(parameters.len(), elapsed, result.is_ok());
        result
    }

    /// Creates a child container that delegates misses to this one.
    ///
    /// The child starts empty, shares nothing but observers and the default
    /// lifetime scope, and sees later registrations on this container.
    /// Registrations on the child never affect this container.
    pub fn create_child_container(&self) -> Container {
        let options = ContainerOptions {
            name: Some(format!("{}/child", self.inner.name)),
            default_lifetime_scope: self.inner.default_scope,
        };
        Self::from_parts(options, self.inner.observers.clone(), Some(self.clone()))
    }

    /// Resolves every key of this container's own registry.
    ///
    /// All resolutions share one invocation scope and run in key name order;
    /// the first failure is returned.
    pub fn verify(&self) -> DiResult<()> {
        let keys = self.inner.registry.read().keys_by_name();
        if keys.is_empty() {
            return Err(DiError::NoRegistrationsToVerify);
        }

        let mut resolution = Resolution::new();
        for key in &keys {
            self.resolve(key, &mut resolution)?;
        }
        tracing::debug!(container = %self.inner.name, verified = keys.len(), "verified");
        Ok(())
    }

    /// True if `key` is bound here or in an ancestor.
    pub fn contains(&self, key: &Key) -> bool {
        self.inner.registry.read().contains_key(key)
            || self.inner.parent.as_ref().is_some_and(|parent| parent.contains(key))
    }

    /// Keys bound in this container's own registry, sorted by type name.
    pub fn registered_keys(&self) -> Vec<Key> {
        self.inner.registry.read().keys_by_name()
    }

    pub fn parent(&self) -> Option<&Container> {
        self.inner.parent.as_ref()
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn default_lifetime_scope(&self) -> LifetimeScope {
        self.inner.default_scope
    }

    /// True if both handles refer to the same container.
    #[inline]
    pub fn ptr_eq(&self, other: &Container) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        let mut s = String::new();
        s.push_str(&format!("=== Container {} ===\n", self.inner.name));
        if let Some(parent) = &self.inner.parent {
            s.push_str(&format!("Parent: {}\n", parent.name()));
        }
        s.push_str("Bindings:\n");
        let registry = self.inner.registry.read();
        for key in registry.keys_by_name() {
            if let Some(recipe) = registry.get(&key) {
                let target = &recipe.target;
                let cached = self.inner.instances.get(target.id).is_some();
                s.push_str(&format!(
                    "  {} -> {} [{}, {}{}]\n",
                    key,
                    target.own,
                    target.lifetime,
                    if target.is_factory() { "factory" } else { "constant" },
                    if cached { ", cached" } else { "" }
                ));
            }
        }
        s
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Container {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("name", &self.inner.name)
            .field("default_scope", &self.inner.default_scope)
            .field("bindings", &self.inner.registry.read().len())
            .field("has_parent", &self.inner.parent.is_some())
            .finish()
    }
}

impl ServiceLocator for Container {
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc> {
        self.resolve(key, &mut Resolution::new())
    }

    fn verify(&self) -> DiResult<()> {
        Container::verify(self)
    }
}

impl IocContainer for Container {
    fn create_child_container(&self) -> Container {
        Container::create_child_container(self)
    }
}

/// Lets factories and invocation targets take the container by value.
impl Inject for Container {
    fn key() -> Key {
        Key::of::<Container>()
    }

    fn from_instance(instance: &AnyArc) -> DiResult<Self> {
        instance
            .downcast_ref::<Arc<Container>>()
            .map(|container| Container::clone(container))
            .ok_or(DiError::TypeMismatch(type_name::<Container>()))
    }
}

/// Builder for root containers.
///
/// ```
/// use ferrous_ioc::{Container, LifetimeScope, MetricsObserver};
/// use std::sync::Arc;
///
/// let metrics = Arc::new(MetricsObserver::new());
/// let container = Container::builder()
///     .name("jobs")
///     .default_lifetime_scope(LifetimeScope::ContainerManaged)
///     .observer(metrics.clone())
///     .build();
///
/// let child = container.create_child_container();
/// assert_eq!(child.name(), "jobs/child");
/// assert_eq!(child.default_lifetime_scope(), LifetimeScope::ContainerManaged);
/// ```
#[derive(Default)]
pub struct ContainerBuilder {
    options: ContainerOptions,
    observers: Observers,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces all options at once.
    pub fn options(mut self, options: ContainerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.options.name = Some(name.into());
        self
    }

    pub fn default_lifetime_scope(mut self, scope: LifetimeScope) -> Self {
        self.options.default_lifetime_scope = scope;
        self
    }

    /// Attaches an observer; children of the built container inherit it.
    pub fn observer(mut self, observer: Arc<dyn DiObserver>) -> Self {
        self.observers.add(observer);
        self
    }

    pub fn build(self) -> Container {
        Container::from_parts(self.options, self.observers, None)
    }
}
