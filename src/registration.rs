//! Registration types: recipes, interfaces and the per-container registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::lifetime::LifetimeScope;
use crate::reflect::{AnyArc, Body};

pub(crate) type CastFn = Arc<dyn Fn(&AnyArc) -> Option<AnyArc> + Send + Sync>;

/// Identity of one registered target.
///
/// Every call to `register` produces a fresh id. Caches are keyed by it, so all
/// interfaces of one registration share one instance per cache, and a child
/// container never sees a parent's entry under a colliding key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct TargetId(u64);

impl TargetId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        TargetId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// An interface a registration is exposed under.
///
/// Rust has no runtime "implements" check, so the coercion from the concrete
/// type to the trait object is supplied at registration time:
///
/// ```rust
/// use ferrous_ioc::{Container, Interface, RegisterOptions, Resolver};
/// use std::sync::Arc;
///
/// trait Store: Send + Sync {
///     fn name(&self) -> &'static str;
/// }
/// struct MemoryStore;
/// impl Store for MemoryStore {
///     fn name(&self) -> &'static str { "memory" }
/// }
///
/// let container = Container::new();
/// container
///     .register_with(
///         || MemoryStore,
///         [RegisterOptions::new().interface(Interface::new::<MemoryStore, dyn Store>(|s| s))],
///     )
///     .unwrap();
///
/// assert_eq!(container.get_required::<dyn Store>().name(), "memory");
/// // Value targets stay reachable under their own type as well.
/// assert!(container.get::<MemoryStore>().is_ok());
/// ```
#[derive(Clone)]
pub struct Interface {
    key: Key,
    source: Key,
    cast: CastFn,
}

impl Interface {
    /// Declares that instances of `R` are exposed as `I`.
    pub fn new<R, I>(cast: fn(Arc<R>) -> Arc<I>) -> Self
    where
        R: ?Sized + Send + Sync + 'static,
        I: ?Sized + Send + Sync + 'static,
    {
        Self {
            key: Key::of::<I>(),
            source: Key::of::<R>(),
            cast: Arc::new(move |instance: &AnyArc| {
                let concrete = instance.downcast_ref::<Arc<R>>()?;
                Some(Arc::new(cast(concrete.clone())) as AnyArc)
            }),
        }
    }

    /// The identity consumers ask for.
    pub fn key(&self) -> Key {
        self.key
    }

    /// The type the cast accepts.
    pub fn source(&self) -> Key {
        self.source
    }
}

impl fmt::Debug for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interface")
            .field("key", &self.key)
            .field("source", &self.source)
            .finish()
    }
}

/// Optional settings for a single registration.
///
/// ```rust
/// use ferrous_ioc::{Interface, LifetimeScope, RegisterOptions};
///
/// trait Clock: Send + Sync {}
/// struct SystemClock;
/// impl Clock for SystemClock {}
///
/// let options = RegisterOptions::new()
///     .lifetime_scope(LifetimeScope::ContainerManaged)
///     .interface(Interface::new::<SystemClock, dyn Clock>(|c| c));
/// assert_eq!(options.interfaces().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RegisterOptions {
    lifetime_scope: Option<LifetimeScope>,
    interfaces: Vec<Interface>,
}

impl RegisterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lifetime for factory targets. Ignored for constants.
    pub fn lifetime_scope(mut self, scope: LifetimeScope) -> Self {
        self.lifetime_scope = Some(scope);
        self
    }

    /// Adds an interface the target is exposed under.
    pub fn interface(mut self, interface: Interface) -> Self {
        self.interfaces.push(interface);
        self
    }

    pub fn interfaces(&self) -> &[Interface] {
        &self.interfaces
    }

    pub fn scope(&self) -> Option<LifetimeScope> {
        self.lifetime_scope
    }

    /// Collapses the caller-supplied options list, which may hold at most one value.
    pub(crate) fn single(options: impl IntoIterator<Item = RegisterOptions>) -> DiResult<RegisterOptions> {
        let mut options: Vec<RegisterOptions> = options.into_iter().collect();
        match options.len() {
            0 => Ok(RegisterOptions::default()),
            1 => Ok(options.remove(0)),
            n => Err(DiError::MultipleOptionsNotAllowed(n)),
        }
    }
}

/// How to construct one registered target.
pub(crate) struct TargetRecipe {
    pub(crate) id: TargetId,
    pub(crate) own: Key,
    pub(crate) parameters: Vec<Key>,
    pub(crate) body: Body,
    pub(crate) lifetime: LifetimeScope,
}

impl TargetRecipe {
    pub(crate) fn new(own: Key, parameters: Vec<Key>, body: Body, lifetime: LifetimeScope) -> Self {
        Self {
            id: TargetId::next(),
            own,
            parameters,
            body,
            lifetime,
        }
    }

    pub(crate) fn is_factory(&self) -> bool {
        matches!(self.body, Body::Factory(_))
    }
}

/// One registry binding: a shared target plus the view it is exposed as.
#[derive(Clone)]
pub(crate) struct Recipe {
    pub(crate) target: Arc<TargetRecipe>,
    /// `None` when bound under the target's own type.
    pub(crate) expose: Option<CastFn>,
}

impl Recipe {
    pub(crate) fn own(target: Arc<TargetRecipe>) -> Self {
        Self { target, expose: None }
    }

    pub(crate) fn exposed(target: Arc<TargetRecipe>, interface: &Interface) -> Self {
        Self {
            target,
            expose: Some(interface.cast.clone()),
        }
    }

    /// Turns a cached target instance into the bound view.
    pub(crate) fn view(&self, instance: AnyArc, key: &Key) -> DiResult<AnyArc> {
        match &self.expose {
            None => Ok(instance),
            Some(cast) => cast(&instance).ok_or(DiError::TypeMismatch(key.display_name())),
        }
    }
}

/// Bindings of one container, keyed by the type consumers ask for.
pub(crate) struct Registry {
    /// Fast Vec lookup for the first few bindings
    small: Vec<(Key, Recipe)>,
    /// HashMap fallback for the rest
    large: HashMap<Key, Recipe>,
    small_threshold: usize,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            small: Vec::new(),
            large: HashMap::new(),
            small_threshold: 16,
        }
    }

    /// Binds `key`, returning the recipe it replaced.
    pub(crate) fn insert(&mut self, key: Key, recipe: Recipe) -> Option<Recipe> {
        if let Some(slot) = self.small.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(&mut slot.1, recipe));
        }
        if self.small.len() < self.small_threshold && !self.large.contains_key(&key) {
            self.small.push((key, recipe));
            return None;
        }
        self.large.insert(key, recipe)
    }

    #[inline]
    pub(crate) fn get(&self, key: &Key) -> Option<&Recipe> {
        for (k, recipe) in &self.small {
            if k == key {
                return Some(recipe);
            }
        }
        self.large.get(key)
    }

    #[inline]
    pub(crate) fn contains_key(&self, key: &Key) -> bool {
        self.get(key).is_some()
    }

    /// True if any binding still points at the target.
    pub(crate) fn references(&self, id: TargetId) -> bool {
        self.iter().any(|(_, recipe)| recipe.target.id == id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&Key, &Recipe)> {
        self.small.iter().map(|(k, r)| (k, r)).chain(self.large.iter())
    }

    /// Bound keys, sorted by display name for stable output.
    pub(crate) fn keys_by_name(&self) -> Vec<Key> {
        let mut keys: Vec<Key> = self.iter().map(|(k, _)| *k).collect();
        keys.sort_by(|a, b| a.display_name().cmp(b.display_name()).then(a.cmp(b)));
        keys
    }

    pub(crate) fn len(&self) -> usize {
        self.small.len() + self.large.len()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.keys_by_name()).finish()
    }
}
