//! The recursive resolution engine.

use std::sync::Arc;
use std::time::Instant;

use crate::cache::InstanceCache;
use crate::error::{DiError, DiResult};
use crate::internal::PathGuard;
use crate::key::Key;
use crate::lifetime::LifetimeScope;
use crate::reflect::{AnyArc, Body};
use crate::registration::{Recipe, TargetRecipe};
use crate::traits::{IocContainer, ServiceLocator};

use super::Container;

/// State of one top-level request (`invoke`, `verify` or an ad-hoc `get`).
///
/// Owns the invocation-scoped cache. Lookups delegated to a parent container
/// carry the same resolution along.
pub(crate) struct Resolution {
    scope: Arc<InstanceCache>,
}

impl Resolution {
    pub(crate) fn new() -> Self {
        Self {
            scope: Arc::new(InstanceCache::new()),
        }
    }

    /// Number of invoke-managed instances built so far.
    pub(crate) fn scoped_instances(&self) -> usize {
        self.scope.len()
    }
}

impl Container {
    /// Resolves `key` through this container, notifying observers.
    pub(crate) fn resolve(&self, key: &Key, resolution: &mut Resolution) -> DiResult<AnyArc> {
        let observers = &self.inner.observers;
        let started = observers.has_observers().then(|| {
            observers.resolving(key);
            Instant::now()
        });

        let result = self.lookup(key, resolution);

        match &result {
            Ok(_) => {
                tracing::trace!(container = %self.inner.name, key = %key, depth = PathGuard::depth(), "resolved");
                if let Some(started) = started {
                    observers.resolved(key, started.elapsed());
                }
            }
            Err(err) => {
                if PathGuard::depth() == 0 {
                    tracing::warn!(container = %self.inner.name, key = %key, error = %err, "resolution failed");
                }
                if started.is_some() {
                    observers.resolution_failed(key, err);
                }
            }
        }
        result
    }

    /// Resolves each key in order, stopping at the first failure.
    pub(crate) fn resolve_all(&self, keys: &[Key], resolution: &mut Resolution) -> DiResult<Vec<AnyArc>> {
        let mut resolved = Vec::with_capacity(keys.len());
        for key in keys {
            resolved.push(self.resolve(key, resolution)?);
        }
        Ok(resolved)
    }

    fn lookup(&self, key: &Key, resolution: &mut Resolution) -> DiResult<AnyArc> {
        if let Some(this) = self.self_surface(key) {
            return Ok(this);
        }

        // clone out so no registry lock is held while factories run
        let recipe = self.inner.registry.read().get(key).cloned();
        match recipe {
            Some(recipe) => self.instantiate(key, &recipe, resolution),
            None => match &self.inner.parent {
                Some(parent) => parent.lookup(key, resolution),
                None => Err(DiError::UnresolvableType(*key)),
            },
        }
    }

    fn self_surface(&self, key: &Key) -> Option<AnyArc> {
        if *key == Key::of::<Container>() {
            Some(Arc::new(Arc::new(self.clone())) as AnyArc)
        } else if *key == Key::of::<dyn IocContainer>() {
            Some(Arc::new(Arc::new(self.clone()) as Arc<dyn IocContainer>) as AnyArc)
        } else if *key == Key::of::<dyn ServiceLocator>() {
            Some(Arc::new(Arc::new(self.clone()) as Arc<dyn ServiceLocator>) as AnyArc)
        } else {
            None
        }
    }

    fn instantiate(&self, key: &Key, recipe: &Recipe, resolution: &mut Resolution) -> DiResult<AnyArc> {
        let target = &recipe.target;
        let frame = PathGuard::enter(*key, target.id)?;

        let instance = match target.lifetime {
            LifetimeScope::ContainerManaged => self.inner.instances.get_or_try_init(target.id, || {
                let instance = self.construct(target, resolution)?;
                // re-registered while building: drop the slot nothing binds anymore
                if !self.inner.registry.read().references(target.id) {
                    self.inner.instances.evict(target.id);
                }
                Ok(instance)
            }),
            LifetimeScope::InvokeManaged => {
                let scope = resolution.scope.clone();
                scope.get_or_try_init(target.id, || self.construct(target, resolution))
            }
        };

        drop(frame);
        recipe.view(instance?, key)
    }

    fn construct(&self, target: &TargetRecipe, resolution: &mut Resolution) -> DiResult<AnyArc> {
        match &target.body {
            Body::Constant(value) => Ok(value.clone()),
            Body::Factory(factory) => {
                tracing::trace!(container = %self.inner.name, target = %target.own, lifetime = %target.lifetime, "constructing");
                let arguments = self.resolve_all(&target.parameters, resolution)?;
                factory(&arguments)
            }
        }
    }
}
