//! Lifetime scopes controlling instance caching.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::error::DiError;

/// Lifetime scope of a registration
///
/// Decides which cache holds the instances a recipe produces.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{Container, LifetimeScope, RegisterOptions};
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// static BUILT: AtomicUsize = AtomicUsize::new(0);
///
/// struct Pool;
/// fn new_pool() -> Pool {
///     BUILT.fetch_add(1, Ordering::SeqCst);
///     Pool
/// }
///
/// let container = Container::new();
/// container
///     .register_with(new_pool, [RegisterOptions::new().lifetime_scope(LifetimeScope::ContainerManaged)])
///     .unwrap();
///
/// container.invoke(|_a: Arc<Pool>| {}).unwrap();
/// container.invoke(|_b: Arc<Pool>| {}).unwrap();
/// assert_eq!(BUILT.load(Ordering::SeqCst), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
pub enum LifetimeScope {
    /// One instance per container, cached for the container's lifetime
    ///
    /// The first resolution through a container builds the instance; every
    /// later resolution through the same container returns it. Constants are
    /// always container-managed.
    ContainerManaged,
    /// One instance per `invoke` call
    ///
    /// Parameters of the same invocation that need the same type share one
    /// instance; separate invocations get fresh ones.
    #[default]
    InvokeManaged,
}

impl LifetimeScope {
    /// Short lowercase label used in logs and configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            LifetimeScope::ContainerManaged => "container",
            LifetimeScope::InvokeManaged => "invoke",
        }
    }
}

impl fmt::Display for LifetimeScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifetimeScope {
    type Err = DiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "container" | "containermanaged" | "container_managed" => Ok(LifetimeScope::ContainerManaged),
            "invoke" | "invokemanaged" | "invoke_managed" => Ok(LifetimeScope::InvokeManaged),
            other => Err(DiError::InvalidConfig(format!("unknown lifetime scope '{}'", other))),
        }
    }
}
