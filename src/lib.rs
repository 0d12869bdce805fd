//! # ferrous-ioc
//!
//! Invoke-driven inversion-of-control container for Rust.
//!
//! ## Features
//!
//! - **Factories and constants**: register plain functions or closures whose
//!   parameters are resolved by type, or ready-made instances
//! - **Two lifetime scopes**: one instance per container, or one per `invoke` call
//! - **Interfaces**: expose a registration as one or more `dyn Trait` types
//! - **Child containers**: extend a parent's bindings without touching it
//! - **Eager verification**: resolve every binding up front with `verify`
//! - **Thread-safe**: containers are cheap `Send + Sync` handles
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_ioc::{Constant, Container, LifetimeScope, RegisterOptions};
//! use std::sync::Arc;
//!
//! struct Settings {
//!     greeting: &'static str,
//! }
//!
//! struct Greeter {
//!     settings: Arc<Settings>,
//! }
//!
//! let container = Container::new();
//! container.register(Constant::new(Settings { greeting: "hello" })).unwrap();
//! container
//!     .register_with(
//!         |settings: Arc<Settings>| Greeter { settings },
//!         [RegisterOptions::new().lifetime_scope(LifetimeScope::ContainerManaged)],
//!     )
//!     .unwrap();
//!
//! container
//!     .invoke(|greeter: Arc<Greeter>| {
//!         assert_eq!(greeter.settings.greeting, "hello");
//!     })
//!     .unwrap();
//! ```
//!
//! ## Lifetime Scopes
//!
//! - **ContainerManaged**: built on first use and kept by the container
//! - **InvokeManaged** (default for factories): built once per `invoke` call and
//!   shared by every parameter of that call that needs it
//!
//! ## Child Containers
//!
//! ```rust
//! use ferrous_ioc::{Constant, Container, Resolver};
//!
//! let root = Container::new();
//! root.register(Constant::new(String::from("root"))).unwrap();
//! root.register(Constant::new(1u32)).unwrap();
//!
//! let child = root.create_child_container();
//! child.register(Constant::new(String::from("child"))).unwrap();
//!
//! assert_eq!(*child.get_required::<String>(), "child");
//! assert_eq!(*root.get_required::<String>(), "root");
//! // misses fall through to the parent
//! assert_eq!(*child.get_required::<u32>(), 1);
//! ```
//!
//! ## Failing Invocations
//!
//! ```rust
//! use ferrous_ioc::{Constant, Container, DiError};
//! use std::sync::Arc;
//!
//! let container = Container::new();
//! container.register(Constant::new(0u32)).unwrap();
//!
//! let result = container.invoke(|divisor: Arc<u32>| {
//!     if *divisor == 0 {
//!         return Err("division by zero");
//!     }
//!     Ok(10 / *divisor)
//! });
//! assert!(matches!(result, Err(DiError::Invocation(_))));
//! ```

pub mod config;
pub mod container;
pub mod error;
pub mod key;
pub mod lifetime;
pub mod observer;
pub mod reflect;
pub mod traits;

// Internal modules
mod cache;
mod internal;
mod registration;

// Re-export core types
pub use config::{ConfigSource, ContainerOptions, EnvironmentConfigSource};
pub use container::{Container, ContainerBuilder};
pub use error::{DiError, DiResult};
pub use key::{key_of_type, Key};
pub use lifetime::LifetimeScope;
pub use observer::{DiObserver, LoggingObserver, MetricsObserver};
pub use reflect::{
    Classification, Constant, ConstantMarker, Inject, Invocable, InvokeOutput, Target, TargetKind, TypeReflector,
};
pub use registration::{Interface, RegisterOptions};
pub use traits::{IocContainer, Resolver, ServiceLocator};
