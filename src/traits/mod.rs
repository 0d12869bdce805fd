//! Core traits for the container surfaces.

mod resolver;

pub use resolver::{IocContainer, Resolver, ServiceLocator};
