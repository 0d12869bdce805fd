//! Shared fixtures: a small service graph with per-instance ids.
#![allow(dead_code)]

use ferrous_ioc::{Container, Interface, LifetimeScope, RegisterOptions};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::SeqCst)
}

pub trait Service1: Send + Sync {
    fn id(&self) -> u64;
    fn name(&self) -> &'static str;
}

pub trait Service2: Send + Sync {
    fn id(&self) -> u64;
    fn name(&self) -> &'static str;
}

pub trait Service3: Send + Sync {
    fn id(&self) -> u64;
    fn name(&self) -> &'static str;
}

pub trait NestedService: Send + Sync {
    fn id(&self) -> u64;
    fn name(&self) -> &'static str;
    fn service1(&self) -> Arc<dyn Service1>;
    fn service2(&self) -> Arc<dyn Service2>;
}

pub trait UseCase: Send + Sync {
    fn id(&self) -> u64;
    fn name(&self) -> &'static str;
    fn nested_service(&self) -> Arc<dyn NestedService>;
    fn service1(&self) -> Arc<dyn Service1>;
}

macro_rules! leaf_service {
    ($ty:ident, $iface:ident, $name:literal) => {
        pub struct $ty {
            id: u64,
        }

        impl $ty {
            pub fn new() -> Self {
                Self { id: next_id() }
            }
        }

        impl $iface for $ty {
            fn id(&self) -> u64 {
                self.id
            }

            fn name(&self) -> &'static str {
                $name
            }
        }
    };
}

leaf_service!(Service1Impl, Service1, "service1");
leaf_service!(Service2Impl, Service2, "service2");
leaf_service!(Service3Impl, Service3, "service3");

pub struct NestedServiceImpl {
    id: u64,
    service1: Arc<dyn Service1>,
    service2: Arc<dyn Service2>,
}

impl NestedService for NestedServiceImpl {
    fn id(&self) -> u64 {
        self.id
    }

    fn name(&self) -> &'static str {
        "nestedService"
    }

    fn service1(&self) -> Arc<dyn Service1> {
        self.service1.clone()
    }

    fn service2(&self) -> Arc<dyn Service2> {
        self.service2.clone()
    }
}

pub struct UseCaseImpl {
    id: u64,
    nested_service: Arc<dyn NestedService>,
    service1: Arc<dyn Service1>,
}

impl UseCase for UseCaseImpl {
    fn id(&self) -> u64 {
        self.id
    }

    fn name(&self) -> &'static str {
        "useCase"
    }

    fn nested_service(&self) -> Arc<dyn NestedService> {
        self.nested_service.clone()
    }

    fn service1(&self) -> Arc<dyn Service1> {
        self.service1.clone()
    }
}

pub fn new_service1() -> Service1Impl {
    Service1Impl::new()
}

pub fn new_service2() -> Service2Impl {
    Service2Impl::new()
}

pub fn new_service3() -> Service3Impl {
    Service3Impl::new()
}

pub fn new_nested_service(service1: Arc<dyn Service1>, service2: Arc<dyn Service2>) -> NestedServiceImpl {
    NestedServiceImpl {
        id: next_id(),
        service1,
        service2,
    }
}

pub fn new_use_case(nested_service: Arc<dyn NestedService>, service1: Arc<dyn Service1>) -> UseCaseImpl {
    UseCaseImpl {
        id: next_id(),
        nested_service,
        service1,
    }
}

pub fn as_service1() -> Interface {
    Interface::new::<Service1Impl, dyn Service1>(|s| s)
}

pub fn as_service2() -> Interface {
    Interface::new::<Service2Impl, dyn Service2>(|s| s)
}

pub fn as_service3() -> Interface {
    Interface::new::<Service3Impl, dyn Service3>(|s| s)
}

pub fn as_nested_service() -> Interface {
    Interface::new::<NestedServiceImpl, dyn NestedService>(|s| s)
}

pub fn as_use_case() -> Interface {
    Interface::new::<UseCaseImpl, dyn UseCase>(|s| s)
}

/// Service1 per invocation, Service2 per container.
pub fn register_services(container: &Container) {
    container
        .register_with(new_service1, [RegisterOptions::new().interface(as_service1())])
        .unwrap();
    container
        .register_with(
            new_service2,
            [RegisterOptions::new()
                .lifetime_scope(LifetimeScope::ContainerManaged)
                .interface(as_service2())],
        )
        .unwrap();
}
