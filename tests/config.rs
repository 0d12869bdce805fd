/// Container options from code, the environment and JSON

use ferrous_ioc::{Container, ContainerOptions, DiError, LifetimeScope, Resolver};
use serial_test::serial;
use std::env;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct EnvGuard(&'static [&'static str]);

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for key in self.0 {
            env::remove_var(key);
        }
    }
}

#[test]
#[serial]
fn test_options_from_env() {
    let _guard = EnvGuard(&["IOCTEST_NAME", "IOCTEST_DEFAULT_SCOPE"]);
    env::set_var("IOCTEST_NAME", "orders");
    env::set_var("IOCTEST_DEFAULT_SCOPE", "container");

    let options = ContainerOptions::from_env("ioctest").unwrap();
    assert_eq!(options.name.as_deref(), Some("orders"));
    assert_eq!(options.default_lifetime_scope, LifetimeScope::ContainerManaged);

    let container = Container::with_options(options);
    assert_eq!(container.name(), "orders");
    assert_eq!(container.create_child_container().name(), "orders/child");
}

#[test]
#[serial]
fn test_options_from_empty_env() {
    let _guard = EnvGuard(&["IOCTEST_NAME", "IOCTEST_DEFAULT_SCOPE"]);
    env::remove_var("IOCTEST_NAME");
    env::remove_var("IOCTEST_DEFAULT_SCOPE");

    let options = ContainerOptions::from_env("ioctest").unwrap();
    assert_eq!(options, ContainerOptions::default());
    assert_eq!(Container::with_options(options).name(), ContainerOptions::DEFAULT_NAME);
}

#[test]
#[serial]
fn test_invalid_scope_in_env() {
    let _guard = EnvGuard(&["IOCTEST_DEFAULT_SCOPE"]);
    env::set_var("IOCTEST_DEFAULT_SCOPE", "per-request");

    let err = ContainerOptions::from_env("ioctest").unwrap_err();
    assert!(matches!(err, DiError::InvalidConfig(_)));
    assert!(err.to_string().contains("per-request"));
}

#[test]
fn test_default_scope_drives_factories() {
    struct Cache;

    let built = Arc::new(AtomicUsize::new(0));
    let counter = built.clone();

    let container = Container::with_options(ContainerOptions {
        name: None,
        default_lifetime_scope: LifetimeScope::ContainerManaged,
    });
    container
        .register(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Cache
        })
        .unwrap();

    let first = container.get_required::<Cache>();
    let second = container.get_required::<Cache>();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(built.load(Ordering::SeqCst), 1);
}

#[test]
fn test_child_inherits_default_scope() {
    let parent = Container::builder()
        .default_lifetime_scope(LifetimeScope::ContainerManaged)
        .build();
    let child = parent.create_child_container();
    assert_eq!(child.default_lifetime_scope(), LifetimeScope::ContainerManaged);

    child.register(|| 5u64).unwrap();
    let a = child.get_required::<u64>();
    let b = child.get_required::<u64>();
    assert!(Arc::ptr_eq(&a, &b));
}

#[cfg(feature = "config")]
#[test]
fn test_options_from_json() {
    let options =
        ContainerOptions::from_json_str(r#"{"name": "jobs", "default_lifetime_scope": "ContainerManaged"}"#)
            .unwrap();
    assert_eq!(options.name.as_deref(), Some("jobs"));
    assert_eq!(options.default_lifetime_scope, LifetimeScope::ContainerManaged);

    let partial = ContainerOptions::from_json_str("{}").unwrap();
    assert_eq!(partial, ContainerOptions::default());

    let err = ContainerOptions::from_json_str(r#"{"default_lifetime_scope": "Forever"}"#).unwrap_err();
    assert!(matches!(err, DiError::InvalidConfig(_)));
}
