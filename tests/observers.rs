/// Observer integration: metrics, event order, inheritance and tracing output

mod common;

use common::*;
use ferrous_ioc::{
    Constant, Container, DiError, DiObserver, Key, LoggingObserver, MetricsObserver, RegisterOptions, Resolver,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
}

impl Recorder {
    fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}

fn short(key: &Key) -> &'static str {
    let name = key.display_name();
    name.rsplit("::").next().unwrap_or(name)
}

impl DiObserver for Recorder {
    fn resolving(&self, key: &Key) {
        self.events.lock().unwrap().push(format!("resolving {}", short(key)));
    }

    fn resolved(&self, key: &Key, _duration: Duration) {
        self.events.lock().unwrap().push(format!("resolved {}", short(key)));
    }

    fn resolution_failed(&self, key: &Key, _error: &DiError) {
        self.events.lock().unwrap().push(format!("failed {}", short(key)));
    }

    fn invoked(&self, parameters: usize, _duration: Duration, succeeded: bool) {
        self.events
            .lock()
            .unwrap()
            .push(format!("invoked {} {}", parameters, succeeded));
    }
}

fn register_nested(container: &Container) {
    container
        .register_with(new_nested_service, [RegisterOptions::new().interface(as_nested_service())])
        .unwrap();
}

#[test]
fn test_metrics_count_nested_resolutions() {
    let metrics = Arc::new(MetricsObserver::new());
    let container = Container::builder().observer(metrics.clone()).build();
    register_services(&container);
    register_nested(&container);

    container.invoke(|_n: Arc<dyn NestedService>| {}).unwrap();

    assert_eq!(metrics.resolution_count(), 3);
    assert_eq!(metrics.failure_count(), 0);
    assert_eq!(metrics.invocation_count(), 1);
    assert!(metrics.average_resolution_time().is_some());
}

#[test]
fn test_metrics_count_failures() {
    let metrics = Arc::new(MetricsObserver::new());
    let container = Container::builder().observer(metrics.clone()).build();
    register_nested(&container);

    let err = container.invoke(|_n: Arc<dyn NestedService>| {}).unwrap_err();
    assert!(matches!(err, DiError::UnresolvableType(_)));

    // the missing dependency and the service that needed it
    assert_eq!(metrics.failure_count(), 2);
    assert_eq!(metrics.resolution_count(), 0);
    assert_eq!(metrics.invocation_count(), 1);
}

#[test]
fn test_event_order() {
    let recorder = Arc::new(Recorder::default());
    let container = Container::builder().observer(recorder.clone()).build();
    register_services(&container);
    register_nested(&container);

    container.invoke(|_n: Arc<dyn NestedService>| {}).unwrap();

    assert_eq!(
        recorder.take(),
        vec![
            "resolving NestedService",
            "resolving Service1",
            "resolved Service1",
            "resolving Service2",
            "resolved Service2",
            "resolved NestedService",
            "invoked 1 true",
        ]
    );
}

#[test]
fn test_failed_target_is_reported_as_failed_invocation() {
    let recorder = Arc::new(Recorder::default());
    let container = Container::builder().observer(recorder.clone()).build();
    container.register(Constant::new(3u8)).unwrap();

    let result = container.invoke(|_n: Arc<u8>| -> Result<(), String> { Err("declined".to_string()) });
    assert!(matches!(result, Err(DiError::Invocation(_))));
    assert_eq!(recorder.take(), vec!["resolving u8", "resolved u8", "invoked 1 false"]);
}

#[test]
fn test_rejected_invocations_are_not_observed() {
    let metrics = Arc::new(MetricsObserver::new());
    let container = Container::builder().observer(metrics.clone()).build();

    assert!(container.invoke(|| {}).is_err());
    assert!(container.invoke(Constant::new(1u8)).is_err());
    assert_eq!(metrics.invocation_count(), 0);
}

#[test]
fn test_children_inherit_observers() {
    let metrics = Arc::new(MetricsObserver::new());
    let parent = Container::builder().observer(metrics.clone()).build();
    register_services(&parent);

    let child = parent.create_child_container();
    child.register(Constant::new(1u8)).unwrap();
    child.invoke(|_s: Arc<dyn Service2>, _n: Arc<u8>| {}).unwrap();

    // a delegated lookup is observed once, by the child
    assert_eq!(metrics.resolution_count(), 2);
    assert_eq!(metrics.invocation_count(), 1);
}

#[test]
fn test_ad_hoc_lookups_are_observed() {
    let metrics = Arc::new(MetricsObserver::new());
    let container = Container::builder().observer(metrics.clone()).build();
    container.register(Constant::new(1u8)).unwrap();

    assert!(container.get::<u8>().is_ok());
    assert!(container.get::<u16>().is_err());
    assert_eq!(metrics.resolution_count(), 1);
    assert_eq!(metrics.failure_count(), 1);
    assert_eq!(metrics.invocation_count(), 0);
}

#[test]
fn test_logging_observer_with_subscriber() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();

    let container = Container::builder()
        .name("logged")
        .observer(Arc::new(LoggingObserver::with_prefix("test")))
        .build();
    register_services(&container);

    container.invoke(|_s: Arc<dyn Service1>| {}).unwrap();
    assert!(container.invoke(|_s: Arc<dyn Service3>| {}).is_err());
}
