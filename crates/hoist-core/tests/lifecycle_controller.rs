//! Lifecycle controller tests

mod support;

use hoist_core::error::Error;
use hoist_core::lifecycle::LifecycleController;
use hoist_core::types::{ExecCommand, ExecutionEnvironment, ReadQuery, ServiceDescription};

use support::backend::{Call, RecordingBackend};

#[test]
fn read_without_filters_lists() {
    let backend = RecordingBackend::new().with_services(vec![ServiceDescription::new("api")]);
    let controller = LifecycleController::new(&backend);

    let services = controller.read(&ReadQuery::new()).expect("read");

    assert_eq!(services.len(), 1);
    assert_eq!(backend.calls(), vec![Call::List]);
}

#[test]
fn read_with_kind_only_filters() {
    let backend = RecordingBackend::new().with_services(vec![ServiceDescription::new("api")]);
    let controller = LifecycleController::new(&backend);
    let query = ReadQuery::new().with_kind("runtime");

    let services = controller.read(&query).expect("read");

    assert!(services.is_empty());
    assert_eq!(backend.calls(), vec![Call::Read(query)]);
}

#[test]
fn create_passes_command_and_env_through() {
    let backend = RecordingBackend::new();
    let controller = LifecycleController::new(&backend);
    let service = ServiceDescription::new("api").with_source("github.com/acme/api");
    let command = ExecCommand::new(vec!["go".into(), "run".into(), "github.com/acme/api".into()]);
    let env = ExecutionEnvironment::from(vec!["A=1".to_string(), "A=2".to_string()]);

    controller
        .create(&service, command.clone(), env.clone())
        .expect("create");

    let calls = backend.calls();
    let Call::Create(created, options) = &calls[0] else {
        panic!("expected create");
    };
    assert_eq!(created, &service);
    assert!(created.metadata.is_empty());
    assert_eq!(options.command, command);
    assert_eq!(options.env, env);
}

#[test]
fn delete_errors_are_not_retried() {
    let backend = RecordingBackend::new().failing_delete("boom");
    let controller = LifecycleController::new(&backend);

    let err = controller
        .delete(&ServiceDescription::new("api"))
        .unwrap_err();

    assert!(matches!(err, Error::BackendOperation(_)));
    assert_eq!(backend.calls().len(), 1);
}
