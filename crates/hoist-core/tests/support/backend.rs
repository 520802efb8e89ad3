use std::sync::{Arc, Mutex};

use hoist_core::backend::RuntimeBackend;
use hoist_core::types::{CreateOptions, ReadQuery, ServiceDescription};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Start,
    Stop,
    Create(ServiceDescription, CreateOptions),
    Delete(ServiceDescription),
    List,
    Read(ReadQuery),
}

/// Backend double that records every call and fails on request.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    calls: Arc<Mutex<Vec<Call>>>,
    services: Vec<ServiceDescription>,
    fail_start: Option<String>,
    fail_create: Option<String>,
    fail_delete: Option<String>,
    fail_stop: Option<String>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_services(mut self, services: Vec<ServiceDescription>) -> Self {
        self.services = services;
        self
    }

    pub fn failing_start(mut self, message: &str) -> Self {
        self.fail_start = Some(message.to_string());
        self
    }

    pub fn failing_create(mut self, message: &str) -> Self {
        self.fail_create = Some(message.to_string());
        self
    }

    pub fn failing_delete(mut self, message: &str) -> Self {
        self.fail_delete = Some(message.to_string());
        self
    }

    pub fn failing_stop(mut self, message: &str) -> Self {
        self.fail_stop = Some(message.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call, failure: &Option<String>) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(call);
        match failure {
            Some(message) => anyhow::bail!("{message}"),
            None => Ok(()),
        }
    }
}

impl RuntimeBackend for RecordingBackend {
    fn start(&mut self) -> anyhow::Result<()> {
        self.record(Call::Start, &self.fail_start)
    }

    fn stop(&mut self) -> anyhow::Result<()> {
        self.record(Call::Stop, &self.fail_stop)
    }

    fn create(&self, service: &ServiceDescription, options: &CreateOptions) -> anyhow::Result<()> {
        self.record(
            Call::Create(service.clone(), options.clone()),
            &self.fail_create,
        )
    }

    fn delete(&self, service: &ServiceDescription) -> anyhow::Result<()> {
        self.record(Call::Delete(service.clone()), &self.fail_delete)
    }

    fn list(&self) -> anyhow::Result<Vec<ServiceDescription>> {
        self.record(Call::List, &None)?;
        Ok(self.services.clone())
    }

    fn read(&self, query: &ReadQuery) -> anyhow::Result<Vec<ServiceDescription>> {
        self.record(Call::Read(query.clone()), &None)?;
        Ok(self
            .services
            .iter()
            .filter(|service| query.matches(service))
            .cloned()
            .collect())
    }
}
