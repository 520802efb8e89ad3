//! Remote backend: a client for the runtime management service.
//!
//! The service speaks JSON over HTTP:
//!
//! | Operation | Request                                   |
//! |-----------|-------------------------------------------|
//! | create    | `POST /services` with service and options |
//! | delete    | `DELETE /services?name=&version=`         |
//! | list      | `GET /services`                           |
//! | read      | `GET /services?name=&version=&type=`      |
//!
//! Calls block the invoking thread on a private tokio runtime.

use std::future::Future;
use std::time::Duration;

use anyhow::Context;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use super::RuntimeBackend;
use crate::config::RemoteConfig;
use crate::types::{CreateOptions, ReadQuery, ServiceDescription};

#[derive(Debug, Serialize)]
struct CreateRequest<'a> {
    service: &'a ServiceDescription,
    options: &'a CreateOptions,
}

#[derive(Debug, Default, Deserialize)]
struct ServicesResponse {
    #[serde(default)]
    services: Vec<ServiceDescription>,
}

struct Connection {
    runtime: tokio::runtime::Runtime,
    client: Client,
    services_url: Url,
}

pub struct RemoteRuntime {
    config: RemoteConfig,
    connection: Option<Connection>,
}

impl RemoteRuntime {
    pub fn new(config: RemoteConfig) -> Self {
        Self {
            config,
            connection: None,
        }
    }

    fn connection(&self) -> anyhow::Result<&Connection> {
        self.connection
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("remote runtime is not started"))
    }

    fn block_on<'a, F, T>(&'a self, f: impl FnOnce(&'a Connection) -> F) -> anyhow::Result<T>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        let connection = self.connection()?;
        connection.runtime.block_on(f(connection))
    }

    fn fetch(&self, url: Url) -> anyhow::Result<Vec<ServiceDescription>> {
        self.block_on(|conn| async move {
            let response = conn
                .client
                .get(url.clone())
                .send()
                .await
                .with_context(|| format!("Failed to reach runtime at {url}"))?;
            let response = check(response).await?;
            let body: ServicesResponse = response
                .json()
                .await
                .context("Failed to parse runtime response")?;
            Ok(body.services)
        })
    }
}

impl RuntimeBackend for RemoteRuntime {
    fn start(&mut self) -> anyhow::Result<()> {
        if self.connection.is_some() {
            return Ok(());
        }
        let services_url = services_url(&self.config.address)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create tokio runtime: {}", e))?;
        let client = Client::builder()
            .user_agent(concat!("hoist/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        tracing::debug!(url = %services_url, "remote runtime started");
        self.connection = Some(Connection {
            runtime,
            client,
            services_url,
        });
        Ok(())
    }

    fn stop(&mut self) -> anyhow::Result<()> {
        self.connection = None;
        Ok(())
    }

    fn create(&self, service: &ServiceDescription, options: &CreateOptions) -> anyhow::Result<()> {
        let body = CreateRequest { service, options };
        self.block_on(|conn| async move {
            let response = conn
                .client
                .post(conn.services_url.clone())
                .json(&body)
                .send()
                .await
                .with_context(|| format!("Failed to reach runtime at {}", conn.services_url))?;
            check(response).await?;
            Ok(())
        })?;
        tracing::info!(service = %service.name, "service created on remote runtime");
        Ok(())
    }

    fn delete(&self, service: &ServiceDescription) -> anyhow::Result<()> {
        let query = ReadQuery::new()
            .with_service(service.name.clone())
            .with_version(service.version.clone());
        let url = with_query(&self.connection()?.services_url, &query);
        self.block_on(|conn| async move {
            let response = conn
                .client
                .delete(url.clone())
                .send()
                .await
                .with_context(|| format!("Failed to reach runtime at {url}"))?;
            check(response).await?;
            Ok(())
        })?;
        tracing::info!(service = %service.name, "service deleted on remote runtime");
        Ok(())
    }

    fn list(&self) -> anyhow::Result<Vec<ServiceDescription>> {
        let url = self.connection()?.services_url.clone();
        self.fetch(url)
    }

    fn read(&self, query: &ReadQuery) -> anyhow::Result<Vec<ServiceDescription>> {
        let url = with_query(&self.connection()?.services_url, query);
        self.fetch(url)
    }
}

fn services_url(address: &str) -> anyhow::Result<Url> {
    let mut base =
        Url::parse(address).with_context(|| format!("Invalid runtime address: {address}"))?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("services")
        .with_context(|| format!("Invalid runtime address: {address}"))
}

fn with_query(base: &Url, query: &ReadQuery) -> Url {
    let mut url = base.clone();
    {
        let mut pairs = url.query_pairs_mut();
        if let Some(name) = &query.service {
            pairs.append_pair("name", name);
        }
        if let Some(version) = &query.version {
            pairs.append_pair("version", version);
        }
        if let Some(kind) = &query.kind {
            pairs.append_pair("type", kind);
        }
    }
    if url.query() == Some("") {
        url.set_query(None);
    }
    url
}

/// Turn a non-success response into an error carrying the runtime's message.
async fn check(response: Response) -> anyhow::Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message =
        error_message(&body).unwrap_or_else(|| format!("runtime returned HTTP {status}"));
    anyhow::bail!("{message}")
}

fn error_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body)
        && let Some(Value::String(message)) = map.get("error")
    {
        return Some(message.clone());
    }
    Some(body.to_string())
}
