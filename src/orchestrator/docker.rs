//! Docker Engine API client
//!
//! Talks to the Engine over TCP. Only the three calls the deploy flow needs
//! are implemented.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use super::{
    CreateServiceOptions, NetworkSummary, Orchestrator, OrchestratorError, SecretSummary,
    ServiceCreateResponse,
};
use crate::deploy::spec::ServiceSpec;

/// Header carrying the encoded registry auth on service creation
pub const REGISTRY_AUTH_HEADER: &str = "X-Registry-Auth";

// ============================================================================
// SBIO: Pure helpers (no I/O)
// ============================================================================

/// Turn a `DOCKER_HOST` style address into an HTTP base URL.
pub fn normalize_docker_host(host: &str) -> Result<String, OrchestratorError> {
    let host = host.trim().trim_end_matches('/');
    if host.is_empty() {
        return Err(OrchestratorError::InvalidHost("empty host".to_string()));
    }

    if let Some(rest) = host.strip_prefix("tcp://") {
        Ok(format!("http://{}", rest))
    } else if host.starts_with("http://") || host.starts_with("https://") {
        Ok(host.to_string())
    } else if host.contains("://") {
        Err(OrchestratorError::InvalidHost(format!(
            "unsupported scheme in '{}', expose the Engine over tcp",
            host
        )))
    } else {
        Ok(format!("http://{}", host))
    }
}

/// Engine filter argument: `{"<key>": {"<value>": true, ...}}`
pub fn filters_arg(key: &str, values: &[&str]) -> String {
    let values: Map<String, Value> = values
        .iter()
        .map(|v| (v.to_string(), Value::Bool(true)))
        .collect();
    let mut filters = Map::new();
    filters.insert(key.to_string(), Value::Object(values));
    Value::Object(filters).to_string()
}

#[derive(Debug, Deserialize)]
struct EngineSecret {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Spec")]
    spec: EngineSecretSpec,
}

#[derive(Debug, Deserialize)]
struct EngineSecretSpec {
    #[serde(rename = "Name")]
    name: String,
}

#[derive(Debug, Deserialize)]
struct EngineErrorBody {
    message: String,
}

// ============================================================================
// SBIO: I/O implementation (real HTTP client)
// ============================================================================

#[derive(Clone)]
pub struct DockerClient {
    client: reqwest::Client,
    base_url: String,
    api_version: String,
}

impl DockerClient {
    pub fn new(host: &str, api_version: &str, timeout: Duration) -> Result<Self, OrchestratorError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OrchestratorError::Http(e.to_string()))?;

        Ok(Self {
            client,
            base_url: normalize_docker_host(host)?,
            api_version: api_version.trim_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if self.api_version.is_empty() {
            format!("{}/{}", self.base_url, path)
        } else {
            format!("{}/{}/{}", self.base_url, self.api_version, path)
        }
    }

    async fn send<T: for<'de> Deserialize<'de>>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, OrchestratorError> {
        let response = request
            .send()
            .await
            .map_err(|e| OrchestratorError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = serde_json::from_str::<EngineErrorBody>(&text)
                .map(|b| b.message)
                .unwrap_or(text);
            return Err(OrchestratorError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| OrchestratorError::Parse(e.to_string()))
    }
}

#[async_trait]
impl Orchestrator for DockerClient {
    async fn list_networks(&self, label: &str) -> Result<Vec<NetworkSummary>, OrchestratorError> {
        debug!("Listing networks with label {}", label);
        let request = self
            .client
            .get(self.url("networks"))
            .query(&[("filters", filters_arg("label", &[label]))]);
        self.send(request).await
    }

    async fn list_secrets(&self, names: &[String]) -> Result<Vec<SecretSummary>, OrchestratorError> {
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let request = self
            .client
            .get(self.url("secrets"))
            .query(&[("filters", filters_arg("name", &names))]);

        let secrets: Vec<EngineSecret> = self.send(request).await?;
        Ok(secrets
            .into_iter()
            .map(|s| SecretSummary {
                id: s.id,
                name: s.spec.name,
            })
            .collect())
    }

    async fn create_service(
        &self,
        spec: &ServiceSpec,
        options: &CreateServiceOptions,
    ) -> Result<ServiceCreateResponse, OrchestratorError> {
        let mut request = self.client.post(self.url("services/create")).json(spec);
        if let Some(auth) = &options.encoded_registry_auth {
            request = request.header(REGISTRY_AUTH_HEADER, auth);
        }
        self.send(request).await
    }
}
