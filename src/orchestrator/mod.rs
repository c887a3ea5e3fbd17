//! Orchestrator client seam
//!
//! The deploy flow talks to the orchestrator through [`Orchestrator`], so the
//! compile logic can be exercised against the in-memory `MockOrchestrator`
//! (test builds and the `test-util` feature) while the
//! binary uses the Docker Engine client in [`docker`].

pub mod docker;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::deploy::spec::ServiceSpec;

pub use docker::DockerClient;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrchestratorError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("JSON parse error: {0}")]
    Parse(String),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid Docker host: {0}")]
    InvalidHost(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSummary {
    #[serde(rename = "Id", default)]
    pub id: String,

    #[serde(rename = "Name")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecretSummary {
    pub id: String,
    pub name: String,
}

/// Options passed alongside the spec on service creation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateServiceOptions {
    /// Sent as `X-Registry-Auth`; only set when the request carried credentials
    pub encoded_registry_auth: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceCreateResponse {
    #[serde(rename = "ID", default)]
    pub id: String,

    #[serde(rename = "Warnings", default)]
    pub warnings: Option<Vec<String>>,
}

#[async_trait]
pub trait Orchestrator: Send + Sync {
    /// List networks carrying `label` (`key=value`), in listing order.
    async fn list_networks(&self, label: &str) -> Result<Vec<NetworkSummary>, OrchestratorError>;

    /// List secrets whose name matches any of `names`.
    async fn list_secrets(&self, names: &[String]) -> Result<Vec<SecretSummary>, OrchestratorError>;

    async fn create_service(
        &self,
        spec: &ServiceSpec,
        options: &CreateServiceOptions,
    ) -> Result<ServiceCreateResponse, OrchestratorError>;
}

// ============================================================================
// SBIO: Mock implementation for testing (no I/O)
// ============================================================================

#[cfg(any(test, feature = "test-util"))]
pub mod mock {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::{
        CreateServiceOptions, NetworkSummary, Orchestrator, OrchestratorError, SecretSummary,
        ServiceCreateResponse,
    };
    use crate::deploy::spec::ServiceSpec;

    /// In-memory orchestrator that records every created service
    #[derive(Default)]
    pub struct MockOrchestrator {
        pub networks: Vec<NetworkSummary>,
        pub secrets: Vec<SecretSummary>,
        pub warnings: Vec<String>,
        pub fail_networks: bool,
        pub fail_create: bool,
        created: Mutex<Vec<(ServiceSpec, CreateServiceOptions)>>,
        network_queries: Mutex<Vec<String>>,
    }

    impl MockOrchestrator {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_network(mut self, name: &str) -> Self {
            self.networks.push(NetworkSummary {
                id: format!("net-{}", name),
                name: name.to_string(),
            });
            self
        }

        pub fn with_secret(mut self, name: &str) -> Self {
            self.secrets.push(SecretSummary {
                id: format!("id-{}", name),
                name: name.to_string(),
            });
            self
        }

        pub fn with_failing_networks(mut self) -> Self {
            self.fail_networks = true;
            self
        }

        pub fn with_failing_create(mut self) -> Self {
            self.fail_create = true;
            self
        }

        pub fn with_warning(mut self, warning: &str) -> Self {
            self.warnings.push(warning.to_string());
            self
        }

        pub fn created(&self) -> Vec<(ServiceSpec, CreateServiceOptions)> {
            self.created.lock().map(|c| c.clone()).unwrap_or_default()
        }

        pub fn network_queries(&self) -> Vec<String> {
            self.network_queries
                .lock()
                .map(|q| q.clone())
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl Orchestrator for MockOrchestrator {
        async fn list_networks(&self, label: &str) -> Result<Vec<NetworkSummary>, OrchestratorError> {
            if let Ok(mut queries) = self.network_queries.lock() {
                queries.push(label.to_string());
            }
            if self.fail_networks {
                return Err(OrchestratorError::Http("connection refused".to_string()));
            }
            Ok(self.networks.clone())
        }

        async fn list_secrets(&self, names: &[String]) -> Result<Vec<SecretSummary>, OrchestratorError> {
            Ok(self
                .secrets
                .iter()
                .filter(|s| names.contains(&s.name))
                .cloned()
                .collect())
        }

        async fn create_service(
            &self,
            spec: &ServiceSpec,
            options: &CreateServiceOptions,
        ) -> Result<ServiceCreateResponse, OrchestratorError> {
            if self.fail_create {
                return Err(OrchestratorError::Api {
                    status: 409,
                    message: format!("service {} already exists", spec.name),
                });
            }
            if let Ok(mut created) = self.created.lock() {
                created.push((spec.clone(), options.clone()));
            }
            Ok(ServiceCreateResponse {
                id: format!("svc-{}", spec.name),
                warnings: (!self.warnings.is_empty()).then(|| self.warnings.clone()),
            })
        }
    }
}

#[cfg(any(test, feature = "test-util"))]
pub use mock::MockOrchestrator;
