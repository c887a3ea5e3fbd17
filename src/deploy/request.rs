//! Inbound deployment request
//!
//! JSON shape of an OpenFaaS `CreateFunctionRequest`. Map-valued fields keep
//! the order they had in the request document.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::error::DeployError;

/// Memory and CPU hints for one resource group (limits or requests)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct FunctionResources {
    /// Human-readable size, e.g. "128m"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,

    /// CPU quantity in nano-units, e.g. "500000000"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<String>,
}

/// A function deployment as submitted by a client
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRequest {
    /// Name of the service to create
    pub service: String,

    /// Container image reference
    pub image: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,

    /// Overrides the watchdog process (`fprocess`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_process: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_vars: Option<IndexMap<String, String>>,

    /// Placement constraints, e.g. "node.role == worker"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Vec<String>>,

    /// Names of orchestrator secrets to mount
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secrets: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<IndexMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<IndexMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<FunctionResources>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests: Option<FunctionResources>,

    #[serde(default)]
    pub read_only_root_filesystem: bool,

    /// Base64 of "user:password" for a private registry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_auth: Option<String>,
}

impl DeploymentRequest {
    pub fn new(service: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            image: image.into(),
            ..Default::default()
        }
    }

    /// Parse a request body.
    pub fn from_slice(body: &[u8]) -> Result<Self, DeployError> {
        serde_json::from_slice(body).map_err(|e| DeployError::InvalidRequestBody(e.to_string()))
    }

    /// Network named by the request, ignoring empty strings
    pub fn requested_network(&self) -> Option<&str> {
        self.network.as_deref().filter(|n| !n.is_empty())
    }

    /// Registry credentials, ignoring empty strings
    pub fn registry_auth(&self) -> Option<&str> {
        self.registry_auth.as_deref().filter(|a| !a.is_empty())
    }

    pub fn secret_names(&self) -> &[String] {
        self.secrets.as_deref().unwrap_or_default()
    }
}
