//! Service spec assembly
//!
//! [`SpecCompiler`] turns a [`DeploymentRequest`] into a complete
//! [`ServiceSpec`]. It is synchronous and does no I/O: secrets and the
//! default network are resolved by the caller and passed in.

use indexmap::IndexMap;

use super::diagnostics::{Diagnostic, Diagnostics};
use super::error::DeployError;
use super::labels::build_labels;
use super::request::DeploymentRequest;
use super::resources::build_resources;
use super::spec::{
    ContainerSpec, Mount, NetworkAttachment, Placement, RestartCondition, RestartPolicy,
    SecretReference, ServiceMode, ServiceSpec, TaskSpec,
};
use crate::config::DeployConfig;

/// Output of a successful compile
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledSpec {
    pub spec: ServiceSpec,
    /// Non-fatal problems absorbed along the way
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone, Default)]
pub struct SpecCompiler {
    config: DeployConfig,
}

impl SpecCompiler {
    pub fn new(config: DeployConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DeployConfig {
        &self.config
    }

    /// Compile a request. `network` is the resolved default network, used
    /// only when the request names none.
    pub fn compile(
        &self,
        request: &DeploymentRequest,
        secrets: Vec<SecretReference>,
        network: Option<String>,
    ) -> Result<CompiledSpec, DeployError> {
        let mut diagnostics = Diagnostics::new();

        let labels = build_labels(
            &request.service,
            request.labels.as_ref(),
            request.annotations.as_ref(),
            &self.config,
        )?;

        let resources = build_resources(
            request.limits.as_ref(),
            request.requests.as_ref(),
            &mut diagnostics,
        );

        let networks = request
            .requested_network()
            .map(String::from)
            .or(network)
            .filter(|n| !n.is_empty())
            .map(|target| vec![NetworkAttachment { target }])
            .unwrap_or_default();

        let mounts = if request.read_only_root_filesystem {
            vec![Mount::tmpfs(&self.config.read_only_tmpfs_target)]
        } else {
            Vec::new()
        };

        let replicas = self.min_replicas(request, &mut diagnostics);

        let spec = ServiceSpec {
            name: request.service.clone(),
            labels: labels.clone(),
            task_template: TaskSpec {
                container_spec: ContainerSpec {
                    image: request.image.clone(),
                    labels,
                    env: self.build_env(request.env_process.as_deref(), request.env_vars.as_ref()),
                    mounts,
                    secrets,
                    read_only: request.read_only_root_filesystem,
                },
                resources,
                restart_policy: RestartPolicy {
                    condition: RestartCondition::Any,
                    delay: self.config.restart_delay(),
                    max_attempts: self.config.max_restarts,
                },
                placement: Placement {
                    constraints: self.constraints(request),
                },
                networks,
            },
            mode: ServiceMode::replicated(replicas),
        };

        Ok(CompiledSpec { spec, diagnostics })
    }

    /// Request constraints if any, otherwise the configured fallback.
    pub fn constraints(&self, request: &DeploymentRequest) -> Vec<String> {
        match &request.constraints {
            Some(constraints) if !constraints.is_empty() => constraints.clone(),
            _ => self.config.fallback_constraints.clone(),
        }
    }

    /// Process override first, then user variables in request order.
    pub fn build_env(
        &self,
        env_process: Option<&str>,
        env_vars: Option<&IndexMap<String, String>>,
    ) -> Vec<String> {
        let process = env_process
            .filter(|p| !p.is_empty())
            .map(|p| format!("{}={}", self.config.env_process_key, p));

        process
            .into_iter()
            .chain(
                env_vars
                    .into_iter()
                    .flatten()
                    .map(|(k, v)| format!("{}={}", k, v)),
            )
            .collect()
    }

    /// Replica count from the scale label, defaulting to 1.
    pub fn min_replicas(&self, request: &DeploymentRequest, diagnostics: &mut Diagnostics) -> u64 {
        let value = request
            .labels
            .as_ref()
            .and_then(|labels| labels.get(&self.config.scale_min_label));

        match value {
            None => 1,
            Some(v) => v.parse::<u64>().unwrap_or_else(|e| {
                diagnostics.push(Diagnostic::InvalidScaleLabel {
                    value: v.clone(),
                    reason: e.to_string(),
                });
                1
            }),
        }
    }
}
