//! Compile-and-submit sequence for one deployment

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::auth::build_encoded_auth_config;
use super::compiler::{CompiledSpec, SpecCompiler};
use super::diagnostics::{Diagnostic, Diagnostics};
use super::error::DeployError;
use super::network::resolve_network;
use super::request::DeploymentRequest;
use super::secrets::resolve_secrets;
use crate::config::DeployConfig;
use crate::orchestrator::{CreateServiceOptions, Orchestrator};

/// Result of a submitted deployment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeployOutcome {
    pub service_id: String,
    pub warnings: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

// ============================================================================
// SBIO: Pure compile path (no I/O)
// ============================================================================

/// Encoded registry auth, when the request carries credentials.
pub fn registry_auth(
    request: &DeploymentRequest,
    config: &DeployConfig,
) -> Result<Option<String>, DeployError> {
    request
        .registry_auth()
        .map(|auth| build_encoded_auth_config(auth, &request.image, &config.default_registry_namespace))
        .transpose()
        .map_err(DeployError::from)
}

/// Compile without an orchestrator. Secrets and the default network are
/// left unresolved.
pub fn compile_only(
    compiler: &SpecCompiler,
    request: &DeploymentRequest,
) -> Result<(CompiledSpec, CreateServiceOptions), DeployError> {
    let encoded_registry_auth = registry_auth(request, compiler.config())?;
    let compiled = compiler.compile(request, Vec::new(), None)?;
    Ok((
        compiled,
        CreateServiceOptions {
            encoded_registry_auth,
        },
    ))
}

// ============================================================================
// SBIO: I/O wrapper over the orchestrator
// ============================================================================

/// Runs auth, secret and network resolution, compiles the spec and submits
/// it. Orchestrator calls are made once, without retry.
#[derive(Clone)]
pub struct Deployer {
    orchestrator: Arc<dyn Orchestrator>,
    compiler: SpecCompiler,
}

impl Deployer {
    pub fn new(orchestrator: Arc<dyn Orchestrator>, config: DeployConfig) -> Self {
        Self {
            orchestrator,
            compiler: SpecCompiler::new(config),
        }
    }

    pub fn config(&self) -> &DeployConfig {
        self.compiler.config()
    }

    pub fn registry_auth(&self, request: &DeploymentRequest) -> Result<Option<String>, DeployError> {
        registry_auth(request, self.config())
    }

    pub async fn deploy(&self, request: &DeploymentRequest) -> Result<DeployOutcome, DeployError> {
        let encoded_registry_auth = self.registry_auth(request)?;

        let secrets = resolve_secrets(
            self.orchestrator.as_ref(),
            request.secret_names(),
            &self.config().secret_mount_dir,
        )
        .await?;

        let mut lookup = Diagnostics::new();
        let network = match request.requested_network() {
            Some(_) => None,
            None => {
                resolve_network(
                    self.orchestrator.as_ref(),
                    &self.config().network_label,
                    &mut lookup,
                )
                .await
            }
        };

        let CompiledSpec {
            spec,
            diagnostics: compile_diagnostics,
        } = self.compiler.compile(request, secrets, network)?;

        let options = CreateServiceOptions {
            encoded_registry_auth,
        };
        let response = self.orchestrator.create_service(&spec, &options).await?;

        let warnings = response.warnings.unwrap_or_default();
        for warning in &warnings {
            warn!("Service {} created with warning: {}", spec.name, warning);
        }
        info!("Deployed service {} ({})", spec.name, response.id);

        lookup.extend(compile_diagnostics);
        Ok(DeployOutcome {
            service_id: response.id,
            warnings,
            diagnostics: lookup.into_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::MockOrchestrator;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;

    fn deployer(mock: Arc<MockOrchestrator>) -> Deployer {
        Deployer::new(mock, DeployConfig::default())
    }

    #[tokio::test]
    async fn test_deploy_resolves_default_network() {
        let mock = Arc::new(MockOrchestrator::new().with_network("func_functions"));
        let request = DeploymentRequest::new("fn", "alice/fn");

        let outcome = deployer(mock.clone()).deploy(&request).await.unwrap();

        assert_eq!(outcome.service_id, "svc-fn");
        let created = mock.created();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].0.task_template.networks[0].target, "func_functions");
        assert_eq!(created[0].1.encoded_registry_auth, None);
    }

    #[tokio::test]
    async fn test_explicit_network_skips_lookup() {
        let mock = Arc::new(MockOrchestrator::new().with_network("func_functions"));
        let mut request = DeploymentRequest::new("fn", "alice/fn");
        request.network = Some("mine".to_string());

        deployer(mock.clone()).deploy(&request).await.unwrap();

        assert!(mock.network_queries().is_empty());
        assert_eq!(mock.created()[0].0.task_template.networks[0].target, "mine");
    }

    #[tokio::test]
    async fn test_network_failure_is_diagnostic() {
        let mock = Arc::new(MockOrchestrator::new().with_failing_networks());
        let request = DeploymentRequest::new("fn", "alice/fn");

        let outcome = deployer(mock.clone()).deploy(&request).await.unwrap();

        assert!(mock.created()[0].0.task_template.networks.is_empty());
        assert!(matches!(
            outcome.diagnostics.first(),
            Some(Diagnostic::NetworkLookupFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_registry_auth_passed_to_create() {
        let mock = Arc::new(MockOrchestrator::new());
        let mut request = DeploymentRequest::new("fn", "alice/fn");
        request.registry_auth = Some(STANDARD.encode("alice:secret"));

        deployer(mock.clone()).deploy(&request).await.unwrap();

        let options = &mock.created()[0].1;
        assert!(options.encoded_registry_auth.is_some());
    }

    #[tokio::test]
    async fn test_auth_failure_submits_nothing() {
        let mock = Arc::new(MockOrchestrator::new().with_network("func_functions"));
        let mut request = DeploymentRequest::new("fn", "alice/fn");
        request.registry_auth = Some(STANDARD.encode("no-colon"));

        let result = deployer(mock.clone()).deploy(&request).await;

        assert!(matches!(result, Err(DeployError::RegistryAuth(_))));
        assert!(mock.created().is_empty());
        assert!(mock.network_queries().is_empty());
    }

    #[tokio::test]
    async fn test_missing_secret_aborts() {
        let mock = Arc::new(MockOrchestrator::new());
        let mut request = DeploymentRequest::new("fn", "alice/fn");
        request.secrets = Some(vec!["api-key".to_string()]);

        let result = deployer(mock.clone()).deploy(&request).await;

        assert!(matches!(result, Err(DeployError::SecretsResolution(_))));
        assert!(mock.created().is_empty());
    }

    #[tokio::test]
    async fn test_secrets_attached() {
        let mock = Arc::new(MockOrchestrator::new().with_secret("api-key"));
        let mut request = DeploymentRequest::new("fn", "alice/fn");
        request.secrets = Some(vec!["api-key".to_string()]);

        deployer(mock.clone()).deploy(&request).await.unwrap();

        let secrets = &mock.created()[0].0.task_template.container_spec.secrets;
        assert_eq!(secrets.len(), 1);
        assert_eq!(secrets[0].secret_id, "id-api-key");
    }

    #[tokio::test]
    async fn test_create_failure_and_warnings() {
        let mock = Arc::new(MockOrchestrator::new().with_failing_create());
        let request = DeploymentRequest::new("fn", "alice/fn");
        let result = deployer(mock).deploy(&request).await;
        assert!(matches!(result, Err(DeployError::ServiceCreate(_))));

        let mock = Arc::new(MockOrchestrator::new().with_warning("image could not be accessed"));
        let outcome = deployer(mock).deploy(&request).await.unwrap();
        assert_eq!(outcome.warnings, vec!["image could not be accessed"]);
    }

    #[test]
    fn test_compile_only_without_orchestrator() {
        let mut request = DeploymentRequest::new("fn", "alice/fn");
        request.registry_auth = Some(STANDARD.encode("u:p"));
        request.secrets = Some(vec!["api-key".to_string()]);

        let compiler = SpecCompiler::new(DeployConfig::default());
        let (compiled, options) = compile_only(&compiler, &request).unwrap();

        assert_eq!(compiled.spec.name, "fn");
        assert!(options.encoded_registry_auth.is_some());
        assert!(compiled.spec.task_template.networks.is_empty());
        assert!(compiled.spec.task_template.container_spec.secrets.is_empty());
    }

    #[test]
    fn test_compile_only_rejects_bad_auth() {
        let mut request = DeploymentRequest::new("fn", "alice/fn");
        request.registry_auth = Some(STANDARD.encode("no-colon"));

        let compiler = SpecCompiler::new(DeployConfig::default());
        assert!(matches!(
            compile_only(&compiler, &request),
            Err(DeployError::RegistryAuth(_))
        ));
    }
}
