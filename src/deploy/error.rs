use thiserror::Error;

use super::auth::AuthError;
use super::labels::LabelError;
use crate::orchestrator::OrchestratorError;

/// Errors that reject a deployment. Nothing is submitted once one occurs.
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("invalid request body: {0}")]
    InvalidRequestBody(String),

    #[error("registry auth: {0}")]
    RegistryAuth(#[from] AuthError),

    #[error("{0}")]
    SecretsResolution(String),

    #[error("{0}")]
    InvalidLabelConfiguration(#[from] LabelError),

    #[error("service create failed: {0}")]
    ServiceCreate(#[from] OrchestratorError),
}
