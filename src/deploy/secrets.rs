//! Secret references for the container spec

use std::collections::HashMap;

use super::error::DeployError;
use super::spec::{SecretFile, SecretReference};
use crate::orchestrator::{Orchestrator, SecretSummary};

/// Mode of mounted secret files (read-only for everyone)
pub const SECRET_FILE_MODE: u32 = 0o444;

/// Match requested secret names against the orchestrator's listing.
///
/// Every requested name must exist; references come back in request order.
pub fn bind_secrets(
    requested: &[String],
    found: &[SecretSummary],
    mount_dir: &str,
) -> Result<Vec<SecretReference>, DeployError> {
    let ids: HashMap<&str, &str> = found
        .iter()
        .map(|s| (s.name.as_str(), s.id.as_str()))
        .collect();

    requested
        .iter()
        .map(|name| {
            let id = ids
                .get(name.as_str())
                .ok_or_else(|| DeployError::SecretsResolution(format!("secret not found: {}", name)))?;

            Ok(SecretReference {
                file: SecretFile {
                    name: format!("{}/{}", mount_dir.trim_end_matches('/'), name),
                    uid: "0".to_string(),
                    gid: "0".to_string(),
                    mode: SECRET_FILE_MODE,
                },
                secret_id: id.to_string(),
                secret_name: name.clone(),
            })
        })
        .collect()
}

/// Look up and bind the requested secrets. No call is made for an empty list.
pub async fn resolve_secrets(
    orchestrator: &dyn Orchestrator,
    requested: &[String],
    mount_dir: &str,
) -> Result<Vec<SecretReference>, DeployError> {
    if requested.is_empty() {
        return Ok(Vec::new());
    }

    let found = orchestrator
        .list_secrets(requested)
        .await
        .map_err(|e| DeployError::SecretsResolution(format!("unable to list secrets: {}", e)))?;

    bind_secrets(requested, &found, mount_dir)
}
