//! Registry credentials for private images
//!
//! Clients send registry credentials as base64 of `user:password` (the format
//! found in `~/.docker/config.json`). The orchestrator wants a base64-URL JSON
//! auth config naming the registry the image lives on.

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::reference::{ImageReference, ReferenceError, DEFAULT_DOMAIN};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthError {
    #[error("invalid image reference: {0}")]
    InvalidReference(#[from] ReferenceError),

    #[error("cannot resolve registry for '{0}'")]
    UnresolvableRegistry(String),

    #[error("invalid base64 in basic auth: {0}")]
    InvalidEncoding(String),

    #[error("invalid basic auth: expected 'user:password'")]
    MalformedCredentials,

    #[error("failed to encode auth config: {0}")]
    Encode(String),
}

/// Registry index an image reference resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryIndex {
    pub name: String,
    pub official: bool,
}

impl RegistryIndex {
    /// Resolve the index for a normalized reference. The index name is the
    /// reference domain. A domain port outside 1..=65535 is rejected here;
    /// Docker's own repository-info lookup does not make that check.
    pub fn resolve(reference: &ImageReference) -> Result<Self, AuthError> {
        let domain = reference.domain();

        if let Some((_, port)) = domain.rsplit_once(':') {
            match port.parse::<u16>() {
                Ok(p) if p > 0 => {}
                _ => return Err(AuthError::UnresolvableRegistry(domain.to_string())),
            }
        }

        Ok(Self {
            name: domain.to_string(),
            official: domain == DEFAULT_DOMAIN,
        })
    }
}

/// Auth config in the shape the Docker Engine expects in `X-Registry-Auth`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub password: String,

    #[serde(rename = "serveraddress", default, skip_serializing_if = "String::is_empty")]
    pub server_address: String,
}

/// Decode base64 `user:password`, splitting on the first colon.
pub fn user_password_from_basic_auth(basic_auth_b64: &str) -> Result<(String, String), AuthError> {
    let decoded = STANDARD
        .decode(basic_auth_b64)
        .map_err(|e| AuthError::InvalidEncoding(e.to_string()))?;
    let decoded = String::from_utf8(decoded).map_err(|e| AuthError::InvalidEncoding(e.to_string()))?;

    let (user, password) = decoded
        .split_once(':')
        .ok_or(AuthError::MalformedCredentials)?;
    Ok((user.to_string(), password.to_string()))
}

/// Qualify an image with the default namespace when it names no registry
/// host, e.g. "alice/fn" becomes "docker.io/alice/fn".
pub fn qualify_image(image: &str, default_namespace: &str) -> String {
    if image.split('/').count() < 3 {
        format!("{}/{}", default_namespace, image)
    } else {
        image.to_string()
    }
}

/// Build the encoded registry auth config for pulling `image`.
pub fn build_encoded_auth_config(
    basic_auth_b64: &str,
    image: &str,
    default_namespace: &str,
) -> Result<String, AuthError> {
    let qualified = qualify_image(image, default_namespace);
    let reference = ImageReference::parse_canonical(&qualified)?;
    let index = RegistryIndex::resolve(&reference)?;

    let (username, password) = user_password_from_basic_auth(basic_auth_b64)?;

    let config = AuthConfig {
        username,
        password,
        server_address: index.name,
    };
    let buf = serde_json::to_vec(&config).map_err(|e| AuthError::Encode(e.to_string()))?;
    Ok(URL_SAFE.encode(buf))
}
