//! Deploy-time configuration
//!
//! Everything the compiler treats as fixed for the lifetime of the process
//! (restart policy, label keys, registry namespace, fallback constraints) is
//! collected in [`DeployConfig`] and injected at construction, so tests can
//! vary it freely. [`ServerConfig`] holds the HTTP and Docker connection
//! settings used by the binary.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default public registry namespace prepended to short image names
pub const DEFAULT_REGISTRY_NAMESPACE: &str = "docker.io";

/// Prefix applied to every annotation key before it is stored as a label
pub const ANNOTATION_LABEL_PREFIX: &str = "com.openfaas.annotations.";

/// Label identifying the function a service belongs to
pub const FUNCTION_LABEL: &str = "com.openfaas.function";

/// Legacy marker label, always set to "true"
pub const LEGACY_FUNCTION_LABEL: &str = "function";

/// Label carrying the requested minimum replica count
pub const SCALE_MIN_LABEL: &str = "com.openfaas.scale.min";

/// Label filter used to find the default function network
pub const NETWORK_LABEL_FILTER: &str = "openfaas=true";

/// Placement used when a request carries no constraints
pub const LINUX_ONLY_CONSTRAINT: &str = "node.platform.os == linux";

/// Errors for config file loading (separate from pure parsing errors)
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ParseError(String),
}

/// Settings that shape every compiled service spec
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DeployConfig {
    /// Restart policy max attempts
    pub max_restarts: u64,

    /// Restart policy delay in seconds
    pub restart_delay_secs: u64,

    /// Namespace prepended to image references without a registry host
    pub default_registry_namespace: String,

    pub annotation_prefix: String,

    pub function_label: String,

    pub scale_min_label: String,

    /// `key=value` label filter for the default network lookup
    pub network_label: String,

    /// Constraints applied when the request specifies none
    pub fallback_constraints: Vec<String>,

    /// Target of the tmpfs mount added for read-only root filesystems
    pub read_only_tmpfs_target: String,

    /// Environment variable name used for the process override
    pub env_process_key: String,

    /// Directory secrets are mounted under inside the container
    pub secret_mount_dir: String,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            max_restarts: 5,
            restart_delay_secs: 5,
            default_registry_namespace: DEFAULT_REGISTRY_NAMESPACE.to_string(),
            annotation_prefix: ANNOTATION_LABEL_PREFIX.to_string(),
            function_label: FUNCTION_LABEL.to_string(),
            scale_min_label: SCALE_MIN_LABEL.to_string(),
            network_label: NETWORK_LABEL_FILTER.to_string(),
            fallback_constraints: vec![LINUX_ONLY_CONSTRAINT.to_string()],
            read_only_tmpfs_target: "/tmp".to_string(),
            env_process_key: "fprocess".to_string(),
            secret_mount_dir: "/var/openfaas/secrets".to_string(),
        }
    }
}

impl DeployConfig {
    pub fn restart_delay(&self) -> Duration {
        Duration::from_secs(self.restart_delay_secs)
    }
}

/// HTTP listener and Docker Engine connection settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ServerConfig {
    pub bind_addr: String,

    pub port: u16,

    /// Docker Engine endpoint, `tcp://` or `http(s)://`
    pub docker_host: String,

    /// Engine API version path segment, e.g. "v1.41"
    pub docker_api_version: String,

    /// Timeout applied to every Docker Engine request (seconds)
    pub request_timeout_secs: u64,

    /// Maximum in-flight deploy requests
    pub max_concurrent: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: 8080,
            docker_host: "http://127.0.0.1:2375".to_string(),
            docker_api_version: "v1.41".to_string(),
            request_timeout_secs: 30,
            max_concurrent: 100,
        }
    }
}

/// Top-level config file layout
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FileConfig {
    pub server: ServerConfig,
    pub deploy: DeployConfig,
}

// ============================================================================
// SBIO: Pure parsing (no I/O)
// ============================================================================

/// Parse YAML (or JSON, which is valid YAML) config content.
pub fn parse_config(content: &str) -> Result<FileConfig, ConfigError> {
    if content.trim().is_empty() {
        return Ok(FileConfig::default());
    }
    serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
}

// ============================================================================
// SBIO: I/O wrapper - thin layer over pure functions
// ============================================================================

/// Load and parse a config file from disk. `~` is expanded.
pub fn load_config_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let raw = path.to_string_lossy();
    let expanded = shellexpand::tilde(raw.as_ref());
    let content = std::fs::read_to_string(expanded.as_ref())?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_deploy_config_defaults() {
        let config = DeployConfig::default();
        assert_eq!(config.max_restarts, 5);
        assert_eq!(config.restart_delay(), Duration::from_secs(5));
        assert_eq!(config.fallback_constraints, vec!["node.platform.os == linux"]);
        assert_eq!(config.annotation_prefix, "com.openfaas.annotations.");
    }

    #[test]
    fn test_parse_empty_config() {
        let config = parse_config("").unwrap();
        assert_eq!(config, FileConfig::default());
    }

    #[test]
    fn test_parse_partial_yaml() {
        let content = r#"
server:
  port: 9090
deploy:
  max-restarts: 3
  fallback-constraints:
    - "node.role == worker"
"#;
        let config = parse_config(content).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.bind_addr, "0.0.0.0");
        assert_eq!(config.deploy.max_restarts, 3);
        assert_eq!(config.deploy.restart_delay_secs, 5);
        assert_eq!(config.deploy.fallback_constraints, vec!["node.role == worker"]);
    }

    #[test]
    fn test_parse_json_config() {
        let content = r#"{"deploy": {"read-only-tmpfs-target": "/scratch"}}"#;
        let config = parse_config(content).unwrap();
        assert_eq!(config.deploy.read_only_tmpfs_target, "/scratch");
    }

    #[test]
    fn test_parse_invalid_config() {
        let result = parse_config("server: [unclosed");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_file() {
        let file = create_temp_file("deploy:\n  restart-delay-secs: 10\n");
        let config = load_config_file(file.path()).unwrap();
        assert_eq!(config.deploy.restart_delay(), Duration::from_secs(10));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = load_config_file(Path::new("/nonexistent/fnswarm.yaml"));
        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }
}
