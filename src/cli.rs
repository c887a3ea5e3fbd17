use clap::{ArgAction, Parser};
use std::path::PathBuf;

use crate::config::FileConfig;
use crate::deploy::{CompiledSpec, DeploymentRequest};
use crate::orchestrator::CreateServiceOptions;

#[derive(Parser, Debug)]
#[command(name = "fnswarm")]
#[command(about = "Deploy functions as Docker Swarm services")]
#[command(version)]
pub struct Args {
    /// Path to a YAML or JSON config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Compile a deployment request file and print the service spec without deploying
    #[arg(long, value_name = "REQUEST_FILE")]
    pub dry_run: Option<PathBuf>,

    /// Override the bind address
    #[arg(long, value_name = "ADDR")]
    pub bind_addr: Option<String>,

    /// Override the listen port
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Docker Engine endpoint
    #[arg(long, env = "DOCKER_HOST", value_name = "URL")]
    pub docker_host: Option<String>,

    /// Restart attempts per task
    #[arg(long, env = "MAX_RESTARTS")]
    pub max_restarts: Option<u64>,

    /// Delay between task restarts, in seconds
    #[arg(long, env = "RESTART_DELAY", value_name = "SECS")]
    pub restart_delay: Option<u64>,

    /// Path to a .env file
    #[arg(long, value_name = "FILE")]
    pub env_file: Option<PathBuf>,

    /// Docker Engine request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Maximum concurrent deploy requests
    #[arg(long)]
    pub max_concurrent: Option<usize>,
}

// ============================================================================
// SBIO: Pure config merging and display logic (no I/O)
// ============================================================================

/// Log filter for the `-v` count.
pub fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Flags (and their env fallbacks) take precedence over the config file.
pub fn apply_overrides(mut config: FileConfig, args: &Args) -> FileConfig {
    if let Some(ref addr) = args.bind_addr {
        config.server.bind_addr = addr.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(ref host) = args.docker_host {
        config.server.docker_host = host.clone();
    }
    if let Some(timeout) = args.timeout {
        config.server.request_timeout_secs = timeout;
    }
    if let Some(max) = args.max_concurrent {
        config.server.max_concurrent = max;
    }
    if let Some(restarts) = args.max_restarts {
        config.deploy.max_restarts = restarts;
    }
    if let Some(delay) = args.restart_delay {
        config.deploy.restart_delay_secs = delay;
    }
    config
}

/// Format the dry-run report: a summary followed by the spec as JSON.
pub fn format_dry_run(
    request: &DeploymentRequest,
    compiled: &CompiledSpec,
    options: &CreateServiceOptions,
) -> Result<String, serde_json::Error> {
    let spec = &compiled.spec;
    let mut output = String::new();

    output.push_str(&format!(
        "fnswarm v{} - Dry Run Mode\n\n",
        env!("CARGO_PKG_VERSION")
    ));
    output.push_str(&format!("Service: {}\n", spec.name));
    output.push_str(&format!("Image: {}\n", spec.task_template.container_spec.image));
    output.push_str(&format!("Replicas: {}\n", spec.mode.replicas()));
    output.push_str(&format!(
        "Registry auth: {}\n",
        if options.encoded_registry_auth.is_some() {
            "provided"
        } else {
            "none"
        }
    ));

    let secrets = request.secret_names();
    if !secrets.is_empty() {
        output.push_str(&format!("Secrets (unresolved): {}\n", secrets.join(", ")));
    }
    if request.requested_network().is_none() {
        output.push_str("Network: resolved at deploy time\n");
    }

    if compiled.diagnostics.is_empty() {
        output.push_str("\nDiagnostics: none\n");
    } else {
        output.push_str(&format!("\nDiagnostics ({}):\n", compiled.diagnostics.len()));
        for diagnostic in &compiled.diagnostics {
            output.push_str(&format!("  - {}\n", diagnostic));
        }
    }

    output.push_str("\nService spec:\n");
    output.push_str(&serde_json::to_string_pretty(spec)?);
    output.push('\n');

    Ok(output)
}
