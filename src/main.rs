use std::path::Path;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use fnswarm::cli::{apply_overrides, format_dry_run, log_filter, Args};
use fnswarm::config::{load_config_file, FileConfig};
use fnswarm::deploy::{compile_only, DeploymentRequest, SpecCompiler};
use fnswarm::orchestrator::DockerClient;
use fnswarm::server::{create_router, AppState};

#[tokio::main]
async fn main() {
    let mut args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(log_filter(args.verbose))),
        )
        .init();

    // Load .env file if specified, then re-read flags so env fallbacks see it
    if let Some(ref env_file) = args.env_file {
        if let Err(e) = dotenvy::from_path(env_file) {
            error!("Failed to load env file {}: {}", env_file.display(), e);
            process::exit(1);
        }
        args = Args::parse();
    }

    let file_config = match args.config {
        Some(ref path) => match load_config_file(path) {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load config file {}: {}", path.display(), e);
                process::exit(1);
            }
        },
        None => FileConfig::default(),
    };
    let config = apply_overrides(file_config, &args);

    // Dry-run mode: compile the request and exit
    if let Some(ref request_file) = args.dry_run {
        match dry_run(request_file, &config) {
            Ok(output) => println!("{}", output),
            Err(e) => {
                error!("Dry run failed: {:#}", e);
                process::exit(1);
            }
        }
        return;
    }

    if let Err(e) = serve(config).await {
        error!("{:#}", e);
        process::exit(1);
    }
}

fn dry_run(request_file: &Path, config: &FileConfig) -> anyhow::Result<String> {
    let body = std::fs::read(request_file)
        .with_context(|| format!("reading {}", request_file.display()))?;
    let request = DeploymentRequest::from_slice(&body)?;

    let compiler = SpecCompiler::new(config.deploy.clone());
    let (compiled, options) = compile_only(&compiler, &request)?;

    Ok(format_dry_run(&request, &compiled, &options)?)
}

async fn serve(config: FileConfig) -> anyhow::Result<()> {
    let FileConfig { server, deploy } = config;

    let docker = DockerClient::new(
        &server.docker_host,
        &server.docker_api_version,
        Duration::from_secs(server.request_timeout_secs),
    )
    .context("creating Docker client")?;
    info!("Using Docker Engine at {}", docker.base_url());

    let state = AppState::new(Arc::new(docker), deploy).with_max_concurrent(server.max_concurrent);
    let app = create_router(state);

    let addr = format!("{}:{}", server.bind_addr, server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Server listening on {}", addr);
    info!("Endpoints:");
    info!("  GET  /healthz           - Health check");
    info!("  POST /system/functions  - Deploy a function");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
