use std::sync::Arc;

use crate::config::DeployConfig;
use crate::deploy::Deployer;
use crate::orchestrator::Orchestrator;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub deployer: Arc<Deployer>,
    pub max_concurrent: usize,
}

impl AppState {
    pub fn new(orchestrator: Arc<dyn Orchestrator>, config: DeployConfig) -> Self {
        Self {
            deployer: Arc::new(Deployer::new(orchestrator, config)),
            max_concurrent: 100,
        }
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }
}
