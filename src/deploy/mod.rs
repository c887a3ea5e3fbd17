//! Deployment request compiler
//!
//! Pure building blocks (quantities, references, auth, labels, resources)
//! feed [`SpecCompiler`], which assembles the service spec. [`Deployer`]
//! wraps it with the orchestrator lookups and the final create call.

pub mod auth;
pub mod compiler;
pub mod deployer;
pub mod diagnostics;
pub mod error;
pub mod labels;
pub mod network;
pub mod quantity;
pub mod reference;
pub mod request;
pub mod resources;
pub mod secrets;
pub mod spec;

pub use auth::{build_encoded_auth_config, AuthError};
pub use compiler::{CompiledSpec, SpecCompiler};
pub use deployer::{compile_only, DeployOutcome, Deployer};
pub use diagnostics::{Diagnostic, Diagnostics};
pub use error::DeployError;
pub use labels::{build_labels, LabelError, LabelSet};
pub use quantity::{parse_cpu_quantity, parse_memory_size, QuantityError};
pub use reference::{ImageReference, ReferenceError};
pub use request::{DeploymentRequest, FunctionResources};
pub use resources::build_resources;
pub use spec::ServiceSpec;
