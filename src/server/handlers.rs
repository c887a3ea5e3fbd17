use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use uuid::Uuid;

use crate::deploy::{DeployError, DeploymentRequest};
use crate::server::state::AppState;

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    StatusCode::OK
}

/// Map a rejected deployment to a status and body.
pub fn error_response(err: &DeployError) -> (StatusCode, String) {
    match err {
        DeployError::RegistryAuth(_) => (StatusCode::BAD_REQUEST, "Invalid registry auth".to_string()),
        other => (StatusCode::BAD_REQUEST, format!("Deployment error: {}", other)),
    }
}

/// Create a function (service) from a deployment request
pub async fn deploy_function(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    // Keep the caller's request ID verbatim, otherwise generate one
    let request_id = headers
        .get("x-request-id")
        .filter(|v| !v.is_empty())
        .cloned()
        .unwrap_or_else(|| {
            HeaderValue::from_str(&Uuid::new_v4().to_string())
                .unwrap_or_else(|_| HeaderValue::from_static("unknown"))
        });
    let log_id = String::from_utf8_lossy(request_id.as_bytes()).into_owned();

    let result = match DeploymentRequest::from_slice(&body) {
        Ok(request) => {
            info!("[{}] Deploying {} from {}", log_id, request.service, request.image);
            state.deployer.deploy(&request).await
        }
        Err(e) => Err(e),
    };

    let mut response = match result {
        Ok(outcome) => {
            info!(
                "[{}] Accepted {} with {} diagnostic(s)",
                log_id,
                outcome.service_id,
                outcome.diagnostics.len()
            );
            StatusCode::ACCEPTED.into_response()
        }
        Err(e) => {
            error!("[{}] Deployment rejected: {}", log_id, e);
            error_response(&e).into_response()
        }
    };

    response.headers_mut().insert("x-request-id", request_id);
    response
}

/// Create the Axum router
pub fn create_router(state: AppState) -> Router {
    let limit = state.max_concurrent;
    Router::new()
        .route("/healthz", get(health))
        .route("/system/functions", post(deploy_function))
        .layer(ConcurrencyLimitLayer::new(limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
