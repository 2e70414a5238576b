use crate::activity::{Level, Package};
use crate::error::AppResult;
use crate::routes::types::HealthCheckResponse;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;

use super::AppState;

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> AppResult<impl IntoResponse> {
    state
        .activity
        .backend(Level::Info, Package::Handler, "Health check requested");

    let response = HealthCheckResponse {
        status: "OK".to_string(),
        timestamp: state.registry.now(),
        registry: state.registry.summary(),
    };

    Ok(Json(response))
}
