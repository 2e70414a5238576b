use crate::config::{CorsConfig, RateLimitConfig};
use crate::error::AppError;
use crate::middleware::{activity_middleware, request_id_middleware, ClientIpKeyExtractor};
use axum::http::{HeaderValue, Uri};
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::GovernorLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use super::health;
use super::url_handlers;
use super::AppState;

/// Largest accepted request body in bytes
const MAX_BODY_BYTES: usize = 16 * 1024;

/// Create application router
pub fn create_router(
    state: Arc<AppState>,
    cors_config: &CorsConfig,
    rate_limit_config: &RateLimitConfig,
) -> Router {
    // Creation and listing share the strict limit
    let mut api_routes = Router::new().route(
        "/shorturls",
        post(url_handlers::create_short_url).get(url_handlers::list_urls),
    );

    // Statistics and redirects are limited at twice the rate
    let mut public_routes = Router::new()
        .route("/shorturls/{shortcode}", get(url_handlers::get_statistics))
        .route("/{shortcode}", get(url_handlers::redirect));

    if rate_limit_config.enabled {
        let strict = GovernorConfigBuilder::default()
            .per_millisecond(rate_limit_config.period_ms())
            .burst_size(rate_limit_config.burst_size)
            .key_extractor(ClientIpKeyExtractor)
            .finish()
            .expect("Failed to build strict governor config");

        let lenient = GovernorConfigBuilder::default()
            .per_millisecond((rate_limit_config.period_ms() / 2).max(1))
            .burst_size(rate_limit_config.burst_size.saturating_mul(2))
            .key_extractor(ClientIpKeyExtractor)
            .finish()
            .expect("Failed to build lenient governor config");

        api_routes = api_routes.layer(GovernorLayer::new(strict));
        public_routes = public_routes.layer(GovernorLayer::new(lenient));
    }

    // Health check endpoint (no rate limiting)
    let health_routes = Router::new().route("/health", get(health::health_check));

    api_routes
        .merge(public_routes)
        .merge(health_routes)
        .fallback(route_not_found)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(cors_layer(cors_config))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            activity_middleware,
        ))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    if config.allows_any() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|s| s.parse::<HeaderValue>().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

async fn route_not_found(uri: Uri) -> impl IntoResponse {
    tracing::warn!(path = %uri.path(), "Route not found");
    AppError::NotFound(format!("no route for {}", uri.path()))
}
