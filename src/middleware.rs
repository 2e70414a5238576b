use crate::activity::{Level, Package};
use crate::models::{SourceMeta, UNKNOWN_USER_AGENT};
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tower_governor::key_extractor::KeyExtractor;
use uuid::Uuid;

/// Request ID wrapper for use in request extensions
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Extract client IP address from headers
pub fn extract_client_ip(headers: &HeaderMap) -> String {
    // Check for X-Forwarded-For header (proxy/load balancer)
    if let Some(forwarded) = headers.get("x-forwarded-for") {
        if let Ok(forwarded_str) = forwarded.to_str() {
            if let Some(first_ip) = forwarded_str.split(',').next() {
                let first_ip = first_ip.trim();
                if !first_ip.is_empty() {
                    return first_ip.to_string();
                }
            }
        }
    }

    // Check for X-Real-IP header
    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(real_ip_str) = real_ip.to_str() {
            return real_ip_str.trim().to_string();
        }
    }

    // Fallback to a default
    "unknown".to_string()
}

fn header_string(headers: &HeaderMap, name: impl header::AsHeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Extract user agent from headers
pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    header_string(headers, header::USER_AGENT)
}

/// Extract the referring page, if the client sent one
pub fn extract_referrer(headers: &HeaderMap) -> Option<String> {
    header_string(headers, header::REFERER)
}

/// Coarse location as supplied by an edge proxy (country code)
pub fn extract_location(headers: &HeaderMap) -> Option<String> {
    header_string(headers, "cf-ipcountry")
}

/// Client context recorded with each click
pub fn source_meta(headers: &HeaderMap) -> SourceMeta {
    SourceMeta {
        user_agent: extract_user_agent(headers).unwrap_or_else(|| UNKNOWN_USER_AGENT.to_string()),
        ip: extract_client_ip(headers),
        location: extract_location(headers),
    }
}

/// Request ID middleware - adds a unique ID to each request
pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    // Try to get existing request ID from header, or generate new one
    let request_id: String = req
        .headers()
        .get("x-request-id")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    req.extensions_mut().insert(RequestId(request_id.clone()));

    tracing::info!(
        request_id = %request_id,
        method = %req.method(),
        path = %req.uri().path(),
        "Incoming request"
    );

    let mut response = next.run(req).await;

    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", header_value);
    }

    response
}

/// Activity middleware - reports every request to the activity log
pub async fn activity_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    state.activity.backend(
        Level::Info,
        Package::Middleware,
        format!("{} {}", req.method(), req.uri().path()),
    );

    if let Some(request_id) = req.extensions().get::<RequestId>() {
        tracing::debug!(request_id = %request_id.as_str(), "Request reported to activity log");
    }

    next.run(req).await
}

/// Rate limit key: the client IP as reported by the proxy headers
#[derive(Debug, Clone)]
pub struct ClientIpKeyExtractor;

impl KeyExtractor for ClientIpKeyExtractor {
    type Key = String;

    fn extract<T>(&self, req: &axum::http::Request<T>) -> Result<Self::Key, tower_governor::GovernorError> {
        Ok(extract_client_ip(req.headers()))
    }
}
