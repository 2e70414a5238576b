use crate::activity::{Level, Package};
use crate::error::{AppError, AppResult};
use crate::middleware::{extract_referrer, source_meta};
use crate::models::{
    CreateShortUrlRequest, CreateShortUrlResponse, PaginatedResponse, StatisticsResponse, UrlRecord,
};
use crate::util::{short_link, truncate_chars};
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json};
use std::sync::Arc;
use validator::Validate;

use super::helpers::{
    json_rejection, path_rejection, query_rejection, redirect_location, validation_error,
};
use super::types::ListUrlsQuery;
use super::AppState;

/// Create a short URL
pub async fn create_short_url(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateShortUrlRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    state
        .activity
        .backend(Level::Info, Package::Controller, "Create short URL request");

    let result = payload
        .map_err(json_rejection)
        .and_then(|Json(mut payload)| -> AppResult<UrlRecord> {
            // A blank shortcode means "generate one"
            payload.shortcode = payload.shortcode.filter(|s| !s.trim().is_empty());
            payload.validate().map_err(validation_error)?;
            let validity = payload.validity.unwrap_or(state.default_validity_minutes);
            state
                .registry
                .create(&payload.url, payload.shortcode.as_deref(), validity)
        });

    let record = match result {
        Ok(record) => record,
        Err(e) => {
            state.activity.backend(
                Level::Error,
                Package::Controller,
                format!("Create URL error: {}", e),
            );
            return Err(e);
        }
    };

    state.activity.backend(
        Level::Info,
        Package::Controller,
        format!("Short URL created: {}", record.shortcode),
    );

    let response = CreateShortUrlResponse {
        short_link: short_link(&state.base_url, &record.shortcode),
        expiry: record.expires_at,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// Statistics for one short URL, including its full click history
pub async fn get_statistics(
    State(state): State<Arc<AppState>>,
    path: Result<Path<String>, PathRejection>,
) -> AppResult<impl IntoResponse> {
    let Path(shortcode) = path.map_err(path_rejection)?;
    state.activity.backend(
        Level::Info,
        Package::Controller,
        format!("Stats request for: {}", shortcode),
    );

    let stats = state
        .registry
        .short_codes()
        .is_routable(&shortcode)
        .then(|| state.registry.statistics(&shortcode))
        .flatten();

    let Some(stats) = stats else {
        state.activity.backend(
            Level::Warn,
            Package::Controller,
            format!("Stats not found: {}", shortcode),
        );
        return Err(AppError::NotFound(shortcode));
    };

    Ok(Json(StatisticsResponse::from(stats)))
}

/// Resolve a shortcode, record the click, and redirect
pub async fn redirect(
    State(state): State<Arc<AppState>>,
    path: Result<Path<String>, PathRejection>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    let Path(shortcode) = path.map_err(path_rejection)?;
    if !state.registry.short_codes().is_routable(&shortcode) {
        state.activity.backend(
            Level::Warn,
            Package::Route,
            format!("Not a shortcode path: {}", shortcode),
        );
        return Err(AppError::NotFound(shortcode));
    }

    let resolved = state.registry.resolve(
        &shortcode,
        extract_referrer(&headers),
        source_meta(&headers),
    );

    let original_url = match resolved {
        Ok(url) => url,
        Err(e) => {
            let message = match &e {
                AppError::Expired(_) => format!("Expired URL: {}", shortcode),
                _ => format!("URL not found: {}", shortcode),
            };
            state
                .activity
                .backend(Level::Warn, Package::Controller, message);
            return Err(e);
        }
    };

    state.activity.backend(
        Level::Info,
        Package::Controller,
        format!("Redirecting to: {}", truncate_chars(&original_url, 30)),
    );

    let location = HeaderValue::from_str(&original_url)
        .or_else(|_| HeaderValue::from_str(&redirect_location(&original_url)))
        .map_err(|e| AppError::Internal(format!("Unusable redirect target: {}", e)))?;

    Ok((StatusCode::FOUND, [(header::LOCATION, location)]))
}

/// List registered URLs, newest first
pub async fn list_urls(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListUrlsQuery>, QueryRejection>,
) -> AppResult<impl IntoResponse> {
    let Query(query) = query.map_err(query_rejection)?;
    let limit = query.limit.unwrap_or(50).min(100); // Max 100
    let offset = query.offset.unwrap_or(0);

    let (records, total) = state.registry.list(limit, offset);
    let paginated_response: PaginatedResponse<UrlRecord> =
        PaginatedResponse::new(records, total, limit, offset);

    Ok(Json(paginated_response))
}
