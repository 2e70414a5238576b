use crate::models::RegistrySummary;
use serde::{Deserialize, Serialize};

/// Query parameters for listing URLs
#[derive(Debug, Deserialize)]
pub struct ListUrlsQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub registry: RegistrySummary,
}
