use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Referrer recorded when a click arrives without one
pub const DIRECT_REFERRER: &str = "Direct";

/// User agent recorded when a click arrives without one
pub const UNKNOWN_USER_AGENT: &str = "Unknown";

/// A shortened URL held by the registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlRecord {
    pub id: Uuid,
    pub original_url: String,
    pub shortcode: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub validity_minutes: i64,
    pub click_count: u64,
}

/// Best-effort client context captured with a click
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMeta {
    pub user_agent: String,
    pub ip: String,
    pub location: Option<String>,
}

impl Default for SourceMeta {
    fn default() -> Self {
        Self {
            user_agent: UNKNOWN_USER_AGENT.to_string(),
            ip: "unknown".to_string(),
            location: None,
        }
    }
}

/// One redirect traversal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickEvent {
    pub timestamp: DateTime<Utc>,
    pub referrer: String,
    pub source_meta: SourceMeta,
}

impl ClickEvent {
    pub fn new(timestamp: DateTime<Utc>, referrer: Option<String>, source_meta: SourceMeta) -> Self {
        let referrer = referrer
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| DIRECT_REFERRER.to_string());

        Self {
            timestamp,
            referrer,
            source_meta,
        }
    }
}

/// A record together with its full click history
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub record: UrlRecord,
    pub clicks: Vec<ClickEvent>,
    pub total_clicks: u64,
    pub expired: bool,
}

/// Registry-wide counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrySummary {
    pub total_urls: u64,
    pub active_urls: u64,
    pub expired_urls: u64,
    pub total_clicks: u64,
}

/// Request to create a short URL
#[derive(Debug, Deserialize, Validate)]
pub struct CreateShortUrlRequest {
    #[validate(length(min = 1, max = 2048, message = "URL must be 1-2048 characters"))]
    pub url: String,

    #[validate(length(min = 3, max = 64, message = "Shortcode must be 3-64 characters"))]
    pub shortcode: Option<String>,

    #[validate(range(min = 1, message = "Validity must be a positive number of minutes"))]
    pub validity: Option<i64>,
}

/// Response after creating a short URL
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShortUrlResponse {
    pub short_link: String,
    pub expiry: DateTime<Utc>,
}

/// Response for the statistics endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsResponse {
    pub original_url: String,
    pub shortcode: String,
    pub created_at: DateTime<Utc>,
    pub expiry: DateTime<Utc>,
    pub expired: bool,
    pub total_clicks: u64,
    pub clicks: Vec<ClickEvent>,
}

impl From<Statistics> for StatisticsResponse {
    fn from(stats: Statistics) -> Self {
        StatisticsResponse {
            original_url: stats.record.original_url,
            shortcode: stats.record.shortcode,
            created_at: stats.record.created_at,
            expiry: stats.record.expires_at,
            expired: stats.expired,
            total_clicks: stats.total_clicks,
            clicks: stats.clicks,
        }
    }
}

/// Paginated listing wrapper
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: usize, limit: usize, offset: usize) -> Self {
        Self {
            items,
            total,
            limit,
            offset,
        }
    }
}
