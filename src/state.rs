use crate::activity::ActivityLog;
use crate::services::Registry;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// This struct is wrapped in `Arc` and shared across all request handlers
/// via Axum's State extraction.
#[derive(Clone)]
pub struct AppState {
    /// The shortcode registry; the only owner of records and click logs
    pub registry: Arc<Registry>,

    /// Fire-and-forget activity log
    pub activity: ActivityLog,

    /// Base URL for constructing short links (e.g., "http://localhost:8080")
    pub base_url: String,

    /// Validity applied when a create request omits one (in minutes)
    pub default_validity_minutes: i64,
}
