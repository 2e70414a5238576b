use serde::Deserialize;

/// Paths that the redirect route never treats as shortcodes.
pub const DEFAULT_RESERVED_PATHS: &[&str] = &[
    "health",
    "api",
    "admin",
    "public",
    "static",
    "assets",
    "favicon.ico",
];

/// URL shortening configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UrlConfig {
    /// Base URL for constructing short links (e.g., "http://localhost:8080")
    pub base_url: String,

    /// Validity applied when a create request omits one (in minutes)
    pub default_validity_minutes: i64,

    /// Length of randomly generated shortcodes
    pub short_code_length: usize,

    /// Maximum number of attempts to generate a unique shortcode
    pub short_code_max_attempts: u32,

    /// Whether strict URL validation is enabled (requires http:// or https://)
    pub strict_url_validation: bool,

    /// Words that can never be used as shortcodes (compared case-insensitively)
    pub reserved_paths: Vec<String>,
}

impl Default for UrlConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            default_validity_minutes: 30,
            short_code_length: 6,
            short_code_max_attempts: 10,
            strict_url_validation: true,
            reserved_paths: DEFAULT_RESERVED_PATHS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl UrlConfig {
    /// Validate URL configuration values
    pub fn validate(&self) -> Result<(), String> {
        if ::url::Url::parse(&self.base_url).is_err() {
            return Err("BASE_URL must be an absolute URL".to_string());
        }

        if self.short_code_length < 4 || self.short_code_length > 16 {
            return Err("SHORT_CODE_LENGTH must be between 4 and 16".to_string());
        }

        if self.default_validity_minutes < 1 {
            return Err("DEFAULT_VALIDITY_MINUTES must be at least 1".to_string());
        }

        if self.short_code_max_attempts < 1 || self.short_code_max_attempts > 100 {
            return Err("SHORT_CODE_MAX_ATTEMPTS must be between 1 and 100".to_string());
        }

        Ok(())
    }
}
