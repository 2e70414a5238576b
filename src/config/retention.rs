use serde::Deserialize;

/// Retention policy for expired short URLs
#[derive(Debug, Clone, Deserialize)]
pub struct RetentionConfig {
    /// How long an expired record stays queryable before it is purged.
    /// `None` keeps expired records forever.
    pub retention_minutes: Option<i64>,

    /// Interval between purge sweeps in seconds
    pub sweep_interval_seconds: u64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            retention_minutes: None,
            sweep_interval_seconds: 60,
        }
    }
}

impl RetentionConfig {
    /// Validate retention configuration values
    pub fn validate(&self) -> Result<(), String> {
        if let Some(minutes) = self.retention_minutes {
            if minutes < 0 {
                return Err("RETENTION_MINUTES cannot be negative".to_string());
            }
        }

        if self.sweep_interval_seconds == 0 {
            return Err("RETENTION_SWEEP_SECONDS must be greater than 0".to_string());
        }

        Ok(())
    }
}
