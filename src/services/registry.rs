//! The shortcode registry: allocation, expiry, and click recording.
//!
//! Records and their click logs share one [`DashMap`] value, so every mutation of a
//! shortcode happens under that key's shard lock:
//! - `create` claims a code through `entry()`, which checks and inserts atomically.
//! - `resolve` appends the click and bumps the counter under one write guard.
//! - readers take a shared guard and see the counter and the log agree.
//!
//! Shortcodes are never removed from the map. A retention purge swaps the value for
//! a tombstone, which keeps the code unavailable for the rest of the process.

use crate::config::UrlConfig;
use crate::error::{AppError, AppResult};
use crate::models::{ClickEvent, RegistrySummary, SourceMeta, Statistics, UrlRecord};
use crate::services::clock::{is_expired, Clock, SystemClock};
use crate::services::short_code::ShortCodeService;
use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use url::Url;
use uuid::Uuid;

/// Longest original URL accepted, in bytes
pub const MAX_URL_LENGTH: usize = 2048;

/// Settings the registry needs from configuration
#[derive(Debug, Clone)]
pub struct RegistrySettings {
    pub short_code_length: usize,
    pub short_code_max_attempts: u32,
    pub strict_url_validation: bool,
    pub reserved_paths: Vec<String>,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self::from(&UrlConfig::default())
    }
}

impl From<&UrlConfig> for RegistrySettings {
    fn from(config: &UrlConfig) -> Self {
        Self {
            short_code_length: config.short_code_length,
            short_code_max_attempts: config.short_code_max_attempts,
            strict_url_validation: config.strict_url_validation,
            reserved_paths: config.reserved_paths.clone(),
        }
    }
}

/// A record and its click history
#[derive(Debug)]
struct LinkEntry {
    record: UrlRecord,
    clicks: Vec<ClickEvent>,
}

#[derive(Debug)]
enum Slot {
    Live(LinkEntry),
    /// Purged by retention; the code stays claimed.
    Retired,
}

impl Slot {
    fn live(&self) -> Option<&LinkEntry> {
        match self {
            Slot::Live(entry) => Some(entry),
            Slot::Retired => None,
        }
    }
}

/// Authoritative in-memory store of short URLs and their clicks.
pub struct Registry {
    slots: DashMap<String, Slot>,
    codes: ShortCodeService,
    clock: Arc<dyn Clock>,
    strict_url_validation: bool,
}

impl Registry {
    /// Create a registry driven by the system clock
    pub fn new(settings: RegistrySettings) -> Self {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    /// Create a registry with an explicit time source
    pub fn with_clock(settings: RegistrySettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            slots: DashMap::new(),
            codes: ShortCodeService::new(
                settings.short_code_length,
                settings.short_code_max_attempts,
                &settings.reserved_paths,
            ),
            clock,
            strict_url_validation: settings.strict_url_validation,
        }
    }

    #[cfg(test)]
    fn with_short_codes(mut self, codes: ShortCodeService) -> Self {
        self.codes = codes;
        self
    }

    /// Shortcode rules used by this registry
    pub fn short_codes(&self) -> &ShortCodeService {
        &self.codes
    }

    /// Current time as seen by this registry
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Register a new short URL.
    ///
    /// # Errors
    ///
    /// - `InvalidUrl` if `original_url` is not an absolute URL with a host
    /// - `InvalidValidity` if `validity_minutes` is not positive or overflows
    /// - `InvalidShortcode` / `ShortcodeTaken` for a rejected `desired_shortcode`
    /// - `ShortcodeGenerationFailed` if no free code was drawn within the attempt cap
    pub fn create(
        &self,
        original_url: &str,
        desired_shortcode: Option<&str>,
        validity_minutes: i64,
    ) -> AppResult<UrlRecord> {
        validate_url(original_url, self.strict_url_validation)?;
        let validity = validity_duration(validity_minutes)?;

        if let Some(code) = desired_shortcode {
            self.codes.validate(code)?;
        }

        let created_at = self.clock.now();
        let expires_at = created_at
            .checked_add_signed(validity)
            .ok_or_else(|| AppError::InvalidValidity("validity is too large".to_string()))?;

        let build = |shortcode: &str| UrlRecord {
            id: Uuid::new_v4(),
            original_url: original_url.to_string(),
            shortcode: shortcode.to_string(),
            created_at,
            expires_at,
            validity_minutes,
            click_count: 0,
        };

        if let Some(code) = desired_shortcode {
            return match self.slots.entry(code.to_string()) {
                Entry::Occupied(_) => Err(AppError::ShortcodeTaken(code.to_string())),
                Entry::Vacant(vacant) => {
                    let record = build(code);
                    vacant.insert(Slot::Live(LinkEntry::new(record.clone())));
                    tracing::debug!(shortcode = %code, "Registered custom shortcode");
                    Ok(record)
                }
            };
        }

        for attempt in 1..=self.codes.max_attempts() {
            let candidate = self.codes.candidate();
            if self.codes.is_reserved(&candidate) {
                continue;
            }

            if let Entry::Vacant(vacant) = self.slots.entry(candidate) {
                let record = build(vacant.key().as_str());
                vacant.insert(Slot::Live(LinkEntry::new(record.clone())));
                tracing::debug!(shortcode = %record.shortcode, attempt, "Registered generated shortcode");
                return Ok(record);
            }

            tracing::debug!(attempt, "Generated shortcode collided, retrying");
        }

        Err(AppError::ShortcodeGenerationFailed(self.codes.max_attempts()))
    }

    /// Fetch a record without any expiry check.
    pub fn lookup(&self, shortcode: &str) -> Option<UrlRecord> {
        let slot = self.slots.get(shortcode)?;
        slot.live().map(|entry| entry.record.clone())
    }

    /// Record a click and return the target URL, or `None` when the code is
    /// unknown or expired. Nothing is recorded in either case.
    pub fn record_click(
        &self,
        shortcode: &str,
        referrer: Option<String>,
        source_meta: SourceMeta,
    ) -> Option<String> {
        self.resolve(shortcode, referrer, source_meta).ok()
    }

    /// Same as [`Registry::record_click`], reporting why a miss happened.
    ///
    /// # Errors
    ///
    /// `NotFound` for unknown or purged codes, `Expired` once the validity elapsed.
    pub fn resolve(
        &self,
        shortcode: &str,
        referrer: Option<String>,
        source_meta: SourceMeta,
    ) -> AppResult<String> {
        let mut slot = self
            .slots
            .get_mut(shortcode)
            .ok_or_else(|| AppError::NotFound(shortcode.to_string()))?;

        let entry = match slot.value_mut() {
            Slot::Live(entry) => entry,
            Slot::Retired => return Err(AppError::NotFound(shortcode.to_string())),
        };

        let now = self.clock.now();
        if is_expired(now, entry.record.expires_at) {
            return Err(AppError::Expired(shortcode.to_string()));
        }

        entry.clicks.push(ClickEvent::new(now, referrer, source_meta));
        entry.record.click_count += 1;
        debug_assert_eq!(entry.record.click_count, entry.clicks.len() as u64);

        Ok(entry.record.original_url.clone())
    }

    /// Snapshot of a record with its full click history
    pub fn statistics(&self, shortcode: &str) -> Option<Statistics> {
        let slot = self.slots.get(shortcode)?;
        let entry = slot.live()?;

        Some(Statistics {
            record: entry.record.clone(),
            clicks: entry.clicks.clone(),
            total_clicks: entry.record.click_count,
            expired: is_expired(self.clock.now(), entry.record.expires_at),
        })
    }

    /// Live records newest first, with the total live count
    pub fn list(&self, limit: usize, offset: usize) -> (Vec<UrlRecord>, usize) {
        let mut records: Vec<UrlRecord> = self
            .slots
            .iter()
            .filter_map(|slot| slot.live().map(|entry| entry.record.clone()))
            .collect();
        let total = records.len();

        records.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.shortcode.cmp(&b.shortcode))
        });

        let page = records.into_iter().skip(offset).take(limit).collect();
        (page, total)
    }

    /// Counts across all live records
    pub fn summary(&self) -> RegistrySummary {
        let now = self.clock.now();
        let mut summary = RegistrySummary::default();

        for slot in self.slots.iter() {
            if let Some(entry) = slot.live() {
                summary.total_urls += 1;
                summary.total_clicks += entry.record.click_count;
                if is_expired(now, entry.record.expires_at) {
                    summary.expired_urls += 1;
                } else {
                    summary.active_urls += 1;
                }
            }
        }

        summary
    }

    /// Retire records that expired more than `retention` ago.
    ///
    /// Returns the number of records retired by this call.
    pub fn purge_expired(&self, retention: Duration) -> usize {
        let now = self.clock.now();
        let Some(cutoff) = now.checked_sub_signed(retention) else {
            return 0;
        };

        let mut purged = 0;
        for mut slot in self.slots.iter_mut() {
            let stale = slot
                .live()
                .is_some_and(|entry| is_expired(cutoff, entry.record.expires_at));
            if stale {
                *slot.value_mut() = Slot::Retired;
                purged += 1;
            }
        }

        if purged > 0 {
            tracing::info!(purged, "Retired expired short URLs");
        }
        purged
    }

    /// Number of live (non-retired) records
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.live().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LinkEntry {
    fn new(record: UrlRecord) -> Self {
        Self {
            record,
            clicks: Vec::new(),
        }
    }
}

fn validate_url(raw: &str, strict: bool) -> AppResult<()> {
    if raw.is_empty() || raw.len() > MAX_URL_LENGTH {
        return Err(AppError::InvalidUrl(format!(
            "URL must be 1-{} characters",
            MAX_URL_LENGTH
        )));
    }

    let parsed =
        Url::parse(raw).map_err(|e| AppError::InvalidUrl(format!("Invalid URL format: {}", e)))?;

    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(AppError::InvalidUrl("URL must include a host".to_string()));
    }

    if strict && !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::InvalidUrl(
            "URL must start with http:// or https://".to_string(),
        ));
    }

    Ok(())
}

fn validity_duration(minutes: i64) -> AppResult<Duration> {
    if minutes < 1 {
        return Err(AppError::InvalidValidity(
            "validity must be a positive number of minutes".to_string(),
        ));
    }

    Duration::try_minutes(minutes)
        .ok_or_else(|| AppError::InvalidValidity("validity is too large".to_string()))
}
