use crate::activity::{ActivityLog, Level, Package};
use crate::config::RetentionConfig;
use crate::services::Registry;
use chrono::Duration;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::info;

/// Periodically retires expired records once they outlive the retention window.
///
/// Only constructed when a retention window is configured; without one expired
/// records stay queryable for the life of the process.
pub struct RetentionJob {
    registry: Arc<Registry>,
    activity: ActivityLog,
    retention: Duration,
    period: std::time::Duration,
}

impl RetentionJob {
    /// Build the job from configuration, or `None` when retention is disabled
    pub fn from_config(
        registry: Arc<Registry>,
        activity: ActivityLog,
        config: &RetentionConfig,
    ) -> Option<Self> {
        let minutes = config.retention_minutes?;
        let retention = Duration::try_minutes(minutes)?;

        Some(Self {
            registry,
            activity,
            retention,
            period: std::time::Duration::from_secs(config.sweep_interval_seconds),
        })
    }

    /// Run one purge pass
    pub fn sweep(&self) -> usize {
        let purged = self.registry.purge_expired(self.retention);
        if purged > 0 {
            self.activity.backend(
                Level::Info,
                Package::CronJob,
                format!("Purged {} expired URLs", purged),
            );
        }
        purged
    }

    /// Sweep on every tick until `shutdown` flips to true or its sender is dropped
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            retention_minutes = self.retention.num_minutes(),
            period_secs = self.period.as_secs(),
            "Retention job started"
        );

        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep();
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Retention job stopped");
    }
}
