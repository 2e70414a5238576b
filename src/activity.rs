//! Fire-and-forget activity log.
//!
//! Handlers call [`ActivityLog::log`] with a stack, level, package and message. The
//! entry is queued on an unbounded channel and an [`ActivityWorker`] hands it to a
//! [`LogSink`], retrying failed deliveries. Callers never wait on delivery and never
//! see its errors.

use crate::util::truncate_chars;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Longest message forwarded to a sink, in characters
pub const MAX_MESSAGE_CHARS: usize = 47;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stack {
    Backend,
    Frontend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Package {
    // backend only
    Cache,
    Controller,
    CronJob,
    Db,
    Domain,
    Handler,
    Repository,
    Route,
    Service,
    // frontend only
    Api,
    Component,
    Hook,
    Page,
    State,
    Style,
    // either stack
    Auth,
    Config,
    Middleware,
    Utils,
}

impl Package {
    /// Whether this package may be reported from `stack`
    pub fn allowed_for(self, stack: Stack) -> bool {
        use Package::*;
        match self {
            Cache | Controller | CronJob | Db | Domain | Handler | Repository | Route
            | Service => stack == Stack::Backend,
            Api | Component | Hook | Page | State | Style => stack == Stack::Frontend,
            Auth | Config | Middleware | Utils => true,
        }
    }

    /// Wire spelling of the package name
    pub fn as_str(self) -> &'static str {
        match self {
            Package::Cache => "cache",
            Package::Controller => "controller",
            Package::CronJob => "cron_job",
            Package::Db => "db",
            Package::Domain => "domain",
            Package::Handler => "handler",
            Package::Repository => "repository",
            Package::Route => "route",
            Package::Service => "service",
            Package::Api => "api",
            Package::Component => "component",
            Package::Hook => "hook",
            Package::Page => "page",
            Package::State => "state",
            Package::Style => "style",
            Package::Auth => "auth",
            Package::Config => "config",
            Package::Middleware => "middleware",
            Package::Utils => "utils",
        }
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One activity line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub stack: Stack,
    pub level: Level,
    pub package: Package,
    pub message: String,
}

impl LogEntry {
    /// Build an entry, truncating the message to [`MAX_MESSAGE_CHARS`].
    ///
    /// Returns `None` when the package does not belong to the stack.
    pub fn new(stack: Stack, level: Level, package: Package, message: &str) -> Option<Self> {
        if !package.allowed_for(stack) {
            return None;
        }

        Some(Self {
            stack,
            level,
            package,
            message: truncate_chars(message, MAX_MESSAGE_CHARS).to_string(),
        })
    }
}

#[derive(Debug, Error)]
#[error("log delivery failed: {0}")]
pub struct SinkError(pub String);

/// Destination for activity entries
#[cfg_attr(test, mockall::automock)]
pub trait LogSink: Send + Sync {
    fn deliver(&self, entry: &LogEntry) -> Result<(), SinkError>;
}

/// Sink that re-emits entries as tracing events under the `activity` target
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn deliver(&self, entry: &LogEntry) -> Result<(), SinkError> {
        let stack = match entry.stack {
            Stack::Backend => "backend",
            Stack::Frontend => "frontend",
        };
        let package = entry.package.as_str();
        let fatal = entry.level == Level::Fatal;

        match entry.level {
            Level::Debug => {
                tracing::debug!(target: "activity", stack, package, "{}", entry.message)
            }
            Level::Info => {
                tracing::info!(target: "activity", stack, package, "{}", entry.message)
            }
            Level::Warn => {
                tracing::warn!(target: "activity", stack, package, "{}", entry.message)
            }
            Level::Error | Level::Fatal => {
                tracing::error!(target: "activity", stack, package, fatal, "{}", entry.message)
            }
        }

        Ok(())
    }
}

/// Background worker configuration
#[derive(Clone)]
pub struct WorkerConfig {
    /// Maximum retries for failed deliveries
    pub max_retries: u32,
    /// Backoff duration between retries
    pub retry_delay_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_ms: 200,
        }
    }
}

/// Drains queued entries into a sink
pub struct ActivityWorker {
    sink: Arc<dyn LogSink>,
    receiver: mpsc::UnboundedReceiver<LogEntry>,
    config: WorkerConfig,
}

impl ActivityWorker {
    pub fn new(sink: Arc<dyn LogSink>, receiver: mpsc::UnboundedReceiver<LogEntry>) -> Self {
        Self {
            sink,
            receiver,
            config: WorkerConfig::default(),
        }
    }

    /// Set worker configuration
    pub fn with_config(mut self, config: WorkerConfig) -> Self {
        self.config = config;
        self
    }

    /// Run the worker - delivers entries until every sender is dropped
    pub async fn run(mut self) {
        info!("Activity worker started");

        while let Some(entry) = self.receiver.recv().await {
            self.deliver(entry).await;
        }

        info!("Activity worker stopped");
    }

    /// Deliver a single entry with retries
    async fn deliver(&self, entry: LogEntry) {
        let mut retries = 0;

        loop {
            match self.sink.deliver(&entry) {
                Ok(()) => break,
                Err(e) if retries < self.config.max_retries => {
                    retries += 1;
                    let delay = std::time::Duration::from_millis(self.config.retry_delay_ms);
                    warn!(
                        "Activity delivery failed (attempt {}/{}), retrying in {:?}: {}",
                        retries, self.config.max_retries, delay, e
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    error!(
                        "Dropping activity entry after {} retries: {}",
                        self.config.max_retries, e
                    );
                    break;
                }
            }
        }
    }
}

/// Handle used to submit activity entries
#[derive(Clone)]
pub struct ActivityLog {
    sender: mpsc::UnboundedSender<LogEntry>,
}

impl ActivityLog {
    pub fn new(sender: mpsc::UnboundedSender<LogEntry>) -> Self {
        Self { sender }
    }

    /// Queue an entry; never blocks and never fails the caller
    pub fn log(&self, stack: Stack, level: Level, package: Package, message: impl AsRef<str>) {
        let Some(entry) = LogEntry::new(stack, level, package, message.as_ref()) else {
            warn!(?stack, %package, "Package not allowed for stack, activity entry dropped");
            return;
        };

        if self.sender.send(entry).is_err() {
            error!("Failed to queue activity entry - worker may have stopped");
        }
    }

    /// Shorthand for backend entries
    pub fn backend(&self, level: Level, package: Package, message: impl AsRef<str>) {
        self.log(Stack::Backend, level, package, message);
    }
}

/// Create a new activity handle and receiver pair
pub fn create_activity_channel() -> (ActivityLog, mpsc::UnboundedReceiver<LogEntry>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (ActivityLog::new(sender), receiver)
}
