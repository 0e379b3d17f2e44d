//! Structured logging utilities
//!
//! Emits structured events for the scheduler lifecycle and job executions.
//! The embedding process installs the `tracing` subscriber (the log sink);
//! the core only emits events against whatever sink is installed.

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::errors::{SchedulerError, SchedulerResult};
use crate::models::{JobKey, TriggerKey};

/// Structured logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Install a global `tracing` subscriber according to the config.
///
/// Intended for binaries and demos; library embedders usually install
/// their own subscriber instead.
pub fn init_logging(config: &LoggingConfig) -> SchedulerResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));

    let result = match config.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).try_init(),
    };

    result.map_err(|e| SchedulerError::config_error(format!("日志初始化失败: {e}")))
}

/// Structured logging utilities
pub struct StructuredLogger;

impl StructuredLogger {
    /// Log scheduler start
    pub fn log_scheduler_started(tick_interval_ms: u64) {
        info!(
            event = "scheduler_started",
            scheduler.tick_interval_ms = tick_interval_ms,
            "Scheduler started"
        );
    }

    /// Log scheduler shutdown
    pub fn log_scheduler_shutdown(wait_for_jobs: bool) {
        info!(
            event = "scheduler_shutdown",
            scheduler.wait_for_jobs = wait_for_jobs,
            "Scheduler shut down"
        );
    }

    /// Log trigger fire
    pub fn log_trigger_fired(
        trigger_key: &TriggerKey,
        job_key: &JobKey,
        scheduled_time: chrono::DateTime<chrono::Utc>,
        fire_count: u32,
    ) {
        info!(
            event = "trigger_fired",
            trigger.key = %trigger_key,
            job.key = %job_key,
            trigger.scheduled_time = %scheduled_time,
            trigger.fire_count = fire_count,
            "Trigger fired"
        );
    }

    /// Log job execution completion
    pub fn log_job_success(job_key: &JobKey, trigger_key: &TriggerKey, duration_ms: u64) {
        info!(
            event = "job_success",
            job.key = %job_key,
            trigger.key = %trigger_key,
            job.duration_ms = duration_ms,
            "Job execution completed successfully"
        );
    }

    /// Log job execution failure
    pub fn log_job_failure(
        job_key: &JobKey,
        trigger_key: &TriggerKey,
        duration_ms: u64,
        error: &SchedulerError,
    ) {
        error!(
            event = "job_failure",
            job.key = %job_key,
            trigger.key = %trigger_key,
            job.duration_ms = duration_ms,
            job.error = %error,
            "Job execution failed"
        );
    }
}
