//! 进程内任务调度核心
//!
//! 对外统一导出核心类型与调度器，使用方只需依赖本crate。

pub use jobsched_core::{
    init_logging, models, traits, JobDataMap, JobDataValue, JobDefinition, JobExecutionContext,
    JobKey, LogFormat, LoggingConfig, Repeat, SchedulerConfig, SchedulerError, SchedulerResult,
    StructuredLogger, Trigger, TriggerKey, TriggerSpec, TriggerState,
};
pub use jobsched_core::traits::{Job, SchedulerListener};
pub use jobsched_dispatcher::{ScheduleRegistry, Scheduler, ShutdownManager};
