pub mod config;
pub mod errors;
pub mod logging;
pub mod models;
pub mod traits;

pub use config::SchedulerConfig;
pub use errors::{SchedulerError, SchedulerResult};
pub use logging::{init_logging, LogFormat, LoggingConfig, StructuredLogger};
pub use models::{
    JobDataMap, JobDataValue, JobDefinition, JobKey, Repeat, Trigger, TriggerKey, TriggerSpec,
    TriggerState,
};
pub use traits::{Job, JobExecutionContext, SchedulerListener};
