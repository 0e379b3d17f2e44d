pub mod data_map;
pub mod job;
pub mod trigger;

pub use data_map::{JobDataMap, JobDataValue};
pub use job::{JobDefinition, JobKey};
pub use trigger::{Repeat, Trigger, TriggerKey, TriggerSpec, TriggerState};
