//! Test data builders for triggers
//!
//! Builder with sensible defaults for constructing triggers in tests;
//! production code goes through the validated `TriggerSpec` directly.

use chrono::{DateTime, Duration, Utc};

use jobsched_core::{JobDataMap, JobDataValue, Repeat, Trigger, TriggerSpec};

/// Builder for test [`Trigger`] instances.
pub struct TriggerBuilder {
    spec: TriggerSpec,
}

impl TriggerBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            spec: TriggerSpec {
                name: name.to_string(),
                group: "default".to_string(),
                start_time: None,
                interval: Duration::seconds(1),
                repeat: Repeat::Forever,
                allow_concurrent: false,
                data: JobDataMap::new(),
            },
        }
    }

    pub fn with_group(mut self, group: &str) -> Self {
        self.spec.group = group.to_string();
        self
    }

    pub fn with_start_time(mut self, start_time: DateTime<Utc>) -> Self {
        self.spec.start_time = Some(start_time);
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.spec.interval = interval;
        self
    }

    pub fn with_repeat(mut self, repeat: Repeat) -> Self {
        self.spec.repeat = repeat;
        self
    }

    pub fn allow_concurrent(mut self) -> Self {
        self.spec.allow_concurrent = true;
        self
    }

    pub fn with_data(mut self, data: JobDataMap) -> Self {
        self.spec.data = data;
        self
    }

    pub fn with_entry<V: Into<JobDataValue>>(mut self, key: &str, value: V) -> Self {
        self.spec.data.insert(key, value);
        self
    }

    pub fn build_spec(self) -> TriggerSpec {
        self.spec
    }

    pub fn build(self) -> Trigger {
        Trigger::new(self.spec).expect("test trigger spec should be valid")
    }
}
