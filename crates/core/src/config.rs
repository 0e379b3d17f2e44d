use serde::{Deserialize, Serialize};

use crate::errors::{SchedulerError, SchedulerResult};

/// 调度器运行配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// 调度循环轮询间隔（毫秒）
    pub tick_interval_ms: u64,
    /// 优雅关闭时等待运行中任务完成的超时（秒）
    pub shutdown_timeout_seconds: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            shutdown_timeout_seconds: 30,
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> SchedulerResult<()> {
        if self.tick_interval_ms == 0 {
            return Err(SchedulerError::config_error("tick_interval_ms 必须大于0"));
        }
        Ok(())
    }
}
