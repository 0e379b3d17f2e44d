use thiserror::Error;

use crate::models::{JobKey, TriggerKey};

/// 调度核心统一错误类型
#[derive(Error, Debug, Clone)]
pub enum SchedulerError {
    #[error("任务已存在: {key}")]
    DuplicateJob { key: JobKey },
    #[error("触发器已存在: {key}")]
    DuplicateTrigger { key: TriggerKey },
    #[error("任务不存在: {key}")]
    JobNotFound { key: JobKey },
    #[error("触发器不存在: {key}")]
    TriggerNotFound { key: TriggerKey },
    #[error("触发器配置无效: {0}")]
    InvalidTrigger(String),
    #[error("数据键不存在: {key}")]
    DataKeyNotFound { key: String },
    #[error("数据类型不匹配: key={key}, 期望={expected}, 实际={actual}")]
    DataTypeMismatch {
        key: String,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("任务执行失败: {key}: {message}")]
    JobExecution { key: JobKey, message: String },
    #[error("等待运行中任务完成超时: {seconds}秒")]
    ShutdownWaitTimeout { seconds: u64 },
    #[error("配置错误: {0}")]
    Configuration(String),
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;

impl SchedulerError {
    pub fn duplicate_job(key: &JobKey) -> Self {
        Self::DuplicateJob { key: key.clone() }
    }
    pub fn duplicate_trigger(key: &TriggerKey) -> Self {
        Self::DuplicateTrigger { key: key.clone() }
    }
    pub fn job_not_found(key: &JobKey) -> Self {
        Self::JobNotFound { key: key.clone() }
    }
    pub fn trigger_not_found(key: &TriggerKey) -> Self {
        Self::TriggerNotFound { key: key.clone() }
    }
    pub fn invalid_trigger<S: Into<String>>(msg: S) -> Self {
        Self::InvalidTrigger(msg.into())
    }
    pub fn config_error<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }
    pub fn job_execution(key: &JobKey, err: &anyhow::Error) -> Self {
        Self::JobExecution {
            key: key.clone(),
            message: format!("{err:#}"),
        }
    }
    /// 注册或调度阶段的错误，会同步返回给调用方
    pub fn is_registration_error(&self) -> bool {
        matches!(
            self,
            SchedulerError::DuplicateJob { .. }
                | SchedulerError::DuplicateTrigger { .. }
                | SchedulerError::JobNotFound { .. }
                | SchedulerError::TriggerNotFound { .. }
                | SchedulerError::InvalidTrigger(_)
        )
    }
}
