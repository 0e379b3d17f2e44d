//! 任务执行接口定义
//!
//! 调度核心只持有 `Arc<dyn Job>` 的不透明引用，从不关心具体类型；
//! 任务内部做什么（控制台输出、网络调用等）不属于调度核心的职责。

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{JobDataMap, JobKey, TriggerKey};

/// 任务执行上下文
///
/// 每次触发时由调度循环构造并传入任务。`data` 是任务级数据被
/// 触发器级数据逐键覆盖后的合并结果。
#[derive(Debug, Clone)]
pub struct JobExecutionContext {
    /// 本次执行的任务标识
    pub job_key: JobKey,
    /// 发起本次执行的触发器标识
    pub trigger_key: TriggerKey,
    /// 合并后的执行数据
    pub data: JobDataMap,
    /// 本次触发的计划时间
    pub scheduled_time: DateTime<Utc>,
    /// 实际触发时间（迟到的检查会晚于计划时间）
    pub fire_time: DateTime<Utc>,
    /// 该触发器的累计触发次数（含本次）
    pub fire_count: u32,
}

/// 任务执行核心接口
///
/// 由使用方实现的唯一能力：执行一次任务。返回 `Err` 表示本次执行
/// 失败，调度核心会记录并通知监听器，但不会中断调度循环，
/// 也不影响该触发器后续的触发。
///
/// # 示例
///
/// ```rust
/// use async_trait::async_trait;
/// use jobsched_core::traits::{Job, JobExecutionContext};
///
/// struct GreetingJob;
///
/// #[async_trait]
/// impl Job for GreetingJob {
///     async fn execute(&self, context: JobExecutionContext) -> anyhow::Result<()> {
///         let greeting = context.data.get_string("greeting")?;
///         println!("{} says: {}", context.job_key, greeting);
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Job: Send + Sync {
    async fn execute(&self, context: JobExecutionContext) -> anyhow::Result<()>;
}
