use async_trait::async_trait;

use crate::errors::SchedulerError;
use crate::traits::JobExecutionContext;

/// 调度事件监听接口
///
/// 执行结果不会同步返回给调用方（触发调度的调用早已返回），
/// 需要感知执行成败的调用方通过监听器订阅。默认实现为空操作。
#[async_trait]
pub trait SchedulerListener: Send + Sync {
    /// 任务执行成功
    async fn on_job_success(&self, _context: &JobExecutionContext) {}

    /// 任务执行失败
    async fn on_job_failure(&self, _context: &JobExecutionContext, _error: &SchedulerError) {}
}
