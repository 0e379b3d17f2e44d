//! 固定间隔触发的最小示例
//!
//! 注册一个带数据的任务，挂上每5秒触发一次的触发器，运行一段时间
//! 后优雅关闭。运行: cargo run -p jobsched-dispatcher --example interval_demo

use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::Duration;
use tracing::info;

use jobsched_core::traits::{Job, JobExecutionContext};
use jobsched_core::{
    init_logging, JobDataMap, JobDefinition, JobKey, LoggingConfig, Repeat, SchedulerConfig,
    Trigger, TriggerSpec,
};
use jobsched_dispatcher::Scheduler;

struct GreetingJob;

#[async_trait]
impl Job for GreetingJob {
    async fn execute(&self, context: JobExecutionContext) -> anyhow::Result<()> {
        let greeting = context.data.get_string("greeting")?;
        let float_value = context.data.get_float("float_value")?;
        info!(
            "任务 {} 第{}次执行: {} (float_value={})",
            context.job_key, context.fire_count, greeting, float_value
        );
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging(&LoggingConfig::default())?;

    let scheduler = Scheduler::new(SchedulerConfig::default())?;

    let mut data = JobDataMap::new();
    data.insert("greeting", "Hello World!");
    data.insert("float_value", 3.141f32);

    let job_key = JobKey::new("myJob", "group1");
    scheduler
        .register_job(JobDefinition::with_data(
            job_key.clone(),
            Arc::new(GreetingJob),
            data,
        ))
        .await?;

    let trigger = Trigger::new(TriggerSpec {
        name: "trigger1".to_string(),
        group: "group1".to_string(),
        interval: Duration::seconds(5),
        repeat: Repeat::Forever,
        ..Default::default()
    })?;
    scheduler.schedule_trigger(trigger, &job_key).await?;

    scheduler.start().await?;

    // 运行一分钟观察输出
    tokio::time::sleep(StdDuration::from_secs(60)).await;

    scheduler.shutdown(true).await?;
    Ok(())
}
