use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use jobsched_core::traits::{Job, JobExecutionContext};
use jobsched_core::{
    JobDefinition, JobKey, SchedulerError, SchedulerResult, Trigger, TriggerKey, TriggerState,
};

/// 触发器登记项：触发器本体、所属任务的反向索引和在途执行标记
#[derive(Debug, Clone)]
struct TriggerEntry {
    trigger: Trigger,
    job_key: JobKey,
    in_flight: bool,
}

/// 一次到期触发对应的执行载荷
pub(crate) struct FiredJob {
    pub(crate) executable: Arc<dyn Job>,
    pub(crate) context: JobExecutionContext,
}

/// 调度注册表
///
/// 调度器独占持有的任务与触发器登记。注册之后的实体只能通过
/// 调度器API（暂停/恢复/移除）变更；调度循环的读取和变更与
/// 调用方的注册操作共用同一把锁（锁由调度器持有）。
#[derive(Debug, Default)]
pub struct ScheduleRegistry {
    jobs: HashMap<JobKey, JobDefinition>,
    triggers: HashMap<TriggerKey, TriggerEntry>,
}

impl ScheduleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册任务定义。重复的任务标识会被拒绝且注册表保持不变。
    pub fn register_job(&mut self, job: JobDefinition) -> SchedulerResult<()> {
        if self.jobs.contains_key(&job.key) {
            warn!("拒绝重复注册任务: {}", job.key);
            return Err(SchedulerError::duplicate_job(&job.key));
        }
        debug!("注册任务: {}", job.key);
        self.jobs.insert(job.key.clone(), job);
        Ok(())
    }

    /// 把触发器挂到已注册的任务上
    pub fn schedule_trigger(&mut self, trigger: Trigger, job_key: &JobKey) -> SchedulerResult<()> {
        if !self.jobs.contains_key(job_key) {
            return Err(SchedulerError::job_not_found(job_key));
        }
        if self.triggers.contains_key(&trigger.key) {
            warn!("拒绝重复注册触发器: {}", trigger.key);
            return Err(SchedulerError::duplicate_trigger(&trigger.key));
        }
        debug!("触发器 {} 关联任务 {}", trigger.key, job_key);
        self.triggers.insert(
            trigger.key.clone(),
            TriggerEntry {
                trigger,
                job_key: job_key.clone(),
                in_flight: false,
            },
        );
        Ok(())
    }

    pub fn pause_trigger(&mut self, key: &TriggerKey) -> SchedulerResult<()> {
        let entry = self.entry_mut(key)?;
        entry.trigger.pause();
        Ok(())
    }

    pub fn resume_trigger(&mut self, key: &TriggerKey) -> SchedulerResult<()> {
        let entry = self.entry_mut(key)?;
        entry.trigger.resume();
        Ok(())
    }

    /// 从注册表移除触发器，在途执行不受影响、自行结束
    pub fn unschedule_trigger(&mut self, key: &TriggerKey) -> SchedulerResult<()> {
        self.triggers
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| SchedulerError::trigger_not_found(key))
    }

    pub fn job(&self, key: &JobKey) -> Option<&JobDefinition> {
        self.jobs.get(key)
    }

    pub fn trigger(&self, key: &TriggerKey) -> Option<&Trigger> {
        self.triggers.get(key).map(|entry| &entry.trigger)
    }

    pub fn trigger_state(&self, key: &TriggerKey) -> Option<TriggerState> {
        self.triggers.get(key).map(|entry| entry.trigger.state())
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    pub fn trigger_count(&self) -> usize {
        self.triggers.len()
    }

    /// 取出当前时刻所有到期的触发器并推进其状态。
    ///
    /// 按到期时间从早到晚排序；在途（上一次执行未结束）的触发器
    /// 不会被再次取出。每个取出的触发器记一次触发、标记为在途，
    /// 并基于任务级数据与触发器级数据合并出本次执行的数据映射。
    pub(crate) fn collect_due(&mut self, now: DateTime<Utc>) -> Vec<FiredJob> {
        let mut due_keys: Vec<TriggerKey> = self
            .triggers
            .iter()
            .filter(|(_, entry)| {
                (entry.trigger.allow_concurrent || !entry.in_flight) && entry.trigger.is_due(now)
            })
            .map(|(key, _)| key.clone())
            .collect();
        due_keys.sort_by_key(|key| self.triggers[key].trigger.next_fire());

        let mut fired = Vec::with_capacity(due_keys.len());
        for key in due_keys {
            let Some(entry) = self.triggers.get_mut(&key) else {
                continue;
            };
            let Some(job) = self.jobs.get(&entry.job_key) else {
                // 注册表不变式保证任务存在；防御性跳过而不是让循环崩溃
                warn!("触发器 {} 关联的任务 {} 不存在，跳过", key, entry.job_key);
                continue;
            };
            let Some(scheduled_time) = entry.trigger.fired(now) else {
                continue;
            };
            if !entry.trigger.allow_concurrent {
                entry.trigger.mark_acquired();
                entry.in_flight = true;
            }

            fired.push(FiredJob {
                executable: job.executable(),
                context: JobExecutionContext {
                    job_key: entry.job_key.clone(),
                    trigger_key: key,
                    data: job.data.merged(&entry.trigger.data),
                    scheduled_time,
                    fire_time: now,
                    fire_count: entry.trigger.fire_count(),
                },
            });
        }
        fired
    }

    /// 对应执行结束，清掉在途标记并归还触发器状态
    pub(crate) fn finish_execution(&mut self, key: &TriggerKey) {
        if let Some(entry) = self.triggers.get_mut(key) {
            entry.in_flight = false;
            entry.trigger.release();
        }
    }

    fn entry_mut(&mut self, key: &TriggerKey) -> SchedulerResult<&mut TriggerEntry> {
        self.triggers
            .get_mut(key)
            .ok_or_else(|| SchedulerError::trigger_not_found(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration;
    use jobsched_core::{JobDataMap, Repeat, TriggerSpec};

    struct NoopJob;

    #[async_trait]
    impl Job for NoopJob {
        async fn execute(&self, _context: JobExecutionContext) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn job(name: &str) -> JobDefinition {
        JobDefinition::new(JobKey::with_name(name), Arc::new(NoopJob))
    }

    fn trigger(name: &str, start: DateTime<Utc>) -> Trigger {
        Trigger::new(TriggerSpec {
            name: name.to_string(),
            start_time: Some(start),
            interval: Duration::seconds(1),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_duplicate_job_rejected_and_registry_unchanged() {
        let mut registry = ScheduleRegistry::new();
        registry.register_job(job("j1")).unwrap();

        let mut data = JobDataMap::new();
        data.insert("marker", "second");
        let duplicate = JobDefinition::with_data(JobKey::with_name("j1"), Arc::new(NoopJob), data);

        let err = registry.register_job(duplicate).unwrap_err();
        assert!(matches!(err, SchedulerError::DuplicateJob { .. }));
        assert_eq!(registry.job_count(), 1);
        // 原有定义未被替换
        let kept = registry.job(&JobKey::with_name("j1")).unwrap();
        assert!(kept.data.is_empty());
    }

    #[test]
    fn test_schedule_trigger_requires_job() {
        let mut registry = ScheduleRegistry::new();
        let err = registry
            .schedule_trigger(trigger("t1", Utc::now()), &JobKey::with_name("missing"))
            .unwrap_err();
        assert!(matches!(err, SchedulerError::JobNotFound { .. }));
        assert_eq!(registry.trigger_count(), 0);
    }

    #[test]
    fn test_duplicate_trigger_rejected() {
        let mut registry = ScheduleRegistry::new();
        registry.register_job(job("j1")).unwrap();
        registry
            .schedule_trigger(trigger("t1", Utc::now()), &JobKey::with_name("j1"))
            .unwrap();

        let err = registry
            .schedule_trigger(trigger("t1", Utc::now()), &JobKey::with_name("j1"))
            .unwrap_err();
        assert!(matches!(err, SchedulerError::DuplicateTrigger { .. }));
        assert_eq!(registry.trigger_count(), 1);
    }

    #[test]
    fn test_collect_due_orders_by_due_time() {
        let mut registry = ScheduleRegistry::new();
        registry.register_job(job("j1")).unwrap();

        let base = Utc::now();
        registry
            .schedule_trigger(trigger("late", base + Duration::seconds(2)), &JobKey::with_name("j1"))
            .unwrap();
        registry
            .schedule_trigger(trigger("early", base), &JobKey::with_name("j1"))
            .unwrap();

        let fired = registry.collect_due(base + Duration::seconds(3));
        let order: Vec<&str> = fired
            .iter()
            .map(|f| f.context.trigger_key.name.as_str())
            .collect();
        assert_eq!(order, vec!["early", "late"]);
    }

    #[test]
    fn test_in_flight_trigger_not_collected_again() {
        let mut registry = ScheduleRegistry::new();
        registry.register_job(job("j1")).unwrap();

        let base = Utc::now();
        registry
            .schedule_trigger(trigger("t1", base), &JobKey::with_name("j1"))
            .unwrap();

        let first = registry.collect_due(base);
        assert_eq!(first.len(), 1);

        // 上一次执行未结束，即使又到期也不取出
        let second = registry.collect_due(base + Duration::seconds(5));
        assert!(second.is_empty());

        registry.finish_execution(&TriggerKey::with_name("t1"));
        let third = registry.collect_due(base + Duration::seconds(5));
        assert_eq!(third.len(), 1);
    }

    #[test]
    fn test_merged_data_overlay() {
        let mut registry = ScheduleRegistry::new();
        let base_data: JobDataMap = [("a", 1i64), ("b", 2i64)].into_iter().collect();
        registry
            .register_job(JobDefinition::with_data(
                JobKey::with_name("j1"),
                Arc::new(NoopJob),
                base_data,
            ))
            .unwrap();

        let start = Utc::now();
        let overlay: JobDataMap = [("b", 3i64), ("c", 4i64)].into_iter().collect();
        let t = Trigger::new(TriggerSpec {
            name: "t1".to_string(),
            start_time: Some(start),
            interval: Duration::seconds(1),
            data: overlay,
            ..Default::default()
        })
        .unwrap();
        registry.schedule_trigger(t, &JobKey::with_name("j1")).unwrap();

        let fired = registry.collect_due(start);
        let data = &fired[0].context.data;
        assert_eq!(data.get_integer("a").unwrap(), 1);
        assert_eq!(data.get_integer("b").unwrap(), 3);
        assert_eq!(data.get_integer("c").unwrap(), 4);
    }

    #[test]
    fn test_unschedule_removes_trigger() {
        let mut registry = ScheduleRegistry::new();
        registry.register_job(job("j1")).unwrap();
        registry
            .schedule_trigger(trigger("t1", Utc::now()), &JobKey::with_name("j1"))
            .unwrap();

        registry
            .unschedule_trigger(&TriggerKey::with_name("t1"))
            .unwrap();
        assert_eq!(registry.trigger_count(), 0);

        let err = registry
            .unschedule_trigger(&TriggerKey::with_name("t1"))
            .unwrap_err();
        assert!(matches!(err, SchedulerError::TriggerNotFound { .. }));
    }

    #[test]
    fn test_pause_resume_via_registry() {
        let mut registry = ScheduleRegistry::new();
        registry.register_job(job("j1")).unwrap();
        let start = Utc::now();
        registry
            .schedule_trigger(trigger("t1", start), &JobKey::with_name("j1"))
            .unwrap();
        let key = TriggerKey::with_name("t1");

        registry.pause_trigger(&key).unwrap();
        assert_eq!(registry.trigger_state(&key), Some(TriggerState::Paused));
        assert!(registry.collect_due(start + Duration::seconds(5)).is_empty());

        registry.resume_trigger(&key).unwrap();
        assert_eq!(registry.trigger_state(&key), Some(TriggerState::Waiting));
        assert_eq!(registry.collect_due(start + Duration::seconds(5)).len(), 1);
    }
}
