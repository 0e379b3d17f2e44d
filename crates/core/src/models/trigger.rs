use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{SchedulerError, SchedulerResult};
use crate::models::JobDataMap;

/// 触发器标识
///
/// (name, group) 二元组，在注册表中全局唯一。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TriggerKey {
    pub name: String,
    pub group: String,
}

impl TriggerKey {
    pub fn new<N: Into<String>, G: Into<String>>(name: N, group: G) -> Self {
        Self {
            name: name.into(),
            group: group.into(),
        }
    }

    /// 使用默认分组 `default` 创建
    pub fn with_name<N: Into<String>>(name: N) -> Self {
        Self::new(name, "default")
    }
}

impl fmt::Display for TriggerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.group, self.name)
    }
}

/// 重复策略
///
/// `Times(n)` 表示首次触发之后再重复n次，共n+1次；`Forever` 表示
/// 一直触发直到被显式移除或调度器关闭。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Repeat {
    Forever,
    Times(u32),
}

/// 触发器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerState {
    /// 等待到达下次触发时间
    Waiting,
    /// 已被调度循环取走，对应的任务执行还未结束
    Acquired,
    /// 被显式暂停
    Paused,
    /// 重复预算耗尽，不再触发
    Complete,
}

/// 触发器配置
///
/// 显式配置结构，在 [`Trigger::new`] 中一次性校验，
/// 非法配置立即返回 [`SchedulerError::InvalidTrigger`] 而不是等到首次触发。
#[derive(Debug, Clone)]
pub struct TriggerSpec {
    pub name: String,
    pub group: String,
    /// 首次触发时间，None 表示构造触发器时立即生效
    pub start_time: Option<DateTime<Utc>>,
    pub interval: Duration,
    pub repeat: Repeat,
    /// 允许同一触发器的多次执行并行。默认关闭：上一次执行未结束时
    /// 即使再次到期也不触发。
    pub allow_concurrent: bool,
    pub data: JobDataMap,
}

impl Default for TriggerSpec {
    fn default() -> Self {
        Self {
            name: String::new(),
            group: "default".to_string(),
            start_time: None,
            interval: Duration::zero(),
            repeat: Repeat::Forever,
            allow_concurrent: false,
            data: JobDataMap::new(),
        }
    }
}

/// 触发器
///
/// 固定间隔的触发规则，持有自身的数据映射和可变的调度状态。
/// 调度循环每次触发后通过 [`Trigger::fired`] 推进状态。
#[derive(Debug, Clone)]
pub struct Trigger {
    pub key: TriggerKey,
    pub start_time: DateTime<Utc>,
    pub interval: Duration,
    pub repeat: Repeat,
    pub allow_concurrent: bool,
    pub data: JobDataMap,
    state: TriggerState,
    next_fire: Option<DateTime<Utc>>,
    fire_count: u32,
}

impl Trigger {
    pub fn new(spec: TriggerSpec) -> SchedulerResult<Self> {
        if spec.name.is_empty() {
            return Err(SchedulerError::invalid_trigger("触发器名称不能为空"));
        }
        if spec.interval <= Duration::zero() {
            return Err(SchedulerError::invalid_trigger(format!(
                "触发间隔必须为正: {}毫秒",
                spec.interval.num_milliseconds()
            )));
        }

        let start_time = spec.start_time.unwrap_or_else(Utc::now);
        Ok(Self {
            key: TriggerKey::new(spec.name, spec.group),
            start_time,
            interval: spec.interval,
            repeat: spec.repeat,
            allow_concurrent: spec.allow_concurrent,
            data: spec.data,
            state: TriggerState::Waiting,
            next_fire: Some(start_time),
            fire_count: 0,
        })
    }

    pub fn state(&self) -> TriggerState {
        self.state
    }

    pub fn next_fire(&self) -> Option<DateTime<Utc>> {
        self.next_fire
    }

    pub fn fire_count(&self) -> u32 {
        self.fire_count
    }

    pub fn is_complete(&self) -> bool {
        self.state == TriggerState::Complete
    }

    /// 是否应该在当前时刻触发
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.state == TriggerState::Waiting
            && self.next_fire.is_some_and(|next| next <= now)
    }

    /// 记录一次触发并推进调度状态，返回本次触发对应的计划时间。
    ///
    /// 迟到的检查只会补触发这一次；错过的节拍被跳过，后续触发
    /// 保持 `start_time + k * interval` 的原有相位，不会连环补发。
    /// 被跳过的节拍不消耗重复预算。
    pub fn fired(&mut self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let scheduled = self.next_fire?;
        self.fire_count = self.fire_count.saturating_add(1);

        if self.budget_exhausted() {
            self.state = TriggerState::Complete;
            self.next_fire = None;
        } else {
            let mut next = scheduled + self.interval;
            while next <= now {
                next += self.interval;
            }
            self.next_fire = Some(next);
        }
        Some(scheduled)
    }

    /// 标记已被调度循环取走（对应执行在途）
    pub fn mark_acquired(&mut self) {
        if self.state == TriggerState::Waiting {
            self.state = TriggerState::Acquired;
        }
    }

    /// 对应执行结束后归还；期间若被暂停或已完成则保持原状态
    pub fn release(&mut self) {
        if self.state == TriggerState::Acquired {
            self.state = TriggerState::Waiting;
        }
    }

    /// 暂停触发。已完成的触发器视为无操作。
    pub fn pause(&mut self) {
        if self.state != TriggerState::Complete {
            self.state = TriggerState::Paused;
        }
    }

    /// 恢复被暂停的触发器。过期的 next_fire 由错过补发规则处理。
    pub fn resume(&mut self) {
        if self.state == TriggerState::Paused {
            self.state = TriggerState::Waiting;
        }
    }

    fn budget_exhausted(&self) -> bool {
        match self.repeat {
            Repeat::Forever => false,
            Repeat::Times(n) => u64::from(self.fire_count) >= u64::from(n) + 1,
        }
    }
}
