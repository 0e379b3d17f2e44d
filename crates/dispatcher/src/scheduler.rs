use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tokio::sync::{broadcast, Notify, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout, Instant};
use tracing::{debug, info, warn};

use jobsched_core::traits::SchedulerListener;
use jobsched_core::{
    JobDefinition, JobKey, SchedulerConfig, SchedulerError, SchedulerResult, StructuredLogger,
    Trigger, TriggerKey, TriggerState,
};

use crate::registry::{FiredJob, ScheduleRegistry};
use crate::shutdown::ShutdownManager;

/// 在途执行计数器，供等待式关闭排空
struct ExecutionTracker {
    running: AtomicUsize,
    drained: Notify,
}

impl ExecutionTracker {
    fn new() -> Self {
        Self {
            running: AtomicUsize::new(0),
            drained: Notify::new(),
        }
    }

    fn enter(&self) {
        self.running.fetch_add(1, Ordering::SeqCst);
    }

    fn exit(&self) {
        if self.running.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.drained.notify_waiters();
        }
    }

    fn running(&self) -> usize {
        self.running.load(Ordering::SeqCst)
    }

    async fn wait_idle(&self) {
        loop {
            // 先登记唤醒再检查计数，避免丢失通知
            let drained = self.drained.notified();
            if self.running() == 0 {
                return;
            }
            drained.await;
        }
    }
}

/// 单调时钟换算出的调度时间源
///
/// 调度判定用 `wall_base + 单调流逝时间`，系统时钟被回拨或跳变
/// 不会造成触发器提前或重复触发。
#[derive(Clone, Copy)]
struct TickClock {
    wall_base: DateTime<Utc>,
    instant_base: Instant,
}

impl TickClock {
    fn start() -> Self {
        Self {
            wall_base: Utc::now(),
            instant_base: Instant::now(),
        }
    }

    fn now(&self) -> DateTime<Utc> {
        let elapsed = self.instant_base.elapsed();
        self.wall_base + ChronoDuration::milliseconds(elapsed.as_millis() as i64)
    }
}

/// 进程内任务调度器
///
/// 持有任务/触发器注册表并运行调度循环：到期的触发器在各自独立的
/// tokio task 中执行对应任务，单个任务的失败只会被记录和上报，
/// 不会中断调度循环或影响其他任务的触发。
///
/// 注册、暂停等控制操作在启动前后都可以调用；所有注册表访问
/// （包括调度循环内的读写）都经过同一把锁。
pub struct Scheduler {
    config: SchedulerConfig,
    registry: Arc<RwLock<ScheduleRegistry>>,
    listeners: Arc<RwLock<Vec<Arc<dyn SchedulerListener>>>>,
    shutdown: ShutdownManager,
    tracker: Arc<ExecutionTracker>,
    is_running: Arc<RwLock<bool>>,
    loop_handle: Arc<RwLock<Option<JoinHandle<()>>>>,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> SchedulerResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    /// 使用默认配置创建
    pub fn with_defaults() -> Self {
        Self::build(SchedulerConfig::default())
    }

    fn build(config: SchedulerConfig) -> Self {
        Self {
            config,
            registry: Arc::new(RwLock::new(ScheduleRegistry::new())),
            listeners: Arc::new(RwLock::new(Vec::new())),
            shutdown: ShutdownManager::new(),
            tracker: Arc::new(ExecutionTracker::new()),
            is_running: Arc::new(RwLock::new(false)),
            loop_handle: Arc::new(RwLock::new(None)),
        }
    }

    /// 注册任务定义，重复的任务标识返回 [`SchedulerError::DuplicateJob`]
    pub async fn register_job(&self, job: JobDefinition) -> SchedulerResult<()> {
        let key = job.key.clone();
        self.registry.write().await.register_job(job)?;
        info!("任务 {} 已注册", key);
        Ok(())
    }

    /// 把触发器挂到已注册的任务上
    pub async fn schedule_trigger(
        &self,
        trigger: Trigger,
        job_key: &JobKey,
    ) -> SchedulerResult<()> {
        let trigger_key = trigger.key.clone();
        self.registry
            .write()
            .await
            .schedule_trigger(trigger, job_key)?;
        info!("触发器 {} 已关联任务 {}", trigger_key, job_key);
        Ok(())
    }

    /// 订阅任务执行成败事件
    pub async fn add_listener(&self, listener: Arc<dyn SchedulerListener>) {
        self.listeners.write().await.push(listener);
    }

    /// 启动调度循环。重复启动是无操作。
    pub async fn start(&self) -> SchedulerResult<()> {
        let mut is_running = self.is_running.write().await;
        if *is_running {
            warn!("调度器已经在运行，忽略重复启动");
            return Ok(());
        }
        if self.shutdown.is_shutdown() {
            warn!("调度器已关闭，忽略启动请求");
            return Ok(());
        }
        *is_running = true;

        let tick = StdDuration::from_millis(self.config.tick_interval_ms);
        let handle = tokio::spawn(run_dispatch_loop(
            Arc::clone(&self.registry),
            Arc::clone(&self.listeners),
            Arc::clone(&self.tracker),
            tick,
            self.shutdown.subscribe(),
        ));
        *self.loop_handle.write().await = Some(handle);

        StructuredLogger::log_scheduler_started(self.config.tick_interval_ms);
        Ok(())
    }

    /// 关闭调度器，停止一切后续触发。
    ///
    /// `wait_for_jobs` 为真时等待在途执行完成，超过配置的
    /// `shutdown_timeout_seconds` 返回 [`SchedulerError::ShutdownWaitTimeout`]；
    /// 为假时立即返回，在途执行自行结束。
    pub async fn shutdown(&self, wait_for_jobs: bool) -> SchedulerResult<()> {
        {
            let mut is_running = self.is_running.write().await;
            if !*is_running {
                debug!("调度器未在运行");
            }
            *is_running = false;
        }

        self.shutdown.shutdown();
        if let Some(handle) = self.loop_handle.write().await.take() {
            let _ = handle.await;
        }
        StructuredLogger::log_scheduler_shutdown(wait_for_jobs);

        if wait_for_jobs {
            let seconds = self.config.shutdown_timeout_seconds;
            match timeout(StdDuration::from_secs(seconds), self.tracker.wait_idle()).await {
                Ok(()) => info!("所有在途任务已完成"),
                Err(_) => {
                    warn!("等待在途任务完成超时（{}秒）", seconds);
                    return Err(SchedulerError::ShutdownWaitTimeout { seconds });
                }
            }
        } else if self.tracker.running() > 0 {
            info!("还有 {} 个任务在途，交由其自行结束", self.tracker.running());
        }
        Ok(())
    }

    pub async fn pause_trigger(&self, key: &TriggerKey) -> SchedulerResult<()> {
        self.registry.write().await.pause_trigger(key)?;
        info!("触发器 {} 已暂停", key);
        Ok(())
    }

    pub async fn resume_trigger(&self, key: &TriggerKey) -> SchedulerResult<()> {
        self.registry.write().await.resume_trigger(key)?;
        info!("触发器 {} 已恢复", key);
        Ok(())
    }

    pub async fn unschedule_trigger(&self, key: &TriggerKey) -> SchedulerResult<()> {
        self.registry.write().await.unschedule_trigger(key)?;
        info!("触发器 {} 已移除", key);
        Ok(())
    }

    pub async fn is_started(&self) -> bool {
        *self.is_running.read().await
    }

    /// 当前在途的任务执行数
    pub fn running_jobs(&self) -> usize {
        self.tracker.running()
    }

    pub async fn trigger_state(&self, key: &TriggerKey) -> Option<TriggerState> {
        self.registry.read().await.trigger_state(key)
    }

    pub async fn trigger_fire_count(&self, key: &TriggerKey) -> Option<u32> {
        self.registry
            .read()
            .await
            .trigger(key)
            .map(|trigger| trigger.fire_count())
    }
}

async fn run_dispatch_loop(
    registry: Arc<RwLock<ScheduleRegistry>>,
    listeners: Arc<RwLock<Vec<Arc<dyn SchedulerListener>>>>,
    tracker: Arc<ExecutionTracker>,
    tick: StdDuration,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let clock = TickClock::start();
    let mut ticker = interval(tick);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                dispatch_due(&registry, &listeners, &tracker, clock.now()).await;
            }
            _ = shutdown_rx.recv() => {
                info!("调度循环收到关闭信号，停止触发");
                break;
            }
        }
    }
}

/// 取出到期触发器并逐个派发执行。
///
/// 每次执行跑在独立的 tokio task 中：慢任务不会拖延其他到期
/// 触发器的检测，失败和panic都被隔离在该task内。
async fn dispatch_due(
    registry: &Arc<RwLock<ScheduleRegistry>>,
    listeners: &Arc<RwLock<Vec<Arc<dyn SchedulerListener>>>>,
    tracker: &Arc<ExecutionTracker>,
    now: DateTime<Utc>,
) {
    let fired = registry.write().await.collect_due(now);
    for FiredJob {
        executable,
        context,
    } in fired
    {
        StructuredLogger::log_trigger_fired(
            &context.trigger_key,
            &context.job_key,
            context.scheduled_time,
            context.fire_count,
        );

        tracker.enter();
        let registry = Arc::clone(registry);
        let listeners = Arc::clone(listeners);
        let tracker = Arc::clone(tracker);
        tokio::spawn(async move {
            let started = Instant::now();

            // 任务本体再包一层task，panic只表现为JoinError
            let execution = tokio::spawn({
                let context = context.clone();
                async move { executable.execute(context).await }
            });
            let result = match execution.await {
                Ok(result) => result,
                Err(join_error) => Err(anyhow::anyhow!("任务执行panic: {join_error}")),
            };
            let duration_ms = started.elapsed().as_millis() as u64;

            match result {
                Ok(()) => {
                    StructuredLogger::log_job_success(
                        &context.job_key,
                        &context.trigger_key,
                        duration_ms,
                    );
                    let listeners = listeners.read().await;
                    for listener in listeners.iter() {
                        listener.on_job_success(&context).await;
                    }
                }
                Err(err) => {
                    let error = SchedulerError::job_execution(&context.job_key, &err);
                    StructuredLogger::log_job_failure(
                        &context.job_key,
                        &context.trigger_key,
                        duration_ms,
                        &error,
                    );
                    let listeners = listeners.read().await;
                    for listener in listeners.iter() {
                        listener.on_job_failure(&context, &error).await;
                    }
                }
            }

            registry.write().await.finish_execution(&context.trigger_key);
            tracker.exit();
        });
    }
}
