//! Mock job and listener implementations for testing
//!
//! In-memory recording implementations of the `Job` and
//! `SchedulerListener` capabilities, usable from unit and integration
//! tests without any real workload behind them.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use jobsched_core::traits::{Job, JobExecutionContext, SchedulerListener};
use jobsched_core::SchedulerError;

/// Job that records every execution context it receives and succeeds.
#[derive(Clone, Default)]
pub struct CountingJob {
    executions: Arc<Mutex<Vec<JobExecutionContext>>>,
}

impl CountingJob {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.executions.lock().unwrap().len()
    }

    pub fn executions(&self) -> Vec<JobExecutionContext> {
        self.executions.lock().unwrap().clone()
    }
}

#[async_trait]
impl Job for CountingJob {
    async fn execute(&self, context: JobExecutionContext) -> anyhow::Result<()> {
        self.executions.lock().unwrap().push(context);
        Ok(())
    }
}

/// Job that fails on every execution with a fixed message.
#[derive(Clone)]
pub struct FailingJob {
    message: String,
    attempts: Arc<AtomicUsize>,
}

impl FailingJob {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
            attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Job for FailingJob {
    async fn execute(&self, _context: JobExecutionContext) -> anyhow::Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(anyhow::anyhow!(self.message.clone()))
    }
}

/// Job that blocks until the test releases it, tracking concurrency.
///
/// Each execution waits for one permit from [`GatedJob::release_one`],
/// so a test can hold executions open across trigger intervals and
/// observe the at-most-one-concurrent guarantee via
/// [`GatedJob::max_concurrent`].
#[derive(Clone)]
pub struct GatedJob {
    gate: Arc<Semaphore>,
    started: Arc<AtomicUsize>,
    completed: Arc<AtomicUsize>,
    concurrent: Arc<AtomicUsize>,
    max_concurrent: Arc<AtomicUsize>,
}

impl GatedJob {
    pub fn new() -> Self {
        Self {
            gate: Arc::new(Semaphore::new(0)),
            started: Arc::new(AtomicUsize::new(0)),
            completed: Arc::new(AtomicUsize::new(0)),
            concurrent: Arc::new(AtomicUsize::new(0)),
            max_concurrent: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Allow one pending (or future) execution to finish.
    pub fn release_one(&self) {
        self.gate.add_permits(1);
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent.load(Ordering::SeqCst)
    }
}

impl Default for GatedJob {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Job for GatedJob {
    async fn execute(&self, _context: JobExecutionContext) -> anyhow::Result<()> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let current = self.concurrent.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_concurrent.fetch_max(current, Ordering::SeqCst);

        let permit = self.gate.acquire().await?;
        permit.forget();

        self.concurrent.fetch_sub(1, Ordering::SeqCst);
        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Listener that records success and failure callbacks.
#[derive(Clone, Default)]
pub struct RecordingListener {
    successes: Arc<Mutex<Vec<JobExecutionContext>>>,
    failures: Arc<Mutex<Vec<(JobExecutionContext, SchedulerError)>>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success_count(&self) -> usize {
        self.successes.lock().unwrap().len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.lock().unwrap().len()
    }

    pub fn failures(&self) -> Vec<(JobExecutionContext, SchedulerError)> {
        self.failures.lock().unwrap().clone()
    }
}

#[async_trait]
impl SchedulerListener for RecordingListener {
    async fn on_job_success(&self, context: &JobExecutionContext) {
        self.successes.lock().unwrap().push(context.clone());
    }

    async fn on_job_failure(&self, context: &JobExecutionContext, error: &SchedulerError) {
        self.failures
            .lock()
            .unwrap()
            .push((context.clone(), error.clone()));
    }
}
