//! Shared test utilities for the jobsched workspace
//!
//! Provides mock job implementations and test data builders so that
//! scheduler tests don't have to re-implement recording jobs by hand.

pub mod builders;
pub mod mocks;

pub use builders::TriggerBuilder;
pub use mocks::{CountingJob, FailingJob, GatedJob, RecordingListener};
