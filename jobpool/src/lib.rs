// SPDX-License-Identifier: MIT
// jobpool: bounded worker-pool job dispatcher
//
// - A fixed set of worker threads pulls jobs through an idle registry.
// - Callers wait for a batch with a completion tracker, then stop the pool.
//
// Author: Johannes Leupolz <dev@leupolz.eu>

pub mod config;
pub mod error;
pub mod job_engine;
pub mod jobs;

pub use config::PoolConfig;
pub use error::PoolError;
pub use job_engine::closure_task::ClosureTask;
pub use job_engine::completion::CompletionTracker;
pub use job_engine::dispatcher::{Dispatcher, ShutdownReport};
pub use job_engine::job::{Job, JobId, JobOutcome, Task};
pub use job_engine::stats::PoolStats;
pub use job_engine::submission::{SubmissionQueue, Submitter};
pub use job_engine::worker::{WorkerId, WorkerState};
pub use jobs::check_file_task::CheckFileTask;
