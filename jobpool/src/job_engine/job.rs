// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};

use log::error;
use serde::Serialize;

use crate::job_engine::completion::CompletionTracker;

static NEXT_JOB_ID: AtomicU64 = AtomicU64::new(1);

/// The opaque body of a job. The pool never looks inside; it only runs it
/// once on some worker thread and records whether it returned an error.
pub trait Task: Send + 'static {
    /// Free-form description, used for logging or debugging
    fn desc(&self) -> &str;

    /// Runs the work synchronously on the calling worker thread.
    fn run(&self) -> anyhow::Result<()>;
}

impl fmt::Debug for dyn Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").field("desc", &self.desc()).finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct JobId(u64);

impl JobId {
    fn next() -> Self {
        JobId(NEXT_JOB_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

/// What a job's completion signal reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "kebab-case")]
pub enum JobOutcome {
    Succeeded,
    /// The task returned an error or panicked. Still counts as completed.
    Failed(String),
    /// The job never ran, e.g. because the pool was stopped underneath it.
    Canceled(String),
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Succeeded)
    }
}

type OnComplete = Box<dyn FnOnce(&JobOutcome) + Send + 'static>;

/// One-shot completion signal. Whatever happens to the owning job, the
/// callback runs exactly once: explicitly through `fire`, or from `Drop`.
struct Completion {
    job_id: JobId,
    callback: Option<OnComplete>,
}

impl Completion {
    fn fire(mut self, outcome: &JobOutcome) {
        self.invoke(outcome);
    }

    fn invoke(&mut self, outcome: &JobOutcome) {
        if let Some(callback) = self.callback.take() {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| callback(outcome))) {
                error!(
                    "completion callback of {} panicked: {}",
                    self.job_id,
                    panic_message(payload.as_ref())
                );
            }
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        self.invoke(&JobOutcome::Canceled(
            "job dropped before execution".into(),
        ));
    }
}

/// A unit of work plus its completion signal. Immutable once created and
/// consumed by exactly one worker.
pub struct Job {
    id: JobId,
    task: Box<dyn Task>,
    completion: Completion,
}

impl Job {
    pub fn new<T, F>(task: T, on_complete: F) -> Self
    where
        T: Task,
        F: FnOnce(&JobOutcome) + Send + 'static,
    {
        Self::from_boxed(Box::new(task), Some(Box::new(on_complete)))
    }

    /// Completion counts down `tracker`. The caller is expected to have
    /// called `tracker.add(..)` for this job beforehand.
    pub fn tracked<T: Task>(task: T, tracker: &CompletionTracker) -> Self {
        let tracker = tracker.clone();
        Self::new(task, move |_| tracker.done())
    }

    /// A job nobody waits for.
    pub fn detached<T: Task>(task: T) -> Self {
        Self::from_boxed(Box::new(task), None)
    }

    fn from_boxed(task: Box<dyn Task>, callback: Option<OnComplete>) -> Self {
        let id = JobId::next();
        Self {
            id,
            task,
            completion: Completion {
                job_id: id,
                callback,
            },
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn desc(&self) -> &str {
        self.task.desc()
    }

    /// Runs the task and fires the completion signal afterwards, on every
    /// path including errors and panics inside the task. `inspect` sees the
    /// outcome before the signal fires.
    pub(crate) fn execute(self, inspect: impl FnOnce(&JobOutcome)) -> JobOutcome {
        let Job {
            id: _,
            task,
            completion,
        } = self;

        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| task.run())) {
            Ok(Ok(())) => JobOutcome::Succeeded,
            Ok(Err(err)) => JobOutcome::Failed(format!("{err:#}")),
            Err(payload) => JobOutcome::Failed(format!(
                "task panicked: {}",
                panic_message(payload.as_ref())
            )),
        };

        inspect(&outcome);
        completion.fire(&outcome);
        outcome
    }

    /// Signals completion without running the task.
    pub(crate) fn cancel(self, reason: impl Into<String>) {
        self.completion.fire(&JobOutcome::Canceled(reason.into()));
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("desc", &self.desc())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
