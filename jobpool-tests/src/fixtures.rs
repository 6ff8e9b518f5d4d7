// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use jobpool::{CompletionTracker, Job, JobOutcome, Task};
use tempfile::TempDir;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A scratch directory holding the files the check jobs read.
pub struct FixtureDir {
    dir: TempDir,
}

impl FixtureDir {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create fixture dir"),
        }
    }

    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, content)
            .unwrap_or_else(|e| panic!("failed to write fixture {}: {e}", path.display()));
        path
    }

    /// A path inside the fixture dir that does not exist.
    pub fn missing(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

impl Default for FixtureDir {
    fn default() -> Self {
        Self::new()
    }
}

/// Collects `(label, outcome)` pairs in completion order.
#[derive(Clone, Default)]
pub struct OutcomeLog {
    entries: Arc<Mutex<Vec<(String, JobOutcome)>>>,
}

impl OutcomeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps `task` into a job that records its outcome under `label` and
    /// then counts down `tracker`.
    pub fn job<T: Task>(&self, label: impl Into<String>, task: T, tracker: &CompletionTracker) -> Job {
        let label = label.into();
        let entries = self.entries.clone();
        let tracker = tracker.clone();
        Job::new(task, move |outcome| {
            entries.lock().unwrap().push((label, outcome.clone()));
            tracker.done();
        })
    }

    pub fn entries(&self) -> Vec<(String, JobOutcome)> {
        self.entries.lock().unwrap().clone()
    }

    pub fn outcome(&self, label: &str) -> Option<JobOutcome> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, outcome)| outcome.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
