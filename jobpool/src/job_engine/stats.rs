// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::job_engine::job::JobOutcome;

/// Counters shared between the match loop and the workers.
#[derive(Debug, Default)]
pub(crate) struct PoolCounters {
    pulled: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    canceled: AtomicU64,
}

/// Point-in-time copy of the pool counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Jobs taken off the submission queue by the match loop.
    pub pulled: u64,
    pub succeeded: u64,
    pub failed: u64,
    /// Pulled jobs that never ran. A job rejected by a closed submission
    /// queue is signaled `Canceled` to its submitter but never pulled, so it
    /// is not counted here.
    pub canceled: u64,
}

impl PoolStats {
    pub fn completed(&self) -> u64 {
        self.succeeded + self.failed + self.canceled
    }
}

impl PoolCounters {
    pub(crate) fn record_pulled(&self) {
        self.pulled.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record(&self, outcome: &JobOutcome) {
        let counter = match outcome {
            JobOutcome::Succeeded => &self.succeeded,
            JobOutcome::Failed(_) => &self.failed,
            JobOutcome::Canceled(_) => &self.canceled,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_canceled(&self) {
        self.canceled.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> PoolStats {
        PoolStats {
            pulled: self.pulled.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            canceled: self.canceled.load(Ordering::Relaxed),
        }
    }
}
