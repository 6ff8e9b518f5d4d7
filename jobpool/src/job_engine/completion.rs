// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use log::error;

/// Counting barrier for a batch of jobs: `add` before submitting, one `done`
/// per completed job, `wait` until the count drops back to zero.
#[derive(Debug, Clone, Default)]
pub struct CompletionTracker {
    state: Arc<(Mutex<usize>, Condvar)>,
}

impl CompletionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn pending_guard(&self) -> MutexGuard<'_, usize> {
        self.state.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add(&self, n: usize) {
        *self.pending_guard() += n;
    }

    pub fn done(&self) {
        let (_, cvar) = &*self.state;
        let mut pending = self.pending_guard();
        match pending.checked_sub(1) {
            Some(left) => *pending = left,
            None => {
                error!("completion tracker signaled more often than jobs were added");
                return;
            }
        }
        if *pending == 0 {
            cvar.notify_all();
        }
    }

    pub fn pending(&self) -> usize {
        *self.pending_guard()
    }

    /// Blocks until every added job has signaled completion.
    pub fn wait(&self) {
        // pattern is described on https://doc.rust-lang.org/stable/std/sync/struct.Condvar.html
        let (_, cvar) = &*self.state;
        let mut pending = self.pending_guard();
        while *pending > 0 {
            pending = cvar.wait(pending).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Like `wait`, but gives up after `timeout`. Returns whether the count
    /// reached zero.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (_, cvar) = &*self.state;
        let deadline = Instant::now() + timeout;
        let mut pending = self.pending_guard();
        while *pending > 0 {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            pending = cvar
                .wait_timeout(pending, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn wait_returns_immediately_without_jobs() {
        let tracker = CompletionTracker::new();
        tracker.wait();
        assert!(tracker.wait_timeout(Duration::ZERO));
    }

    #[test]
    fn wait_blocks_until_all_done() {
        let tracker = CompletionTracker::new();
        tracker.add(3);

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let t = tracker.clone();
                thread::spawn(move || t.done())
            })
            .collect();

        assert!(tracker.wait_timeout(Duration::from_secs(5)));
        assert_eq!(tracker.pending(), 0);
        for handle in handles {
            handle.join().unwrap();
        }
    }

    #[test]
    fn wait_timeout_reports_pending_work() {
        let tracker = CompletionTracker::new();
        tracker.add(2);
        tracker.done();
        assert!(!tracker.wait_timeout(Duration::from_millis(20)));
        assert_eq!(tracker.pending(), 1);
    }

    #[test]
    fn extra_done_saturates_at_zero() {
        let tracker = CompletionTracker::new();
        tracker.done();
        assert_eq!(tracker.pending(), 0);
    }
}
