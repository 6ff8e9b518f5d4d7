// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::num::NonZeroUsize;
use std::thread;

use crate::error::PoolError;

/// Static shape of a pool. Nothing in here changes after `Dispatcher::new`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of workers, also the capacity of the idle registry.
    pub workers: usize,
    /// Upper bound for concurrently pending handoffs. `None` spawns one
    /// handoff per pulled job without limit.
    pub max_in_flight_handoffs: Option<usize>,
    /// Capacity of the submission queue. `None` means unbounded.
    pub submission_capacity: Option<usize>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
            max_in_flight_handoffs: None,
            submission_capacity: None,
        }
    }
}

impl PoolConfig {
    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers,
            ..Self::default()
        }
    }

    pub fn max_in_flight_handoffs(mut self, limit: usize) -> Self {
        self.max_in_flight_handoffs = Some(limit);
        self
    }

    pub fn submission_capacity(mut self, capacity: usize) -> Self {
        self.submission_capacity = Some(capacity);
        self
    }

    pub fn validate(&self) -> Result<(), PoolError> {
        if self.workers == 0 {
            return Err(PoolError::InvalidConfig(
                "the pool needs at least one worker".into(),
            ));
        }
        if self.max_in_flight_handoffs == Some(0) {
            return Err(PoolError::InvalidConfig(
                "max_in_flight_handoffs must be at least 1 when set".into(),
            ));
        }
        if self.submission_capacity == Some(0) {
            return Err(PoolError::InvalidConfig(
                "submission_capacity must be at least 1 when set".into(),
            ));
        }
        Ok(())
    }
}
