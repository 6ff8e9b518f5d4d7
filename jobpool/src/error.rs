// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::io;

/// Errors raised by the pool itself. Failures inside a job body never show up
/// here; they end up in the job's `JobOutcome`.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("invalid pool configuration: {0}")]
    InvalidConfig(String),

    #[error("dispatcher is already running")]
    AlreadyRunning,

    #[error("submission queue is closed")]
    QueueClosed,

    #[error("failed to spawn thread: {0}")]
    Spawn(#[from] io::Error),
}
