// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use async_channel::{Receiver, Sender};

use crate::config::PoolConfig;
use crate::error::PoolError;
use crate::job_engine::job::{Job, JobId};

/// The shared queue between submitters and the dispatcher. Arrival order is
/// preserved; the order in which jobs reach workers is not.
#[derive(Debug, Clone)]
pub struct SubmissionQueue {
    tx: Sender<Job>,
    rx: Receiver<Job>,
}

/// Send-only view of a `SubmissionQueue`, handed out to producers.
#[derive(Debug, Clone)]
pub struct Submitter {
    tx: Sender<Job>,
}

impl SubmissionQueue {
    pub fn unbounded() -> Self {
        let (tx, rx) = async_channel::unbounded();
        Self { tx, rx }
    }

    pub fn bounded(capacity: usize) -> Self {
        let (tx, rx) = async_channel::bounded(capacity.max(1));
        Self { tx, rx }
    }

    pub fn from_config(config: &PoolConfig) -> Self {
        match config.submission_capacity {
            Some(capacity) => Self::bounded(capacity),
            None => Self::unbounded(),
        }
    }

    pub fn submitter(&self) -> Submitter {
        Submitter {
            tx: self.tx.clone(),
        }
    }

    /// Blocks while a bounded queue is full.
    pub fn submit(&self, job: Job) -> Result<JobId, PoolError> {
        submit_blocking(&self.tx, job)
    }

    pub async fn submit_async(&self, job: Job) -> Result<JobId, PoolError> {
        submit(&self.tx, job).await
    }

    /// Closes the queue for new submissions. Jobs already queued can still be
    /// pulled. Returns `false` if it was closed before.
    pub fn close(&self) -> bool {
        self.tx.close()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub(crate) fn receiver(&self) -> Receiver<Job> {
        self.rx.clone()
    }
}

impl Submitter {
    pub fn submit(&self, job: Job) -> Result<JobId, PoolError> {
        submit_blocking(&self.tx, job)
    }

    pub async fn submit_async(&self, job: Job) -> Result<JobId, PoolError> {
        submit(&self.tx, job).await
    }
}

fn submit_blocking(tx: &Sender<Job>, job: Job) -> Result<JobId, PoolError> {
    let id = job.id();
    tx.send_blocking(job).map_err(|rejected| {
        rejected.into_inner().cancel("submission queue is closed");
        PoolError::QueueClosed
    })?;
    Ok(id)
}

async fn submit(tx: &Sender<Job>, job: Job) -> Result<JobId, PoolError> {
    let id = job.id();
    tx.send(job).await.map_err(|rejected| {
        rejected.into_inner().cancel("submission queue is closed");
        PoolError::QueueClosed
    })?;
    Ok(id)
}
