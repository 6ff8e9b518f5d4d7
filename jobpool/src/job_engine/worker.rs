// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use async_channel::{Receiver, Sender};
use futures::executor::block_on;
use futures::{select_biased, FutureExt};
use log::{debug, warn};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use crate::job_engine::job::{Job, JobOutcome};
use crate::job_engine::stats::PoolCounters;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerId(pub usize);

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "worker-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Created, thread not yet running.
    Starting,
    /// Pushing its handle onto the idle registry.
    IdleAnnouncing,
    /// Handle is in the registry; waiting for a job or the stop signal.
    AwaitingAssignment,
    Executing,
    Stopped,
}

/// What a worker puts on the idle registry: the way to reach its private
/// single-slot job channel.
#[derive(Debug, Clone)]
pub(crate) struct WorkerHandle {
    id: WorkerId,
    job_tx: Sender<Job>,
}

impl WorkerHandle {
    pub(crate) fn id(&self) -> WorkerId {
        self.id
    }

    /// Hands `job` over to the worker. If the worker has already stopped the
    /// job is given back untouched.
    pub(crate) async fn deliver(&self, job: Job) -> Result<(), Job> {
        self.job_tx.send(job).await.map_err(|e| e.into_inner())
    }
}

enum Wakeup {
    Assigned(Job),
    Stop,
}

pub struct Worker {
    id: WorkerId,
    idle_registry: Sender<WorkerHandle>,
    job_tx: Sender<Job>,
    job_rx: Receiver<Job>,
    stop_tx: Sender<()>,
    stop_rx: Receiver<()>,
    state: Arc<Mutex<WorkerState>>,
    counters: Arc<PoolCounters>,
    thread_handle: Option<JoinHandle<()>>,
}

impl Worker {
    pub(crate) fn new(
        id: WorkerId,
        idle_registry: Sender<WorkerHandle>,
        counters: Arc<PoolCounters>,
    ) -> Self {
        let (job_tx, job_rx) = async_channel::bounded(1);
        let (stop_tx, stop_rx) = async_channel::bounded(1);
        Self {
            id,
            idle_registry,
            job_tx,
            job_rx,
            stop_tx,
            stop_rx,
            state: Arc::new(Mutex::new(WorkerState::Starting)),
            counters,
            thread_handle: None,
        }
    }

    pub fn id(&self) -> WorkerId {
        self.id
    }

    pub fn state(&self) -> WorkerState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts the worker loop on its own thread. Calling it again on a running
    /// worker does nothing.
    pub(crate) fn start(&mut self) -> std::io::Result<()> {
        if self.thread_handle.is_some() {
            return Ok(());
        }

        let worker_loop = WorkerLoop {
            handle: WorkerHandle {
                id: self.id,
                job_tx: self.job_tx.clone(),
            },
            idle_registry: self.idle_registry.clone(),
            job_rx: self.job_rx.clone(),
            stop_rx: self.stop_rx.clone(),
            state: self.state.clone(),
            counters: self.counters.clone(),
        };

        let thread_handle = thread::Builder::new()
            .name(format!("jobpool-{}", self.id))
            .spawn(move || worker_loop.run())?;
        self.thread_handle = Some(thread_handle);
        Ok(())
    }

    /// Signals the worker to stop. It exits at its next wait point; a job
    /// that is already executing runs to completion. Never blocks.
    pub fn stop(&self) {
        if self.stop_tx.close() {
            debug!("Stop requested for {}", self.id);
        }
    }

    /// Waits for the worker thread to exit. Only returns once `stop` was
    /// called and the current job, if any, has finished.
    pub(crate) fn join(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                warn!("{} terminated with a panic", self.id);
            }
        }
    }
}

impl fmt::Debug for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worker")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish()
    }
}

/// Everything the worker thread owns.
struct WorkerLoop {
    handle: WorkerHandle,
    idle_registry: Sender<WorkerHandle>,
    job_rx: Receiver<Job>,
    stop_rx: Receiver<()>,
    state: Arc<Mutex<WorkerState>>,
    counters: Arc<PoolCounters>,
}

impl WorkerLoop {
    fn run(self) {
        let id = self.handle.id;
        debug!("Starting {}", id);

        loop {
            self.set_state(WorkerState::IdleAnnouncing);
            if self.idle_registry.send_blocking(self.handle.clone()).is_err() {
                debug!("Idle registry of {} has been closed", id);
                break;
            }

            self.set_state(WorkerState::AwaitingAssignment);
            match block_on(self.next_wakeup()) {
                Wakeup::Assigned(job) => self.execute(job),
                Wakeup::Stop => break,
            }
        }

        self.retire();
        debug!("{} stopped", id);
    }

    /// Waits for either a job or the stop signal. Stop wins if both are
    /// ready.
    async fn next_wakeup(&self) -> Wakeup {
        select_biased! {
            _ = self.stop_rx.recv().fuse() => Wakeup::Stop,
            job = self.job_rx.recv().fuse() => match job {
                Ok(job) => Wakeup::Assigned(job),
                Err(_) => Wakeup::Stop,
            },
        }
    }

    fn execute(&self, job: Job) {
        self.set_state(WorkerState::Executing);
        let id = job.id();
        debug!("{} executing {} ({})", self.handle.id, id, job.desc());

        let counters = &self.counters;
        let worker = self.handle.id;
        job.execute(|outcome| {
            counters.record(outcome);
            match outcome {
                JobOutcome::Failed(reason) => warn!("{} on {} failed: {}", id, worker, reason),
                _ => debug!("{} on {} finished: {:?}", id, worker, outcome),
            }
        });
    }

    /// No job is accepted after this; one that was delivered but never
    /// picked up is canceled instead of dropped silently.
    fn retire(&self) {
        self.set_state(WorkerState::Stopped);
        self.job_rx.close();
        while let Ok(job) = self.job_rx.try_recv() {
            debug!("{} canceling undelivered {}", self.handle.id, job.id());
            self.counters.record_canceled();
            job.cancel(format!("{} stopped before accepting the job", self.handle.id));
        }
    }

    fn set_state(&self, state: WorkerState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }
}
