// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use async_channel::{Receiver, Sender};
use futures::executor::{LocalPool, LocalSpawner};
use futures::task::LocalSpawnExt;
use futures::{select_biased, FutureExt};
use log::{debug, info, warn};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::config::PoolConfig;
use crate::error::PoolError;
use crate::job_engine::job::Job;
use crate::job_engine::limiter::{HandoffLimiter, HandoffPermit};
use crate::job_engine::stats::{PoolCounters, PoolStats};
use crate::job_engine::submission::SubmissionQueue;
use crate::job_engine::worker::{Worker, WorkerHandle, WorkerId, WorkerState};

/// Result of a two-phase shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    pub workers_joined: usize,
    pub stats: PoolStats,
}

/// Owns a fixed pool of workers and pairs queued jobs with idle workers.
#[derive(Debug)]
pub struct Dispatcher {
    config: PoolConfig,
    queue: SubmissionQueue,
    idle_tx: Sender<WorkerHandle>,
    idle_rx: Receiver<WorkerHandle>,
    workers: Vec<Worker>,
    counters: Arc<PoolCounters>,
    halt_tx: Sender<()>,
    halt_rx: Receiver<()>,
    thread_handle: Option<JoinHandle<()>>,
}

impl Dispatcher {
    /// Allocates the idle registry. Workers are only created by `run`.
    pub fn new(config: PoolConfig, queue: SubmissionQueue) -> Result<Self, PoolError> {
        config.validate()?;
        let (idle_tx, idle_rx) = async_channel::bounded(config.workers);
        let (halt_tx, halt_rx) = async_channel::bounded(1);

        Ok(Self {
            config,
            queue,
            idle_tx,
            idle_rx,
            workers: Vec::new(),
            counters: Arc::new(PoolCounters::default()),
            halt_tx,
            halt_rx,
            thread_handle: None,
        })
    }

    pub fn with_workers(workers: usize, queue: SubmissionQueue) -> Result<Self, PoolError> {
        Self::new(PoolConfig::with_workers(workers), queue)
    }

    /// Starts all workers and the match loop.
    pub fn run(&mut self) -> Result<(), PoolError> {
        if self.thread_handle.is_some() || !self.workers.is_empty() {
            return Err(PoolError::AlreadyRunning);
        }

        for i in 0..self.config.workers {
            let mut worker = Worker::new(WorkerId(i), self.idle_tx.clone(), self.counters.clone());
            if let Err(e) = worker.start() {
                warn!("Failed to start {}: {e}", worker.id());
                self.abort_start();
                return Err(e.into());
            }
            self.workers.push(worker);
        }

        let rx = self.queue.receiver();
        let halt_rx = self.halt_rx.clone();
        let idle_rx = self.idle_rx.clone();
        let limiter = self.config.max_in_flight_handoffs.map(HandoffLimiter::new);
        let counters = self.counters.clone();

        // run the match loop in a dedicated thread
        let thread_handle = thread::Builder::new()
            .name("jobpool-dispatcher".into())
            .spawn(move || {
                let mut pool = LocalPool::new();
                let spawner = pool.spawner();

                if let Err(e) = spawner.spawn_local(match_loop(
                    spawner.clone(),
                    rx,
                    halt_rx,
                    idle_rx,
                    limiter,
                    counters,
                )) {
                    warn!("Failed to spawn the match loop: {e}");
                    return;
                }
                pool.run(); // blocks until the loop and all handoffs are done
            });

        match thread_handle {
            Ok(handle) => self.thread_handle = Some(handle),
            Err(e) => {
                self.abort_start();
                return Err(e.into());
            }
        }

        info!("Dispatcher running with {} workers", self.config.workers);
        Ok(())
    }

    /// Undoes a partial `run`: stops and joins the workers started so far and
    /// puts a fresh idle registry in place, so `run` can be tried again.
    fn abort_start(&mut self) {
        self.stop();
        for worker in &mut self.workers {
            worker.join();
        }
        self.workers.clear();

        let (idle_tx, idle_rx) = async_channel::bounded(self.config.workers);
        self.idle_tx = idle_tx;
        self.idle_rx = idle_rx;
    }

    /// Tells every worker to stop and closes the idle registry. Does not wait
    /// for anything and leaves the submission queue open; jobs pulled from it
    /// afterwards are canceled.
    pub fn stop(&self) {
        for worker in &self.workers {
            worker.stop();
        }
        if self.idle_tx.close() {
            debug!("Idle registry closed");
        }
    }

    /// Two-phase shutdown: stop, close the submission queue, then join the
    /// match loop and every worker. Jobs still queued are canceled, jobs
    /// already executing finish first.
    pub fn shutdown(&mut self) -> ShutdownReport {
        info!("Shutting down dispatcher");
        self.stop();
        self.queue.close();

        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                warn!("Match loop terminated with a panic");
            }
        }

        let mut workers_joined = 0;
        for worker in &mut self.workers {
            worker.join();
            workers_joined += 1;
        }

        let stats = self.stats();
        info!(
            "Dispatcher shut down: {} workers joined, {} succeeded, {} failed, {} canceled",
            workers_joined, stats.succeeded, stats.failed, stats.canceled
        );
        ShutdownReport {
            workers_joined,
            stats,
        }
    }

    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot()
    }

    pub fn pool_size(&self) -> usize {
        self.config.workers
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.thread_handle.is_some() && !self.idle_tx.is_closed()
    }

    pub fn worker_states(&self) -> Vec<(WorkerId, WorkerState)> {
        self.workers.iter().map(|w| (w.id(), w.state())).collect()
    }

    /// Number of workers currently running a job.
    pub fn executing(&self) -> usize {
        self.workers
            .iter()
            .filter(|w| w.state() == WorkerState::Executing)
            .count()
    }
}

impl Drop for Dispatcher {
    /// Stops the workers and ends the match loop without closing the shared
    /// submission queue. Queued jobs stay queued; running jobs are not waited
    /// for.
    fn drop(&mut self) {
        self.stop();
        self.halt_tx.close();
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                warn!("Match loop terminated with a panic");
            }
        }
    }
}

/// Pulls jobs in arrival order and launches one handoff per job, so a job
/// waiting for a worker never holds up the ones behind it.
async fn match_loop(
    spawner: LocalSpawner,
    rx: Receiver<Job>,
    halt_rx: Receiver<()>,
    idle_rx: Receiver<WorkerHandle>,
    limiter: Option<HandoffLimiter>,
    counters: Arc<PoolCounters>,
) {
    loop {
        let job = select_biased! {
            _ = halt_rx.recv().fuse() => {
                info!("Dispatcher dropped, match loop ending");
                return;
            }
            job = rx.recv().fuse() => match job {
                Ok(job) => job,
                Err(_) => break,
            },
        };

        counters.record_pulled();
        let permit = match &limiter {
            Some(limiter) => match limiter.try_acquire() {
                Some(permit) => Some(permit),
                None => {
                    debug!("{} handoffs in flight, waiting for a slot", limiter.in_flight());
                    Some(limiter.acquire().await)
                }
            },
            None => None,
        };

        let id = job.id();
        if let Err(e) = spawner.spawn_local(handoff(job, idle_rx.clone(), counters.clone(), permit))
        {
            // the job went down with the rejected future and was canceled there
            counters.record_canceled();
            warn!("Failed to launch handoff for {}: {e}", id);
        }
    }
    info!("Submission queue has been closed, match loop ending");
}

/// Waits for an idle worker and hands the job over. A worker that stopped
/// after announcing itself gives the job back and the next one is tried.
async fn handoff(
    mut job: Job,
    idle_rx: Receiver<WorkerHandle>,
    counters: Arc<PoolCounters>,
    _permit: Option<HandoffPermit>,
) {
    loop {
        let worker = match idle_rx.recv().await {
            Ok(worker) => worker,
            Err(_) => {
                debug!("No worker left for {}, canceling", job.id());
                counters.record_canceled();
                job.cancel("dispatcher stopped before a worker became available");
                return;
            }
        };

        let id = job.id();
        match worker.deliver(job).await {
            Ok(()) => {
                debug!("Handed {} to {}", id, worker.id());
                return;
            }
            Err(returned) => {
                debug!("{} has stopped, trying the next idle worker", worker.id());
                job = returned;
            }
        }
    }
}
