// SPDX-License-Identifier: MIT
// jobpool: runs a batch of file-check jobs through the worker pool
//
// - Every job reads the same file and compares it with the expected text.
// - Prints the execution time once all jobs have signaled completion.
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use jobpool::jobs::check_file_task::DEFAULT_EXPECTED_CONTENT;
use jobpool::{
    CheckFileTask, CompletionTracker, Dispatcher, Job, PoolConfig, PoolStats, SubmissionQueue,
};
use log::info;
use serde::Serialize;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Number of workers in the pool
    #[arg(long, default_value_t = 5)]
    workers: usize,

    /// Number of jobs to submit
    #[arg(long, default_value_t = 10000)]
    rounds: usize,

    /// File every job reads
    #[arg(long, default_value = "./text.txt")]
    file: PathBuf,

    /// Content the file is expected to have
    #[arg(long, default_value = DEFAULT_EXPECTED_CONTENT)]
    expected: String,

    /// Capacity of the submission queue (unbounded if not set)
    #[arg(long)]
    queue_capacity: Option<usize>,

    /// Upper bound for concurrently pending handoffs
    #[arg(long)]
    max_in_flight_handoffs: Option<usize>,

    /// Print a JSON report instead of the plain execution time
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct RunReport {
    workers: usize,
    rounds: usize,
    elapsed_ms: u128,
    stats: PoolStats,
}

fn pool_config(args: &Args) -> PoolConfig {
    PoolConfig {
        workers: args.workers,
        max_in_flight_handoffs: args.max_in_flight_handoffs,
        submission_capacity: args.queue_capacity,
    }
}

fn run(args: &Args) -> anyhow::Result<(Duration, PoolStats)> {
    let start_time = Instant::now();

    let config = pool_config(args);
    let queue = SubmissionQueue::from_config(&config);
    let tracker = CompletionTracker::new();
    tracker.add(args.rounds);

    let mut dispatcher = Dispatcher::new(config, queue.clone())?;
    dispatcher.run()?;

    for _ in 0..args.rounds {
        let task = CheckFileTask::new(args.file.clone(), args.expected.as_str());
        queue.submit(Job::tracked(task, &tracker))?;
    }

    tracker.wait();
    let report = dispatcher.shutdown();

    Ok((start_time.elapsed(), report.stats))
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(e) = pool_config(&args).validate() {
        eprintln!("Error: {e}");
        std::process::exit(2);
    }

    info!(
        "Submitting {} jobs checking {} to {} workers",
        args.rounds,
        args.file.display(),
        args.workers
    );
    let (elapsed, stats) = run(&args)?;

    if args.json {
        let report = RunReport {
            workers: args.workers,
            rounds: args.rounds,
            elapsed_ms: elapsed.as_millis(),
            stats,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Execution time: {:?}", elapsed);
    }

    Ok(())
}
