// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::time::Duration;

use jobpool::jobs::check_file_task::DEFAULT_EXPECTED_CONTENT;
use jobpool::{
    CheckFileTask, CompletionTracker, Dispatcher, Job, JobOutcome, PoolConfig, SubmissionQueue,
    WorkerState,
};
use jobpool_tests::fixtures::{init_logging, FixtureDir, OutcomeLog};

const WAIT: Duration = Duration::from_secs(10);

#[test]
fn test_two_workers_five_matching_files() {
    init_logging();
    let fixtures = FixtureDir::new();
    let path = fixtures.write("text.txt", DEFAULT_EXPECTED_CONTENT);

    let queue = SubmissionQueue::unbounded();
    let mut dispatcher = Dispatcher::with_workers(2, queue.clone()).unwrap();
    dispatcher.run().unwrap();

    let tracker = CompletionTracker::new();
    let log = OutcomeLog::new();
    tracker.add(5);
    for i in 0..5 {
        let task = CheckFileTask::new(&path, DEFAULT_EXPECTED_CONTENT);
        queue.submit(log.job(format!("read {i}"), task, &tracker)).unwrap();
    }

    assert!(tracker.wait_timeout(WAIT), "wait did not return");
    assert_eq!(log.len(), 5);
    assert!(log.entries().iter().all(|(_, outcome)| outcome.is_success()));

    let report = dispatcher.shutdown();
    assert_eq!(report.stats.succeeded, 5);
    assert_eq!(report.workers_joined, 2);
}

#[test]
fn test_single_worker_with_missing_file() {
    init_logging();
    let fixtures = FixtureDir::new();
    let present = fixtures.write("text.txt", DEFAULT_EXPECTED_CONTENT);
    let missing = fixtures.missing("gone.txt");

    let queue = SubmissionQueue::unbounded();
    let mut dispatcher = Dispatcher::with_workers(1, queue.clone()).unwrap();
    dispatcher.run().unwrap();

    let tracker = CompletionTracker::new();
    let log = OutcomeLog::new();
    tracker.add(3);
    for (label, path) in [("job 1", &present), ("job 2", &missing), ("job 3", &present)] {
        let task = CheckFileTask::new(path, DEFAULT_EXPECTED_CONTENT);
        queue.submit(log.job(label, task, &tracker)).unwrap();
    }

    assert!(tracker.wait_timeout(WAIT));
    assert_eq!(log.outcome("job 1"), Some(JobOutcome::Succeeded));
    assert!(matches!(log.outcome("job 2"), Some(JobOutcome::Failed(reason)) if reason.contains("gone.txt")));
    assert_eq!(log.outcome("job 3"), Some(JobOutcome::Succeeded));

    let report = dispatcher.shutdown();
    assert_eq!(report.stats.succeeded, 2);
    assert_eq!(report.stats.failed, 1);
}

#[test]
fn test_mismatched_content_is_a_completed_failure() {
    init_logging();
    let fixtures = FixtureDir::new();
    let wrong = fixtures.write("wrong.txt", "Goodbye, world");

    let config = PoolConfig::with_workers(3).max_in_flight_handoffs(2);
    let queue = SubmissionQueue::from_config(&config);
    let mut dispatcher = Dispatcher::new(config, queue.clone()).unwrap();
    dispatcher.run().unwrap();

    let tracker = CompletionTracker::new();
    let log = OutcomeLog::new();
    tracker.add(10);
    for i in 0..10 {
        let task = CheckFileTask::new(&wrong, DEFAULT_EXPECTED_CONTENT);
        queue.submit(log.job(format!("mismatch {i}"), task, &tracker)).unwrap();
    }

    assert!(tracker.wait_timeout(WAIT));
    assert!(log
        .entries()
        .iter()
        .all(|(_, outcome)| matches!(outcome, JobOutcome::Failed(reason) if reason.contains("mismatch"))));
    assert_eq!(dispatcher.shutdown().stats.failed, 10);
}

#[test]
fn test_stop_after_barrier_then_late_submission() {
    init_logging();
    let fixtures = FixtureDir::new();
    let path = fixtures.write("text.txt", DEFAULT_EXPECTED_CONTENT);

    let queue = SubmissionQueue::unbounded();
    let mut dispatcher = Dispatcher::with_workers(2, queue.clone()).unwrap();
    dispatcher.run().unwrap();

    let tracker = CompletionTracker::new();
    tracker.add(4);
    for _ in 0..4 {
        queue
            .submit(Job::tracked(CheckFileTask::new(&path, DEFAULT_EXPECTED_CONTENT), &tracker))
            .unwrap();
    }
    assert!(tracker.wait_timeout(WAIT));
    dispatcher.stop();

    // out of contract, but must not bring anything down
    let late = OutcomeLog::new();
    tracker.add(1);
    queue
        .submit(late.job("late", CheckFileTask::new(&path, DEFAULT_EXPECTED_CONTENT), &tracker))
        .unwrap();
    assert!(tracker.wait_timeout(WAIT));
    assert!(matches!(late.outcome("late"), Some(JobOutcome::Canceled(_))));

    let report = dispatcher.shutdown();
    assert_eq!(report.stats.succeeded, 4);
    assert!(dispatcher
        .worker_states()
        .iter()
        .all(|(_, state)| *state == WorkerState::Stopped));
}
