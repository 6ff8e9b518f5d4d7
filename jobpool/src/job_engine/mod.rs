// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>
//! # Design: Bounded Worker Pool with Channel Hand-off
//!
//! ## Overview
//! A fixed number of worker threads process jobs pulled from a shared queue.
//!
//! - Workers advertise themselves on a bounded idle registry (capacity = pool size).
//! - The match loop pulls jobs in arrival order and spawns one handoff per job.
//! - A handoff takes the next idle worker handle and sends the job into that
//!   worker's single-slot channel. Ownership moves with the send, no locks.
//! - Every job fires its completion signal exactly once: after running, or as
//!   `Canceled` when it can no longer reach a worker.
//! - Stop is a broadcast; `Dispatcher::shutdown` adds the join phase.
//!
//!   submit()                                       idle registry
//!      |                                        +----------------+
//!      v                                        | w0 | w2 | ...  |<------+
//!   +-----------------+     +-------------+     +-------+--------+       |
//!   | SubmissionQueue |---->| match_loop  |--+          |                |
//!   +-----------------+     +-------------+  |  +-------v-------+        |
//!                                            +->|  handoff(job) |        |
//!                                            +->|  handoff(job) |        |
//!                                               +-------+-------+        |
//!                                                       | job            |
//!                                             +---------v---------+      |
//!                                             | worker loop       |------+
//!                                             | run, signal, idle |  announce
//!                                             +-------------------+

pub mod closure_task;
pub mod completion;
pub mod dispatcher;
pub mod job;
pub mod limiter;
pub mod stats;
pub mod submission;
pub mod worker;
