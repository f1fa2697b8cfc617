// src/dispatch.rs
//! Bounded parallel fan-out of detail fetches.
//!
//! Tasks are queued up front on a shared injector and drained by a fixed
//! number of scoped worker threads. Results flow back over a channel and are
//! handed to the caller's aggregator on the dispatching thread, in
//! submission order, so the rows a fan-out produces do not depend on which
//! fetch finished first. Accumulators never need locks.

use crate::types::WorkerCount;
use crossbeam::channel;
use crossbeam::deque::{Injector, Steal};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread;

/// Result of one parallel task at the dispatcher boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome<T> {
    Success(T),
    /// The task faulted outside its own error handling.
    Failed { reason: String },
}

impl<T> TaskOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Success(_))
    }
}

/// Counts observed by one dispatch call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub submitted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl DispatchStats {
    pub fn completed(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn absorb(&mut self, other: DispatchStats) {
        self.submitted += other.submitted;
        self.succeeded += other.succeeded;
        self.failed += other.failed;
    }
}

/// Fixed-size worker pool created per fan-out step.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher {
    workers: WorkerCount,
}

impl Dispatcher {
    pub fn new(workers: WorkerCount) -> Self {
        Self { workers }
    }

    pub fn workers(&self) -> usize {
        self.workers.get()
    }

    /// Runs `fetch` once per task and feeds each outcome to `aggregate`.
    ///
    /// `aggregate` runs only on the calling thread, once per task, after
    /// that task and every task submitted before it have completed. A
    /// panicking task is reported as [`TaskOutcome::Failed`] and never
    /// disturbs its siblings.
    pub fn dispatch<P, T, F, A>(&self, tasks: Vec<P>, fetch: F, mut aggregate: A) -> DispatchStats
    where
        P: Send + fmt::Display,
        T: Send,
        F: Fn(&P) -> T + Sync,
        A: FnMut(P, TaskOutcome<T>),
    {
        let mut stats = DispatchStats {
            submitted: tasks.len(),
            ..DispatchStats::default()
        };
        if tasks.is_empty() {
            return stats;
        }

        let queue = Injector::new();
        for (index, task) in tasks.into_iter().enumerate() {
            queue.push((index, task));
        }

        let pool_size = self.workers.get().min(stats.submitted);
        let (sender, receiver) = channel::unbounded::<(usize, P, TaskOutcome<T>)>();

        thread::scope(|scope| {
            for _ in 0..pool_size {
                let sender = sender.clone();
                let queue = &queue;
                let fetch = &fetch;
                scope.spawn(move || loop {
                    match queue.steal() {
                        Steal::Success((index, task)) => {
                            let outcome = run_guarded(&task, fetch);
                            if sender.send((index, task, outcome)).is_err() {
                                break;
                            }
                        }
                        Steal::Retry => continue,
                        Steal::Empty => break,
                    }
                });
            }
            drop(sender);

            // Outcomes that arrived ahead of an earlier, still running task.
            let mut pending = BTreeMap::new();
            let mut next = 0;
            for (index, task, outcome) in receiver.iter() {
                match &outcome {
                    TaskOutcome::Success(_) => stats.succeeded += 1,
                    TaskOutcome::Failed { reason } => {
                        stats.failed += 1;
                        log::error!("    Error fetching details for {}: {}", task, reason);
                    }
                }
                pending.insert(index, (task, outcome));
                while let Some((task, outcome)) = pending.remove(&next) {
                    aggregate(task, outcome);
                    next += 1;
                }
            }
        });

        stats
    }
}

fn run_guarded<P, T, F>(task: &P, fetch: &F) -> TaskOutcome<T>
where
    F: Fn(&P) -> T,
{
    match catch_unwind(AssertUnwindSafe(|| fetch(task))) {
        Ok(value) => TaskOutcome::Success(value),
        Err(payload) => TaskOutcome::Failed {
            reason: panic_reason(payload.as_ref()),
        },
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "task panicked".to_string()
    }
}
