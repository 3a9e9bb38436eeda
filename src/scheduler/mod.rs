//! Bounded-concurrency execution of independent async tasks.
//!
//! [`run_bounded`] keeps at most `limit` tasks in flight. Tasks are started in input
//! order, and whenever one settles the next is admitted, so the ceiling holds
//! throughout the run instead of advancing in fixed-size batches. A failing task never
//! cancels its siblings, and the call returns only once every task has settled.
//!
//! # Example
//!
//! ```rust
//! use nlm_ingest::scheduler::run_bounded;
//!
//! # async fn example() {
//! let urls = vec!["https://a.example", "https://b.example", "https://c.example"];
//! let tasks = urls.into_iter().map(|url| move || async move {
//!     if url.contains('b') {
//!         Err(format!("rejected {url}"))
//!     } else {
//!         Ok(url.len())
//!     }
//! });
//!
//! let outcomes = run_bounded(tasks, 2).await;
//! assert_eq!(outcomes.len(), 3);
//! assert!(outcomes[0].is_success());
//! assert!(!outcomes[1].is_success());
//! # }
//! ```

use futures::stream::{self, StreamExt};
use std::future::Future;

/// Settled result of one task submitted to [`run_bounded`]
#[derive(Debug)]
pub struct TaskOutcome<T, E = crate::Error> {
    /// Position of the task in the input
    pub index: usize,
    /// What the task produced
    pub result: Result<T, E>,
}

impl<T, E> TaskOutcome<T, E> {
    /// Whether the task completed successfully
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// The produced value, if the task succeeded
    pub fn value(&self) -> Option<&T> {
        self.result.as_ref().ok()
    }

    /// The failure, if the task failed
    pub fn error(&self) -> Option<&E> {
        self.result.as_ref().err()
    }
}

/// Run every task with at most `limit` in flight, returning outcomes in input order
///
/// A `limit` of zero is treated as one.
pub async fn run_bounded<I, F, Fut, T, E>(tasks: I, limit: usize) -> Vec<TaskOutcome<T, E>>
where
    I: IntoIterator<Item = F>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let limit = limit.max(1);

    let mut outcomes: Vec<TaskOutcome<T, E>> = stream::iter(tasks.into_iter().enumerate())
        .map(|(index, task)| async move {
            TaskOutcome {
                index,
                result: task().await,
            }
        })
        .buffer_unordered(limit)
        .collect()
        .await;

    // buffer_unordered yields in completion order
    outcomes.sort_by_key(|outcome| outcome.index);
    outcomes
}

/// Count `(succeeded, failed)` outcomes
pub fn tally<T, E>(outcomes: &[TaskOutcome<T, E>]) -> (usize, usize) {
    let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
    (succeeded, outcomes.len() - succeeded)
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
