//! Fixed-attempt polling for eventually-consistent remote state
//!
//! The service ingests submitted sources asynchronously, so the registrar polls the
//! notebook until the expected number of sources is visible. Polling is strictly
//! sequential with a fixed delay between rounds. When the attempt ceiling is reached,
//! one final probe runs and its result is returned whether or not it satisfies the
//! condition: the caller always makes forward progress and never waits indefinitely.
//!
//! # Example
//!
//! ```no_run
//! use nlm_ingest::config::PollConfig;
//! use nlm_ingest::poll::poll_until;
//!
//! # async fn example() -> nlm_ingest::Result<()> {
//! let config = PollConfig::default();
//! let ids = poll_until(
//!     &config,
//!     |_attempt| async { Ok::<Vec<String>, nlm_ingest::Error>(vec![]) },
//!     |ids: &Vec<String>| ids.len() >= 3,
//! )
//! .await?;
//! # Ok(())
//! # }
//! ```

use crate::config::PollConfig;
use std::future::Future;

/// Probe repeatedly until `done` accepts a result or attempts run out
///
/// `probe` receives the 1-based attempt number. Up to `config.max_attempts` rounds
/// run with `config.delay` between them; after the last unsatisfied round one more
/// probe runs and its result is returned as-is. Errors from `probe` abort polling
/// immediately; callers that want to tolerate a bad round should map it to an empty
/// result inside the probe.
pub async fn poll_until<F, Fut, T, E, D>(config: &PollConfig, mut probe: F, done: D) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    D: Fn(&T) -> bool,
{
    for attempt in 1..=config.max_attempts {
        let value = probe(attempt).await?;
        if done(&value) {
            tracing::debug!(attempt, "poll condition satisfied");
            return Ok(value);
        }

        tracing::debug!(
            attempt,
            max_attempts = config.max_attempts,
            delay_ms = config.delay.as_millis(),
            "poll condition not met, waiting"
        );
        tokio::time::sleep(config.delay).await;
    }

    tracing::warn!(
        max_attempts = config.max_attempts,
        "poll attempts exhausted, taking final result"
    );
    probe(final_attempt(config.max_attempts)).await
}

/// Attempt number of the extra probe after the ceiling
fn final_attempt(max_attempts: u32) -> u32 {
    max_attempts.saturating_add(1)
}
