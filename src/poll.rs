//! Polling-based state-convergence wait.

use std::{future::Future, time::Duration};

use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::Error;

/// Terminal result of a single [`ConditionPoller::wait_until`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Success,
    TimedOut,
    FailedPrecondition(String),
    /// The snapshot lacked a field the predicate needs to decide.
    Malformed(String),
}

impl PollOutcome {
    pub fn succeeded(&self) -> bool {
        self == &PollOutcome::Success
    }

    /// Converts everything but `Success` into an error describing `what` was
    /// being waited for.
    pub fn into_result(self, what: &str) -> Result<(), Error> {
        match self {
            PollOutcome::Success => Ok(()),
            PollOutcome::TimedOut => Err(Error::TimedOut(what.to_string())),
            PollOutcome::FailedPrecondition(message) => Err(Error::FailedPrecondition(message)),
            PollOutcome::Malformed(message) => Err(Error::Malformed(message)),
        }
    }
}

/// A predicate's judgement of one status snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Done,
    Pending,
    FailedPrecondition(String),
    Malformed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConditionPoller {
    interval: Duration,
    timeout: Duration,
    not_found_means_done: bool,
}

impl ConditionPoller {
    /// Requires a non-zero `interval` no longer than `timeout`.
    pub fn new(interval: Duration, timeout: Duration) -> Result<Self, Error> {
        if interval.is_zero() {
            return Err(Error::InvalidPollConfig(
                "interval must be greater than zero".to_string(),
            ));
        }

        if timeout < interval {
            return Err(Error::InvalidPollConfig(format!(
                "timeout {timeout:?} is shorter than interval {interval:?}"
            )));
        }

        Ok(ConditionPoller {
            interval,
            timeout,
            not_found_means_done: false,
        })
    }

    /// Treat a `NotFound` from the check as the awaited state, rather than
    /// as a fatal error.
    pub fn not_found_means_done(mut self, not_found_means_done: bool) -> Self {
        self.not_found_means_done = not_found_means_done;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Sleeps one interval, then calls `check` and judges the snapshot with
    /// `predicate`, until the predicate is satisfied or the deadline passes.
    ///
    /// The check is always invoked at least once. Errors from `check` are
    /// returned as-is and never retried, except for `NotFound` when
    /// [`not_found_means_done`](Self::not_found_means_done) is set.
    pub async fn wait_until<S, F, Fut, P>(
        &self,
        what: &str,
        mut check: F,
        predicate: P,
    ) -> Result<PollOutcome, Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<S, Error>>,
        P: Fn(&S) -> Verdict,
    {
        let deadline = Instant::now() + self.timeout;
        let mut attempt = 0u32;

        loop {
            if Instant::now() >= deadline {
                error!("timeout {what} after {attempt} attempts");
                return Ok(PollOutcome::TimedOut);
            }

            tokio::time::sleep(self.interval).await;
            attempt += 1;

            let snapshot = match check().await {
                Ok(snapshot) => snapshot,
                Err(err) if self.not_found_means_done && err.is_not_found() => {
                    info!("ok {what}: gone after {attempt} attempts");
                    return Ok(PollOutcome::Success);
                }
                Err(err) => return Err(err),
            };

            match predicate(&snapshot) {
                Verdict::Done => {
                    info!("ok {what} after {attempt} attempts");
                    return Ok(PollOutcome::Success);
                }
                Verdict::Pending => {
                    debug!("pending {what}, attempt {attempt}");
                }
                Verdict::FailedPrecondition(message) => {
                    warn!("{what}: {message}");
                    return Ok(PollOutcome::FailedPrecondition(message));
                }
                Verdict::Malformed(message) => {
                    warn!("{what}: {message}");
                    return Ok(PollOutcome::Malformed(message));
                }
            }
        }
    }
}
