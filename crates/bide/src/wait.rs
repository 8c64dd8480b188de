// Wait/retry engine shared by element and collection handles
//
// One algorithm, parameterized by a zero-argument resolve-and-evaluate step.
// Transient driver failures count as "not yet"; fatal ones abort the wait.
// Uses tokio's clock so tests can run under paused virtual time.

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, sleep};

use crate::driver::{DriverError, DriverResult};

/// Outcome of one evaluation attempt: either the target satisfied the
/// condition, or the last observed state is recorded for diagnostics.
pub(crate) enum Attempt<T, S> {
    Ready(T),
    Pending(S),
}

pub(crate) enum WaitError<S> {
    /// The wait budget ran out; `last` is the most recent observed state,
    /// `None` if no attempt ever produced one.
    TimedOut { last: Option<S>, elapsed: Duration },
    /// Session-level failure; surfaced immediately, never retried.
    Fatal(DriverError),
}

/// Polls `attempt` until it is ready or `timeout` elapses.
///
/// At least one attempt runs even with a zero timeout, so conditions can be
/// checked synchronously. Success returns immediately, with no trailing
/// sleep.
pub(crate) async fn wait_for<T, S, F, Fut>(
    timeout: Duration,
    poll_interval: Duration,
    mut attempt: F,
) -> Result<T, WaitError<S>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = DriverResult<Attempt<T, S>>>,
{
    let start = Instant::now();
    let mut last = None;
    loop {
        match attempt().await {
            Ok(Attempt::Ready(value)) => return Ok(value),
            Ok(Attempt::Pending(state)) => last = Some(state),
            Err(e) if e.is_transient() => {
                tracing::trace!(error = %e, "retryable failure, polling again");
            }
            Err(e) => {
                tracing::debug!(error = %e, "fatal driver failure aborts wait");
                return Err(WaitError::Fatal(e));
            }
        }
        let elapsed = start.elapsed();
        if elapsed >= timeout {
            tracing::debug!(?elapsed, "wait budget exhausted");
            return Err(WaitError::TimedOut { last, elapsed });
        }
        sleep(poll_interval).await;
    }
}
