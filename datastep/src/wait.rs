//! Retrying remote calls with exponential backoff.

use std::time::Duration;
use tokio::time::sleep;

use crate::common::*;

/// How often and how patiently to retry.
#[derive(Clone, Debug)]
pub(crate) struct WaitOptions {
    /// How long to wait before the first retry. Doubles after each failure.
    retry_interval: Duration,
    /// How many temporary failures we tolerate before giving up.
    allowed_errors: usize,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            retry_interval: Duration::from_secs(1),
            allowed_errors: 3,
        }
    }
}

impl WaitOptions {
    /// Set the initial retry interval.
    pub(crate) fn retry_interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }

    /// Set the number of allowed errors before giving up.
    pub(crate) fn allowed_errors(mut self, allowed_errors: usize) -> Self {
        self.allowed_errors = allowed_errors;
        self
    }
}

/// The outcome of a single attempt.
#[derive(Debug)]
pub(crate) enum WaitStatus<T, E> {
    /// The attempt succeeded.
    Finished(T),
    /// The attempt failed, but another attempt may succeed.
    FailedTemporarily(E),
    /// The attempt failed, and retrying would not help.
    FailedPermanently(E),
}

/// Call `f` until it finishes, fails permanently, or runs out of allowed
/// temporary failures.
pub(crate) async fn wait<T, E, F, Fut>(options: &WaitOptions, mut f: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = WaitStatus<T, E>>,
{
    let mut errors = 0;
    let mut interval = options.retry_interval;
    loop {
        match f().await {
            WaitStatus::Finished(result) => return Ok(result),
            WaitStatus::FailedPermanently(err) => return Err(err),
            WaitStatus::FailedTemporarily(err) => {
                errors += 1;
                if errors > options.allowed_errors {
                    return Err(err);
                }
                trace!(
                    "attempt {}/{} failed temporarily, retrying in {:?}",
                    errors,
                    options.allowed_errors,
                    interval,
                );
                sleep(interval).await;
                interval = interval.saturating_mul(2);
            }
        }
    }
}
