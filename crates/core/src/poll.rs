//! Poll-until-present helper
//!
//! The occurrence identifier is populated by the CRM asynchronously after
//! record creation, so the pipeline has to poll for it. The fixed-sleep
//! loop is modelled as an explicit policy value object consumed by a
//! generic helper, which keeps the policy independently testable without
//! real sleeps (set the interval to zero).

use std::future::Future;
use std::time::Duration;

use aerointake_domain::Result;
use tracing::{debug, warn};

/// Bounded polling: a fixed number of attempts with a fixed delay between
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl PollPolicy {
    #[must_use]
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self { max_attempts: max_attempts.max(1), interval }
    }

    /// Upper bound on time spent sleeping; the helper never sleeps after
    /// the final attempt.
    #[must_use]
    pub fn budget(&self) -> Duration {
        self.interval.saturating_mul(self.max_attempts.saturating_sub(1))
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self { max_attempts: 5, interval: Duration::from_millis(2000) }
    }
}

/// Poll `read` until it yields a value or the policy is exhausted.
///
/// Returns the first non-empty value. Exhaustion yields `None`. A read
/// error also yields `None` and stops polling early: the record behind the
/// poll still exists, so the caller decides how to degrade rather than
/// receiving an error.
pub async fn poll_until<F, Fut, T>(policy: PollPolicy, mut read: F) -> Option<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let attempts = policy.max_attempts.max(1);

    for attempt in 1..=attempts {
        match read(attempt).await {
            Ok(Some(value)) => {
                debug!(attempt, "poll satisfied");
                return Some(value);
            }
            Ok(None) => {
                debug!(attempt, max_attempts = attempts, "poll attempt yielded nothing");
            }
            Err(err) => {
                warn!(attempt, error = %err, "poll read failed, giving up");
                return None;
            }
        }

        if attempt < attempts && !policy.interval.is_zero() {
            tokio::time::sleep(policy.interval).await;
        }
    }

    None
}
