//! Retry loop: attempt until success, policy stop, budget exhaustion or cancel.

use std::time::Duration;

use super::policy::{RetryBudget, RetryPolicy};
use super::Outcome;
use crate::error::CloudError;
use crate::progress::{SubMonitor, WaitOutcome};

/// Runs `attempt` until it succeeds or the policy, the budget or the
/// monitor says to stop. Only errors drive reattempts; a returned value is
/// never retried.
///
/// On stop: a canceled monitor yields [`Outcome::Canceled`], otherwise the
/// last error is normalized (structured errors as-is, anything else wrapped).
pub(crate) fn run_with_retry<T, R, F>(policy: &R, progress: &SubMonitor, mut attempt: F) -> Outcome<T>
where
    R: RetryPolicy + ?Sized,
    F: FnMut() -> anyhow::Result<T>,
{
    let label = progress.label();
    let mut budget = RetryBudget::new(policy.total_time_wait());
    let mut attempts = 0u32;

    let last_error = loop {
        attempts += 1;
        let error = match attempt() {
            Ok(value) => {
                tracing::debug!(label, attempts, "client request succeeded");
                return Outcome::Success(value);
            }
            Err(e) => e,
        };

        let interval = match policy.wait_interval(&error, progress) {
            Ok(interval) => interval.unwrap_or(Duration::ZERO),
            Err(policy_error) => {
                tracing::warn!(
                    label,
                    attempts,
                    error = %policy_error,
                    "could not determine retry interval; giving up"
                );
                return Outcome::Failure(CloudError::from_failure(policy_error));
            }
        };

        let within_budget = budget.consume(interval);
        let reattempt = !progress.is_canceled() && within_budget && !interval.is_zero();
        if !reattempt {
            break error;
        }

        tracing::debug!(
            label,
            attempts,
            interval_ms = interval.as_millis() as u64,
            time_left_ms = budget.time_left().unwrap_or_default().as_millis() as u64,
            error = %error,
            "attempt failed; waiting before next attempt"
        );
        match progress.wait(interval) {
            WaitOutcome::Elapsed => {}
            WaitOutcome::Interrupted => {
                tracing::debug!(label, "wait between attempts interrupted; continuing");
            }
            WaitOutcome::Canceled => break error,
        }
    };

    if progress.is_canceled() {
        tracing::info!(label, attempts, "client request canceled");
        return Outcome::Canceled;
    }
    tracing::debug!(label, attempts, error = %last_error, "client request failed");
    Outcome::Failure(CloudError::from_failure(last_error))
}
