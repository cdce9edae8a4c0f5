use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::classify;
use crate::error::CloudError;
use crate::progress::SubMonitor;

/// Total retry budget used when a policy does not override it.
pub const DEFAULT_TOTAL_TIME_WAIT: Duration = Duration::from_secs(5 * 60);

/// Backoff policy consulted after every failed attempt.
///
/// Both hooks have defaults, so an empty impl means "attempt once, never
/// retry". Override only what you need.
pub trait RetryPolicy {
    /// How long to wait before the next attempt after `error`.
    ///
    /// `None` or a zero duration stops further attempts. An `Err` also stops
    /// them and becomes the request's terminal error.
    fn wait_interval(
        &self,
        error: &anyhow::Error,
        progress: &SubMonitor,
    ) -> anyhow::Result<Option<Duration>> {
        let _ = (error, progress);
        Ok(None)
    }

    /// Sum of waits allowed across the whole request. A budget shorter than
    /// one interval means a single attempt.
    fn total_time_wait(&self) -> Duration {
        DEFAULT_TOTAL_TIME_WAIT
    }
}

impl<R: RetryPolicy + ?Sized> RetryPolicy for Box<R> {
    fn wait_interval(
        &self,
        error: &anyhow::Error,
        progress: &SubMonitor,
    ) -> anyhow::Result<Option<Duration>> {
        (**self).wait_interval(error, progress)
    }

    fn total_time_wait(&self) -> Duration {
        (**self).total_time_wait()
    }
}

/// Attempt once; any error is terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRetry;

impl RetryPolicy for NoRetry {}

/// Which failures a [`FixedInterval`] policy retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryOn {
    /// Every failed attempt.
    #[default]
    Any,
    /// HTTP 5xx responses and connection failures only.
    ServerErrors,
}

/// Constant wait between attempts, bounded by a total budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedInterval {
    pub interval: Duration,
    pub total: Duration,
    pub retry_on: RetryOn,
}

impl FixedInterval {
    pub fn new(interval: Duration, total: Duration) -> Self {
        Self {
            interval,
            total,
            retry_on: RetryOn::Any,
        }
    }

    pub fn retry_on(mut self, retry_on: RetryOn) -> Self {
        self.retry_on = retry_on;
        self
    }
}

impl RetryPolicy for FixedInterval {
    fn wait_interval(
        &self,
        error: &anyhow::Error,
        _progress: &SubMonitor,
    ) -> anyhow::Result<Option<Duration>> {
        let retry = match self.retry_on {
            RetryOn::Any => true,
            RetryOn::ServerErrors => is_server_or_connection_failure(error),
        };
        Ok(retry.then_some(self.interval))
    }

    fn total_time_wait(&self) -> Duration {
        self.total
    }
}

fn is_server_or_connection_failure(error: &anyhow::Error) -> bool {
    if let Some(cloud) = error.downcast_ref::<CloudError>() {
        if cloud.is_server_error() || cloud.is_connection_error() {
            return true;
        }
    }
    classify::connection_reason(&**error).is_some()
}

/// Remaining wait budget of one request. Goes "overdrawn" once an interval
/// larger than what is left has been consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    remaining: Duration,
    overdrawn: bool,
}

impl RetryBudget {
    pub fn new(total: Duration) -> Self {
        Self {
            remaining: total,
            overdrawn: false,
        }
    }

    /// Subtract `interval`. Returns false once the budget is below zero.
    pub fn consume(&mut self, interval: Duration) -> bool {
        if !self.overdrawn {
            match self.remaining.checked_sub(interval) {
                Some(left) => self.remaining = left,
                None => {
                    self.remaining = Duration::ZERO;
                    self.overdrawn = true;
                }
            }
        }
        !self.overdrawn
    }

    /// Time still available, or `None` when overdrawn.
    pub fn time_left(&self) -> Option<Duration> {
        (!self.overdrawn).then_some(self.remaining)
    }
}
