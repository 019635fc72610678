use std::time::Duration;

use tracing::warn;

use crate::service::{
    GroupPageRequest, LogEvent, LogGroup, LogService, LogServiceError, LogStream, Page,
    StreamPageRequest,
};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Delay before attempt `attempt + 1`, doubling from `base_delay`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let factor = 1u32.checked_shl(exponent).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Retries transient failures of the wrapped service. Not-found and other
/// failures are returned on the first attempt.
pub struct RetryingLogService<S> {
    inner: S,
    policy: RetryPolicy,
    sleep: fn(Duration),
}

impl<S: LogService> RetryingLogService<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self {
            inner,
            policy,
            sleep: std::thread::sleep,
        }
    }

    pub fn with_sleep(mut self, sleep: fn(Duration)) -> Self {
        self.sleep = sleep;
        self
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn call<T>(
        &self,
        mut operation: impl FnMut(&S) -> Result<T, LogServiceError>,
    ) -> Result<T, LogServiceError> {
        let mut attempt = 1;
        loop {
            match operation(&self.inner) {
                Err(err) if err.is_transient() && attempt < self.policy.max_attempts => {
                    let delay = self.policy.backoff(attempt);
                    warn!(
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retrying transient log service failure"
                    );
                    (self.sleep)(delay);
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

impl<S: LogService> LogService for RetryingLogService<S> {
    fn describe_log_groups(
        &self,
        request: &GroupPageRequest<'_>,
    ) -> Result<Page<LogGroup>, LogServiceError> {
        self.call(|inner| inner.describe_log_groups(request))
    }

    fn describe_log_streams(
        &self,
        request: &StreamPageRequest<'_>,
    ) -> Result<Page<LogStream>, LogServiceError> {
        self.call(|inner| inner.describe_log_streams(request))
    }

    fn recent_events(
        &self,
        log_group_name: &str,
        log_stream_name: &str,
        limit: i32,
    ) -> Result<Vec<LogEvent>, LogServiceError> {
        self.call(|inner| inner.recent_events(log_group_name, log_stream_name, limit))
    }

    fn delete_log_stream(
        &self,
        log_group_name: &str,
        log_stream_name: &str,
    ) -> Result<(), LogServiceError> {
        self.call(|inner| inner.delete_log_stream(log_group_name, log_stream_name))
    }

    fn delete_log_group(&self, log_group_name: &str) -> Result<(), LogServiceError> {
        self.call(|inner| inner.delete_log_group(log_group_name))
    }

    fn put_retention_policy(
        &self,
        log_group_name: &str,
        retention_in_days: i32,
    ) -> Result<(), LogServiceError> {
        self.call(|inner| inner.put_retention_policy(log_group_name, retention_in_days))
    }
}
