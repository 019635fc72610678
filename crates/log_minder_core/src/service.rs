//! Capability surface of the remote log service.
//!
//! Implementations block until the service answers. Transient failures are
//! reported as [`LogServiceError::Transient`] so that a decorator such as
//! [`crate::retry::RetryingLogService`] can retry them; the deciders never
//! retry on their own.

use thiserror::Error;

/// Page size used for every group and stream listing.
pub const PAGE_SIZE: i32 = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogGroup {
    pub name: String,
    pub retention_in_days: Option<i32>,
}

impl LogGroup {
    /// Retention as a positive day count. Unset and non-positive values both
    /// mean "never expire".
    pub fn retention_days(&self) -> Option<u32> {
        self.retention_in_days
            .and_then(|days| u32::try_from(days).ok())
            .filter(|days| *days > 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogStream {
    pub name: String,
    /// Milliseconds since the Unix epoch.
    pub creation_time: i64,
    /// Milliseconds since the Unix epoch, absent if the stream never received an event.
    pub last_event_timestamp: Option<i64>,
    pub stored_bytes: i64,
}

impl LogStream {
    /// Last event time, or creation time for a stream that was never written to.
    pub fn effective_timestamp(&self) -> i64 {
        self.last_event_timestamp.unwrap_or(self.creation_time)
    }

    pub fn has_events(&self) -> bool {
        self.last_event_timestamp.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub timestamp: i64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_token: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupPageRequest<'a> {
    pub name_prefix: Option<&'a str>,
    pub limit: i32,
    pub next_token: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOrder {
    LogStreamName,
    LastEventTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamPageRequest<'a> {
    pub log_group_name: &'a str,
    pub order_by: StreamOrder,
    pub descending: bool,
    pub limit: i32,
    pub next_token: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogServiceError {
    #[error("{operation}: resource not found: {message}")]
    NotFound {
        operation: &'static str,
        message: String,
    },
    #[error("{operation}: transient failure: {message}")]
    Transient {
        operation: &'static str,
        message: String,
    },
    #[error("{operation}: {message}")]
    Other {
        operation: &'static str,
        message: String,
    },
}

impl LogServiceError {
    pub fn not_found(operation: &'static str, message: impl Into<String>) -> Self {
        Self::NotFound {
            operation,
            message: message.into(),
        }
    }

    pub fn transient(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Transient {
            operation,
            message: message.into(),
        }
    }

    pub fn other(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Other {
            operation,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

/// Blocking access to log groups and streams.
pub trait LogService {
    fn describe_log_groups(
        &self,
        request: &GroupPageRequest<'_>,
    ) -> Result<Page<LogGroup>, LogServiceError>;

    fn describe_log_streams(
        &self,
        request: &StreamPageRequest<'_>,
    ) -> Result<Page<LogStream>, LogServiceError>;

    /// Most recent events of a stream, newest first, at most `limit` of them.
    fn recent_events(
        &self,
        log_group_name: &str,
        log_stream_name: &str,
        limit: i32,
    ) -> Result<Vec<LogEvent>, LogServiceError>;

    fn delete_log_stream(
        &self,
        log_group_name: &str,
        log_stream_name: &str,
    ) -> Result<(), LogServiceError>;

    fn delete_log_group(&self, log_group_name: &str) -> Result<(), LogServiceError>;

    fn put_retention_policy(
        &self,
        log_group_name: &str,
        retention_in_days: i32,
    ) -> Result<(), LogServiceError>;
}
