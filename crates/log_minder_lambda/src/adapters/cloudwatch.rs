use std::future::Future;

use aws_sdk_cloudwatchlogs::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_cloudwatchlogs::types::OrderBy;
use log_minder_core::service::{
    GroupPageRequest, LogEvent, LogGroup, LogService, LogServiceError, LogStream, Page,
    StreamOrder, StreamPageRequest,
};

/// Error codes the service returns for conditions that clear up on retry.
const TRANSIENT_ERROR_CODES: [&str; 5] = [
    "ThrottlingException",
    "ServiceUnavailableException",
    "OperationAbortedException",
    "InternalFailure",
    "RequestTimeoutException",
];

const NOT_FOUND_ERROR_CODE: &str = "ResourceNotFoundException";

/// [`LogService`] over the CloudWatch Logs SDK client. Calls block the
/// current worker thread until the service responds.
#[derive(Debug, Clone)]
pub struct CloudWatchLogService {
    client: aws_sdk_cloudwatchlogs::Client,
}

impl CloudWatchLogService {
    pub fn new(client: aws_sdk_cloudwatchlogs::Client) -> Self {
        Self { client }
    }
}

fn block_on<F: Future>(future: F) -> F::Output {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

pub fn classify_error<E, R>(operation: &'static str, error: SdkError<E, R>) -> LogServiceError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let message = DisplayErrorContext(&error).to_string();
    if matches!(
        error,
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_)
    ) {
        return LogServiceError::transient(operation, message);
    }

    match error.code() {
        Some(NOT_FOUND_ERROR_CODE) => LogServiceError::not_found(operation, message),
        Some(code) if TRANSIENT_ERROR_CODES.contains(&code) => {
            LogServiceError::transient(operation, message)
        }
        _ => LogServiceError::other(operation, message),
    }
}

impl LogService for CloudWatchLogService {
    fn describe_log_groups(
        &self,
        request: &GroupPageRequest<'_>,
    ) -> Result<Page<LogGroup>, LogServiceError> {
        let output = block_on(
            self.client
                .describe_log_groups()
                .set_log_group_name_prefix(request.name_prefix.map(str::to_string))
                .limit(request.limit)
                .set_next_token(request.next_token.map(str::to_string))
                .send(),
        )
        .map_err(|error| classify_error("DescribeLogGroups", error))?;

        let items = output
            .log_groups()
            .iter()
            .filter_map(|group| {
                Some(LogGroup {
                    name: group.log_group_name()?.to_string(),
                    retention_in_days: group.retention_in_days(),
                })
            })
            .collect();

        Ok(Page {
            items,
            next_token: output.next_token().map(str::to_string),
        })
    }

    #[allow(deprecated)]
    fn describe_log_streams(
        &self,
        request: &StreamPageRequest<'_>,
    ) -> Result<Page<LogStream>, LogServiceError> {
        let order_by = match request.order_by {
            StreamOrder::LogStreamName => OrderBy::LogStreamName,
            StreamOrder::LastEventTime => OrderBy::LastEventTime,
        };
        let output = block_on(
            self.client
                .describe_log_streams()
                .log_group_name(request.log_group_name)
                .order_by(order_by)
                .descending(request.descending)
                .limit(request.limit)
                .set_next_token(request.next_token.map(str::to_string))
                .send(),
        )
        .map_err(|error| classify_error("DescribeLogStreams", error))?;

        let items = output
            .log_streams()
            .iter()
            .filter_map(|stream| {
                Some(LogStream {
                    name: stream.log_stream_name()?.to_string(),
                    creation_time: stream.creation_time().unwrap_or_default(),
                    last_event_timestamp: stream.last_event_timestamp(),
                    // Deprecated upstream but still populated.
                    stored_bytes: stream.stored_bytes().unwrap_or_default(),
                })
            })
            .collect();

        Ok(Page {
            items,
            next_token: output.next_token().map(str::to_string),
        })
    }

    fn recent_events(
        &self,
        log_group_name: &str,
        log_stream_name: &str,
        limit: i32,
    ) -> Result<Vec<LogEvent>, LogServiceError> {
        let output = block_on(
            self.client
                .get_log_events()
                .log_group_name(log_group_name)
                .log_stream_name(log_stream_name)
                .limit(limit)
                .start_from_head(false)
                .send(),
        )
        .map_err(|error| classify_error("GetLogEvents", error))?;

        Ok(output
            .events()
            .iter()
            .rev()
            .map(|event| LogEvent {
                timestamp: event.timestamp().unwrap_or_default(),
                message: event.message().unwrap_or_default().to_string(),
            })
            .collect())
    }

    fn delete_log_stream(
        &self,
        log_group_name: &str,
        log_stream_name: &str,
    ) -> Result<(), LogServiceError> {
        block_on(
            self.client
                .delete_log_stream()
                .log_group_name(log_group_name)
                .log_stream_name(log_stream_name)
                .send(),
        )
        .map(|_| ())
        .map_err(|error| classify_error("DeleteLogStream", error))
    }

    fn delete_log_group(&self, log_group_name: &str) -> Result<(), LogServiceError> {
        block_on(
            self.client
                .delete_log_group()
                .log_group_name(log_group_name)
                .send(),
        )
        .map(|_| ())
        .map_err(|error| classify_error("DeleteLogGroup", error))
    }

    fn put_retention_policy(
        &self,
        log_group_name: &str,
        retention_in_days: i32,
    ) -> Result<(), LogServiceError> {
        block_on(
            self.client
                .put_retention_policy()
                .log_group_name(log_group_name)
                .retention_in_days(retention_in_days)
                .send(),
        )
        .map(|_| ())
        .map_err(|error| classify_error("PutRetentionPolicy", error))
    }
}

#[cfg(test)]
mod tests {
    use aws_sdk_cloudwatchlogs::error::ErrorMetadata;
    use aws_sdk_cloudwatchlogs::operation::delete_log_stream::DeleteLogStreamError;

    use super::*;

    fn service_error(code: &str) -> SdkError<DeleteLogStreamError, ()> {
        SdkError::service_error(
            DeleteLogStreamError::generic(
                ErrorMetadata::builder()
                    .code(code)
                    .message("simulated")
                    .build(),
            ),
            (),
        )
    }

    #[test]
    fn resource_not_found_is_classified_as_not_found() {
        let source = service_error("ResourceNotFoundException");
        let error = classify_error("DeleteLogStream", source);
        assert!(error.is_not_found());
    }

    #[test]
    fn throttling_is_classified_as_transient() {
        let source = service_error("ThrottlingException");
        let error = classify_error("DeleteLogStream", source);
        assert!(error.is_transient());
    }

    #[test]
    fn timeouts_are_classified_as_transient() {
        let error = classify_error(
            "DeleteLogStream",
            SdkError::<DeleteLogStreamError, ()>::timeout_error("request timed out"),
        );
        assert!(error.is_transient());
    }

    #[test]
    fn access_denied_is_neither_transient_nor_absent() {
        let source = service_error("AccessDeniedException");
        let error = classify_error("DeleteLogStream", source);
        assert!(!error.is_transient());
        assert!(!error.is_not_found());
        assert!(error.to_string().starts_with("DeleteLogStream: "));
    }
}
