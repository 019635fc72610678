use std::ops::ControlFlow;

use crate::service::{
    GroupPageRequest, LogGroup, LogService, LogServiceError, LogStream, Page, StreamOrder,
    StreamPageRequest, PAGE_SIZE,
};

/// Walks every page produced by `fetch` until the service stops returning a
/// continuation token or `visit` breaks. Returns whether the walk was cut short.
pub fn walk_pages<T>(
    mut fetch: impl FnMut(Option<&str>) -> Result<Page<T>, LogServiceError>,
    mut visit: impl FnMut(T) -> ControlFlow<()>,
) -> Result<ControlFlow<()>, LogServiceError> {
    let mut next_token: Option<String> = None;
    loop {
        let page = fetch(next_token.as_deref())?;
        for item in page.items {
            if visit(item).is_break() {
                return Ok(ControlFlow::Break(()));
            }
        }

        match page.next_token {
            // A repeated token means the listing is exhausted.
            Some(token) if next_token.as_deref() != Some(token.as_str()) => {
                next_token = Some(token);
            }
            _ => return Ok(ControlFlow::Continue(())),
        }
    }
}

/// Visits every log group whose name starts with `name_prefix`.
pub fn for_each_log_group<S: LogService + ?Sized>(
    service: &S,
    name_prefix: Option<&str>,
    mut visit: impl FnMut(LogGroup),
) -> Result<(), LogServiceError> {
    walk_pages(
        |next_token| {
            service.describe_log_groups(&GroupPageRequest {
                name_prefix,
                limit: PAGE_SIZE,
                next_token,
            })
        },
        |group| {
            visit(group);
            ControlFlow::Continue(())
        },
    )
    .map(|_| ())
}

/// Names of every log group matching `name_prefix`, in listing order.
pub fn log_group_names<S: LogService + ?Sized>(
    service: &S,
    name_prefix: Option<&str>,
) -> Result<Vec<String>, LogServiceError> {
    let mut names = Vec::new();
    for_each_log_group(service, name_prefix, |group| names.push(group.name))?;
    Ok(names)
}

/// Visits the streams of a group oldest-first by last event time until
/// `visit` breaks.
pub fn walk_streams_oldest_first<S: LogService + ?Sized>(
    service: &S,
    log_group_name: &str,
    visit: impl FnMut(LogStream) -> ControlFlow<()>,
) -> Result<ControlFlow<()>, LogServiceError> {
    walk_pages(
        |next_token| {
            service.describe_log_streams(&StreamPageRequest {
                log_group_name,
                order_by: StreamOrder::LastEventTime,
                descending: false,
                limit: PAGE_SIZE,
                next_token,
            })
        },
        visit,
    )
}

/// Whether the group holds at least one stream. Empty pages carrying a
/// continuation token are followed before concluding the group is empty.
pub fn has_any_stream<S: LogService + ?Sized>(
    service: &S,
    log_group_name: &str,
) -> Result<bool, LogServiceError> {
    let flow = walk_pages(
        |next_token| {
            service.describe_log_streams(&StreamPageRequest {
                log_group_name,
                order_by: StreamOrder::LogStreamName,
                descending: false,
                limit: 1,
                next_token,
            })
        },
        |_| ControlFlow::Break(()),
    )?;
    Ok(flow.is_break())
}
