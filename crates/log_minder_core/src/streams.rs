//! Deletion of log streams that outlived the retention period of their group.
//!
//! Streams are listed oldest-first by last event time. The walk over a group
//! stops at the first stream that was written to inside the retention window,
//! so the cost of a pass is bounded by the number of overdue streams.

use std::ops::ControlFlow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::decision::{intent, Action, Decision, Outcome, Reason, Report};
use crate::pagination::{for_each_log_group, walk_streams_oldest_first};
use crate::service::{LogGroup, LogService, LogServiceError, LogStream};
use crate::time::{age_in_days, is_within_retention, retention_cutoff_millis};

/// Number of recent events fetched to tell an empty stream from a live one.
pub const PROBE_EVENT_LIMIT: i32 = 2;

/// How an overdue stream is checked for remaining events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emptiness {
    /// Fetch the most recent events of the stream.
    #[default]
    Probe,
    /// Trust the stored-bytes counter reported by the listing.
    StoredBytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamPruneOptions<'a> {
    pub name_prefix: Option<&'a str>,
    pub purge_non_empty: bool,
    pub emptiness: Emptiness,
    pub dry_run: bool,
    pub now: DateTime<Utc>,
}

/// Verdict on a stream before any emptiness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Age {
    /// Never written to and created inside the window.
    FreshUnused,
    /// Written to inside the window. No later stream can be overdue.
    Recent,
    /// Effective timestamp at or before the cutoff.
    Overdue,
}

pub fn classify_age(stream: &LogStream, cutoff: i64) -> Age {
    if !stream.has_events() && is_within_retention(stream.creation_time, cutoff) {
        Age::FreshUnused
    } else if is_within_retention(stream.effective_timestamp(), cutoff) {
        Age::Recent
    } else {
        Age::Overdue
    }
}

/// Deletes overdue streams in every matching group that has a retention policy.
pub fn prune_streams<S: LogService + ?Sized>(
    service: &S,
    options: &StreamPruneOptions<'_>,
) -> Result<Report, LogServiceError> {
    info!(
        log_group_prefix = options.name_prefix.unwrap_or_default(),
        purge_non_empty = options.purge_non_empty,
        "cleaning empty log streams older than the retention period of the group"
    );

    let mut report = Report::default();
    for_each_log_group(service, options.name_prefix, |group| {
        prune_group_streams(service, &group, options, &mut report);
    })?;

    let summary = report.summary();
    info!(
        decisions = summary.decisions,
        deleted = summary.applied,
        dry_run = summary.dry_run,
        already_gone = summary.already_gone,
        failed = summary.failed,
        "stream pruning pass finished"
    );
    Ok(report)
}

/// Walks the streams of one group. Listing failures are recorded against the
/// group and never escape.
pub fn prune_group_streams<S: LogService + ?Sized>(
    service: &S,
    group: &LogGroup,
    options: &StreamPruneOptions<'_>,
    report: &mut Report,
) {
    let Some(retention_days) = group.retention_days() else {
        debug!(log_group = %group.name, "no retention set on log group");
        report.record(
            Decision::keep(&group.name, Reason::NoRetentionPolicy),
            Outcome::Unchanged,
        );
        return;
    };

    let cutoff = retention_cutoff_millis(options.now, retention_days);
    let walked = walk_streams_oldest_first(service, &group.name, |stream| {
        visit_stream(service, group, &stream, cutoff, options, report)
    });

    if let Err(err) = walked {
        error!(
            log_group = %group.name,
            operation = "DescribeLogStreams",
            error = %err,
            "failed to list log streams"
        );
        report.record(
            Decision::keep(&group.name, Reason::StreamsUnreadable),
            Outcome::Failed {
                error: err.to_string(),
            },
        );
    }
}

fn visit_stream<S: LogService + ?Sized>(
    service: &S,
    group: &LogGroup,
    stream: &LogStream,
    cutoff: i64,
    options: &StreamPruneOptions<'_>,
    report: &mut Report,
) -> ControlFlow<()> {
    let keep = |reason| Decision::for_stream(&group.name, &stream.name, Action::Keep, reason);

    match classify_age(stream, cutoff) {
        Age::FreshUnused => {
            debug!(
                log_group = %group.name,
                log_stream = %stream.name,
                "unused log stream is within retention period"
            );
            report.record(keep(Reason::UnusedWithinRetention), Outcome::Unchanged);
            return ControlFlow::Continue(());
        }
        Age::Recent => {
            debug!(
                log_group = %group.name,
                log_stream = %stream.name,
                "oldest remaining log stream is within retention period"
            );
            report.record(keep(Reason::WithinRetention), Outcome::Unchanged);
            return ControlFlow::Break(());
        }
        Age::Overdue => {}
    }

    let reason = if options.purge_non_empty {
        Reason::ExpiredPurged
    } else {
        match holds_events(service, group, stream, options.emptiness) {
            Ok(false) => Reason::ExpiredAndEmpty,
            Ok(true) => {
                debug!(
                    log_group = %group.name,
                    log_stream = %stream.name,
                    "keeping expired log stream as it is not empty"
                );
                report.record(keep(Reason::ExpiredNotEmpty), Outcome::Unchanged);
                return ControlFlow::Continue(());
            }
            Err(err) if err.is_not_found() => {
                debug!(
                    log_group = %group.name,
                    log_stream = %stream.name,
                    "log stream already gone"
                );
                report.record(keep(Reason::StreamGone), Outcome::AlreadyGone);
                return ControlFlow::Continue(());
            }
            Err(err) => {
                error!(
                    log_group = %group.name,
                    log_stream = %stream.name,
                    operation = "GetLogEvents",
                    error = %err,
                    "failed to probe log stream for events"
                );
                report.record(
                    keep(Reason::ExpiredNotEmpty),
                    Outcome::Failed {
                        error: err.to_string(),
                    },
                );
                return ControlFlow::Continue(());
            }
        }
    };

    let decision = Decision::for_stream(&group.name, &stream.name, Action::DeleteStream, reason);
    let outcome = delete_stream(service, &decision, stream, options);
    report.record(decision, outcome);
    ControlFlow::Continue(())
}

fn holds_events<S: LogService + ?Sized>(
    service: &S,
    group: &LogGroup,
    stream: &LogStream,
    emptiness: Emptiness,
) -> Result<bool, LogServiceError> {
    match emptiness {
        Emptiness::StoredBytes => Ok(stream.stored_bytes > 0),
        Emptiness::Probe => service
            .recent_events(&group.name, &stream.name, PROBE_EVENT_LIMIT)
            .map(|events| !events.is_empty()),
    }
}

fn delete_stream<S: LogService + ?Sized>(
    service: &S,
    decision: &Decision,
    stream: &LogStream,
    options: &StreamPruneOptions<'_>,
) -> Outcome {
    info!(
        log_group = %decision.log_group,
        log_stream = %stream.name,
        age_days = age_in_days(options.now, stream.effective_timestamp()),
        purge_non_empty = options.purge_non_empty,
        dry_run = options.dry_run,
        "{} delete log stream",
        intent(options.dry_run)
    );
    if options.dry_run {
        return Outcome::DryRun;
    }

    match service.delete_log_stream(&decision.log_group, &stream.name) {
        Ok(()) => Outcome::Applied,
        Err(err) if err.is_not_found() => {
            debug!(
                log_group = %decision.log_group,
                log_stream = %stream.name,
                "log stream already deleted"
            );
            Outcome::AlreadyGone
        }
        Err(err) => {
            error!(
                log_group = %decision.log_group,
                log_stream = %stream.name,
                operation = "DeleteLogStream",
                error = %err,
                "failed to delete log stream"
            );
            Outcome::Failed {
                error: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(creation_time: i64, last_event_timestamp: Option<i64>) -> LogStream {
        LogStream {
            name: "s".to_string(),
            creation_time,
            last_event_timestamp,
            stored_bytes: 0,
        }
    }

    #[test]
    fn unused_stream_created_inside_window_is_fresh() {
        assert_eq!(classify_age(&stream(150, None), 100), Age::FreshUnused);
    }

    #[test]
    fn unused_stream_created_before_cutoff_is_overdue() {
        assert_eq!(classify_age(&stream(100, None), 100), Age::Overdue);
    }

    #[test]
    fn stream_written_inside_window_is_recent() {
        assert_eq!(classify_age(&stream(10, Some(101)), 100), Age::Recent);
    }

    #[test]
    fn old_creation_with_recent_event_is_not_overdue() {
        assert_ne!(classify_age(&stream(1, Some(500)), 100), Age::Overdue);
    }

    #[test]
    fn stream_last_written_at_cutoff_is_overdue() {
        assert_eq!(classify_age(&stream(10, Some(100)), 100), Age::Overdue);
    }

    #[test]
    fn emptiness_defaults_to_probe() {
        assert_eq!(Emptiness::default(), Emptiness::Probe);
        let parsed: Emptiness =
            serde_json::from_value(serde_json::json!("stored_bytes")).expect("should parse");
        assert_eq!(parsed, Emptiness::StoredBytes);
    }
}
