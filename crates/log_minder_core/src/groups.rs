use tracing::{debug, error, info};

use crate::decision::{intent, Action, Decision, Outcome, Reason, Report};
use crate::pagination::{for_each_log_group, has_any_stream};
use crate::service::{LogGroup, LogService, LogServiceError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupPruneOptions<'a> {
    pub name_prefix: Option<&'a str>,
    pub dry_run: bool,
}

/// Deletes every matching group that has a retention policy and no streams.
/// Groups without a retention policy are never removed.
pub fn prune_groups<S: LogService + ?Sized>(
    service: &S,
    options: &GroupPruneOptions<'_>,
) -> Result<Report, LogServiceError> {
    if let Some(prefix) = options.name_prefix {
        info!(log_group_prefix = prefix, "finding log groups by prefix");
    }

    let mut report = Report::default();
    for_each_log_group(service, options.name_prefix, |group| {
        prune_group(service, &group, options.dry_run, &mut report);
    })?;

    let summary = report.summary();
    info!(
        groups = summary.decisions,
        deleted = summary.applied,
        dry_run = summary.dry_run,
        failed = summary.failed,
        "group pruning pass finished"
    );
    Ok(report)
}

fn prune_group<S: LogService + ?Sized>(
    service: &S,
    group: &LogGroup,
    dry_run: bool,
    report: &mut Report,
) {
    if group.retention_days().is_none() {
        debug!(log_group = %group.name, "no retention set on log group");
        report.record(
            Decision::keep(&group.name, Reason::NoRetentionPolicy),
            Outcome::Unchanged,
        );
        return;
    }

    let has_streams = match has_any_stream(service, &group.name) {
        Ok(value) => value,
        Err(err) if err.is_not_found() => {
            debug!(log_group = %group.name, "log group already gone");
            report.record(
                Decision::keep(&group.name, Reason::StreamsUnreadable),
                Outcome::AlreadyGone,
            );
            return;
        }
        Err(err) => {
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
            return;
        }
    };

    if has_streams {
        debug!(log_group = %group.name, "keeping log group as it is not empty");
        report.record(
            Decision::keep(&group.name, Reason::GroupNotEmpty),
            Outcome::Unchanged,
        );
        return;
    }

    info!(
        log_group = %group.name,
        dry_run,
        "{} delete empty log group",
        intent(dry_run)
    );
    let decision = Decision::for_group(&group.name, Action::DeleteGroup, Reason::GroupEmpty);
    let outcome = if dry_run {
        Outcome::DryRun
    } else {
        match service.delete_log_group(&group.name) {
            Ok(()) => Outcome::Applied,
            Err(err) if err.is_not_found() => {
                debug!(log_group = %group.name, "log group already deleted");
                Outcome::AlreadyGone
            }
            Err(err) => {
                error!(
                    log_group = %group.name,
                    operation = "DeleteLogGroup",
                    error = %err,
                    "failed to delete log group"
                );
                Outcome::Failed {
                    error: err.to_string(),
                }
            }
        }
    };
    report.record(decision, outcome);
}
