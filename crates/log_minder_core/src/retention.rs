use tracing::{debug, error, info};

use crate::decision::{intent, Action, Decision, Outcome, Reason, Report};
use crate::pagination::for_each_log_group;
use crate::service::{LogGroup, LogService, LogServiceError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionOptions<'a> {
    pub name_prefix: Option<&'a str>,
    pub retention_days: u32,
    pub overwrite: bool,
    pub dry_run: bool,
}

/// Decides whether a group needs a (new) retention policy.
pub fn decide_retention(group: &LogGroup, retention_days: u32, overwrite: bool) -> Decision {
    match group.retention_days() {
        None => Decision::for_group(
            &group.name,
            Action::SetRetention {
                days: retention_days,
            },
            Reason::RetentionUnset,
        ),
        Some(current) if overwrite && current != retention_days => Decision::for_group(
            &group.name,
            Action::SetRetention {
                days: retention_days,
            },
            Reason::RetentionDiffers { current },
        ),
        Some(current) => Decision::keep(&group.name, Reason::RetentionAlreadySet { current }),
    }
}

/// Applies `retention_days` to every matching group without a retention
/// policy, and to groups with a different one when `overwrite` is set.
///
/// Failures on a single group are logged and recorded; only a failure to list
/// the groups is returned.
pub fn set_retention<S: LogService + ?Sized>(
    service: &S,
    options: &RetentionOptions<'_>,
) -> Result<Report, LogServiceError> {
    if let Some(prefix) = options.name_prefix {
        info!(log_group_prefix = prefix, "finding log groups by prefix");
    }

    let mut report = Report::default();
    for_each_log_group(service, options.name_prefix, |group| {
        let decision = decide_retention(&group, options.retention_days, options.overwrite);
        let outcome = apply(service, &decision, options.dry_run);
        report.record(decision, outcome);
    })?;

    let summary = report.summary();
    info!(
        groups = summary.decisions,
        updated = summary.applied,
        dry_run = summary.dry_run,
        failed = summary.failed,
        "retention pass finished"
    );
    Ok(report)
}

fn apply<S: LogService + ?Sized>(service: &S, decision: &Decision, dry_run: bool) -> Outcome {
    let Action::SetRetention { days } = decision.action else {
        if let Reason::RetentionAlreadySet { current } = decision.reason {
            debug!(
                log_group = %decision.log_group,
                current_days = current,
                "retention already set"
            );
        }
        return Outcome::Unchanged;
    };

    match decision.reason {
        Reason::RetentionDiffers { current } => info!(
            log_group = %decision.log_group,
            current_days = current,
            retention_days = days,
            dry_run,
            "{} overwrite retention period",
            intent(dry_run)
        ),
        _ => info!(
            log_group = %decision.log_group,
            retention_days = days,
            dry_run,
            "{} set default retention period",
            intent(dry_run)
        ),
    }

    if dry_run {
        return Outcome::DryRun;
    }

    // Validated days never exceed i32::MAX.
    let days = i32::try_from(days).unwrap_or(i32::MAX);
    match service.put_retention_policy(&decision.log_group, days) {
        Ok(()) => Outcome::Applied,
        Err(err) if err.is_not_found() => {
            debug!(log_group = %decision.log_group, "log group vanished before retention update");
            Outcome::AlreadyGone
        }
        Err(err) => {
            error!(
                log_group = %decision.log_group,
                retention_days = days,
                operation = "PutRetentionPolicy",
                error = %err,
                "failed to set retention period"
            );
            Outcome::Failed {
                error: err.to_string(),
            }
        }
    }
}
