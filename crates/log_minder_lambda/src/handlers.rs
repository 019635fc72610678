//! Entry points shared by the three Lambda functions and the CLI.

use chrono::{DateTime, Utc};
use log_minder_core::contract::{MinderRequest, ValidationError};
use log_minder_core::decision::{Report, ReportSummary};
use log_minder_core::fan_out::{
    fan_out, should_fan_out, DispatchError, FanOutReport, TaskSubmitter,
};
use log_minder_core::groups::{prune_groups, GroupPruneOptions};
use log_minder_core::pagination::log_group_names;
use log_minder_core::retention::{set_retention, RetentionOptions};
use log_minder_core::service::{LogService, LogServiceError};
use log_minder_core::streams::{prune_streams, StreamPruneOptions};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::settings::HandlerSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    SetLogRetention,
    DeleteEmptyLogStreams,
    DeleteEmptyLogGroups,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SetLogRetention => "set-log-retention",
            Self::DeleteEmptyLogStreams => "delete-empty-log-streams",
            Self::DeleteEmptyLogGroups => "delete-empty-log-groups",
        }
    }

    /// Retention updates are one call per group and always run in process.
    pub fn supports_fan_out(self) -> bool {
        !matches!(self, Self::SetLogRetention)
    }
}

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    LogService(#[from] LogServiceError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Where account-wide work is re-submitted, one invocation per group.
#[derive(Clone, Copy)]
pub struct FanOutTarget<'a> {
    pub submitter: &'a dyn TaskSubmitter,
    pub function: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandlerResponse {
    pub operation: Operation,
    pub dry_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_group_name_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<ReportSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fanned_out: Option<FanOutReport>,
}

/// Runs one operation in process against `service`.
pub fn execute<S: LogService + ?Sized>(
    operation: Operation,
    request: &MinderRequest,
    service: &S,
    now: DateTime<Utc>,
) -> Result<Report, LogServiceError> {
    match operation {
        Operation::SetLogRetention => set_retention(
            service,
            &RetentionOptions {
                name_prefix: request.name_prefix(),
                retention_days: request.days,
                overwrite: request.overwrite,
                dry_run: request.dry_run,
            },
        ),
        Operation::DeleteEmptyLogStreams => prune_streams(
            service,
            &StreamPruneOptions {
                name_prefix: request.name_prefix(),
                purge_non_empty: request.purge_non_empty,
                emptiness: request.emptiness,
                dry_run: request.dry_run,
                now,
            },
        ),
        Operation::DeleteEmptyLogGroups => prune_groups(
            service,
            &GroupPruneOptions {
                name_prefix: request.name_prefix(),
                dry_run: request.dry_run,
            },
        ),
    }
}

/// Validates `payload`, then either fans the request out or runs it.
///
/// Validation happens before the first call to `service`.
pub fn handle_event<S: LogService + ?Sized>(
    operation: Operation,
    payload: &Value,
    settings: &HandlerSettings,
    service: &S,
    fan_out_target: Option<FanOutTarget<'_>>,
    now: DateTime<Utc>,
) -> Result<HandlerResponse, HandlerError> {
    let request = MinderRequest::from_payload(payload, &settings.request_defaults())?;
    info!(
        operation = operation.as_str(),
        dry_run = request.dry_run,
        log_group_name_prefix = request.name_prefix().unwrap_or_default(),
        "handling invocation"
    );

    let mut response = HandlerResponse {
        operation,
        dry_run: request.dry_run,
        log_group_name_prefix: request.log_group_name_prefix.clone(),
        summary: None,
        fanned_out: None,
    };

    if let Some(target) = fan_out_target.filter(|_| operation.supports_fan_out()) {
        if request.log_group_name_prefix.is_none() {
            let names = log_group_names(service, None)?;
            if should_fan_out(&request, names.len(), settings.fan_out_threshold) {
                let report = fan_out(target.submitter, target.function, &names, &request)?;
                info!(
                    operation = operation.as_str(),
                    submitted = report.submitted,
                    failed = report.failed.len(),
                    "fan-out complete"
                );
                response.fanned_out = Some(report);
                return Ok(response);
            }
        }
    }

    let summary = execute(operation, &request, service, now)?.summary();
    info!(
        operation = operation.as_str(),
        decisions = summary.decisions,
        applied = summary.applied,
        dry_run_intents = summary.dry_run,
        already_gone = summary.already_gone,
        failed = summary.failed,
        "invocation complete"
    );
    response.summary = Some(summary);
    Ok(response)
}
