//! Account-wide fan-out: one asynchronous invocation per log group.
//!
//! The dispatcher never waits for the invocations it submits. Each one
//! repeats the single-group decision logic on its own, so failures inside
//! them are invisible here.

use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};

use crate::contract::MinderRequest;

/// Submits a payload for asynchronous execution by `target`.
pub trait TaskSubmitter {
    fn submit(&self, target: &str, payload: &[u8]) -> Result<(), String>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("fan-out target must be configured")]
    MissingTarget,
    #[error("failed to serialize fan-out payload for {log_group}: {message}")]
    Serialization { log_group: String, message: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FanOutReport {
    pub submitted: usize,
    pub failed: Vec<String>,
}

/// Submits `request` narrowed to each name in `log_group_names`.
///
/// A submission failure for one group is logged and recorded; the remaining
/// groups are still dispatched.
pub fn fan_out<T: TaskSubmitter + ?Sized>(
    submitter: &T,
    target: &str,
    log_group_names: &[String],
    request: &MinderRequest,
) -> Result<FanOutReport, DispatchError> {
    if target.trim().is_empty() {
        return Err(DispatchError::MissingTarget);
    }

    info!(
        function = target,
        log_groups = log_group_names.len(),
        dry_run = request.dry_run,
        "recursively invoking per log group"
    );

    let mut report = FanOutReport::default();
    for log_group_name in log_group_names {
        let payload = match serde_json::to_vec(&request.for_log_group(log_group_name)) {
            Ok(payload) => payload,
            Err(err) => {
                return Err(DispatchError::Serialization {
                    log_group: log_group_name.clone(),
                    message: err.to_string(),
                })
            }
        };

        match submitter.submit(target, &payload) {
            Ok(()) => report.submitted += 1,
            Err(message) => {
                error!(
                    function = target,
                    log_group = %log_group_name,
                    operation = "Invoke",
                    error = %message,
                    "failed to submit fan-out invocation"
                );
                report.failed.push(log_group_name.clone());
            }
        }
    }
    Ok(report)
}

/// Whether an account-wide request should be fanned out rather than run in
/// process: only when it lists more than `threshold` groups. Requests that
/// already carry a prefix never fan out.
pub fn should_fan_out(request: &MinderRequest, log_group_count: usize, threshold: usize) -> bool {
    request.log_group_name_prefix.is_none() && log_group_count > threshold
}
