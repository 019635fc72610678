//! Decisions taken by the deciders and what became of them.
//!
//! Every branch of every decider produces exactly one [`Decision`]. The
//! [`Report`] pairs each decision with its [`Outcome`] so callers and tests can
//! inspect a run without parsing logs.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    SetRetention { days: u32 },
    DeleteStream,
    DeleteGroup,
    Keep,
}

impl Action {
    pub fn is_mutation(self) -> bool {
        !matches!(self, Self::Keep)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Reason {
    /// The group has no retention policy yet.
    RetentionUnset,
    /// The group carries a different retention and overwriting was requested.
    RetentionDiffers { current: u32 },
    /// The group already carries a retention that is kept as is.
    RetentionAlreadySet { current: u32 },
    /// Pruners leave groups without a retention policy alone.
    NoRetentionPolicy,
    /// The stream never received an event and was created inside the window.
    UnusedWithinRetention,
    /// The stream was written to inside the window; later streams are newer.
    WithinRetention,
    /// The stream is older than the window and holds no events.
    ExpiredAndEmpty,
    /// The stream is older than the window and non-empty streams are purged.
    ExpiredPurged,
    /// The stream is older than the window but still holds events.
    ExpiredNotEmpty,
    /// The stream disappeared before the probe could read it.
    StreamGone,
    /// Listing the streams of the group failed.
    StreamsUnreadable,
    /// The group holds no streams.
    GroupEmpty,
    /// The group holds at least one stream.
    GroupNotEmpty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub log_group: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_stream: Option<String>,
    pub action: Action,
    pub reason: Reason,
}

impl Decision {
    pub fn for_group(log_group: &str, action: Action, reason: Reason) -> Self {
        Self {
            log_group: log_group.to_string(),
            log_stream: None,
            action,
            reason,
        }
    }

    pub fn for_stream(log_group: &str, log_stream: &str, action: Action, reason: Reason) -> Self {
        Self {
            log_group: log_group.to_string(),
            log_stream: Some(log_stream.to_string()),
            action,
            reason,
        }
    }

    pub fn keep(log_group: &str, reason: Reason) -> Self {
        Self::for_group(log_group, Action::Keep, reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// Nothing to call.
    Unchanged,
    /// The mutating call succeeded.
    Applied,
    /// The mutating call was suppressed by dry run.
    DryRun,
    /// The resource was already gone; treated as done.
    AlreadyGone,
    /// The call failed; the item is skipped.
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub decision: Decision,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub entries: Vec<ReportEntry>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub decisions: usize,
    pub applied: usize,
    pub dry_run: usize,
    pub already_gone: usize,
    pub failed: usize,
    pub kept: usize,
}

impl Report {
    pub fn record(&mut self, decision: Decision, outcome: Outcome) {
        self.entries.push(ReportEntry { decision, outcome });
    }

    pub fn decisions(&self) -> impl Iterator<Item = &Decision> {
        self.entries.iter().map(|entry| &entry.decision)
    }

    /// Decisions that would mutate the service, whether or not they ran.
    pub fn candidates(&self) -> impl Iterator<Item = &Decision> {
        self.decisions()
            .filter(|decision| decision.action.is_mutation())
    }

    pub fn summary(&self) -> ReportSummary {
        let mut summary = ReportSummary {
            decisions: self.entries.len(),
            ..ReportSummary::default()
        };
        for entry in &self.entries {
            match entry.outcome {
                Outcome::Unchanged => summary.kept += 1,
                Outcome::Applied => summary.applied += 1,
                Outcome::DryRun => summary.dry_run += 1,
                Outcome::AlreadyGone => summary.already_gone += 1,
                Outcome::Failed { .. } => summary.failed += 1,
            }
        }
        summary
    }
}

/// Human prefix for log lines describing a mutation.
pub(crate) fn intent(dry_run: bool) -> &'static str {
    if dry_run {
        "dry run: would"
    } else {
        "going to"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts_each_outcome() {
        let mut report = Report::default();
        report.record(
            Decision::for_stream("g", "a", Action::DeleteStream, Reason::ExpiredAndEmpty),
            Outcome::Applied,
        );
        report.record(
            Decision::for_stream("g", "b", Action::DeleteStream, Reason::ExpiredPurged),
            Outcome::AlreadyGone,
        );
        report.record(
            Decision::for_stream("g", "c", Action::DeleteStream, Reason::ExpiredAndEmpty),
            Outcome::Failed {
                error: "AccessDenied".to_string(),
            },
        );
        report.record(
            Decision::for_stream("g", "d", Action::Keep, Reason::WithinRetention),
            Outcome::Unchanged,
        );

        let summary = report.summary();
        assert_eq!(summary.decisions, 4);
        assert_eq!(summary.applied, 1);
        assert_eq!(summary.already_gone, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.kept, 1);
        assert_eq!(report.candidates().count(), 3);
    }

    #[test]
    fn decisions_serialize_with_tagged_action() {
        let decision = Decision::for_group(
            "app-logs",
            Action::SetRetention { days: 30 },
            Reason::RetentionUnset,
        );
        let value = serde_json::to_value(&decision).expect("decision should serialize");

        assert_eq!(value["action"]["type"], "set_retention");
        assert_eq!(value["action"]["days"], 30);
        assert_eq!(value["reason"]["type"], "retention_unset");
        assert!(value.get("log_stream").is_none());
    }
}
