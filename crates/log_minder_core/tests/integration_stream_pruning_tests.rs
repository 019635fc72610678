mod support;

use log_minder_core::decision::{Action, Outcome, Reason};
use log_minder_core::streams::{prune_streams, Emptiness, StreamPruneOptions};
use log_minder_core::test_helpers::{InMemoryLogService, ScriptedFailure};

use support::{days_ago, now};

fn options(purge_non_empty: bool, dry_run: bool) -> StreamPruneOptions<'static> {
    StreamPruneOptions {
        name_prefix: None,
        purge_non_empty,
        emptiness: Emptiness::Probe,
        dry_run,
        now: now(),
    }
}

/// Group "app-logs" with retention 7 and streams aged 40, 12, 5 and 1 days.
fn app_logs(event_count: usize) -> InMemoryLogService {
    let service = InMemoryLogService::new();
    service.add_group("app-logs", Some(7));
    for (index, age) in [40, 12, 5, 1].into_iter().enumerate() {
        service.add_stream(
            "app-logs",
            &format!("stream-{index}"),
            days_ago(age + 1),
            Some(days_ago(age)),
            event_count,
        );
    }
    service
}

#[test]
fn deletes_only_streams_older_than_retention() {
    let service = app_logs(0);
    let report = prune_streams(&service, &options(false, false)).expect("pass should succeed");

    let deleted: Vec<_> = report
        .candidates()
        .map(|decision| decision.log_stream.clone().expect("stream decision"))
        .collect();
    assert_eq!(deleted, vec!["stream-0", "stream-1"]);
    assert_eq!(
        service.stream_names("app-logs"),
        vec!["stream-2".to_string(), "stream-3".to_string()]
    );
}

#[test]
fn scan_stops_at_first_stream_within_retention() {
    let service = app_logs(0);
    let report = prune_streams(&service, &options(true, false)).expect("pass should succeed");

    assert_eq!(service.evaluated_streams(), vec!["stream-0", "stream-1"]);
    let last = report.entries.last().expect("report should not be empty");
    assert_eq!(last.decision.log_stream.as_deref(), Some("stream-2"));
    assert_eq!(last.decision.reason, Reason::WithinRetention);
    assert!(report
        .decisions()
        .all(|decision| decision.log_stream.as_deref() != Some("stream-3")));
}

#[test]
fn expired_stream_with_events_is_kept_unless_purging() {
    let service = app_logs(2);
    let report = prune_streams(&service, &options(false, false)).expect("pass should succeed");

    assert!(service.mutating_calls().is_empty());
    assert_eq!(service.calls_to("GetLogEvents"), 2);
    assert!(report
        .entries
        .iter()
        .filter(|entry| entry.decision.reason == Reason::ExpiredNotEmpty)
        .all(|entry| entry.decision.action == Action::Keep));

    let purged = prune_streams(&service, &options(true, false)).expect("pass should succeed");
    assert_eq!(purged.summary().applied, 2);
    assert_eq!(service.calls_to("GetLogEvents"), 2);
}

#[test]
fn stored_bytes_strategy_skips_the_probe() {
    let service = app_logs(2);
    service.add_stream("app-logs", "unused-old", days_ago(30), None, 0);

    let report = prune_streams(
        &service,
        &StreamPruneOptions {
            emptiness: Emptiness::StoredBytes,
            ..options(false, false)
        },
    )
    .expect("pass should succeed");

    assert_eq!(service.calls_to("GetLogEvents"), 0);
    let deleted: Vec<_> = report
        .candidates()
        .filter_map(|decision| decision.log_stream.as_deref())
        .collect();
    assert_eq!(deleted, vec!["unused-old"]);
}

#[test]
fn dry_run_issues_no_mutating_calls() {
    let service = app_logs(0);
    let report = prune_streams(&service, &options(true, true)).expect("pass should succeed");

    assert!(service.mutating_calls().is_empty());
    assert_eq!(report.summary().dry_run, 2);
    assert_eq!(service.stream_names("app-logs").len(), 4);
}

#[test]
fn groups_without_retention_are_untouched() {
    let service = InMemoryLogService::new();
    service.add_group("forever", None);
    service.add_group("zero", Some(0));
    service.add_stream("forever", "ancient", days_ago(900), Some(days_ago(800)), 0);
    service.add_stream("zero", "ancient", days_ago(900), None, 0);

    let report = prune_streams(&service, &options(true, false)).expect("pass should succeed");

    assert!(service.mutating_calls().is_empty());
    assert_eq!(service.calls_to("DescribeLogStreams"), 0);
    assert!(report
        .decisions()
        .all(|decision| decision.reason == Reason::NoRetentionPolicy));
}

#[test]
fn fresh_unused_stream_does_not_stop_the_scan() {
    let service = InMemoryLogService::new();
    service.add_group("app-logs", Some(7));
    service.add_stream("app-logs", "fresh", days_ago(2), None, 0);
    service.add_stream("app-logs", "old", days_ago(60), Some(days_ago(30)), 0);
    service.add_stream("app-logs", "recent", days_ago(40), Some(days_ago(3)), 0);
    service.add_stream("app-logs", "tail", days_ago(40), Some(days_ago(1)), 0);

    let report = prune_streams(&service, &options(true, false)).expect("pass should succeed");

    let reasons: Vec<_> = report.decisions().map(|decision| decision.reason).collect();
    assert_eq!(
        reasons,
        vec![
            Reason::UnusedWithinRetention,
            Reason::ExpiredPurged,
            Reason::WithinRetention
        ]
    );
    assert_eq!(service.evaluated_streams(), vec!["old"]);
}

#[test]
fn already_deleted_stream_counts_as_handled() {
    let service = app_logs(0);
    service.fail_on("DeleteLogStream", "stream-0", ScriptedFailure::NotFound);

    let report = prune_streams(&service, &options(false, false)).expect("pass should succeed");

    let summary = report.summary();
    assert_eq!(summary.already_gone, 1);
    assert_eq!(summary.applied, 1);
    assert_eq!(summary.failed, 0);
}

#[test]
fn probe_of_vanished_stream_is_not_an_error() {
    let service = app_logs(0);
    service.fail_on("GetLogEvents", "stream-0", ScriptedFailure::NotFound);

    let report = prune_streams(&service, &options(false, false)).expect("pass should succeed");

    let first = &report.entries[0];
    assert_eq!(first.decision.reason, Reason::StreamGone);
    assert_eq!(first.outcome, Outcome::AlreadyGone);
    assert_eq!(service.calls_to("DeleteLogStream"), 1);
}

#[test]
fn other_deletion_failures_do_not_stop_the_group() {
    let service = app_logs(0);
    service.fail_on("DeleteLogStream", "stream-0", ScriptedFailure::Other);

    let report = prune_streams(&service, &options(false, false)).expect("pass should succeed");

    assert_eq!(report.summary().failed, 1);
    assert_eq!(report.summary().applied, 1);
    assert_eq!(
        service.stream_names("app-logs"),
        vec![
            "stream-0".to_string(),
            "stream-2".to_string(),
            "stream-3".to_string()
        ]
    );
}

#[test]
fn unreadable_group_does_not_stop_the_pass() {
    let service = app_logs(0);
    service.add_group("broken", Some(7));
    service.fail_on("DescribeLogStreams", "broken", ScriptedFailure::Other);

    let report = prune_streams(&service, &options(false, false)).expect("pass should succeed");

    assert_eq!(report.summary().failed, 1);
    assert_eq!(report.summary().applied, 2);
}

#[test]
fn group_listing_failure_is_returned() {
    let service = app_logs(0);
    service.fail_next("DescribeLogGroups", ScriptedFailure::Other, 1);

    let error = prune_streams(&service, &options(false, false)).expect_err("pass should fail");
    assert_eq!(
        error.to_string(),
        "DescribeLogGroups: AccessDeniedException"
    );
}

#[test]
fn overdue_streams_across_pages_are_all_visited() {
    let service = InMemoryLogService::new();
    service.add_group("busy", Some(1));
    for index in 0..120 {
        service.add_stream(
            "busy",
            &format!("stream-{index:03}"),
            days_ago(10),
            Some(days_ago(5) + index),
            0,
        );
    }
    service.add_stream("busy", "live", days_ago(10), Some(days_ago(0)), 3);

    let report = prune_streams(&service, &options(false, false)).expect("pass should succeed");

    assert_eq!(report.summary().applied, 120);
    assert_eq!(service.stream_names("busy"), vec!["live".to_string()]);
    assert_eq!(service.calls_to("DescribeLogStreams"), 3);
}

#[test]
fn prefix_restricts_the_groups_visited() {
    let service = app_logs(0);
    service.add_group("other", Some(1));
    service.add_stream("other", "old", days_ago(30), Some(days_ago(20)), 0);

    prune_streams(
        &service,
        &StreamPruneOptions {
            name_prefix: Some("oth"),
            ..options(false, false)
        },
    )
    .expect("pass should succeed");

    assert!(service.stream_names("other").is_empty());
    assert_eq!(service.stream_names("app-logs").len(), 4);
}

#[test]
fn stream_becomes_deletable_once_its_events_expire() {
    let service = app_logs(2);
    service.expire_events("app-logs", "stream-1");

    let report = prune_streams(&service, &options(false, false)).expect("pass should succeed");

    let deleted: Vec<_> = report
        .candidates()
        .filter_map(|decision| decision.log_stream.as_deref())
        .collect();
    assert_eq!(deleted, vec!["stream-1"]);
}
