mod support;

use log_minder_core::contract::MinderRequest;
use log_minder_core::fan_out::{fan_out, should_fan_out};
use log_minder_core::groups::{prune_groups, GroupPruneOptions};
use log_minder_core::pagination::log_group_names;
use log_minder_core::streams::{prune_streams, StreamPruneOptions};
use log_minder_core::test_helpers::{InMemoryLogService, InProcessSubmitter, RecordingSubmitter};

use support::{days_ago, now};

fn account() -> InMemoryLogService {
    let service = InMemoryLogService::new();
    service.add_group("/aws/lambda/api", Some(7));
    service.add_stream(
        "/aws/lambda/api",
        "old",
        days_ago(20),
        Some(days_ago(10)),
        0,
    );
    service.add_stream(
        "/aws/lambda/api",
        "live",
        days_ago(20),
        Some(days_ago(1)),
        4,
    );
    service.add_group("/aws/lambda/worker", Some(14));
    service.add_group("/ecs/forever", None);
    service
}

#[test]
fn fanned_out_stream_pruning_matches_a_serial_pass() {
    let service = account();
    let request = MinderRequest::new(30);
    let names = log_group_names(&service, None).expect("listing should succeed");
    assert!(should_fan_out(&request, names.len(), 0));

    let submitter = InProcessSubmitter::new(|request: MinderRequest| {
        prune_streams(
            &service,
            &StreamPruneOptions {
                name_prefix: request.name_prefix(),
                purge_non_empty: request.purge_non_empty,
                emptiness: request.emptiness,
                dry_run: request.dry_run,
                now: now(),
            },
        )
        .expect("pass should succeed");
    });

    let report = fan_out(&submitter, "minder", &names, &request).expect("fan-out should succeed");

    assert_eq!(report.submitted, 3);
    assert_eq!(
        service.stream_names("/aws/lambda/api"),
        vec!["live".to_string()]
    );
}

#[test]
fn fanned_out_group_pruning_removes_only_empty_groups_with_retention() {
    let service = account();
    let names = log_group_names(&service, None).expect("listing should succeed");

    let submitter = InProcessSubmitter::new(|request: MinderRequest| {
        prune_groups(
            &service,
            &GroupPruneOptions {
                name_prefix: request.name_prefix(),
                dry_run: request.dry_run,
            },
        )
        .expect("pass should succeed");
    });
    fan_out(&submitter, "minder", &names, &MinderRequest::new(30))
        .expect("fan-out should succeed");

    assert_eq!(
        service.group_names(),
        vec!["/aws/lambda/api".to_string(), "/ecs/forever".to_string()]
    );
}

#[test]
fn dry_run_flag_is_carried_to_every_invocation() {
    let service = account();
    let names = log_group_names(&service, None).expect("listing should succeed");
    let submitter = RecordingSubmitter::new();
    let request = MinderRequest {
        dry_run: true,
        ..MinderRequest::new(30)
    };

    fan_out(
        &submitter,
        "arn:aws:lambda:eu-west-1:123456789012:function:minder",
        &names,
        &request,
    )
    .expect("fan-out should succeed");

    let requests = submitter.requests();
    assert_eq!(requests.len(), 3);
    assert!(requests.iter().all(|request| request.dry_run));
    assert!(submitter
        .targets()
        .iter()
        .all(|target| target.ends_with("function:minder")));
    assert!(service.mutating_calls().is_empty());
}
