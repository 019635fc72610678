use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use log_minder_core::retry::{RetryPolicy, RetryingLogService};
use log_minder_lambda::adapters::cloudwatch::CloudWatchLogService;
use log_minder_lambda::adapters::connection::{load_sdk_config, logs_client};
use log_minder_lambda::cli::Cli;
use log_minder_lambda::handlers::execute;
use log_minder_lambda::telemetry::{init_tracing, LogFormat};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing(LogFormat::Text);

    let cli = Cli::parse();
    let (operation, request) = cli.invocation();
    let sdk_config = load_sdk_config(&cli.connection())
        .await
        .context("failed to load AWS configuration")?;
    let service = RetryingLogService::new(
        CloudWatchLogService::new(logs_client(&sdk_config)),
        RetryPolicy::with_max_attempts(cli.max_attempts),
    );

    let report = execute(operation, &request, &service, Utc::now())
        .with_context(|| format!("{} failed", operation.as_str()))?;
    let summary = report.summary();
    info!(
        operation = operation.as_str(),
        dry_run = request.dry_run,
        decisions = summary.decisions,
        applied = summary.applied,
        failed = summary.failed,
        "done"
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
