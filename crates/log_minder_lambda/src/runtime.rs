use chrono::Utc;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use log_minder_core::retry::RetryingLogService;
use serde_json::Value;

use crate::adapters::cloudwatch::CloudWatchLogService;
use crate::adapters::connection::{lambda_client, load_sdk_config, logs_client, ConnectionOptions};
use crate::adapters::invoke::LambdaTaskSubmitter;
use crate::handlers::{handle_event, FanOutTarget, Operation};
use crate::settings::HandlerSettings;
use crate::telemetry::{init_tracing, LogFormat};

/// Serves `operation` from the Lambda runtime until the process is stopped.
///
/// Clients and settings are built once per container. Fan-out invocations
/// target the function that received the event.
pub async fn serve(operation: Operation) -> Result<(), Error> {
    init_tracing(LogFormat::Json);

    let settings = HandlerSettings::from_env()?;
    let sdk_config = load_sdk_config(&ConnectionOptions::default()).await?;
    let service = RetryingLogService::new(
        CloudWatchLogService::new(logs_client(&sdk_config)),
        settings.retry_policy(),
    );
    let submitter = LambdaTaskSubmitter::new(lambda_client(&sdk_config));

    let settings = &settings;
    let service = &service;
    let submitter = &submitter;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        let target = FanOutTarget {
            submitter,
            function: &event.context.invoked_function_arn,
        };
        handle_event(
            operation,
            &event.payload,
            settings,
            service,
            Some(target),
            Utc::now(),
        )
        .map_err(Error::from)
    }))
    .await
}
