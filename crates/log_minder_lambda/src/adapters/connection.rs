use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_cloudwatchlogs::config::retry::RetryConfig;

use crate::settings::SetupError;

/// Connection target and credentials for the AWS clients. Unset fields fall
/// back to the default provider chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionOptions {
    pub region: Option<String>,
    pub profile: Option<String>,
}

pub async fn load_sdk_config(options: &ConnectionOptions) -> Result<SdkConfig, SetupError> {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = &options.region {
        loader = loader.region(Region::new(region.clone()));
    }
    if let Some(profile) = &options.profile {
        loader = loader.profile_name(profile);
    }

    let config = loader.load().await;
    if config.region().is_none() {
        return Err(SetupError::MissingRegion);
    }
    Ok(config)
}

/// CloudWatch Logs client without SDK-level retries; throttling is retried
/// by `RetryingLogService` instead.
pub fn logs_client(config: &SdkConfig) -> aws_sdk_cloudwatchlogs::Client {
    let logs_config = aws_sdk_cloudwatchlogs::config::Builder::from(config)
        .retry_config(RetryConfig::disabled())
        .build();
    aws_sdk_cloudwatchlogs::Client::from_conf(logs_config)
}

pub fn lambda_client(config: &SdkConfig) -> aws_sdk_lambda::Client {
    aws_sdk_lambda::Client::new(config)
}
