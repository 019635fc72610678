//! Environment configuration of the Lambda handlers.

use log_minder_core::contract::{validate_retention_days, RequestDefaults, DEFAULT_RETENTION_DAYS};
use log_minder_core::retry::{RetryPolicy, DEFAULT_MAX_ATTEMPTS};
use log_minder_core::streams::Emptiness;
use thiserror::Error;

pub const DEFAULT_RETENTION_ENV: &str = "DEFAULT_LOG_RETENTION_IN_DAYS";
pub const MAX_ATTEMPTS_ENV: &str = "LOG_MINDER_MAX_ATTEMPTS";
pub const FAN_OUT_THRESHOLD_ENV: &str = "LOG_MINDER_FAN_OUT_THRESHOLD";
pub const EMPTINESS_ENV: &str = "LOG_MINDER_EMPTINESS";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("{name} has invalid value {value:?}: {reason}")]
    InvalidSetting {
        name: &'static str,
        value: String,
        reason: String,
    },
    #[error("no AWS region configured; pass --region or set AWS_REGION")]
    MissingRegion,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerSettings {
    pub default_retention_days: u32,
    pub max_attempts: u32,
    /// Account-wide requests fan out when there are more groups than this.
    pub fan_out_threshold: usize,
    pub emptiness: Emptiness,
}

impl Default for HandlerSettings {
    fn default() -> Self {
        Self {
            default_retention_days: DEFAULT_RETENTION_DAYS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            fan_out_threshold: 0,
            emptiness: Emptiness::default(),
        }
    }
}

impl HandlerSettings {
    pub fn from_env() -> Result<Self, SetupError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SetupError> {
        let defaults = Self::default();

        let default_retention_days = match lookup(DEFAULT_RETENTION_ENV) {
            Some(value) => {
                let days = parse_number::<u32>(DEFAULT_RETENTION_ENV, &value)?;
                validate_retention_days(days).map_err(|error| SetupError::InvalidSetting {
                    name: DEFAULT_RETENTION_ENV,
                    value: value.clone(),
                    reason: error.to_string(),
                })?;
                days
            }
            None => defaults.default_retention_days,
        };

        let max_attempts = match lookup(MAX_ATTEMPTS_ENV) {
            Some(value) => match parse_number::<u32>(MAX_ATTEMPTS_ENV, &value)? {
                0 => {
                    return Err(SetupError::InvalidSetting {
                        name: MAX_ATTEMPTS_ENV,
                        value,
                        reason: "must be at least 1".to_string(),
                    })
                }
                attempts => attempts,
            },
            None => defaults.max_attempts,
        };

        let fan_out_threshold = match lookup(FAN_OUT_THRESHOLD_ENV) {
            Some(value) => parse_number::<usize>(FAN_OUT_THRESHOLD_ENV, &value)?,
            None => defaults.fan_out_threshold,
        };

        let emptiness = match lookup(EMPTINESS_ENV).as_deref().map(str::trim) {
            None | Some("") => defaults.emptiness,
            Some("probe") => Emptiness::Probe,
            Some("stored_bytes") | Some("stored-bytes") => Emptiness::StoredBytes,
            Some(other) => {
                return Err(SetupError::InvalidSetting {
                    name: EMPTINESS_ENV,
                    value: other.to_string(),
                    reason: "expected probe or stored_bytes".to_string(),
                })
            }
        };

        Ok(Self {
            default_retention_days,
            max_attempts,
            fan_out_threshold,
            emptiness,
        })
    }

    pub fn request_defaults(&self) -> RequestDefaults {
        RequestDefaults {
            days: self.default_retention_days,
            emptiness: self.emptiness,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::with_max_attempts(self.max_attempts)
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, SetupError>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|error| SetupError::InvalidSetting {
            name,
            value: value.to_string(),
            reason: error.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn settings(vars: &[(&str, &str)]) -> Result<HandlerSettings, SetupError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        HandlerSettings::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_without_environment() {
        assert_eq!(settings(&[]).expect("settings"), HandlerSettings::default());
    }

    #[test]
    fn reads_every_variable() {
        let parsed = settings(&[
            (DEFAULT_RETENTION_ENV, "14"),
            (MAX_ATTEMPTS_ENV, "4"),
            (FAN_OUT_THRESHOLD_ENV, "25"),
            (EMPTINESS_ENV, "stored-bytes"),
        ])
        .expect("settings");

        assert_eq!(parsed.default_retention_days, 14);
        assert_eq!(parsed.retry_policy().max_attempts, 4);
        assert_eq!(parsed.fan_out_threshold, 25);
        assert_eq!(parsed.request_defaults().emptiness, Emptiness::StoredBytes);
    }

    #[test]
    fn rejects_unsupported_default_retention() {
        let error = settings(&[(DEFAULT_RETENTION_ENV, "31")]).expect_err("should fail");
        assert!(error.to_string().starts_with(DEFAULT_RETENTION_ENV));
    }

    #[test]
    fn rejects_zero_attempts_and_garbage() {
        assert!(settings(&[(MAX_ATTEMPTS_ENV, "0")]).is_err());
        assert!(settings(&[(FAN_OUT_THRESHOLD_ENV, "many")]).is_err());
        assert!(settings(&[(EMPTINESS_ENV, "bytes")]).is_err());
    }
}
