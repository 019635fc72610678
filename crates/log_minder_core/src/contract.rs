//! Invocation request contract shared by the CLI, the Lambda handlers and
//! fan-out payloads.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::streams::Emptiness;

pub const DEFAULT_RETENTION_DAYS: u32 = 30;

/// Retention values accepted by CloudWatch Logs.
pub const RETENTION_DAYS_VALUES: [u32; 22] = [
    1, 3, 5, 7, 14, 30, 60, 90, 120, 150, 180, 365, 400, 545, 731, 1096, 1827, 2192, 2557, 2922,
    3288, 3653,
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    field: &'static str,
    message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }

    pub fn field(&self) -> &'static str {
        self.field
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Validated parameters of one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinderRequest {
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_group_name_prefix: Option<String>,
    pub days: u32,
    #[serde(default)]
    pub overwrite: bool,
    #[serde(default)]
    pub purge_non_empty: bool,
    #[serde(default)]
    pub emptiness: Emptiness,
}

impl MinderRequest {
    pub fn new(days: u32) -> Self {
        Self {
            dry_run: false,
            log_group_name_prefix: None,
            days,
            overwrite: false,
            purge_non_empty: false,
            emptiness: Emptiness::default(),
        }
    }

    /// Validates a raw payload. Absent fields take their defaults; present
    /// fields of the wrong type are rejected with the received value.
    pub fn from_payload(
        payload: &Value,
        defaults: &RequestDefaults,
    ) -> Result<Self, ValidationError> {
        let empty = Map::new();
        let object = match payload {
            Value::Object(object) => object,
            Value::Null => &empty,
            other => {
                return Err(ValidationError::new(
                    "payload",
                    format!("request payload must be a JSON object, got {other}"),
                ))
            }
        };

        let days = match object.get("days") {
            None => defaults.days,
            Some(value) => days_field(value)?,
        };
        validate_retention_days(days)?;

        Ok(Self {
            dry_run: bool_field(object, "dry_run")?,
            log_group_name_prefix: prefix_field(object)?,
            days,
            overwrite: bool_field(object, "overwrite")?,
            purge_non_empty: bool_field(object, "purge_non_empty")?,
            emptiness: emptiness_field(object)?.unwrap_or(defaults.emptiness),
        })
    }

    /// The same request narrowed to a single log group name.
    pub fn for_log_group(&self, log_group_name: &str) -> Self {
        Self {
            log_group_name_prefix: Some(log_group_name.to_string()),
            ..self.clone()
        }
    }

    pub fn name_prefix(&self) -> Option<&str> {
        self.log_group_name_prefix.as_deref()
    }
}

/// Values used for fields a payload leaves out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestDefaults {
    pub days: u32,
    pub emptiness: Emptiness,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            days: DEFAULT_RETENTION_DAYS,
            emptiness: Emptiness::default(),
        }
    }
}

pub fn validate_retention_days(days: u32) -> Result<(), ValidationError> {
    if RETENTION_DAYS_VALUES.contains(&days) {
        Ok(())
    } else {
        Err(ValidationError::new(
            "days",
            format!("'days' must be one of {RETENTION_DAYS_VALUES:?}, got {days}"),
        ))
    }
}

fn bool_field(object: &Map<String, Value>, field: &'static str) -> Result<bool, ValidationError> {
    match object.get(field) {
        None => Ok(false),
        Some(Value::Bool(value)) => Ok(*value),
        Some(other) => Err(ValidationError::new(
            field,
            format!("'{field}' is not a boolean value, got {other}"),
        )),
    }
}

fn prefix_field(object: &Map<String, Value>) -> Result<Option<String>, ValidationError> {
    match object.get("log_group_name_prefix") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(prefix)) if prefix.is_empty() => Ok(None),
        Some(Value::String(prefix)) => Ok(Some(prefix.clone())),
        Some(other) => Err(ValidationError::new(
            "log_group_name_prefix",
            format!("'log_group_name_prefix' is not a string value, got {other}"),
        )),
    }
}

fn days_field(value: &Value) -> Result<u32, ValidationError> {
    let message = match value.as_i64() {
        Some(days) if days >= 0 => match u32::try_from(days) {
            Ok(days) => return Ok(days),
            Err(_) => format!("'days' must be one of {RETENTION_DAYS_VALUES:?}, got {value}"),
        },
        Some(_) => format!("'days' must be a positive number of days, got {value}"),
        None => format!("'days' is not an integer value, got {value}"),
    };
    Err(ValidationError::new("days", message))
}

fn emptiness_field(object: &Map<String, Value>) -> Result<Option<Emptiness>, ValidationError> {
    let value = match object.get("emptiness") {
        None | Some(Value::Null) => return Ok(None),
        Some(value) => value,
    };
    match serde_json::from_value(value.clone()) {
        Ok(emptiness) => Ok(Some(emptiness)),
        Err(_) => Err(ValidationError::new(
            "emptiness",
            format!("'emptiness' must be \"probe\" or \"stored_bytes\", got {value}"),
        )),
    }
}
