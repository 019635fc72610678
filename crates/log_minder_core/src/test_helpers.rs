//! Test doubles for the log service and the fan-out submitter.
//!
//! [`InMemoryLogService`] keeps groups and streams in memory, honors prefixes,
//! ordering and pagination the way the remote service does, records every
//! call and can be scripted to fail.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use crate::contract::MinderRequest;
use crate::fan_out::TaskSubmitter;
use crate::service::{
    GroupPageRequest, LogEvent, LogGroup, LogService, LogServiceError, LogStream, Page,
    StreamOrder, StreamPageRequest,
};

pub const MUTATING_OPERATIONS: [&str; 3] =
    ["DeleteLogStream", "DeleteLogGroup", "PutRetentionPolicy"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub operation: &'static str,
    pub log_group: Option<String>,
    pub log_stream: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedFailure {
    NotFound,
    Transient,
    Other,
}

impl ScriptedFailure {
    fn into_error(self, operation: &'static str) -> LogServiceError {
        match self {
            Self::NotFound => {
                LogServiceError::not_found(operation, "The specified resource does not exist.")
            }
            Self::Transient => LogServiceError::transient(operation, "Rate exceeded"),
            Self::Other => LogServiceError::other(operation, "AccessDeniedException"),
        }
    }
}

#[derive(Debug, Clone)]
struct StoredStream {
    stream: LogStream,
    events: Vec<LogEvent>,
}

#[derive(Debug, Default)]
struct State {
    groups: BTreeMap<String, Option<i32>>,
    streams: HashMap<String, Vec<StoredStream>>,
    calls: Vec<Call>,
    next_failures: HashMap<&'static str, (ScriptedFailure, usize)>,
    targeted_failures: HashMap<(&'static str, String), ScriptedFailure>,
}

#[derive(Debug, Default)]
pub struct InMemoryLogService {
    state: Mutex<State>,
}

impl InMemoryLogService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_group(&self, name: &str, retention_in_days: Option<i32>) {
        let mut state = self.lock();
        state.groups.insert(name.to_string(), retention_in_days);
        state.streams.entry(name.to_string()).or_default();
    }

    /// Adds a stream. Streams with a last event timestamp get `event_count`
    /// events ending at that timestamp.
    pub fn add_stream(
        &self,
        log_group_name: &str,
        log_stream_name: &str,
        creation_time: i64,
        last_event_timestamp: Option<i64>,
        event_count: usize,
    ) {
        let events = match last_event_timestamp {
            Some(last) => (0..event_count)
                .map(|index| LogEvent {
                    timestamp: last - (event_count - 1 - index) as i64,
                    message: format!("event {index}"),
                })
                .collect(),
            None => Vec::new(),
        };
        let stored = StoredStream {
            stream: LogStream {
                name: log_stream_name.to_string(),
                creation_time,
                last_event_timestamp,
                stored_bytes: events.iter().map(|event| event.message.len() as i64).sum(),
            },
            events,
        };
        self.lock()
            .streams
            .entry(log_group_name.to_string())
            .or_default()
            .push(stored);
    }

    /// Drops the events of a stream while keeping its metadata, the way the
    /// service expires events of a group with retention.
    pub fn expire_events(&self, log_group_name: &str, log_stream_name: &str) {
        let mut state = self.lock();
        let Some(streams) = state.streams.get_mut(log_group_name) else {
            return;
        };
        for stored in streams.iter_mut() {
            if stored.stream.name == log_stream_name {
                stored.events.clear();
            }
        }
    }

    /// Fails the next `times` calls of `operation`.
    pub fn fail_next(&self, operation: &'static str, failure: ScriptedFailure, times: usize) {
        let mut state = self.lock();
        state.next_failures.insert(operation, (failure, times));
    }

    /// Fails every call of `operation` that targets `resource` (a stream name,
    /// or a group name for group-level operations).
    pub fn fail_on(&self, operation: &'static str, resource: &str, failure: ScriptedFailure) {
        self.lock()
            .targeted_failures
            .insert((operation, resource.to_string()), failure);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn calls_to(&self, operation: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.operation == operation)
            .count()
    }

    pub fn mutating_calls(&self) -> Vec<Call> {
        self.lock()
            .calls
            .iter()
            .filter(|call| MUTATING_OPERATIONS.contains(&call.operation))
            .cloned()
            .collect()
    }

    /// Streams that were probed or targeted for deletion.
    pub fn evaluated_streams(&self) -> Vec<String> {
        let mut names = Vec::new();
        for call in self.lock().calls.iter() {
            if matches!(call.operation, "GetLogEvents" | "DeleteLogStream") {
                if let Some(stream) = &call.log_stream {
                    if !names.contains(stream) {
                        names.push(stream.clone());
                    }
                }
            }
        }
        names
    }

    pub fn group_names(&self) -> Vec<String> {
        self.lock().groups.keys().cloned().collect()
    }

    pub fn stream_names(&self, log_group_name: &str) -> Vec<String> {
        self.lock()
            .streams
            .get(log_group_name)
            .map(|streams| streams.iter().map(|s| s.stream.name.clone()).collect())
            .unwrap_or_default()
    }

    pub fn retention_of(&self, log_group_name: &str) -> Option<i32> {
        self.lock().groups.get(log_group_name).copied().flatten()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("poisoned mutex")
    }

    fn begin(
        &self,
        operation: &'static str,
        log_group: Option<&str>,
        log_stream: Option<&str>,
    ) -> Result<std::sync::MutexGuard<'_, State>, LogServiceError> {
        let mut state = self.lock();
        state.calls.push(Call {
            operation,
            log_group: log_group.map(str::to_string),
            log_stream: log_stream.map(str::to_string),
        });

        if let Some((failure, remaining)) = state.next_failures.get_mut(operation) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(failure.into_error(operation));
            }
        }

        let resource = log_stream.or(log_group).unwrap_or_default();
        if let Some(failure) = state
            .targeted_failures
            .get(&(operation, resource.to_string()))
        {
            return Err(failure.into_error(operation));
        }
        Ok(state)
    }
}

fn paginate<T: Clone>(items: &[T], limit: i32, next_token: Option<&str>) -> Page<T> {
    let start = next_token
        .and_then(|token| token.parse::<usize>().ok())
        .unwrap_or(0)
        .min(items.len());
    let limit = usize::try_from(limit).unwrap_or(1).max(1);
    let end = (start + limit).min(items.len());
    Page {
        items: items[start..end].to_vec(),
        next_token: (end < items.len()).then(|| end.to_string()),
    }
}

fn not_found(operation: &'static str) -> LogServiceError {
    ScriptedFailure::NotFound.into_error(operation)
}

impl LogService for InMemoryLogService {
    fn describe_log_groups(
        &self,
        request: &GroupPageRequest<'_>,
    ) -> Result<Page<LogGroup>, LogServiceError> {
        let state = self.begin("DescribeLogGroups", request.name_prefix, None)?;
        let groups: Vec<LogGroup> = state
            .groups
            .iter()
            .filter(|(name, _)| request.name_prefix.is_none_or(|p| name.starts_with(p)))
            .map(|(name, retention_in_days)| LogGroup {
                name: name.clone(),
                retention_in_days: *retention_in_days,
            })
            .collect();
        Ok(paginate(&groups, request.limit, request.next_token))
    }

    fn describe_log_streams(
        &self,
        request: &StreamPageRequest<'_>,
    ) -> Result<Page<LogStream>, LogServiceError> {
        let operation = "DescribeLogStreams";
        let state = self.begin(operation, Some(request.log_group_name), None)?;
        if !state.groups.contains_key(request.log_group_name) {
            return Err(not_found(operation));
        }

        let mut streams: Vec<LogStream> = state
            .streams
            .get(request.log_group_name)
            .map(|streams| streams.iter().map(|s| s.stream.clone()).collect())
            .unwrap_or_default();
        match request.order_by {
            StreamOrder::LogStreamName => streams.sort_by(|a, b| a.name.cmp(&b.name)),
            // Streams that never received an event sort first.
            StreamOrder::LastEventTime => streams.sort_by_key(|stream| {
                (
                    stream.last_event_timestamp.unwrap_or(i64::MIN),
                    stream.creation_time,
                )
            }),
        }
        if request.descending {
            streams.reverse();
        }
        Ok(paginate(&streams, request.limit, request.next_token))
    }

    fn recent_events(
        &self,
        log_group_name: &str,
        log_stream_name: &str,
        limit: i32,
    ) -> Result<Vec<LogEvent>, LogServiceError> {
        let operation = "GetLogEvents";
        let state = self.begin(operation, Some(log_group_name), Some(log_stream_name))?;
        let stored = state
            .streams
            .get(log_group_name)
            .and_then(|streams| streams.iter().find(|s| s.stream.name == log_stream_name))
            .ok_or_else(|| not_found(operation))?;
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(stored.events.iter().rev().take(limit).cloned().collect())
    }

    fn delete_log_stream(
        &self,
        log_group_name: &str,
        log_stream_name: &str,
    ) -> Result<(), LogServiceError> {
        let operation = "DeleteLogStream";
        let mut state = self.begin(operation, Some(log_group_name), Some(log_stream_name))?;
        let streams = state
            .streams
            .get_mut(log_group_name)
            .ok_or_else(|| not_found(operation))?;
        let before = streams.len();
        streams.retain(|s| s.stream.name != log_stream_name);
        if streams.len() == before {
            return Err(not_found(operation));
        }
        Ok(())
    }

    fn delete_log_group(&self, log_group_name: &str) -> Result<(), LogServiceError> {
        let operation = "DeleteLogGroup";
        let mut state = self.begin(operation, Some(log_group_name), None)?;
        if state.groups.remove(log_group_name).is_none() {
            return Err(not_found(operation));
        }
        state.streams.remove(log_group_name);
        Ok(())
    }

    fn put_retention_policy(
        &self,
        log_group_name: &str,
        retention_in_days: i32,
    ) -> Result<(), LogServiceError> {
        let operation = "PutRetentionPolicy";
        let mut state = self.begin(operation, Some(log_group_name), None)?;
        match state.groups.get_mut(log_group_name) {
            Some(retention) => {
                *retention = Some(retention_in_days);
                Ok(())
            }
            None => Err(not_found(operation)),
        }
    }
}

/// Records submitted payloads without running them.
#[derive(Debug, Default)]
pub struct RecordingSubmitter {
    submissions: Mutex<Vec<(String, Vec<u8>)>>,
}

impl RecordingSubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn targets(&self) -> Vec<String> {
        self.submissions
            .lock()
            .expect("poisoned mutex")
            .iter()
            .map(|(target, _)| target.clone())
            .collect()
    }

    pub fn requests(&self) -> Vec<MinderRequest> {
        self.submissions
            .lock()
            .expect("poisoned mutex")
            .iter()
            .map(|(_, payload)| serde_json::from_slice(payload).expect("payload should parse"))
            .collect()
    }
}

impl TaskSubmitter for RecordingSubmitter {
    fn submit(&self, target: &str, payload: &[u8]) -> Result<(), String> {
        self.submissions
            .lock()
            .expect("poisoned mutex")
            .push((target.to_string(), payload.to_vec()));
        Ok(())
    }
}

/// Runs every submitted request synchronously, in submission order.
pub struct InProcessSubmitter<F> {
    run: F,
}

impl<F: Fn(MinderRequest)> InProcessSubmitter<F> {
    pub fn new(run: F) -> Self {
        Self { run }
    }
}

impl<F: Fn(MinderRequest)> TaskSubmitter for InProcessSubmitter<F> {
    fn submit(&self, _target: &str, payload: &[u8]) -> Result<(), String> {
        let request = serde_json::from_slice(payload).map_err(|err| err.to_string())?;
        (self.run)(request);
        Ok(())
    }
}
