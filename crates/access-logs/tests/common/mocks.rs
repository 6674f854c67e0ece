// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Mock log sinks for testing

use access_logs::errors::SinkError;
use access_logs::event::{Destination, LogEvent};
use access_logs::sink::{AppendRequest, LogSink};
use std::collections::VecDeque;
use std::sync::Mutex;

/// An append call as seen by the sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPut {
    pub destination: Destination,
    pub events: Vec<LogEvent>,
    pub sequence_token: Option<String>,
}

/// Mock sink that records every call and replays scripted outcomes.
///
/// Appends without a scripted outcome succeed and return `token-<n>`.
#[derive(Default)]
pub struct RecordingSink {
    pub group_result: Option<SinkError>,
    pub stream_result: Option<SinkError>,
    pub put_results: Mutex<VecDeque<Result<Option<String>, SinkError>>>,
    pub groups: Mutex<Vec<String>>,
    pub streams: Mutex<Vec<(String, String)>>,
    pub puts: Mutex<Vec<RecordedPut>>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_put_results(results: Vec<Result<Option<String>, SinkError>>) -> Self {
        Self {
            put_results: Mutex::new(results.into()),
            ..Default::default()
        }
    }

    pub fn groups(&self) -> Vec<String> {
        self.groups.lock().expect("lock poisoned").clone()
    }

    pub fn streams(&self) -> Vec<(String, String)> {
        self.streams.lock().expect("lock poisoned").clone()
    }

    pub fn puts(&self) -> Vec<RecordedPut> {
        self.puts.lock().expect("lock poisoned").clone()
    }

    /// Events of every append, in call order
    pub fn appended_events(&self) -> Vec<LogEvent> {
        self.puts()
            .into_iter()
            .flat_map(|put| put.events)
            .collect()
    }
}

#[async_trait::async_trait]
impl LogSink for RecordingSink {
    async fn create_log_group(&self, group: &str) -> Result<(), SinkError> {
        self.groups
            .lock()
            .expect("lock poisoned")
            .push(group.to_string());
        self.group_result.clone().map_or(Ok(()), Err)
    }

    async fn create_log_stream(&self, group: &str, stream: &str) -> Result<(), SinkError> {
        self.streams
            .lock()
            .expect("lock poisoned")
            .push((group.to_string(), stream.to_string()));
        self.stream_result.clone().map_or(Ok(()), Err)
    }

    async fn put_log_events(
        &self,
        request: AppendRequest<'_>,
    ) -> Result<Option<String>, SinkError> {
        let mut puts = self.puts.lock().expect("lock poisoned");
        puts.push(RecordedPut {
            destination: request.destination.clone(),
            events: request.events.to_vec(),
            sequence_token: request.sequence_token.map(str::to_string),
        });
        let call = puts.len();
        self.put_results
            .lock()
            .expect("lock poisoned")
            .pop_front()
            .unwrap_or_else(|| Ok(Some(format!("token-{call}"))))
    }
}
