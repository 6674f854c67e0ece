// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;

use crate::errors::SinkError;
use crate::event::{Destination, LogEvent};

/// A single append call: events in the order they must be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendRequest<'a> {
    pub destination: &'a Destination,
    pub events: &'a [LogEvent],
    pub sequence_token: Option<&'a str>,
}

/// Remote log store that accepts ordered appends to a group/stream pair.
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Creates a log group. Returns [`SinkError::AlreadyExists`] if it exists.
    async fn create_log_group(&self, group: &str) -> Result<(), SinkError>;

    /// Creates a log stream in `group`. Returns [`SinkError::AlreadyExists`]
    /// if it exists.
    async fn create_log_stream(&self, group: &str, stream: &str) -> Result<(), SinkError>;

    /// Appends events and returns the sequence token for the next append.
    async fn put_log_events(
        &self,
        request: AppendRequest<'_>,
    ) -> Result<Option<String>, SinkError>;
}
