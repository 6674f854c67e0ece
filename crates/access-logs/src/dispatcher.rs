// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Batching of log events into ordered appends against a single destination.
//!
//! The dispatcher owns one batch per run. Events are accumulated until the
//! batch reaches the configured event count or the next event would push the
//! estimated payload over the sink's byte ceiling; the batch is then sorted by
//! timestamp and appended in one call.
//!
//! The sink serialises appends per stream with a sequence token. The token
//! returned by each successful append is echoed on the next one. When the sink
//! rejects a token it reports the one it expected; the dispatcher adopts it and
//! resends the same batch, up to `max_append_attempts` sends in total.
//!
//! All state lives behind a single async mutex held for the whole of an
//! accumulate or flush, sink calls included, so appends never overlap.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::constants::{
    EVENT_OVERHEAD_BYTES, MAX_APPEND_ATTEMPTS, MAX_BATCH_EVENTS, MAX_PAYLOAD_BYTES,
};
use crate::errors::{PipelineError, SinkError};
use crate::event::{Destination, LogEvent};
use crate::sink::{AppendRequest, LogSink};
use crate::util::byte_count_binary;

/// Batching limits and retry ceiling of a [`BatchDispatcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Maximum number of events per append.
    pub batch_size: usize,
    /// Payload estimate above which a batch is flushed before growing.
    pub max_payload_bytes: usize,
    /// Bytes added per event when estimating the payload.
    pub event_overhead_bytes: usize,
    /// Total sends of one batch before sequence token conflicts are fatal.
    pub max_append_attempts: u32,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            batch_size: MAX_BATCH_EVENTS,
            max_payload_bytes: MAX_PAYLOAD_BYTES,
            event_overhead_bytes: EVENT_OVERHEAD_BYTES,
            max_append_attempts: MAX_APPEND_ATTEMPTS,
        }
    }
}

/// Counters over the appends made by a dispatcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub flushes: usize,
    pub events: usize,
    pub payload_bytes: usize,
    pub token_conflicts: usize,
}

#[derive(Debug, Default)]
struct BatchState {
    events: Vec<LogEvent>,
    /// Sum of message lengths in `events`.
    message_bytes: usize,
    sequence_token: Option<String>,
    destination_ready: bool,
    stats: DispatchStats,
}

impl BatchState {
    fn payload_size(&self, event_overhead_bytes: usize) -> usize {
        self.message_bytes + event_overhead_bytes * (self.events.len() + 1)
    }

    fn push(&mut self, event: LogEvent) {
        self.message_bytes += event.message_len();
        self.events.push(event);
    }

    fn clear(&mut self) {
        self.events.clear();
        self.message_bytes = 0;
    }
}

/// Accumulates events for one destination and appends them in order.
#[allow(clippy::module_name_repetitions)]
pub struct BatchDispatcher {
    sink: Arc<dyn LogSink>,
    destination: Destination,
    config: DispatcherConfig,
    state: Mutex<BatchState>,
}

impl BatchDispatcher {
    pub fn new(sink: Arc<dyn LogSink>, destination: Destination, config: DispatcherConfig) -> Self {
        Self {
            sink,
            destination,
            config,
            state: Mutex::new(BatchState::default()),
        }
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    /// Creates the log group and stream unless already done in this run.
    ///
    /// Resources that already exist are not an error.
    pub async fn ensure_destination_exists(&self) -> Result<(), PipelineError> {
        let mut state = self.state.lock().await;
        self.create_destination(&mut state).await
    }

    /// Adds an event to the batch, flushing first if it is full.
    pub async fn accumulate(&self, event: LogEvent) -> Result<(), PipelineError> {
        let mut state = self.state.lock().await;
        if self.needs_flush_before(&state, &event) {
            self.flush_state(&mut state).await?;
        }
        state.push(event);
        Ok(())
    }

    /// Appends every pending event. Does nothing when the batch is empty.
    ///
    /// On error the batch is left untouched so the flush can be retried.
    pub async fn flush(&self) -> Result<(), PipelineError> {
        let mut state = self.state.lock().await;
        self.flush_state(&mut state).await
    }

    /// Number of events waiting for the next flush.
    pub async fn pending(&self) -> usize {
        self.state.lock().await.events.len()
    }

    pub async fn sequence_token(&self) -> Option<String> {
        self.state.lock().await.sequence_token.clone()
    }

    pub async fn stats(&self) -> DispatchStats {
        self.state.lock().await.stats
    }

    fn needs_flush_before(&self, state: &BatchState, event: &LogEvent) -> bool {
        if state.events.is_empty() {
            return false;
        }
        if state.events.len() >= self.config.batch_size {
            return true;
        }
        let overhead = self.config.event_overhead_bytes;
        state.payload_size(overhead) + event.message_len() + overhead
            > self.config.max_payload_bytes
    }

    async fn create_destination(&self, state: &mut BatchState) -> Result<(), PipelineError> {
        if state.destination_ready {
            return Ok(());
        }

        let Destination { group, stream } = &self.destination;

        match self.sink.create_log_group(group).await {
            Ok(()) => info!("Created log group {group}"),
            Err(SinkError::AlreadyExists) => debug!("Log group {group} already exists"),
            Err(source) => {
                return Err(PipelineError::CreateGroup {
                    group: group.clone(),
                    source,
                })
            }
        }

        match self.sink.create_log_stream(group, stream).await {
            Ok(()) => info!("Created log stream {stream} in {group}"),
            Err(SinkError::AlreadyExists) => debug!("Log stream {stream} already exists in {group}"),
            Err(source) => {
                return Err(PipelineError::CreateStream {
                    group: group.clone(),
                    stream: stream.clone(),
                    source,
                })
            }
        }

        state.destination_ready = true;
        Ok(())
    }

    async fn flush_state(&self, state: &mut BatchState) -> Result<(), PipelineError> {
        if state.events.is_empty() {
            return Ok(());
        }

        self.create_destination(state).await?;

        let count = state.events.len();
        let payload_bytes = state.payload_size(self.config.event_overhead_bytes);
        debug!(
            "Pushing {count} log events with payload of {} to {}",
            byte_count_binary(payload_bytes),
            self.destination
        );

        // Stable, so events sharing a timestamp keep their line order.
        state.events.sort_by_key(|event| event.timestamp);

        let mut attempts = 0;
        loop {
            attempts += 1;
            let request = AppendRequest {
                destination: &self.destination,
                events: &state.events,
                sequence_token: state.sequence_token.as_deref(),
            };

            let source = match self.sink.put_log_events(request).await {
                Ok(next_token) => {
                    state.sequence_token = next_token;
                    break;
                }
                Err(source) => source,
            };

            let expected = source
                .conflict_token()
                .map(|token| token.map(str::to_string));
            let Some(expected) = expected else {
                return Err(PipelineError::Append {
                    events: count,
                    source,
                });
            };

            state.stats.token_conflicts += 1;
            if attempts >= self.config.max_append_attempts {
                return Err(PipelineError::AppendRetriesExhausted {
                    events: count,
                    attempts,
                });
            }

            debug!(
                "Sequence token rejected for {} ({source}), retrying",
                self.destination
            );
            state.sequence_token = expected;
        }

        state.stats.flushes += 1;
        state.stats.events += count;
        state.stats.payload_bytes += payload_bytes;
        state.clear();
        Ok(())
    }
}
