// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! End-to-end forwarding of one log object.
//!
//! ```text
//!   gzip object ──> decode_lines ──> parse_event_line ──> BatchDispatcher ──> LogSink
//!                                        │
//!                                        └─ comments and malformed lines skipped
//! ```

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::decoder::decode_lines;
use crate::dispatcher::{BatchDispatcher, DispatcherConfig};
use crate::errors::PipelineError;
use crate::parser::{derive_destination, parse_event_line, ParsedLine};
use crate::sink::LogSink;
use crate::util::byte_count_binary;

/// What happened to the lines of one object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineSummary {
    /// Non-empty lines read from the object.
    pub lines: usize,
    /// Events handed to the dispatcher, `untimed` included.
    pub events: usize,
    pub comments: usize,
    pub malformed: usize,
    /// Events stamped with the processing time because their own timestamp
    /// could not be read.
    pub untimed: usize,
    pub flushes: usize,
    pub payload_bytes: usize,
    pub token_conflicts: usize,
}

#[derive(Clone)]
pub struct Pipeline {
    sink: Arc<dyn LogSink>,
    config: DispatcherConfig,
}

impl Pipeline {
    pub fn new(sink: Arc<dyn LogSink>, config: DispatcherConfig) -> Self {
        Self { sink, config }
    }

    /// Decodes `compressed` and appends every event to the log stream derived
    /// from `object_key`.
    pub async fn run(
        &self,
        compressed: &[u8],
        object_key: &str,
    ) -> Result<PipelineSummary, PipelineError> {
        let destination = derive_destination(object_key);
        info!(
            "Forwarding {} object {object_key} to {destination}",
            byte_count_binary(compressed.len())
        );

        let lines = decode_lines(compressed)?;

        let dispatcher =
            BatchDispatcher::new(Arc::clone(&self.sink), destination, self.config.clone());
        dispatcher.ensure_destination_exists().await?;

        let mut summary = PipelineSummary::default();
        for line in lines {
            summary.lines += 1;
            match parse_event_line(&line) {
                Ok(ParsedLine::Comment) => summary.comments += 1,
                Ok(ParsedLine::Event(event)) => {
                    dispatcher.accumulate(event).await?;
                    summary.events += 1;
                }
                Ok(ParsedLine::Untimed(event)) => {
                    debug!("Unreadable timestamp, using processing time: {line}");
                    dispatcher.accumulate(event).await?;
                    summary.events += 1;
                    summary.untimed += 1;
                }
                Err(e) => {
                    debug!("Skipping line: {e}");
                    summary.malformed += 1;
                }
            }
        }

        dispatcher.flush().await?;

        let stats = dispatcher.stats().await;
        summary.flushes = stats.flushes;
        summary.payload_bytes = stats.payload_bytes;
        summary.token_conflicts = stats.token_conflicts;

        if summary.untimed > 0 {
            warn!(
                "{} events had unreadable timestamps and were stamped with the processing time",
                summary.untimed
            );
        }
        if summary.malformed > 0 {
            warn!("Skipped {} malformed lines", summary.malformed);
        }
        info!(
            "Forwarded {} events from {} non-empty lines in {} batches ({})",
            summary.events,
            summary.lines,
            summary.flushes,
            byte_count_binary(summary.payload_bytes)
        );

        Ok(summary)
    }
}
