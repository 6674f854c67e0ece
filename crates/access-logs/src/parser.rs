// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Parsing of tab-separated access-log lines and object keys.
//!
//! Access logs start every record with a `date` and a `time` field:
//!
//! ```text
//! #Version: 1.0
//! #Fields: date time x-edge-location sc-bytes c-ip cs-method ...
//! 2014-05-23	01:13:11	FRA2	182	192.0.2.10	GET ...
//! ```
//!
//! The two leading fields become the event timestamp and everything after
//! them, tabs included, is the event message.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::constants::{COMMENT_PREFIX, FALLBACK_STREAM_NAME, FIELD_SEPARATOR};
use crate::errors::ParseError;
use crate::event::{Destination, LogEvent};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Outcome of parsing one decoded line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    /// Header line such as `#Fields:`, not an event.
    Comment,
    /// Event carrying the timestamp read from the line.
    Event(LogEvent),
    /// Event whose date or time field was unreadable; stamped with the time
    /// the line was parsed so the message is still delivered.
    Untimed(LogEvent),
}

impl ParsedLine {
    pub fn into_event(self) -> Option<LogEvent> {
        match self {
            Self::Comment => None,
            Self::Event(event) | Self::Untimed(event) => Some(event),
        }
    }
}

/// Parses an access-log line, falling back to the current time when the
/// timestamp fields cannot be read.
pub fn parse_event_line(line: &str) -> Result<ParsedLine, ParseError> {
    parse_event_line_at(line, Utc::now())
}

/// Same as [`parse_event_line`] with an explicit fallback time.
pub fn parse_event_line_at(line: &str, now: DateTime<Utc>) -> Result<ParsedLine, ParseError> {
    if line.starts_with(COMMENT_PREFIX) {
        return Ok(ParsedLine::Comment);
    }

    let mut fields = line.splitn(3, FIELD_SEPARATOR);
    let (Some(date), Some(time), Some(message)) = (fields.next(), fields.next(), fields.next())
    else {
        return Err(ParseError::Malformed);
    };

    match NaiveDateTime::parse_from_str(&format!("{date} {time}"), TIMESTAMP_FORMAT) {
        Ok(timestamp) => Ok(ParsedLine::Event(LogEvent::new(
            timestamp.and_utc().timestamp_millis(),
            message,
        ))),
        Err(_) => Ok(ParsedLine::Untimed(LogEvent::new(
            now.timestamp_millis(),
            message,
        ))),
    }
}

/// Derives the log group and stream from an object key.
///
/// The directory part of the key becomes the group, always rooted at `/`,
/// and the file name without its last extension becomes the stream:
/// `logs/2024/01/01.gz` maps to `/logs/2024/01` and `01`.
pub fn derive_destination(object_key: &str) -> Destination {
    let (directory, file_name) = object_key.rsplit_once('/').unwrap_or(("", object_key));

    let group = if directory.starts_with('/') {
        directory.to_string()
    } else {
        format!("/{directory}")
    };

    let stream = match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ if !file_name.is_empty() => file_name,
        _ => FALLBACK_STREAM_NAME,
    };

    Destination::new(group, stream)
}
