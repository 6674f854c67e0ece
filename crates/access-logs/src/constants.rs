// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Limits of the CloudWatch Logs `PutLogEvents` API and pipeline defaults.

/// Bytes CloudWatch Logs charges per event on top of the UTF-8 message.
pub const EVENT_OVERHEAD_BYTES: usize = 26;

/// Maximum number of events accepted by a single `PutLogEvents` call.
pub const MAX_BATCH_EVENTS: usize = 10_000;

/// Maximum payload size of a single `PutLogEvents` call, overhead included.
pub const MAX_PAYLOAD_BYTES: usize = 1_048_576;

/// Number of times a batch is sent before sequence token conflicts are
/// treated as fatal.
pub const MAX_APPEND_ATTEMPTS: u32 = 5;

/// Lines starting with this marker are headers (`#Version`, `#Fields`).
pub const COMMENT_PREFIX: char = '#';

/// Field separator of access-log lines.
pub const FIELD_SEPARATOR: char = '\t';

/// Stream name used when the object key has no usable file name.
pub const FALLBACK_STREAM_NAME: &str = "default";
