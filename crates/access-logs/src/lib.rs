// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Forwards gzip-compressed, tab-separated access logs to CloudWatch Logs.
//!
//! A run decodes one log object line by line, parses each line into a
//! timestamped event and appends the events, sorted and batched, to the log
//! group and stream named after the object key.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod cloudwatch;
pub mod config;
pub mod constants;
pub mod decoder;
pub mod dispatcher;
pub mod errors;
pub mod event;
pub mod parser;
pub mod pipeline;
pub mod sink;
pub mod util;
