// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Helper functions for integration tests

use chrono::{NaiveDate, NaiveTime};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;

pub const FIELDS_HEADER: &str = "#Version: 1.0\n#Fields: date time x-edge-location sc-bytes c-ip cs-method cs(Host) cs-uri-stem sc-status\n";

/// Gzip-compress a log body
pub fn gzip(body: &str) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(body.as_bytes())
        .expect("Failed to write gzip body");
    encoder.finish().expect("Failed to finish gzip stream")
}

/// Build a tab-separated access-log line
pub fn access_log_line(date: &str, time: &str, path: &str) -> String {
    format!("{date}\t{time}\tFRA2\t182\t192.0.2.10\tGET\td111111abcdef8.cloudfront.net\t{path}\t200\n")
}

/// Epoch milliseconds of a UTC date and time
pub fn millis(date: &str, time: &str) -> i64 {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("Failed to parse test date");
    let time = NaiveTime::parse_from_str(time, "%H:%M:%S").expect("Failed to parse test time");
    date.and_time(time).and_utc().timestamp_millis()
}
