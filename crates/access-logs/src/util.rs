// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Formatting helpers for log output.

const UNIT: usize = 1024;
const PREFIXES: [char; 6] = ['K', 'M', 'G', 'T', 'P', 'E'];

/// Formats a byte count with binary prefixes, e.g. `1.5 KiB`.
///
/// # Examples
///
/// ```
/// use access_logs::util::byte_count_binary;
///
/// assert_eq!(byte_count_binary(512), "512 B");
/// assert_eq!(byte_count_binary(1536), "1.5 KiB");
/// assert_eq!(byte_count_binary(1_048_576), "1.0 MiB");
/// ```
pub fn byte_count_binary(bytes: usize) -> String {
    if bytes < UNIT {
        return format!("{bytes} B");
    }

    let mut div = UNIT;
    let mut exp = 0;
    let mut n = bytes / UNIT;
    while n >= UNIT && exp < PREFIXES.len() - 1 {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }

    #[allow(clippy::cast_precision_loss)]
    let value = bytes as f64 / div as f64;
    format!("{value:.1} {}iB", PREFIXES[exp])
}
