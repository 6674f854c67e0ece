// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Streaming gzip decoding of log objects into text lines.
//!
//! The object is decompressed on demand while lines are pulled, so memory use
//! stays bounded by the longest line rather than the decompressed size. Only
//! the gzip header is validated up front: an object that is not gzip at all
//! aborts the run, while corruption further in simply ends the line sequence
//! and whatever was readable up to that point is kept.
//!
//! Members are inflated with [`flate2::Decompress`] directly so that output
//! produced right before a corrupt block still reaches the caller.

use std::io::{self, BufRead, BufReader, Read};

use flate2::{Crc, Decompress, FlushDecompress, Status};
use tracing::warn;

use crate::errors::DecodeError;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const GZIP_HEADER_LEN: usize = 10;
const GZIP_TRAILER_LEN: usize = 8;
const DEFLATE_METHOD: u8 = 8;

const FLAG_HCRC: u8 = 0x02;
const FLAG_EXTRA: u8 = 0x04;
const FLAG_NAME: u8 = 0x08;
const FLAG_COMMENT: u8 = 0x10;

/// Forward-only iterator over the non-empty lines of a gzip buffer.
pub struct Lines<'a> {
    reader: BufReader<GzipMembers<'a>>,
    buf: Vec<u8>,
    line_number: usize,
    done: bool,
}

/// Opens `compressed` for line-by-line reading.
///
/// Fails if the buffer does not start with a complete gzip header. Nothing
/// past the header is inspected here.
pub fn decode_lines(compressed: &[u8]) -> Result<Lines<'_>, DecodeError> {
    if !compressed.starts_with(&GZIP_MAGIC) {
        return Err(DecodeError::NotGzip);
    }

    let header_len = gzip_header_len(compressed).map_err(DecodeError::Header)?;

    Ok(Lines {
        reader: BufReader::new(GzipMembers::new(&compressed[header_len..])),
        buf: Vec::new(),
        line_number: 0,
        done: false,
    })
}

impl Lines<'_> {
    /// Number of physical lines consumed so far, empty ones included.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    fn take_line(&mut self) -> Option<String> {
        let line = trim_line_ending(&self.buf);
        if line.is_empty() {
            return None;
        }
        Some(String::from_utf8_lossy(line).into_owned())
    }
}

impl Iterator for Lines<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        while !self.done {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => self.done = true,
                Ok(_) => {
                    self.line_number += 1;
                    if let Some(line) = self.take_line() {
                        return Some(line);
                    }
                }
                Err(e) => {
                    self.done = true;
                    // The bytes read before the failure form a final, unterminated line.
                    if !self.buf.is_empty() {
                        self.line_number += 1;
                    }
                    warn!(
                        "Stopped reading log object after {} lines: {}",
                        self.line_number, e
                    );
                    return self.take_line();
                }
            }
        }
        None
    }
}

/// Decompressed content of the gzip members following the first header.
struct GzipMembers<'a> {
    input: &'a [u8],
    inflate: Decompress,
    crc: Crc,
    member_done: bool,
    finished: bool,
    pending_error: Option<io::Error>,
}

impl<'a> GzipMembers<'a> {
    fn new(body: &'a [u8]) -> Self {
        Self {
            input: body,
            inflate: Decompress::new(false),
            crc: Crc::new(),
            member_done: false,
            finished: false,
            pending_error: None,
        }
    }

    /// Checks the trailer of the member just inflated and moves on to the
    /// next member, if any.
    fn next_member(&mut self) -> io::Result<()> {
        if self.input.len() < GZIP_TRAILER_LEN {
            return Err(truncated("gzip trailer"));
        }
        let (trailer, rest) = self.input.split_at(GZIP_TRAILER_LEN);
        let crc = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
        let size = u32::from_le_bytes([trailer[4], trailer[5], trailer[6], trailer[7]]);
        if crc != self.crc.sum() || size != self.crc.amount() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "gzip member checksum mismatch",
            ));
        }

        self.input = rest;
        if self.input.is_empty() {
            self.finished = true;
            return Ok(());
        }

        let header_len = gzip_header_len(self.input)?;
        self.input = &self.input[header_len..];
        self.inflate.reset(false);
        self.crc.reset();
        self.member_done = false;
        Ok(())
    }
}

impl Read for GzipMembers<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if let Some(e) = self.pending_error.take() {
            return Err(e);
        }
        if buf.is_empty() {
            return Ok(0);
        }

        loop {
            if self.member_done {
                self.next_member()?;
            }
            if self.finished {
                return Ok(0);
            }

            let before_in = self.inflate.total_in();
            let before_out = self.inflate.total_out();
            let status = self
                .inflate
                .decompress(self.input, buf, FlushDecompress::None);
            let consumed = (self.inflate.total_in() - before_in) as usize;
            let written = (self.inflate.total_out() - before_out) as usize;

            self.input = &self.input[consumed..];
            self.crc.update(&buf[..written]);

            match status {
                Ok(Status::StreamEnd) => {
                    self.member_done = true;
                    if written > 0 {
                        return Ok(written);
                    }
                }
                Ok(_) if written > 0 => return Ok(written),
                Ok(_) if consumed == 0 => return Err(truncated("deflate stream")),
                Ok(_) => {}
                Err(e) => {
                    let e = io::Error::new(io::ErrorKind::InvalidData, e);
                    if written == 0 {
                        return Err(e);
                    }
                    // Hand out what was inflated before the corruption first.
                    self.pending_error = Some(e);
                    return Ok(written);
                }
            }
        }
    }
}

/// Length of the gzip member header at the start of `data`.
fn gzip_header_len(data: &[u8]) -> io::Result<usize> {
    if !data.starts_with(&GZIP_MAGIC) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "missing gzip magic bytes",
        ));
    }
    let fixed = data
        .get(..GZIP_HEADER_LEN)
        .ok_or_else(|| truncated("gzip header"))?;
    if fixed[2] != DEFLATE_METHOD {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("unsupported gzip compression method {}", fixed[2]),
        ));
    }

    let flags = fixed[3];
    let mut len = GZIP_HEADER_LEN;
    if flags & FLAG_EXTRA != 0 {
        let extra_len = data
            .get(len..len + 2)
            .ok_or_else(|| truncated("gzip header"))?;
        len += 2 + usize::from(u16::from_le_bytes([extra_len[0], extra_len[1]]));
    }
    if flags & FLAG_NAME != 0 {
        len = skip_zero_terminated(data, len)?;
    }
    if flags & FLAG_COMMENT != 0 {
        len = skip_zero_terminated(data, len)?;
    }
    if flags & FLAG_HCRC != 0 {
        len += 2;
    }

    if len > data.len() {
        return Err(truncated("gzip header"));
    }
    Ok(len)
}

fn skip_zero_terminated(data: &[u8], start: usize) -> io::Result<usize> {
    data.get(start..)
        .and_then(|rest| rest.iter().position(|&b| b == 0))
        .map(|end| start + end + 1)
        .ok_or_else(|| truncated("gzip header"))
}

fn truncated(what: &str) -> io::Error {
    io::Error::new(io::ErrorKind::UnexpectedEof, format!("truncated {what}"))
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
