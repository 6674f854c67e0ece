// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Error types for each stage of the forwarding pipeline.

/// Failure to open a compressed log object.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("input is not gzip compressed")]
    NotGzip,

    #[error("unable to read gzip header: {0}")]
    Header(#[source] std::io::Error),
}

/// Failure to turn a decoded line into a log event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("malformed line: expected date, time and message fields")]
    Malformed,
}

/// Errors reported by a [`crate::sink::LogSink`].
///
/// The variants the dispatcher reacts to are kept distinct; everything else is
/// collapsed into `Service` or `Transport`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    #[error("resource already exists")]
    AlreadyExists,

    #[error("invalid sequence token, expected {expected:?}")]
    InvalidSequenceToken { expected: Option<String> },

    #[error("data already accepted, expected sequence token {expected:?}")]
    DataAlreadyAccepted { expected: Option<String> },

    #[error("service error {code}: {message}")]
    Service { code: String, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid log event: {0}")]
    InvalidEvent(String),
}

impl SinkError {
    /// Returns the token the sink expects next if this error is a sequencing
    /// conflict, `None` otherwise.
    ///
    /// The outer option tells whether the error is a conflict at all; the inner
    /// one is the token itself, which the sink omits for a fresh stream.
    pub fn conflict_token(&self) -> Option<Option<&str>> {
        match self {
            Self::InvalidSequenceToken { expected } | Self::DataAlreadyAccepted { expected } => {
                Some(expected.as_deref())
            }
            _ => None,
        }
    }
}

/// Fatal errors that abort a pipeline run, tagged with the phase that failed.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("failed to decode log object: {0}")]
    Decode(#[from] DecodeError),

    #[error("failed to create log group {group}: {source}")]
    CreateGroup {
        group: String,
        #[source]
        source: SinkError,
    },

    #[error("failed to create log stream {group}:{stream}: {source}")]
    CreateStream {
        group: String,
        stream: String,
        #[source]
        source: SinkError,
    },

    #[error("failed to push {events} log events: {source}")]
    Append {
        events: usize,
        #[source]
        source: SinkError,
    },

    #[error("gave up pushing {events} log events after {attempts} sequence token conflicts")]
    AppendRetriesExhausted { events: usize, attempts: u32 },
}

/// Errors raised while loading [`crate::config::ForwarderConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{name} must be a positive integer, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_token_for_invalid_sequence_token() {
        let error = SinkError::InvalidSequenceToken {
            expected: Some("T2".to_string()),
        };
        assert_eq!(error.conflict_token(), Some(Some("T2")));
    }

    #[test]
    fn test_conflict_token_for_data_already_accepted_without_token() {
        let error = SinkError::DataAlreadyAccepted { expected: None };
        assert_eq!(error.conflict_token(), Some(None));
    }

    #[test]
    fn test_conflict_token_for_other_errors() {
        assert_eq!(SinkError::AlreadyExists.conflict_token(), None);
        assert_eq!(
            SinkError::Transport("connection reset".into()).conflict_token(),
            None
        );
    }

    #[test]
    fn test_pipeline_error_display_names_phase() {
        let error = PipelineError::CreateStream {
            group: "/logs".to_string(),
            stream: "01".to_string(),
            source: SinkError::Service {
                code: "AccessDeniedException".to_string(),
                message: "denied".to_string(),
            },
        };
        assert_eq!(
            error.to_string(),
            "failed to create log stream /logs:01: service error AccessDeniedException: denied"
        );
    }

    #[test]
    fn test_config_error_display() {
        let error = ConfigError::InvalidNumber {
            name: "FORWARDER_BATCH_SIZE",
            value: "ten".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "FORWARDER_BATCH_SIZE must be a positive integer, got 'ten'"
        );
    }

    #[test]
    fn test_decode_error_converts_into_pipeline_error() {
        let error: PipelineError = DecodeError::NotGzip.into();
        assert!(matches!(error, PipelineError::Decode(DecodeError::NotGzip)));
    }
}
