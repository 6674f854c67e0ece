// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! [`LogSink`] backed by Amazon CloudWatch Logs.

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_cloudwatchlogs::config::timeout::TimeoutConfig;
use aws_sdk_cloudwatchlogs::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_cloudwatchlogs::operation::put_log_events::PutLogEventsError;
use aws_sdk_cloudwatchlogs::types::{InputLogEvent, RejectedLogEventsInfo};
use aws_sdk_cloudwatchlogs::Client;
use tracing::{debug, warn};

use crate::config::ForwarderConfig;
use crate::errors::SinkError;
use crate::event::LogEvent;
use crate::sink::{AppendRequest, LogSink};

#[derive(Clone, Debug)]
pub struct CloudWatchLogsSink {
    client: Client,
}

impl CloudWatchLogsSink {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a client from the SDK provider chain, applying the region,
    /// endpoint and timeout overrides of `config`.
    pub async fn from_config(config: &ForwarderConfig) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());

        if let Some(region) = &config.aws_region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }

        if let Some(endpoint) = &config.logs_endpoint_url {
            debug!("Using CloudWatch Logs endpoint {endpoint}");
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;

        let logs_config = aws_sdk_cloudwatchlogs::config::Builder::from(&sdk_config)
            .timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(Duration::from_secs(config.timeout_secs))
                    .build(),
            )
            .build();

        Self::new(Client::from_conf(logs_config))
    }
}

#[async_trait]
impl LogSink for CloudWatchLogsSink {
    async fn create_log_group(&self, group: &str) -> Result<(), SinkError> {
        match self.client.create_log_group().log_group_name(group).send().await {
            Ok(_) => Ok(()),
            Err(e) => Err(classify_sdk_error(e, |err| {
                if err.is_resource_already_exists_exception() {
                    SinkError::AlreadyExists
                } else {
                    service_error(err)
                }
            })),
        }
    }

    async fn create_log_stream(&self, group: &str, stream: &str) -> Result<(), SinkError> {
        match self
            .client
            .create_log_stream()
            .log_group_name(group)
            .log_stream_name(stream)
            .send()
            .await
        {
            Ok(_) => Ok(()),
            Err(e) => Err(classify_sdk_error(e, |err| {
                if err.is_resource_already_exists_exception() {
                    SinkError::AlreadyExists
                } else {
                    service_error(err)
                }
            })),
        }
    }

    async fn put_log_events(
        &self,
        request: AppendRequest<'_>,
    ) -> Result<Option<String>, SinkError> {
        let events = to_input_events(request.events)?;

        let output = self
            .client
            .put_log_events()
            .log_group_name(&request.destination.group)
            .log_stream_name(&request.destination.stream)
            .set_log_events(Some(events))
            .set_sequence_token(request.sequence_token.map(str::to_string))
            .send()
            .await
            .map_err(|e| classify_sdk_error(e, classify_put_log_events_error))?;

        if let Some(rejected) = output.rejected_log_events_info() {
            warn_rejected(rejected);
        }

        Ok(output.next_sequence_token().map(str::to_string))
    }
}

fn to_input_events(events: &[LogEvent]) -> Result<Vec<InputLogEvent>, SinkError> {
    events
        .iter()
        .map(|event| {
            InputLogEvent::builder()
                .timestamp(event.timestamp)
                .message(event.message.clone())
                .build()
                .map_err(|e| SinkError::InvalidEvent(e.to_string()))
        })
        .collect()
}

fn classify_put_log_events_error(err: &PutLogEventsError) -> SinkError {
    match err {
        PutLogEventsError::InvalidSequenceTokenException(e) => SinkError::InvalidSequenceToken {
            expected: e.expected_sequence_token().map(str::to_string),
        },
        PutLogEventsError::DataAlreadyAcceptedException(e) => SinkError::DataAlreadyAccepted {
            expected: e.expected_sequence_token().map(str::to_string),
        },
        other => service_error(other),
    }
}

fn service_error<E: ProvideErrorMetadata>(err: &E) -> SinkError {
    SinkError::Service {
        code: err.code().unwrap_or("Unknown").to_string(),
        message: err.message().unwrap_or_default().to_string(),
    }
}

/// Maps an SDK failure onto a [`SinkError`], delegating service errors to
/// `classify_service`.
fn classify_sdk_error<E, R>(
    err: SdkError<E, R>,
    classify_service: impl FnOnce(&E) -> SinkError,
) -> SinkError
where
    E: Debug,
    R: Debug,
{
    match &err {
        SdkError::ServiceError(service_err) => classify_service(service_err.err()),
        SdkError::TimeoutError(_) => {
            SinkError::Transport("CloudWatch Logs operation timed out".to_string())
        }
        SdkError::DispatchFailure(e) => SinkError::Transport(format!("dispatch failure: {e:?}")),
        SdkError::ConstructionFailure(e) => {
            SinkError::Transport(format!("construction failure: {e:?}"))
        }
        SdkError::ResponseError(e) => SinkError::Transport(format!("response error: {e:?}")),
        _ => SinkError::Transport(format!("{err:?}")),
    }
}

fn warn_rejected(rejected: &RejectedLogEventsInfo) {
    if let Some(index) = rejected.too_old_log_event_end_index() {
        warn!("CloudWatch Logs rejected events up to index {index}: too old");
    }
    if let Some(index) = rejected.expired_log_event_end_index() {
        warn!("CloudWatch Logs rejected events up to index {index}: past retention");
    }
    if let Some(index) = rejected.too_new_log_event_start_index() {
        warn!("CloudWatch Logs rejected events from index {index}: too new");
    }
}
