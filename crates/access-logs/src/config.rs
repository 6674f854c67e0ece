// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::env;

use crate::constants::{
    EVENT_OVERHEAD_BYTES, MAX_APPEND_ATTEMPTS, MAX_BATCH_EVENTS, MAX_PAYLOAD_BYTES,
};
use crate::dispatcher::DispatcherConfig;
use crate::errors::ConfigError;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Configuration of the log forwarder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwarderConfig {
    /// Maximum number of events per `PutLogEvents` call
    pub batch_size: usize,
    /// Payload ceiling per `PutLogEvents` call, in bytes
    pub max_payload_bytes: usize,
    /// Sends of one batch before sequence token conflicts are fatal
    pub max_append_attempts: u32,
    /// Log level (e.g., trace, debug, info, warn, error)
    pub log_level: String,
    /// AWS region override, defaults to the SDK provider chain
    pub aws_region: Option<String>,
    /// CloudWatch Logs endpoint override, mainly for local testing
    pub logs_endpoint_url: Option<String>,
    /// Timeout of each CloudWatch Logs operation, in seconds
    pub timeout_secs: u64,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            batch_size: MAX_BATCH_EVENTS,
            max_payload_bytes: MAX_PAYLOAD_BYTES,
            max_append_attempts: MAX_APPEND_ATTEMPTS,
            log_level: "info".to_string(),
            aws_region: None,
            logs_endpoint_url: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ForwarderConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let batch_size = read_number("FORWARDER_BATCH_SIZE")?.unwrap_or(defaults.batch_size);
        let max_payload_bytes =
            read_number("FORWARDER_MAX_PAYLOAD_BYTES")?.unwrap_or(defaults.max_payload_bytes);
        let max_append_attempts = read_number("FORWARDER_MAX_APPEND_ATTEMPTS")?
            .unwrap_or(defaults.max_append_attempts);
        let timeout_secs =
            read_number("FORWARDER_TIMEOUT_SECS")?.unwrap_or(defaults.timeout_secs);
        let log_level = env::var("FORWARDER_LOG_LEVEL")
            .map(|val| val.to_lowercase())
            .unwrap_or(defaults.log_level);
        let aws_region = env::var("AWS_REGION")
            .or_else(|_| env::var("AWS_DEFAULT_REGION"))
            .ok()
            .filter(|val| !val.trim().is_empty());
        let logs_endpoint_url = env::var("FORWARDER_LOGS_ENDPOINT_URL")
            .ok()
            .filter(|val| !val.trim().is_empty());

        let config = Self {
            batch_size,
            max_payload_bytes,
            max_append_attempts,
            log_level,
            aws_region,
            logs_endpoint_url,
            timeout_secs,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 || self.batch_size > MAX_BATCH_EVENTS {
            return Err(ConfigError::InvalidConfig(format!(
                "batch size must be between 1 and {MAX_BATCH_EVENTS}, got {}",
                self.batch_size
            )));
        }

        // A single event with its overhead must always fit.
        if self.max_payload_bytes <= 2 * EVENT_OVERHEAD_BYTES
            || self.max_payload_bytes > MAX_PAYLOAD_BYTES
        {
            return Err(ConfigError::InvalidConfig(format!(
                "max payload bytes must be between {} and {MAX_PAYLOAD_BYTES}, got {}",
                2 * EVENT_OVERHEAD_BYTES + 1,
                self.max_payload_bytes
            )));
        }

        if self.max_append_attempts == 0 {
            return Err(ConfigError::InvalidConfig(
                "max append attempts must be greater than 0".to_string(),
            ));
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "timeout must be greater than 0".to_string(),
            ));
        }

        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::InvalidConfig(format!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.log_level
            )));
        }

        Ok(())
    }

    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            batch_size: self.batch_size,
            max_payload_bytes: self.max_payload_bytes,
            event_overhead_bytes: EVENT_OVERHEAD_BYTES,
            max_append_attempts: self.max_append_attempts,
        }
    }
}

fn read_number<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { name, value }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 8] = [
        "FORWARDER_BATCH_SIZE",
        "FORWARDER_MAX_PAYLOAD_BYTES",
        "FORWARDER_MAX_APPEND_ATTEMPTS",
        "FORWARDER_TIMEOUT_SECS",
        "FORWARDER_LOG_LEVEL",
        "FORWARDER_LOGS_ENDPOINT_URL",
        "AWS_REGION",
        "AWS_DEFAULT_REGION",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(ForwarderConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_batch_size_bounds() {
        let config = ForwarderConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ForwarderConfig {
            batch_size: MAX_BATCH_EVENTS + 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_payload_bounds() {
        let config = ForwarderConfig {
            max_payload_bytes: 2 * EVENT_OVERHEAD_BYTES,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ForwarderConfig {
            max_payload_bytes: MAX_PAYLOAD_BYTES + 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_attempts_and_timeout() {
        let config = ForwarderConfig {
            max_append_attempts: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ForwarderConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let config = ForwarderConfig {
            log_level: "verbose".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_dispatcher_config_carries_limits() {
        let config = ForwarderConfig {
            batch_size: 500,
            max_append_attempts: 2,
            ..Default::default()
        };
        let dispatcher_config = config.dispatcher_config();
        assert_eq!(dispatcher_config.batch_size, 500);
        assert_eq!(dispatcher_config.max_append_attempts, 2);
        assert_eq!(dispatcher_config.event_overhead_bytes, EVENT_OVERHEAD_BYTES);
        assert_eq!(dispatcher_config.max_payload_bytes, MAX_PAYLOAD_BYTES);
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        let config = ForwarderConfig::from_env().unwrap();
        assert_eq!(config, ForwarderConfig::default());
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        env::set_var("FORWARDER_BATCH_SIZE", "250");
        env::set_var("FORWARDER_LOG_LEVEL", "DEBUG");
        env::set_var("AWS_DEFAULT_REGION", "eu-west-1");
        env::set_var("FORWARDER_LOGS_ENDPOINT_URL", "http://127.0.0.1:4566");

        let config = ForwarderConfig::from_env().unwrap();
        clear_env();

        assert_eq!(config.batch_size, 250);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.aws_region.as_deref(), Some("eu-west-1"));
        assert_eq!(
            config.logs_endpoint_url.as_deref(),
            Some("http://127.0.0.1:4566")
        );
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_non_numeric_batch_size() {
        clear_env();
        env::set_var("FORWARDER_BATCH_SIZE", "lots");

        let result = ForwarderConfig::from_env();
        clear_env();

        assert!(matches!(
            result,
            Err(ConfigError::InvalidNumber {
                name: "FORWARDER_BATCH_SIZE",
                ..
            })
        ));
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_out_of_range_batch_size() {
        clear_env();
        env::set_var("FORWARDER_BATCH_SIZE", "20000");

        let result = ForwarderConfig::from_env();
        clear_env();

        assert!(matches!(result, Err(ConfigError::InvalidConfig(_))));
    }
}
