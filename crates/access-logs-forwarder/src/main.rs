// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::{env, process::ExitCode, sync::Arc};
use tracing::{debug, error, info, Instrument};
use tracing_subscriber::EnvFilter;

use access_logs::{cloudwatch::CloudWatchLogsSink, config::ForwarderConfig, pipeline::Pipeline};

mod logger;

const USAGE: &str = "usage: access-logs-forwarder <object-file> <object-key>";

#[tokio::main]
pub async fn main() -> ExitCode {
    let config = ForwarderConfig::from_env();

    let log_level = config
        .as_ref()
        .map(|config| config.log_level.as_str())
        .unwrap_or("info");
    init_logging(log_level);

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let mut args = env::args().skip(1);
    let (Some(object_file), Some(object_key), None) = (args.next(), args.next(), args.next())
    else {
        error!("{USAGE}");
        return ExitCode::FAILURE;
    };

    let compressed = match tokio::fs::read(&object_file).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Unable to read {object_file}: {e}");
            return ExitCode::FAILURE;
        }
    };

    let sink = Arc::new(CloudWatchLogsSink::from_config(&config).await);
    let pipeline = Pipeline::new(sink, config.dispatcher_config());

    let span = tracing::info_span!("object", key = %object_key);
    match pipeline.run(&compressed, &object_key).instrument(span).await {
        Ok(summary) => {
            debug!("{summary:?}");
            info!("Finished forwarding {object_key}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Forwarding {object_key} failed: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(log_level: &str) {
    let env_filter = format!(
        "h2=off,hyper=off,rustls=off,aws_smithy_runtime=off,aws_config=warn,{log_level}"
    );

    #[allow(clippy::expect_used)]
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(env_filter).expect("could not parse log level in configuration"),
        )
        .with_ansi(false)
        .event_format(logger::Formatter)
        .finish();

    #[allow(clippy::expect_used)]
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    debug!("Logging subsystem enabled");
}
