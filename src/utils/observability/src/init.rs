// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub const DEFAULT_LOGGING_CONFIG: &str = "info,tower_http=info,sqlx=warn";
pub const VERBOSE_LOGGING_CONFIG: &str = "debug,hyper=info,h2=info,redis=info";

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human friendly multi-line output for terminals
    Pretty,
    /// One JSON object per line, for log collectors
    Json,
}

#[derive(Debug, Clone)]
pub struct LoggingOptions {
    pub format: LogFormat,
    pub verbosity_level: u8,
}

/// Must be held for the lifetime of the process, dropping it flushes and stops
/// the background log writer
#[must_use]
pub struct LoggingGuard {
    _appender: Option<WorkerGuard>,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub fn init_logging(options: &LoggingOptions) -> LoggingGuard {
    // Logging may be already initialized when running under tests
    if tracing::dispatcher::has_been_set() {
        return LoggingGuard { _appender: None };
    }

    // Use configuration from RUST_LOG env var if provided
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        match options.verbosity_level {
            0 => EnvFilter::new(DEFAULT_LOGGING_CONFIG),
            _ => EnvFilter::new(VERBOSE_LOGGING_CONFIG),
        }
    });

    let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());

    let registry = tracing_subscriber::registry().with(env_filter);

    let init_result = match options.format {
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_span_events(FmtSpan::NONE)
                    .pretty(),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .json()
                    .with_current_span(true)
                    .flatten_event(true),
            )
            .try_init(),
    };

    // `try_init` also redirects `log` records into tracing
    if let Err(err) = init_result {
        eprintln!("Failed to initialize logging: {err}");
    }

    LoggingGuard {
        _appender: Some(guard),
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
