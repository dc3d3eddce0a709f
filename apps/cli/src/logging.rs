//! Logging initialization for the tessera binary
//!
//! Console output plus an optional log file written next to it, in JSON or
//! human-readable form. `RUST_LOG` overrides the configured level.

use std::fs;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Keeps the non-blocking file writer flushing.
/// Must be kept alive for the duration of the program
pub struct LoggingGuard {
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
}

/// Initialize logging from the provided `LoggingConfig`.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<LoggingGuard> {
    let subscriber = tracing_subscriber::registry().with(build_env_filter(config));

    let file_guard = if config.json {
        init_json_logging_with_subscriber(subscriber, config)?
    } else {
        init_human_logging_with_subscriber(subscriber, config)?
    };

    tracing::debug!(
        level = %config.level,
        json = config.json,
        file_enabled = config.file_enabled,
        "Logging initialized"
    );

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

/// Build environment filter
fn build_env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        // Include both the binary and the library crate module paths
        EnvFilter::new(format!(
            "tessera={},tessera_codegen={}",
            config.level, config.level
        ))
    })
}

/// Initialize JSON logging with a pre-configured subscriber
fn init_json_logging_with_subscriber<S>(
    subscriber: S,
    config: &LoggingConfig,
) -> anyhow::Result<Option<tracing_appender::non_blocking::WorkerGuard>>
where
    S: SubscriberExt + for<'a> tracing_subscriber::registry::LookupSpan<'a> + Send + Sync,
{
    let console_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(false)
        .with_writer(std::io::stderr);

    if config.file_enabled {
        let (file_appender, file_guard) = create_file_appender(config)?;
        let file_layer = fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_writer(file_appender);

        subscriber.with(console_layer).with(file_layer).init();
        Ok(Some(file_guard))
    } else {
        subscriber.with(console_layer).init();
        Ok(None)
    }
}

/// Initialize human-readable logging with a pre-configured subscriber
fn init_human_logging_with_subscriber<S>(
    subscriber: S,
    config: &LoggingConfig,
) -> anyhow::Result<Option<tracing_appender::non_blocking::WorkerGuard>>
where
    S: SubscriberExt + for<'a> tracing_subscriber::registry::LookupSpan<'a> + Send + Sync,
{
    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    if config.file_enabled {
        let (file_appender, file_guard) = create_file_appender(config)?;
        let file_layer = fmt::layer()
            .with_target(true)
            .with_ansi(false) // No ANSI colors in files
            .with_writer(file_appender);

        subscriber.with(console_layer).with(file_layer).init();
        Ok(Some(file_guard))
    } else {
        subscriber.with(console_layer).init();
        Ok(None)
    }
}

/// Create the log file appender. Each run appends to the same file.
fn create_file_appender(
    config: &LoggingConfig,
) -> anyhow::Result<(
    tracing_appender::non_blocking::NonBlocking,
    tracing_appender::non_blocking::WorkerGuard,
)> {
    fs::create_dir_all(&config.file_directory)?;

    let file_appender = tracing_appender::rolling::never(&config.file_directory, &config.file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    Ok((non_blocking, guard))
}
