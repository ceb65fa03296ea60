//! Structured logging for the entql command line
//!
//! Console logs go to stderr so stdout stays clean for command output.
//! File logs rotate daily.

use anyhow::Result;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const LOG_FILE_PREFIX: &str = "entql.log";

/// Log format configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format for development
    Pretty,
    /// JSON format (structured logging)
    Json,
    /// Single-line format
    Compact,
}

impl LogFormat {
    /// Parse from environment variable
    pub fn from_env() -> Self {
        match std::env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("pretty") => LogFormat::Pretty,
            Ok("compact") | Ok(_) | Err(_) => LogFormat::Compact,
        }
    }
}

/// Log output configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    /// Log to stderr only
    Stderr,
    /// Log to file only
    File,
    /// Log to both stderr and file
    Both,
}

impl LogOutput {
    /// Parse from environment variable
    pub fn from_env() -> Self {
        match std::env::var("LOG_OUTPUT").as_deref() {
            Ok("file") => LogOutput::File,
            Ok("both") => LogOutput::Both,
            Ok("stderr") | Ok(_) | Err(_) => LogOutput::Stderr,
        }
    }
}

fn console_layer<S>(format: LogFormat) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a> + 'static,
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .boxed(),
    }
}

fn file_appender() -> Result<RollingFileAppender> {
    let log_dir = std::env::var("LOG_DIR").unwrap_or_else(|_| "./logs".to_string());
    std::fs::create_dir_all(&log_dir)?;
    Ok(RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_PREFIX))
}

/// Initialize the logging system
///
/// Environment variables:
/// - `RUST_LOG`: Log level (e.g., "debug", "info", "entql_ir=trace")
/// - `LOG_FORMAT`: Output format ("pretty", "json", "compact")
/// - `LOG_OUTPUT`: Where to write logs ("stderr", "file", "both")
/// - `LOG_DIR`: Directory for log files (default: "./logs")
///
/// Examples:
/// ```bash
/// # Watch every translation step
/// RUST_LOG=entql_ir=trace entql translate select.json
///
/// # JSON to file
/// RUST_LOG=info LOG_FORMAT=json LOG_OUTPUT=file LOG_DIR=/var/log/entql entql translate select.json
/// ```
pub fn init() -> Result<()> {
    let format = LogFormat::from_env();
    let output = LogOutput::from_env();

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("warn"))?;

    match output {
        LogOutput::Stderr => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(console_layer(format))
                .try_init()?;
        }
        LogOutput::File => {
            let file_layer = fmt::layer()
                .with_writer(file_appender()?)
                .with_ansi(false);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(file_layer)
                .try_init()?;
        }
        LogOutput::Both => {
            let file_layer = fmt::layer()
                .with_writer(file_appender()?)
                .with_ansi(false)
                .boxed();

            tracing_subscriber::registry()
                .with(env_filter)
                .with(console_layer(format))
                .with(file_layer)
                .try_init()?;
        }
    }

    tracing::debug!(format = ?format, output = ?output, "Logging initialized");
    Ok(())
}
