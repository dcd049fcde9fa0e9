//! Tracing setup for the toolpin CLI.
//!
//! Two consumers share one subscriber: a diagnostics layer writing to stderr
//! under an `EnvFilter`, and the [`ToolpinEventLayer`] that captures every
//! `toolpin::*` event for the renderer regardless of log level.

use std::io;
pub use tracing::Level;
use tracing_subscriber::filter::{EnvFilter, filter_fn};
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::registry::Registry;
use tracing_subscriber::util::SubscriberInitExt;
use toolpin_events::{EventBus, EventReceiver, ToolpinEventLayer, correlation_id};

/// Tracing output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TracingFormat {
    /// Pretty-printed human-readable format
    Pretty,
    /// Compact single-line format
    Compact,
    /// Structured JSON format
    Json,
    /// Development format with file and line
    Dev,
}

/// Log level options for CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    /// Show all logs (trace level)
    Trace,
    /// Show debug and above
    Debug,
    /// Show info and above
    Info,
    /// Show warnings and above (default)
    Warn,
    /// Show errors only
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

/// Tracing configuration.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Diagnostics format.
    pub format: TracingFormat,
    /// Level used when `RUST_LOG` is unset.
    pub level: Level,
    /// Explicit filter directives, overriding both `RUST_LOG` and `level`.
    pub filter: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            format: TracingFormat::Compact,
            level: Level::WARN,
            filter: None,
        }
    }
}

/// Filter directives for the diagnostics layer.
fn env_filter(config: &TracingConfig) -> miette::Result<EnvFilter> {
    if let Some(filter) = &config.filter {
        return EnvFilter::try_new(filter)
            .map_err(|e| miette::miette!("Failed to create tracing filter: {e}"));
    }
    EnvFilter::try_from_default_env()
        .or_else(|_| {
            let level = config.level.as_str().to_lowercase();
            EnvFilter::try_new(format!(
                "toolpin={level},toolpin_core={level},toolpin_install={level},toolpin_events={level}"
            ))
        })
        .map_err(|e| miette::miette!("Failed to create tracing filter: {e}"))
}

type Logs = Box<dyn Layer<tracing_subscriber::layer::Layered<ToolpinEventLayer, Registry>> + Send + Sync>;

fn diagnostics_layer(format: TracingFormat) -> Logs {
    match format {
        TracingFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_writer(io::stderr)
            .with_target(true)
            .boxed(),
        TracingFormat::Compact => tracing_subscriber::fmt::layer()
            .compact()
            .with_writer(io::stderr)
            .with_target(false)
            .boxed(),
        TracingFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(io::stderr)
            .with_current_span(true)
            .boxed(),
        TracingFormat::Dev => tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .with_file(true)
            .with_line_number(true)
            .with_target(true)
            .with_thread_ids(true)
            .boxed(),
    }
}

/// Install the global subscriber and return a receiver of toolpin events.
///
/// Must be called inside a tokio runtime.
///
/// # Errors
///
/// Fails if the filter is invalid or a global subscriber is already set.
pub fn init_tracing_with_events(config: TracingConfig) -> miette::Result<EventReceiver> {
    let bus = EventBus::new();
    let receiver = bus.subscribe();
    let sender = bus.sender();

    let logs = diagnostics_layer(config.format)
        .with_filter(filter_fn(|metadata| !metadata.target().starts_with("toolpin::")))
        .with_filter(env_filter(&config)?);

    tracing_subscriber::registry()
        .with(ToolpinEventLayer::new(sender.into_inner()))
        .with(logs)
        .try_init()
        .map_err(|e| miette::miette!("Failed to initialize tracing: {e}"))?;

    tracing::debug!(
        correlation_id = %correlation_id(),
        version = env!("CARGO_PKG_VERSION"),
        format = ?config.format,
        "Tracing initialized"
    );
    Ok(receiver)
}
