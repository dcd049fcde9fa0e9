//! Structured event system for toolpin.
//!
//! The install pipeline never prints. It emits tracing events with a
//! `toolpin::*` target and an `event_type` field; [`ToolpinEventLayer`]
//! turns them into typed [`ToolpinEvent`]s and an [`EventBus`] fans them out
//! to a renderer.
//!
//! ```text
//!  emit_tool_*! ──► tracing ──► ToolpinEventLayer ──► EventBus ──► CliRenderer
//!                                                              └─► JsonRenderer
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use toolpin_events::{EventBus, ToolpinEventLayer, emit_tool_queued};
//! use tracing_subscriber::layer::SubscriberExt;
//! use tracing_subscriber::util::SubscriberInitExt;
//!
//! let bus = EventBus::new();
//! let layer = ToolpinEventLayer::new(bus.sender().into_inner());
//! tracing_subscriber::registry().with(layer).init();
//!
//! emit_tool_queued!("elm", "0.19.1");
//! ```

pub mod bus;
pub mod event;
pub mod layer;
pub mod metadata;
pub mod renderers;

pub use bus::{EventBus, EventReceiver, EventSender, SendError};
pub use event::{CommandEvent, EventCategory, EventSource, OutputEvent, ToolEvent, ToolpinEvent};
pub use layer::ToolpinEventLayer;
pub use metadata::{correlation_id, set_correlation_id};
pub use renderers::{CliRenderer, CliRendererConfig, JsonRenderer};

// ============================================================================
// Emit Macros
// ============================================================================

/// Emit a tool queued event (download about to start).
#[macro_export]
macro_rules! emit_tool_queued {
    ($name:expr, $version:expr) => {
        ::tracing::info!(
            target: "toolpin::tool",
            event_type = "tool.queued",
            tool_name = %$name,
            version = %$version,
        )
    };
}

/// Emit a tool download progress event.
///
/// # Example
/// ```rust,ignore
/// emit_tool_progress!("elm", "0.19.1", 42_u8);
/// ```
#[macro_export]
macro_rules! emit_tool_progress {
    ($name:expr, $version:expr, $percent:expr) => {
        ::tracing::info!(
            target: "toolpin::tool",
            event_type = "tool.progress",
            tool_name = %$name,
            version = %$version,
            percent = $percent,
        )
    };
}

/// Emit a tool verifying event.
#[macro_export]
macro_rules! emit_tool_verifying {
    ($name:expr, $version:expr) => {
        ::tracing::info!(
            target: "toolpin::tool",
            event_type = "tool.verifying",
            tool_name = %$name,
            version = %$version,
        )
    };
}

/// Emit a tool extracting event.
#[macro_export]
macro_rules! emit_tool_extracting {
    ($name:expr, $version:expr) => {
        ::tracing::info!(
            target: "toolpin::tool",
            event_type = "tool.extracting",
            tool_name = %$name,
            version = %$version,
        )
    };
}

/// Emit a tool linked event. `created` is false when the link was already correct.
#[macro_export]
macro_rules! emit_tool_linked {
    ($name:expr, $version:expr, $created:expr) => {
        ::tracing::info!(
            target: "toolpin::tool",
            event_type = "tool.linked",
            tool_name = %$name,
            version = %$version,
            created = $created,
        )
    };
}

/// Emit a tool link removed event.
#[macro_export]
macro_rules! emit_tool_removed {
    ($name:expr, $version:expr) => {
        ::tracing::info!(
            target: "toolpin::tool",
            event_type = "tool.removed",
            tool_name = %$name,
            version = %$version,
        )
    };
}

/// Emit a tool unsupported-on-this-platform event.
#[macro_export]
macro_rules! emit_tool_unsupported {
    ($name:expr, $version:expr, $message:expr) => {
        ::tracing::info!(
            target: "toolpin::tool",
            event_type = "tool.unsupported",
            tool_name = %$name,
            version = %$version,
            message = %$message,
        )
    };
}

/// Emit a tool failed event.
#[macro_export]
macro_rules! emit_tool_failed {
    ($name:expr, $version:expr, $error:expr) => {
        ::tracing::info!(
            target: "toolpin::tool",
            event_type = "tool.failed",
            tool_name = %$name,
            version = %$version,
            error = %$error,
        )
    };
}

// Command Events

/// Emit a command started event.
#[macro_export]
macro_rules! emit_command_started {
    ($command:expr) => {
        ::tracing::info!(
            target: "toolpin::command",
            event_type = "command.started",
            command = %$command,
        )
    };
    ($command:expr, $args:expr) => {
        ::tracing::info!(
            target: "toolpin::command",
            event_type = "command.started",
            command = %$command,
            args = ?$args,
        )
    };
}

/// Emit a command completed event. Renderers stop after this event.
#[macro_export]
macro_rules! emit_command_completed {
    ($command:expr, $success:expr, $duration_ms:expr) => {
        ::tracing::info!(
            target: "toolpin::command",
            event_type = "command.completed",
            command = %$command,
            success = $success,
            duration_ms = $duration_ms,
        )
    };
}

// Output Events

/// Emit a stdout output event.
#[macro_export]
macro_rules! emit_stdout {
    ($content:expr) => {
        ::tracing::info!(
            target: "toolpin::output",
            event_type = "output.stdout",
            content = %$content,
        )
    };
}

/// Emit a stderr output event.
#[macro_export]
macro_rules! emit_stderr {
    ($content:expr) => {
        ::tracing::info!(
            target: "toolpin::output",
            event_type = "output.stderr",
            content = %$content,
        )
    };
}
