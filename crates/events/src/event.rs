//! Event type definitions for structured toolpin events.
//!
//! Events are grouped by domain (tool pipeline, command lifecycle, plain
//! output) and carry id, correlation and timing metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A structured toolpin event with full metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolpinEvent {
    /// Unique event identifier.
    pub id: Uuid,
    /// Correlation ID shared by every event of one invocation.
    pub correlation_id: Uuid,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// Source information for the event.
    pub source: EventSource,
    /// The event category and data.
    pub category: EventCategory,
}

impl ToolpinEvent {
    /// Create a new event with the given category.
    #[must_use]
    pub fn new(correlation_id: Uuid, source: EventSource, category: EventCategory) -> Self {
        Self {
            id: Uuid::new_v4(),
            correlation_id,
            timestamp: Utc::now(),
            source,
            category,
        }
    }
}

/// Source information for an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSource {
    /// The tracing target (e.g. `toolpin::tool`).
    pub target: String,
}

impl EventSource {
    /// Create a new event source.
    #[must_use]
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }
}

/// Event categories organized by domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum EventCategory {
    /// Per-tool install pipeline events.
    Tool(ToolEvent),
    /// Command lifecycle events.
    Command(CommandEvent),
    /// Plain output lines.
    Output(OutputEvent),
}

/// Per-tool install pipeline events.
///
/// A missing tool goes `Queued → Progress* → Verifying → Extracting →
/// Linked`, or ends in `Failed` at any point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ToolEvent {
    /// Download about to start.
    Queued {
        /// Tool name.
        name: String,
        /// Resolved version.
        version: String,
    },
    /// Download progress.
    Progress {
        /// Tool name.
        name: String,
        /// Resolved version.
        version: String,
        /// Percentage, 0 to 100.
        percent: u8,
    },
    /// Download finished; checking size and hash.
    Verifying {
        /// Tool name.
        name: String,
        /// Resolved version.
        version: String,
    },
    /// Verified; finishing extraction.
    Extracting {
        /// Tool name.
        name: String,
        /// Resolved version.
        version: String,
    },
    /// Link in the project's binary directory is in place.
    Linked {
        /// Tool name.
        name: String,
        /// Resolved version.
        version: String,
        /// `false` when the link already matched and nothing was written.
        created: bool,
    },
    /// A link for a tool no longer requested was removed.
    Removed {
        /// Tool name.
        name: String,
        /// Version the link pointed at.
        version: String,
    },
    /// Requested version has no build for this platform.
    Unsupported {
        /// Tool name.
        name: String,
        /// Resolved version.
        version: String,
        /// Explanation with alternatives.
        message: String,
    },
    /// The tool's pipeline failed.
    Failed {
        /// Tool name.
        name: String,
        /// Resolved version.
        version: String,
        /// Error text.
        error: String,
    },
}

impl ToolEvent {
    /// Tool name the event is about.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Queued { name, .. }
            | Self::Progress { name, .. }
            | Self::Verifying { name, .. }
            | Self::Extracting { name, .. }
            | Self::Linked { name, .. }
            | Self::Removed { name, .. }
            | Self::Unsupported { name, .. }
            | Self::Failed { name, .. } => name,
        }
    }
}

/// Command lifecycle events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum CommandEvent {
    /// Command started.
    Started {
        /// Command name.
        command: String,
        /// Command arguments.
        args: Vec<String>,
    },
    /// Command completed.
    Completed {
        /// Command name.
        command: String,
        /// Whether the command succeeded.
        success: bool,
        /// Duration in milliseconds.
        duration_ms: u64,
    },
}

/// Plain output lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum OutputEvent {
    /// Standard output.
    Stdout {
        /// Content to output.
        content: String,
    },
    /// Standard error.
    Stderr {
        /// Content to output.
        content: String,
    },
}
