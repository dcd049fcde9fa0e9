//! Tracing layer that turns toolpin events into [`ToolpinEvent`]s.
//!
//! Events are recognised by a target starting with `toolpin` plus an
//! `event_type` field; everything else passes through untouched.

use crate::event::{
    CommandEvent, EventCategory, EventSource, OutputEvent, ToolEvent, ToolpinEvent,
};
use crate::metadata::correlation_id;
use tokio::sync::mpsc;
use tracing::Subscriber;
use tracing::field::{Field, Visit};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;

/// A tracing Layer that captures toolpin events.
pub struct ToolpinEventLayer {
    sender: mpsc::UnboundedSender<ToolpinEvent>,
}

impl ToolpinEventLayer {
    /// Create a new layer that sends events to the given channel.
    #[must_use]
    pub fn new(sender: mpsc::UnboundedSender<ToolpinEvent>) -> Self {
        Self { sender }
    }
}

impl<S> Layer<S> for ToolpinEventLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let target = event.metadata().target();
        if !target.starts_with("toolpin") {
            return;
        }

        let mut visitor = ToolpinEventVisitor::new(target);
        event.record(&mut visitor);

        if let Some(toolpin_event) = visitor.build() {
            let _ = self.sender.send(toolpin_event);
        }
    }
}

#[derive(Default)]
struct ToolpinEventVisitor {
    target: String,
    event_type: Option<String>,

    tool_name: Option<String>,
    version: Option<String>,
    percent: Option<u8>,
    created: Option<bool>,
    message: Option<String>,
    error: Option<String>,

    command: Option<String>,
    args: Option<Vec<String>>,
    success: Option<bool>,
    duration_ms: Option<u64>,

    content: Option<String>,
}

impl ToolpinEventVisitor {
    fn new(target: &str) -> Self {
        Self {
            target: target.to_string(),
            ..Self::default()
        }
    }

    fn build(self) -> Option<ToolpinEvent> {
        let event_type = self.event_type.as_deref()?;
        let source = EventSource::new(&self.target);

        let category = match event_type {
            "tool.queued" => EventCategory::Tool(ToolEvent::Queued {
                name: self.tool_name?,
                version: self.version?,
            }),
            "tool.progress" => EventCategory::Tool(ToolEvent::Progress {
                name: self.tool_name?,
                version: self.version?,
                percent: self.percent?,
            }),
            "tool.verifying" => EventCategory::Tool(ToolEvent::Verifying {
                name: self.tool_name?,
                version: self.version?,
            }),
            "tool.extracting" => EventCategory::Tool(ToolEvent::Extracting {
                name: self.tool_name?,
                version: self.version?,
            }),
            "tool.linked" => EventCategory::Tool(ToolEvent::Linked {
                name: self.tool_name?,
                version: self.version?,
                created: self.created.unwrap_or(true),
            }),
            "tool.removed" => EventCategory::Tool(ToolEvent::Removed {
                name: self.tool_name?,
                version: self.version?,
            }),
            "tool.unsupported" => EventCategory::Tool(ToolEvent::Unsupported {
                name: self.tool_name?,
                version: self.version?,
                message: self.message?,
            }),
            "tool.failed" => EventCategory::Tool(ToolEvent::Failed {
                name: self.tool_name?,
                version: self.version?,
                error: self.error?,
            }),

            "command.started" => EventCategory::Command(CommandEvent::Started {
                command: self.command?,
                args: self.args.unwrap_or_default(),
            }),
            "command.completed" => EventCategory::Command(CommandEvent::Completed {
                command: self.command?,
                success: self.success?,
                duration_ms: self.duration_ms.unwrap_or(0),
            }),

            "output.stdout" => EventCategory::Output(OutputEvent::Stdout {
                content: self.content?,
            }),
            "output.stderr" => EventCategory::Output(OutputEvent::Stderr {
                content: self.content?,
            }),

            _ => return None,
        };

        Some(ToolpinEvent::new(correlation_id(), source, category))
    }
}

impl Visit for ToolpinEventVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        let value = Some(value.to_string());
        match field.name() {
            "event_type" => self.event_type = value,
            "tool_name" => self.tool_name = value,
            "version" => self.version = value,
            "message" => self.message = value,
            "error" => self.error = value,
            "command" => self.command = value,
            "content" => self.content = value,
            _ => {}
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        match field.name() {
            "percent" => self.percent = u8::try_from(value.clamp(0, 100)).ok(),
            "duration_ms" => self.duration_ms = u64::try_from(value).ok(),
            _ => {}
        }
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        match field.name() {
            "percent" => self.percent = u8::try_from(value.min(100)).ok(),
            "duration_ms" => self.duration_ms = Some(value),
            _ => {}
        }
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        match field.name() {
            "created" => self.created = Some(value),
            "success" => self.success = Some(value),
            _ => {}
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        // `%value` fields arrive here rather than in record_str.
        let text = format!("{value:?}");
        match field.name() {
            "args" => {
                if let Ok(args) = serde_json::from_str::<Vec<String>>(&text) {
                    self.args = Some(args);
                }
            }
            _ => self.record_str(field, &text),
        }
    }
}
