//! Event renderers.

pub mod cli;
pub mod json;

pub use cli::{CliRenderer, CliRendererConfig};
pub use json::JsonRenderer;

use crate::event::{CommandEvent, EventCategory, ToolpinEvent};

/// Whether `event` closes out the running command, after which renderers stop.
pub(crate) const fn ends_command(event: &ToolpinEvent) -> bool {
    matches!(
        event.category,
        EventCategory::Command(CommandEvent::Completed { .. })
    )
}
