//! JSON renderer for toolpin events.
//!
//! Writes one JSON object per line to stdout.

#![allow(clippy::print_stdout)]

use crate::bus::EventReceiver;
use crate::event::ToolpinEvent;
use crate::renderers::ends_command;

/// JSON renderer that outputs events as JSON lines.
#[derive(Debug, Default)]
pub struct JsonRenderer {
    pretty: bool,
}

impl JsonRenderer {
    /// Create a new JSON renderer with compact output.
    #[must_use]
    pub const fn new() -> Self {
        Self { pretty: false }
    }

    /// Create a new JSON renderer with pretty-printed output.
    #[must_use]
    pub const fn pretty() -> Self {
        Self { pretty: true }
    }

    /// Render events until the bus closes or a command completes.
    pub async fn run(self, mut receiver: EventReceiver) {
        while let Some(event) = receiver.recv().await {
            self.render(&event);
            if ends_command(&event) {
                break;
            }
        }
    }

    /// Render a single event as JSON.
    pub fn render(&self, event: &ToolpinEvent) {
        if let Some(json) = self.to_json(event) {
            println!("{json}");
        }
    }

    fn to_json(&self, event: &ToolpinEvent) -> Option<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(event)
        } else {
            serde_json::to_string(event)
        };
        json.ok()
    }
}
