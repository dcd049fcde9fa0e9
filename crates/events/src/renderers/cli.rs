//! CLI renderer for toolpin events.
//!
//! Tool lifecycle lines go to stderr; `Output` events go to their stream.
//! This module is allowed to use println!/eprintln! as it's the output layer.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use crate::bus::EventReceiver;
use crate::event::{CommandEvent, EventCategory, OutputEvent, ToolEvent, ToolpinEvent};
use crate::renderers::ends_command;
use std::cell::Cell;
use std::io::{self, IsTerminal, Write};

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

/// CLI renderer configuration.
///
/// Decided once by the caller; the renderer never inspects the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliRendererConfig {
    /// Whether to use ANSI colors.
    pub colors: bool,
    /// Whether to show verbose output.
    pub verbose: bool,
    /// Whether stderr is a terminal that can redraw a progress line.
    pub interactive: bool,
}

impl CliRendererConfig {
    /// Configuration for the current stderr, honoring an explicit `NO_COLOR`.
    #[must_use]
    pub fn detect(no_color: bool, verbose: bool) -> Self {
        let interactive = io::stderr().is_terminal();
        Self {
            colors: interactive && !no_color,
            verbose,
            interactive,
        }
    }
}

/// CLI renderer that outputs events to stdout/stderr.
#[derive(Debug, Default)]
pub struct CliRenderer {
    config: CliRendererConfig,
    progress_line: Cell<bool>,
}

impl CliRenderer {
    /// Create a new CLI renderer with plain, non-verbose output.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new CLI renderer with the given configuration.
    #[must_use]
    pub fn with_config(config: CliRendererConfig) -> Self {
        Self {
            config,
            progress_line: Cell::new(false),
        }
    }

    /// Render events until the bus closes or a command completes.
    pub async fn run(self, mut receiver: EventReceiver) {
        while let Some(event) = receiver.recv().await {
            self.render(&event);
            if ends_command(&event) {
                break;
            }
        }
        self.clear_progress();
    }

    /// Render a single event.
    pub fn render(&self, event: &ToolpinEvent) {
        match &event.category {
            EventCategory::Tool(tool_event) => self.render_tool(tool_event),
            EventCategory::Command(cmd_event) => self.render_command(cmd_event),
            EventCategory::Output(output_event) => self.render_output(output_event),
        }
    }

    fn render_tool(&self, event: &ToolEvent) {
        if let ToolEvent::Progress { .. } = event {
            if let Some(line) = self.format_tool(event) {
                if self.config.interactive {
                    eprint!("\r\x1b[K{line}");
                    let _ = io::stderr().flush();
                    self.progress_line.set(true);
                } else {
                    eprintln!("{line}");
                }
            }
            return;
        }

        if let Some(line) = self.format_tool(event) {
            self.clear_progress();
            eprintln!("{line}");
        }
    }

    /// The line shown for a tool event, or `None` if it is not shown at
    /// this verbosity.
    #[must_use]
    pub fn format_tool(&self, event: &ToolEvent) -> Option<String> {
        let line = match event {
            ToolEvent::Queued { name, version } => {
                format!("{} {name} {version}: downloading", self.paint(DIM, "-"))
            }
            ToolEvent::Progress {
                name,
                version,
                percent,
            } => {
                if !self.config.interactive && !self.config.verbose {
                    return None;
                }
                format!("{} {name} {version}: {percent}%", self.paint(DIM, "-"))
            }
            ToolEvent::Verifying { name, version } => {
                if !self.config.verbose {
                    return None;
                }
                format!("{} {name} {version}: verifying", self.paint(DIM, "-"))
            }
            ToolEvent::Extracting { name, version } => {
                if !self.config.verbose {
                    return None;
                }
                format!("{} {name} {version}: extracting", self.paint(DIM, "-"))
            }
            ToolEvent::Linked {
                name,
                version,
                created,
            } => {
                let status = if *created { "link created" } else { "all good" };
                format!("{} {name} {version}: {status}", self.paint(GREEN, "✓"))
            }
            ToolEvent::Removed { name, version } => {
                format!("{} {name} {version}: link removed", self.paint(GREEN, "✓"))
            }
            ToolEvent::Unsupported { message, .. } => {
                format!("{} {message}", self.paint(YELLOW, "!"))
            }
            ToolEvent::Failed { name, version, .. } => {
                format!("{} {name} {version}: failed", self.paint(RED, "✗"))
            }
        };
        Some(line)
    }

    fn render_command(&self, event: &CommandEvent) {
        if !self.config.verbose {
            return;
        }
        self.clear_progress();
        match event {
            CommandEvent::Started { command, .. } => {
                eprintln!("Starting command: {command}");
            }
            CommandEvent::Completed {
                command,
                success,
                duration_ms,
            } => {
                let status = if *success { "completed" } else { "failed" };
                eprintln!("Command {command} {status} in {duration_ms}ms");
            }
        }
    }

    fn render_output(&self, event: &OutputEvent) {
        self.clear_progress();
        match event {
            OutputEvent::Stdout { content } => println!("{content}"),
            OutputEvent::Stderr { content } => eprintln!("{content}"),
        }
    }

    fn clear_progress(&self) {
        if self.progress_line.replace(false) {
            eprint!("\r\x1b[K");
            let _ = io::stderr().flush();
        }
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.config.colors {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventSource;
    use uuid::Uuid;

    fn tool(name: &str) -> (String, String) {
        (name.to_string(), "0.19.1".to_string())
    }

    fn plain() -> CliRenderer {
        CliRenderer::new()
    }

    fn verbose() -> CliRenderer {
        CliRenderer::with_config(CliRendererConfig {
            verbose: true,
            ..CliRendererConfig::default()
        })
    }

    #[test]
    fn test_linked_lines() {
        let (name, version) = tool("elm");
        let created = ToolEvent::Linked {
            name: name.clone(),
            version: version.clone(),
            created: true,
        };
        let kept = ToolEvent::Linked {
            name,
            version,
            created: false,
        };
        assert_eq!(
            plain().format_tool(&created).as_deref(),
            Some("✓ elm 0.19.1: link created")
        );
        assert_eq!(
            plain().format_tool(&kept).as_deref(),
            Some("✓ elm 0.19.1: all good")
        );
    }

    #[test]
    fn test_failed_and_removed_lines() {
        let (name, version) = tool("elm-format");
        let failed = ToolEvent::Failed {
            name: name.clone(),
            version: version.clone(),
            error: "404".to_string(),
        };
        let removed = ToolEvent::Removed { name, version };
        assert_eq!(
            plain().format_tool(&failed).as_deref(),
            Some("✗ elm-format 0.19.1: failed")
        );
        assert_eq!(
            plain().format_tool(&removed).as_deref(),
            Some("✓ elm-format 0.19.1: link removed")
        );
    }

    #[test]
    fn test_unsupported_shows_message() {
        let event = ToolEvent::Unsupported {
            name: "elm".to_string(),
            version: "0.19.0".to_string(),
            message: "elm 0.19.0: not available for linux-arm64".to_string(),
        };
        assert_eq!(
            plain().format_tool(&event).as_deref(),
            Some("! elm 0.19.0: not available for linux-arm64")
        );
    }

    #[test]
    fn test_quiet_events_need_verbose() {
        let (name, version) = tool("elm");
        let verifying = ToolEvent::Verifying {
            name: name.clone(),
            version: version.clone(),
        };
        let progress = ToolEvent::Progress {
            name,
            version,
            percent: 50,
        };
        assert!(plain().format_tool(&verifying).is_none());
        assert!(plain().format_tool(&progress).is_none());
        assert_eq!(
            verbose().format_tool(&verifying).as_deref(),
            Some("- elm 0.19.1: verifying")
        );
        assert_eq!(
            verbose().format_tool(&progress).as_deref(),
            Some("- elm 0.19.1: 50%")
        );
    }

    #[test]
    fn test_interactive_shows_progress() {
        let renderer = CliRenderer::with_config(CliRendererConfig {
            interactive: true,
            ..CliRendererConfig::default()
        });
        let event = ToolEvent::Progress {
            name: "elm".to_string(),
            version: "0.19.1".to_string(),
            percent: 7,
        };
        assert_eq!(
            renderer.format_tool(&event).as_deref(),
            Some("- elm 0.19.1: 7%")
        );
    }

    #[test]
    fn test_colors_wrap_marks() {
        let renderer = CliRenderer::with_config(CliRendererConfig {
            colors: true,
            ..CliRendererConfig::default()
        });
        let event = ToolEvent::Removed {
            name: "elm".to_string(),
            version: "0.19.1".to_string(),
        };
        assert_eq!(
            renderer.format_tool(&event).as_deref(),
            Some("\x1b[32m✓\x1b[0m elm 0.19.1: link removed")
        );
    }

    #[test]
    fn test_detect_respects_no_color() {
        let config = CliRendererConfig::detect(true, false);
        assert!(!config.colors);
    }

    #[test]
    fn test_render_does_not_panic() {
        let renderer = verbose();
        for category in [
            EventCategory::Command(CommandEvent::Started {
                command: "install".to_string(),
                args: vec![],
            }),
            EventCategory::Output(OutputEvent::Stderr {
                content: "line".to_string(),
            }),
            EventCategory::Command(CommandEvent::Completed {
                command: "install".to_string(),
                success: true,
                duration_ms: 12,
            }),
        ] {
            renderer.render(&ToolpinEvent::new(
                Uuid::nil(),
                EventSource::new("toolpin::command"),
                category,
            ));
        }
    }
}
