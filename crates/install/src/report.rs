//! Aggregated outcome of one install run.

use crate::error::Error;
use crate::link::LinkOutcome;
use std::fmt;
use std::path::PathBuf;

/// A tool that could not be installed, linked or unlinked.
#[derive(Debug)]
pub struct ToolFailure {
    /// Tool name.
    pub name: String,
    /// Resolved version.
    pub version: String,
    /// Where the executable was going.
    pub target_path: PathBuf,
    /// Where it was coming from.
    pub url: String,
    /// What went wrong.
    pub error: Error,
}

impl fmt::Display for ToolFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}", self.name, self.version)?;
        writeln!(f, "to: {}", self.target_path.display())?;
        writeln!(f, "from: {}", self.url)?;
        write!(f, "{}", self.error)
    }
}

/// What happened to a tool whose link was touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutcome {
    /// Tool name.
    pub name: String,
    /// Resolved version.
    pub version: String,
    /// What the linker did.
    pub link: LinkOutcome,
}

/// Per-tool results of a run. The run succeeded iff `failures` is empty.
#[derive(Debug, Default)]
pub struct InstallReport {
    /// One human-readable line per completed step, in completion order.
    pub messages: Vec<String>,
    /// Every per-tool failure.
    pub failures: Vec<ToolFailure>,
    /// Link results for tools that were linked or unlinked.
    pub outcomes: Vec<ToolOutcome>,
}

impl InstallReport {
    /// Whether every tool succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Process exit status for this run.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        i32::from(!self.is_success())
    }

    /// The link outcome recorded for `name`, if any.
    #[must_use]
    pub fn outcome(&self, name: &str) -> Option<LinkOutcome> {
        self.outcomes
            .iter()
            .find(|outcome| outcome.name == name)
            .map(|outcome| outcome.link)
    }

    pub(crate) fn record(&mut self, name: &str, version: &str, link: LinkOutcome) {
        self.messages.push(format!("{name} {version}: {link}"));
        self.outcomes.push(ToolOutcome {
            name: name.to_string(),
            version: version.to_string(),
            link,
        });
    }
}

impl fmt::Display for InstallReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for message in &self.messages {
            writeln!(f, "{message}")?;
        }
        for failure in &self.failures {
            writeln!(f)?;
            writeln!(f, "{failure}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure() -> ToolFailure {
        ToolFailure {
            name: "elm-format".to_string(),
            version: "0.8.7".to_string(),
            target_path: PathBuf::from("/home/u/.toolpin/tools/elm-format/0.8.7/elm-format"),
            url: "https://example.test/elm-format.tgz".to_string(),
            error: Error::HttpStatus {
                command: "GET https://example.test/elm-format.tgz".to_string(),
                status: 404,
            },
        }
    }

    #[test]
    fn test_empty_report_succeeds() {
        let report = InstallReport::default();
        assert!(report.is_success());
        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.to_string(), "");
    }

    #[test]
    fn test_failure_block() {
        assert_eq!(
            failure().to_string(),
            "elm-format 0.8.7\n\
             to: /home/u/.toolpin/tools/elm-format/0.8.7/elm-format\n\
             from: https://example.test/elm-format.tgz\n\
             GET https://example.test/elm-format.tgz returned HTTP 404"
        );
    }

    #[test]
    fn test_messages_then_failures() {
        let mut report = InstallReport::default();
        report.record("elm", "0.19.1", LinkOutcome::Created);
        report.failures.push(failure());

        assert_eq!(report.exit_code(), 1);
        assert_eq!(report.outcome("elm"), Some(LinkOutcome::Created));
        let text = report.to_string();
        assert!(text.starts_with("elm 0.19.1: link created\n\nelm-format 0.8.7\n"));
    }
}
