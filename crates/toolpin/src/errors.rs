//! CLI errors and exit codes.

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;
use toolpin_events::emit_stderr;

/// Exit code for success.
pub const EXIT_OK: i32 = 0;
/// Exit code for any failure.
pub const EXIT_FAILURE: i32 = 1;

/// Errors surfaced by CLI commands.
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// Manifest or argument problem.
    #[error("{message}")]
    #[diagnostic(code(toolpin::cli::config))]
    Config {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },

    /// The manifest is not valid JSON of the expected shape.
    #[error("Invalid manifest: {message}")]
    #[diagnostic(
        code(toolpin::manifest::parse),
        help("Expected an object like {{\"tools\": {{\"elm\": \"0.19.1\"}}}}")
    )]
    ManifestParse {
        /// Parser message
        message: String,
        /// The manifest text
        #[source_code]
        src: NamedSource<String>,
        /// Where the parser stopped
        #[label("here")]
        span: SourceSpan,
    },

    /// Catalog, resolution or platform error.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Core(#[from] toolpin_core::Error),

    /// Download, extraction or link error.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Install(#[from] toolpin_install::Error),

    /// Tracing or runtime setup failed.
    #[error("{message}")]
    #[diagnostic(code(toolpin::cli::other))]
    Other {
        /// The error message
        message: String,
    },
}

impl CliError {
    /// Create a new configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    /// Create a new configuration error with help text.
    #[must_use]
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a new other error.
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}

/// Exit code for an error. Every failure maps to `1`.
#[must_use]
pub const fn exit_code_for(_err: &CliError) -> i32 {
    EXIT_FAILURE
}

/// Send an error to the renderer: a full diagnostic for humans, a one-line
/// message in JSON mode.
pub fn render_error(err: CliError, json_mode: bool) {
    if json_mode {
        emit_stderr!(err);
    } else {
        emit_stderr!(format!("{:?}", miette::Report::new(err)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_help() {
        let err = CliError::config_with_help("No toolpin.json found", "Create one");
        assert_eq!(err.to_string(), "No toolpin.json found");
        assert_eq!(
            err.help().map(|h| h.to_string()).as_deref(),
            Some("Create one")
        );
        assert_eq!(exit_code_for(&err), EXIT_FAILURE);
    }

    #[test]
    fn test_wrapped_errors_keep_their_diagnostics() {
        let err: CliError = toolpin_core::Error::malformed_range("0.19").into();
        let code = err.code().map(|c| c.to_string());
        assert!(code.is_some_and(|c| c.starts_with("toolpin::")));
        assert!(err.to_string().contains("0.19"));
    }
}
