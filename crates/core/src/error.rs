//! Error types for catalog lookup, version resolution and install planning.

use miette::Diagnostic;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main error type for toolpin-core operations.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// The requested tool is not in the catalog.
    #[error("Unknown tool '{name}'")]
    #[diagnostic(code(toolpin::tool::unknown))]
    UnknownTool {
        /// The requested tool name.
        name: String,
        /// Every tool name the catalog knows about.
        known: Vec<String>,
        /// Rendered list of known tools for the user.
        #[help]
        help: String,
    },

    /// A version range did not match `<sign><major>.<minor>.<patch>[-prerelease]`.
    #[error("Malformed version range '{range}'")]
    #[diagnostic(
        code(toolpin::version::malformed),
        help("Use one of =1.2.3, ~1.2.3 or ^1.2.3 (optionally with a -prerelease suffix)")
    )]
    MalformedRange {
        /// The offending range expression.
        range: String,
    },

    /// No known version satisfies the range.
    #[error("No version of '{name}' matches '{range}'")]
    #[diagnostic(code(toolpin::version::no_match))]
    NoMatchingVersion {
        /// The tool name.
        name: String,
        /// The requested range.
        range: String,
        /// Rendered list of known versions for the user.
        #[help]
        help: String,
    },

    /// The host is not one of the platforms toolpin ships binaries for.
    #[error("Unsupported platform: {os}-{arch}")]
    #[diagnostic(
        code(toolpin::platform::unsupported),
        help("toolpin ships binaries for linux, darwin and windows on x64 and arm64")
    )]
    UnsupportedPlatform {
        /// The host operating system as reported by Rust.
        os: String,
        /// The host architecture as reported by Rust.
        arch: String,
    },

    /// Something other than a regular file occupies a tool's target path.
    #[error("Expected a file at {}, found something else", path.display())]
    #[diagnostic(
        code(toolpin::fs::not_a_file),
        help("Remove whatever is at that path and try again")
    )]
    NotAFile {
        /// The conflicting path.
        path: PathBuf,
    },

    /// The compiled-in or supplied catalog could not be parsed.
    #[error("Invalid catalog: {message}")]
    #[diagnostic(code(toolpin::catalog::invalid))]
    Catalog {
        /// What was wrong with the catalog.
        message: String,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    #[diagnostic(code(toolpin::config::invalid))]
    Configuration {
        /// The error message describing the configuration issue.
        message: String,
    },

    /// I/O error with path context.
    #[error("I/O error during {operation} ({}): {source}", path.display())]
    #[diagnostic(code(toolpin::io::error))]
    Io {
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
        /// The path where the I/O error occurred.
        path: Box<Path>,
        /// Description of the operation that failed.
        operation: String,
    },
}

impl Error {
    /// Create an unknown tool error listing the known tools.
    pub fn unknown_tool(name: impl Into<String>, known: Vec<String>) -> Self {
        let help = format!("Known tools: {}", known.join(", "));
        Self::UnknownTool {
            name: name.into(),
            known,
            help,
        }
    }

    /// Create a malformed range error.
    pub fn malformed_range(range: impl Into<String>) -> Self {
        Self::MalformedRange {
            range: range.into(),
        }
    }

    /// Create a no matching version error listing the known versions.
    pub fn no_matching_version(
        name: impl Into<String>,
        range: impl Into<String>,
        known: &[&str],
    ) -> Self {
        Self::NoMatchingVersion {
            name: name.into(),
            range: range.into(),
            help: format!("Known versions: {}", known.join(", ")),
        }
    }

    /// Create an unsupported platform error.
    pub fn unsupported_platform(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self::UnsupportedPlatform {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// Create a catalog error.
    pub fn catalog(message: impl Into<String>) -> Self {
        Self::Catalog {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an I/O error with context.
    pub fn io(source: std::io::Error, path: &Path, operation: impl Into<String>) -> Self {
        Self::Io {
            source,
            path: path.into(),
            operation: operation.into(),
        }
    }
}

/// Result type for toolpin-core operations.
pub type Result<T> = std::result::Result<T, Error>;
