//! Error types for downloading, verifying, extracting and linking tools.

use miette::Diagnostic;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main error type for toolpin-install operations.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// Catalog, resolution or classification error.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Core(#[from] toolpin_core::Error),

    /// The resolved version has no build for this platform.
    #[error("{message}")]
    #[diagnostic(code(toolpin::tool::unsupported))]
    Unsupported {
        /// Explanation including alternatives.
        message: String,
    },

    /// A download program exists but could not be started.
    #[error("Failed to start `{command}`: {source}")]
    #[diagnostic(code(toolpin::download::spawn))]
    Spawn {
        /// The command line that was attempted.
        command: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// None of the configured download mechanisms is available.
    #[error("No download program available (tried: {})", tried.join(", "))]
    #[diagnostic(
        code(toolpin::download::unavailable),
        help("Install curl or wget, or enable the built-in HTTP client")
    )]
    NoDownloader {
        /// Programs that were not found.
        tried: Vec<String>,
    },

    /// A download process exited unsuccessfully.
    #[error("`{command}` exited with {status}{}", stderr_suffix(stderr))]
    #[diagnostic(
        code(toolpin::download::failed),
        help("Check proxy settings and any .curlrc or .wgetrc that may change the request")
    )]
    DownloadFailed {
        /// The command line that was run.
        command: String,
        /// Exit status description.
        status: String,
        /// Tail of the process's stderr.
        stderr: String,
    },

    /// Reading a download program's output failed.
    #[error("Failed to read output of `{command}`: {source}")]
    #[diagnostic(code(toolpin::download::stream))]
    Stream {
        /// The command line that was run.
        command: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The server answered with a non-success status.
    #[error("{command} returned HTTP {status}")]
    #[diagnostic(code(toolpin::download::status))]
    HttpStatus {
        /// The request that was made.
        command: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The redirect chain exceeded the limit.
    #[error("{command} followed too many redirects")]
    #[diagnostic(code(toolpin::download::redirects))]
    TooManyRedirects {
        /// The request that was made.
        command: String,
    },

    /// The built-in HTTP client failed.
    #[error("{command} failed: {source}")]
    #[diagnostic(code(toolpin::download::http))]
    Http {
        /// The request that was made.
        command: String,
        /// The underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// Downloaded byte count differs from the catalog.
    #[error(
        "Size mismatch for {command}: expected {expected} bytes, got {actual} bytes"
    )]
    #[diagnostic(
        code(toolpin::verify::size),
        help("The download may have been truncated or tampered with; nothing was installed")
    )]
    SizeMismatch {
        /// The command or request that fetched the bytes.
        command: String,
        /// Size recorded in the catalog.
        expected: u64,
        /// Size actually received.
        actual: u64,
    },

    /// Downloaded SHA-256 differs from the catalog.
    #[error("Hash mismatch for {command}: expected sha256 {expected}, got {actual}")]
    #[diagnostic(
        code(toolpin::verify::hash),
        help("The download may have been tampered with; nothing was installed")
    )]
    HashMismatch {
        /// The command or request that fetched the bytes.
        command: String,
        /// Digest recorded in the catalog.
        expected: String,
        /// Digest of the received bytes.
        actual: String,
    },

    /// gzip decompression failed.
    #[error("Failed to decompress into {}: {source}", path.display())]
    #[diagnostic(code(toolpin::extract::gzip))]
    Decompress {
        /// Destination file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The archive program is not installed.
    #[error("`{program}` is required to extract this archive but was not found")]
    #[diagnostic(
        code(toolpin::extract::missing_tool),
        help("Install `{program}` and make sure it is on your PATH")
    )]
    ArchiveToolMissing {
        /// The program name.
        program: String,
    },

    /// The archive program exited unsuccessfully.
    #[error("`{command}` exited with {status}{}", stderr_suffix(stderr))]
    #[diagnostic(code(toolpin::extract::failed))]
    ExtractFailed {
        /// The command line that was run.
        command: String,
        /// Exit status description.
        status: String,
        /// Tail of the process's stderr.
        stderr: String,
    },

    /// The archive did not contain the expected file.
    #[error("Archive did not contain `{entry}`")]
    #[diagnostic(code(toolpin::extract::entry_missing))]
    EntryMissing {
        /// Expected entry name.
        entry: String,
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

    /// An error followed by a failure while cleaning up after it.
    #[error("{error}\n\nAdditionally, cleanup failed: {cleanup}")]
    #[diagnostic(code(toolpin::cleanup))]
    WithCleanup {
        /// The original failure.
        #[source]
        error: Box<Error>,
        /// The cleanup failure.
        cleanup: Box<Error>,
    },
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(":\n{trimmed}")
    }
}

impl Error {
    /// Create an I/O error with context.
    pub fn io(source: std::io::Error, path: &Path, operation: impl Into<String>) -> Self {
        Self::Io {
            source,
            path: path.into(),
            operation: operation.into(),
        }
    }

    /// Create an unsupported-platform error for one tool.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }

    /// Append the outcome of a cleanup step to this error.
    ///
    /// A successful cleanup leaves the error unchanged.
    #[must_use]
    pub fn with_cleanup(self, cleanup: Result<()>) -> Self {
        match cleanup {
            Ok(()) => self,
            Err(cleanup) => Self::WithCleanup {
                error: Box::new(self),
                cleanup: Box::new(cleanup),
            },
        }
    }
}

/// Result type for toolpin-install operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_cleanup_keeps_both_errors() {
        let original = Error::HashMismatch {
            command: "GET https://example.test/elm.gz".to_string(),
            expected: "aa".to_string(),
            actual: "bb".to_string(),
        };
        let cleanup = Error::io(
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            Path::new("/tools/elm"),
            "remove partial file",
        );

        let combined = original.with_cleanup(Err(cleanup));
        let text = combined.to_string();
        assert!(text.starts_with("Hash mismatch for GET https://example.test/elm.gz"));
        assert!(text.contains("Additionally, cleanup failed: I/O error during remove partial file"));
    }

    #[test]
    fn test_with_cleanup_success_is_identity() {
        let error = Error::unsupported("nope").with_cleanup(Ok(()));
        assert!(matches!(error, Error::Unsupported { .. }));
    }

    #[test]
    fn test_process_errors_include_stderr() {
        let error = Error::DownloadFailed {
            command: "curl -#fL https://example.test/x".to_string(),
            status: "exit status: 22".to_string(),
            stderr: "curl: (22) The requested URL returned error: 404\n".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "`curl -#fL https://example.test/x` exited with exit status: 22:\n\
             curl: (22) The requested URL returned error: 404"
        );

        let quiet = Error::ExtractFailed {
            command: "tar zxf -".to_string(),
            status: "exit status: 2".to_string(),
            stderr: "  ".to_string(),
        };
        assert_eq!(quiet.to_string(), "`tar zxf -` exited with exit status: 2");
    }

    #[test]
    fn test_size_and_hash_mismatch_are_distinct() {
        let size = Error::SizeMismatch {
            command: "GET u".to_string(),
            expected: 10,
            actual: 9,
        };
        assert_eq!(
            size.to_string(),
            "Size mismatch for GET u: expected 10 bytes, got 9 bytes"
        );
    }

    #[test]
    fn test_missing_archive_tool_names_program() {
        use miette::Diagnostic;
        let error = Error::ArchiveToolMissing {
            program: "tar".to_string(),
        };
        assert!(error.to_string().contains("`tar`"));
        let help = error.help().map(|h| h.to_string()).unwrap_or_default();
        assert!(help.contains("PATH"));
    }
}
