//! Tests for error types

use miette::Diagnostic;
use std::path::{Path, PathBuf};
use toolpin_core::Error;

#[test]
fn test_configuration_error() {
    let error = Error::configuration("manifest is invalid");
    assert_eq!(error.to_string(), "Configuration error: manifest is invalid");
}

#[test]
fn test_unknown_tool_lists_known_tools() {
    let error = Error::unknown_tool("elmo", vec!["elm".into(), "elm-format".into()]);
    assert_eq!(error.to_string(), "Unknown tool 'elmo'");
    let help = error.help().map(|h| h.to_string());
    assert_eq!(help.as_deref(), Some("Known tools: elm, elm-format"));
}

#[test]
fn test_no_matching_version_lists_versions() {
    let error = Error::no_matching_version("elm", "^0.20.0", &["0.19.1", "0.19.0"]);
    assert_eq!(error.to_string(), "No version of 'elm' matches '^0.20.0'");
    let help = error.help().map(|h| h.to_string());
    assert_eq!(help.as_deref(), Some("Known versions: 0.19.1, 0.19.0"));
}

#[test]
fn test_malformed_range() {
    let error = Error::malformed_range("latest");
    assert_eq!(error.to_string(), "Malformed version range 'latest'");
    assert!(error.help().is_some());
}

#[test]
fn test_unsupported_platform() {
    let error = Error::unsupported_platform("freebsd", "x86_64");
    assert_eq!(error.to_string(), "Unsupported platform: freebsd-x86_64");
}

#[test]
fn test_not_a_file() {
    let error = Error::NotAFile {
        path: PathBuf::from("/tools/elm/0.19.1/elm"),
    };
    assert_eq!(
        error.to_string(),
        "Expected a file at /tools/elm/0.19.1/elm, found something else"
    );
}

#[test]
fn test_io_error() {
    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let error = Error::io(io, Path::new("/tools"), "create directory");
    assert_eq!(
        error.to_string(),
        "I/O error during create directory (/tools): denied"
    );
    assert!(std::error::Error::source(&error).is_some());
}

#[test]
fn test_diagnostic_codes() {
    let code = |e: &Error| e.code().map(|c| c.to_string());
    assert_eq!(
        code(&Error::malformed_range("x")).as_deref(),
        Some("toolpin::version::malformed")
    );
    assert_eq!(
        code(&Error::catalog("x")).as_deref(),
        Some("toolpin::catalog::invalid")
    );
}
