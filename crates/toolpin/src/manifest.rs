//! Loading `toolpin.json`.
//!
//! ```json
//! { "tools": { "elm": "0.19.1", "elm-format": "^0.8.5" } }
//! ```
//!
//! Only `tools` is read; other fields are ignored. A bare `X.Y.Z` pins that
//! exact version.

use crate::errors::CliError;
use miette::{NamedSource, SourceSpan};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Parsed manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Manifest {
    /// Tool name to version range.
    #[serde(default)]
    pub tools: BTreeMap<String, String>,
}

impl Manifest {
    /// Parse manifest text. `name` is used in diagnostics.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::ManifestParse`] pointing at the offending position.
    pub fn parse(name: &str, source: &str) -> Result<Self, CliError> {
        serde_json::from_str(source).map_err(|e| CliError::ManifestParse {
            message: e.to_string(),
            span: SourceSpan::from((offset_of(source, e.line(), e.column()), 0)),
            src: NamedSource::new(name, source.to_string()),
        })
    }

    /// Read and parse the manifest at `path`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file cannot be read, or a parse
    /// error if it is malformed.
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            CliError::config(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::parse(&path.display().to_string(), &source)
    }

    /// `(name, range)` requests with bare versions turned into exact pins.
    #[must_use]
    pub fn requests(&self) -> Vec<(String, String)> {
        self.tools
            .iter()
            .map(|(name, range)| (name.clone(), normalize_range(range)))
            .collect()
    }
}

/// `0.19.1` becomes `=0.19.1`; anything else is left alone.
#[must_use]
pub fn normalize_range(range: &str) -> String {
    let range = range.trim();
    if range.starts_with(|c: char| c.is_ascii_digit()) {
        format!("={range}")
    } else {
        range.to_string()
    }
}

/// The project directory for a manifest path.
#[must_use]
pub fn project_dir(manifest: &Path) -> PathBuf {
    manifest
        .parent()
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Byte offset of a 1-based line and column.
fn offset_of(source: &str, line: usize, column: usize) -> usize {
    let start: usize = source
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    (start + column.saturating_sub(1)).min(source.len())
}
