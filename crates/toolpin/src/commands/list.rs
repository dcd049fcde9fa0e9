//! `toolpin list`: print the catalog.

use crate::errors::{CliError, EXIT_OK};
use toolpin_core::Catalog;
use toolpin_events::emit_stdout;

/// One line per catalog entry: `name version: platform, platform`.
///
/// # Errors
///
/// Fails only if the built-in catalog does not parse.
pub fn execute() -> Result<i32, CliError> {
    for line in lines(Catalog::builtin()?) {
        emit_stdout!(line);
    }
    Ok(EXIT_OK)
}

fn lines(catalog: &Catalog) -> Vec<String> {
    catalog
        .entries()
        .map(|(name, version)| {
            let platforms: Vec<String> = catalog
                .platforms(name, version)
                .iter()
                .map(ToString::to_string)
                .collect();
            format!("{name} {version}: {}", platforms.join(", "))
        })
        .collect()
}
