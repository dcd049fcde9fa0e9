//! `toolpin which`: print a tool's executable path.

use crate::cli::Cli;
use crate::errors::{CliError, EXIT_OK};
use crate::manifest::normalize_range;
use toolpin_core::{Catalog, Platform, paths};
use toolpin_events::emit_stdout;
use toolpin_install::Installer;

/// Download `name` if needed and print where its executable lives. No link
/// is created.
///
/// # Errors
///
/// Fails if the tool cannot be resolved, has no build for this platform, or
/// cannot be downloaded.
pub async fn execute(cli: &Cli, name: &str, range: &str) -> Result<i32, CliError> {
    let catalog = Catalog::builtin()?;
    let installer = Installer::new(
        catalog,
        paths::install_root_in(&super::home(cli)?),
        Platform::current()?,
    );
    let path = installer
        .get_executable(name, &normalize_range(range))
        .await?;
    emit_stdout!(path.display());
    Ok(EXIT_OK)
}
