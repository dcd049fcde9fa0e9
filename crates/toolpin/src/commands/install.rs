//! `toolpin install`: reconcile the project's bin directory with its manifest.

use crate::cli::Cli;
use crate::errors::CliError;
use crate::manifest::{self, Manifest};
use std::path::Path;
use toolpin_core::{Catalog, Platform, paths};
use toolpin_events::emit_stderr;
use toolpin_install::Installer;

/// Install every tool named in the nearest `toolpin.json`.
///
/// # Errors
///
/// Fails without touching the disk when the manifest is missing or invalid,
/// or when any requested tool cannot be resolved.
pub async fn execute(cli: &Cli) -> Result<i32, CliError> {
    let cwd = std::env::current_dir()
        .map_err(|e| CliError::config(format!("Failed to read the current directory: {e}")))?;
    let manifest_path = paths::find_manifest(&cwd).ok_or_else(|| {
        CliError::config_with_help(
            format!(
                "No {} found in {} or any parent directory",
                paths::MANIFEST_FILE,
                cwd.display()
            ),
            format!(
                "Create {} with an object like {{\"tools\": {{\"elm\": \"0.19.1\"}}}}",
                paths::MANIFEST_FILE
            ),
        )
    })?;
    let manifest = Manifest::load(&manifest_path)?;
    let project = manifest::project_dir(&manifest_path);

    run(
        Catalog::builtin()?,
        &paths::install_root_in(&super::home(cli)?),
        Platform::current()?,
        &manifest,
        &project,
    )
    .await
}

/// Plan and install `manifest` into `project`'s bin directory.
///
/// # Errors
///
/// Returns a configuration error listing every request that failed to
/// resolve, or a fatal install error.
pub async fn run(
    catalog: &Catalog,
    install_root: &Path,
    platform: Platform,
    manifest: &Manifest,
    project: &Path,
) -> Result<i32, CliError> {
    let requests = manifest.requests();
    let installer = Installer::new(catalog, install_root, platform);
    let (plan, errors) =
        installer.plan(requests.iter().map(|(name, range)| (name.as_str(), range.as_str())));

    if !errors.is_empty() {
        let lines: Vec<String> = errors.iter().map(ToString::to_string).collect();
        return Err(CliError::config_with_help(
            format!("Could not resolve the tools in toolpin.json:\n{}", lines.join("\n")),
            "Run `toolpin list` to see every known tool and version",
        ));
    }

    tracing::debug!(
        existing = plan.existing.len(),
        missing = plan.missing.len(),
        unsupported = plan.unsupported.len(),
        "Install plan ready"
    );

    let report = installer.install(&plan, &paths::bin_dir(project)).await?;
    for failure in &report.failures {
        emit_stderr!(format!("\n{failure}"));
    }
    Ok(report.exit_code())
}
