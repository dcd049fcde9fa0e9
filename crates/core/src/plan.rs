//! Classification of requested tools into an install plan.
//!
//! Each `(name, range)` request is resolved against the [`Catalog`] and the
//! install root on disk and ends up in exactly one place: `existing`,
//! `missing`, `unsupported`, or the error list.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use crate::catalog::{AssetDescriptor, Catalog};
use crate::platform::Platform;
use crate::version::VersionRange;
use crate::{Error, Result};

/// A tool pinned to one version with a concrete asset and target path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTool {
    /// Tool name.
    pub name: String,
    /// Exact version.
    pub version: String,
    /// `<install root>/<name>/<version>/<file name>`.
    pub target_path: PathBuf,
    /// What to download.
    pub asset: AssetDescriptor,
}

impl ResolvedTool {
    /// Derive the target path for an asset under `install_root`.
    #[must_use]
    pub fn new(
        install_root: &Path,
        name: impl Into<String>,
        version: impl Into<String>,
        asset: AssetDescriptor,
    ) -> Self {
        let name = name.into();
        let version = version.into();
        let target_path = install_root
            .join(&name)
            .join(&version)
            .join(&asset.file_name);
        Self {
            name,
            version,
            target_path,
            asset,
        }
    }

    /// Display label `name version`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} {}", self.name, self.version)
    }
}

/// A tool version the catalog has, but not for the current platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedTool {
    /// Tool name.
    pub name: String,
    /// Resolved version.
    pub version: String,
    /// The platform that has no build.
    pub platform: Platform,
    /// Platforms the resolved version does support.
    pub supported_platforms: Vec<Platform>,
    /// Other versions of the tool that support `platform`, newest first.
    pub alternatives: Vec<String>,
}

impl fmt::Display for UnsupportedTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: not available for {}",
            self.name, self.version, self.platform
        )?;
        if !self.supported_platforms.is_empty() {
            let platforms: Vec<String> = self
                .supported_platforms
                .iter()
                .map(ToString::to_string)
                .collect();
            write!(f, " (only {})", platforms.join(", "))?;
        }
        if self.alternatives.is_empty() {
            write!(f, ". No version of {} supports {}", self.name, self.platform)
        } else {
            write!(
                f,
                ". Versions that do: {}",
                self.alternatives.join(", ")
            )
        }
    }
}

/// Result of resolving a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The catalog has an asset for this platform.
    Supported(ResolvedTool),
    /// The resolved version has no build for this platform.
    Unsupported(UnsupportedTool),
}

/// A classification failure for one requested tool.
#[derive(Debug)]
pub struct ToolError {
    /// The requested tool name.
    pub name: String,
    /// What went wrong.
    pub error: Error,
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.error)
    }
}

/// Requested tools split by what needs to happen to them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallPlan {
    /// Target file already on disk; only needs linking.
    pub existing: Vec<ResolvedTool>,
    /// Needs download, verification and extraction before linking.
    pub missing: Vec<ResolvedTool>,
    /// No build for this platform; never downloaded.
    pub unsupported: Vec<UnsupportedTool>,
}

impl InstallPlan {
    /// Whether `name` was requested and classified.
    #[must_use]
    pub fn mentions(&self, name: &str) -> bool {
        self.existing.iter().any(|t| t.name == name)
            || self.missing.iter().any(|t| t.name == name)
            || self.unsupported.iter().any(|t| t.name == name)
    }
}

/// Resolve one request to a concrete tool for `platform`.
///
/// # Errors
///
/// Returns [`Error::UnknownTool`], [`Error::MalformedRange`] or
/// [`Error::NoMatchingVersion`].
pub fn resolve_tool(
    catalog: &Catalog,
    install_root: &Path,
    platform: Platform,
    name: &str,
    range: &str,
) -> Result<Resolution> {
    if !catalog.contains(name) {
        let known = catalog.tool_names().map(str::to_string).collect();
        return Err(Error::unknown_tool(name, known));
    }

    let range = VersionRange::parse(range)?;
    let versions = catalog.versions(name);
    let version = range
        .resolve(&versions)
        .ok_or_else(|| Error::no_matching_version(name, range.to_string(), &versions))?;

    if let Some(asset) = catalog.asset(name, version, platform) {
        return Ok(Resolution::Supported(ResolvedTool::new(
            install_root,
            name,
            version,
            asset.clone(),
        )));
    }

    let alternatives = versions
        .iter()
        .filter(|v| **v != version && catalog.asset(name, v, platform).is_some())
        .map(|v| (*v).to_string())
        .collect();
    Ok(Resolution::Unsupported(UnsupportedTool {
        name: name.to_string(),
        version: version.to_string(),
        platform,
        supported_platforms: catalog.platforms(name, version),
        alternatives,
    }))
}

/// Whether a resolved tool's executable is already on disk.
///
/// # Errors
///
/// Returns [`Error::NotAFile`] when something other than a regular file is at
/// the target path, and [`Error::Io`] when it cannot be inspected.
pub fn is_installed(tool: &ResolvedTool) -> Result<bool> {
    match std::fs::metadata(&tool.target_path) {
        Ok(metadata) if metadata.is_file() => Ok(true),
        Ok(_) => Err(Error::NotAFile {
            path: tool.target_path.clone(),
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::io(e, &tool.target_path, "stat")),
    }
}

/// Classify every request into an [`InstallPlan`] plus per-tool errors.
pub fn classify<'a, I>(
    catalog: &Catalog,
    install_root: &Path,
    platform: Platform,
    requests: I,
) -> (InstallPlan, Vec<ToolError>)
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut plan = InstallPlan::default();
    let mut errors = Vec::new();

    for (name, range) in requests {
        let classified = resolve_tool(catalog, install_root, platform, name, range).and_then(
            |resolution| match resolution {
                Resolution::Unsupported(tool) => {
                    plan.unsupported.push(tool);
                    Ok(())
                }
                Resolution::Supported(tool) => {
                    if is_installed(&tool)? {
                        plan.existing.push(tool);
                    } else {
                        plan.missing.push(tool);
                    }
                    Ok(())
                }
            },
        );
        if let Err(error) = classified {
            tracing::debug!(tool = name, %error, "Failed to classify tool");
            errors.push(ToolError {
                name: name.to_string(),
                error,
            });
        }
    }

    tracing::debug!(
        existing = plan.existing.len(),
        missing = plan.missing.len(),
        unsupported = plan.unsupported.len(),
        errors = errors.len(),
        "Classified requested tools"
    );
    (plan, errors)
}
