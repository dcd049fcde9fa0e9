//! The compiled-in tool catalog.
//!
//! The catalog maps tool name → version → platform → [`AssetDescriptor`].
//! It is parsed from `catalog.toml` once per process and never changes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use crate::platform::Platform;
use crate::version::sort_newest_first;
use crate::{Error, Result};

const BUILTIN_TOML: &str = include_str!("catalog.toml");

static BUILTIN: LazyLock<std::result::Result<Catalog, String>> =
    LazyLock::new(|| Catalog::from_toml(BUILTIN_TOML).map_err(|e| e.to_string()));

/// Container format of a downloaded asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveKind {
    /// A single gzip-compressed executable.
    Gz,
    /// A gzip-compressed tarball holding the executable.
    Tgz,
    /// A zip archive holding the executable.
    Zip,
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gz => write!(f, "gz"),
            Self::Tgz => write!(f, "tgz"),
            Self::Zip => write!(f, "zip"),
        }
    }
}

/// Download descriptor for one (tool, version, platform) triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssetDescriptor {
    /// Lowercase hex SHA-256 of the downloaded bytes (before extraction).
    pub hash: String,
    /// Remote URL.
    pub url: String,
    /// Exact size in bytes of the download.
    pub file_size: u64,
    /// Name of the executable, both inside the archive and on disk.
    pub file_name: String,
    /// Container format.
    pub archive: ArchiveKind,
}

impl AssetDescriptor {
    fn validate(&self, tool: &str, version: &str, platform: Platform) -> Result<()> {
        let at = || format!("{tool} {version} ({platform})");
        if self.hash.len() != 64
            || !self
                .hash
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        {
            return Err(Error::catalog(format!(
                "{}: hash must be 64 lowercase hex characters",
                at()
            )));
        }
        if self.file_name.is_empty() || self.file_name.contains(['/', '\\']) {
            return Err(Error::catalog(format!(
                "{}: file_name must be a bare, non-empty file name",
                at()
            )));
        }
        if self.url.is_empty() {
            return Err(Error::catalog(format!("{}: url is empty", at())));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    #[serde(default)]
    tools: BTreeMap<String, BTreeMap<String, BTreeMap<Platform, AssetDescriptor>>>,
}

#[derive(Debug, Clone)]
struct ToolEntry {
    /// Newest first.
    versions: Vec<String>,
    assets: BTreeMap<String, BTreeMap<Platform, AssetDescriptor>>,
}

/// Read-only table of every tool, version and platform toolpin can install.
#[derive(Debug, Clone)]
pub struct Catalog {
    tools: BTreeMap<String, ToolEntry>,
}

impl Catalog {
    /// The catalog compiled into this binary.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Catalog`] if the embedded table fails validation.
    pub fn builtin() -> Result<&'static Self> {
        BUILTIN.as_ref().map_err(|message| Error::catalog(message.clone()))
    }

    /// Parse and validate a catalog from TOML.
    ///
    /// ```toml
    /// [tools.elm."0.19.1".linux-x64]
    /// hash = "<sha256 hex>"
    /// url = "https://..."
    /// file_size = 6034617
    /// file_name = "elm"
    /// archive = "gz"
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::Catalog`] on TOML errors, unknown platforms or archive
    /// kinds, and descriptors that fail validation.
    pub fn from_toml(source: &str) -> Result<Self> {
        let file: CatalogFile =
            toml::from_str(source).map_err(|e| Error::catalog(e.to_string()))?;

        let mut tools = BTreeMap::new();
        for (name, assets) in file.tools {
            for (version, platforms) in &assets {
                for (platform, asset) in platforms {
                    asset.validate(&name, version, *platform)?;
                }
            }
            let mut versions: Vec<String> = assets.keys().cloned().collect();
            sort_newest_first(&mut versions);
            tools.insert(name, ToolEntry { versions, assets });
        }

        tracing::trace!(tools = tools.len(), "Parsed tool catalog");
        Ok(Self { tools })
    }

    /// All tool names, sorted.
    pub fn tool_names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    /// Whether the catalog knows `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Versions of a tool, newest first. Empty for unknown tools.
    #[must_use]
    pub fn versions(&self, name: &str) -> Vec<&str> {
        self.tools
            .get(name)
            .map(|entry| entry.versions.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Asset for a (tool, version, platform) triple, if the catalog has one.
    #[must_use]
    pub fn asset(&self, name: &str, version: &str, platform: Platform) -> Option<&AssetDescriptor> {
        self.tools.get(name)?.assets.get(version)?.get(&platform)
    }

    /// Platforms a tool version has builds for.
    #[must_use]
    pub fn platforms(&self, name: &str, version: &str) -> Vec<Platform> {
        self.tools
            .get(name)
            .and_then(|entry| entry.assets.get(version))
            .map(|platforms| platforms.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Every (tool, version) pair, tools sorted by name and versions newest first.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tools.iter().flat_map(|(name, entry)| {
            entry
                .versions
                .iter()
                .map(move |version| (name.as_str(), version.as_str()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Arch, Os};

    const HASH: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    fn asset_toml(key: &str, archive: &str) -> String {
        format!(
            "[tools.{key}]\nhash = \"{HASH}\"\nurl = \"https://example.test/x\"\n\
             file_size = 10\nfile_name = \"x\"\narchive = \"{archive}\"\n"
        )
    }

    #[test]
    fn test_builtin_parses() {
        let catalog = Catalog::builtin().unwrap();
        assert!(catalog.contains("elm"));
        assert!(catalog.contains("elm-format"));
        assert!(!catalog.contains("npm"));
    }

    #[test]
    fn test_builtin_versions_newest_first() {
        let catalog = Catalog::builtin().unwrap();
        for name in catalog.tool_names() {
            let versions = catalog.versions(name);
            let mut sorted = versions.clone();
            sort_newest_first(&mut sorted);
            assert_eq!(versions, sorted, "{name} versions not newest first");
        }
    }

    #[test]
    fn test_builtin_every_version_has_a_platform() {
        let catalog = Catalog::builtin().unwrap();
        for (name, version) in catalog.entries() {
            assert!(
                !catalog.platforms(name, version).is_empty(),
                "{name} {version} has no platforms"
            );
        }
    }

    #[test]
    fn test_from_toml_queries() {
        let source = [
            asset_toml(r#"demo."1.0.0".linux-x64"#, "gz"),
            asset_toml(r#"demo."1.2.0".linux-x64"#, "tgz"),
            asset_toml(r#"demo."1.2.0".darwin-arm64"#, "zip"),
        ]
        .concat();
        let catalog = Catalog::from_toml(&source).unwrap();

        assert_eq!(catalog.versions("demo"), vec!["1.2.0", "1.0.0"]);
        assert!(catalog.versions("missing").is_empty());

        let linux = Platform::new(Os::Linux, Arch::X64);
        let mac = Platform::new(Os::Darwin, Arch::Arm64);
        assert_eq!(
            catalog.asset("demo", "1.2.0", mac).map(|a| a.archive),
            Some(ArchiveKind::Zip)
        );
        assert!(catalog.asset("demo", "1.0.0", mac).is_none());
        assert_eq!(catalog.platforms("demo", "1.2.0"), vec![linux, mac]);
        assert_eq!(
            catalog.entries().collect::<Vec<_>>(),
            vec![("demo", "1.2.0"), ("demo", "1.0.0")]
        );
    }

    #[test]
    fn test_rejects_bad_hash() {
        let source = asset_toml(r#"demo."1.0.0".linux-x64"#, "gz").replace(HASH, "ABC");
        let err = Catalog::from_toml(&source).unwrap_err();
        assert!(err.to_string().contains("hash"), "{err}");
    }

    #[test]
    fn test_rejects_uppercase_hash() {
        let source = asset_toml(r#"demo."1.0.0".linux-x64"#, "gz")
            .replace(HASH, &HASH.to_uppercase());
        assert!(Catalog::from_toml(&source).is_err());
    }

    #[test]
    fn test_rejects_unknown_archive_kind() {
        let source = asset_toml(r#"demo."1.0.0".linux-x64"#, "rar");
        assert!(Catalog::from_toml(&source).is_err());
    }

    #[test]
    fn test_rejects_unknown_platform() {
        let source = asset_toml(r#"demo."1.0.0".solaris-sparc"#, "gz");
        assert!(Catalog::from_toml(&source).is_err());
    }

    #[test]
    fn test_rejects_nested_file_name() {
        let source = asset_toml(r#"demo."1.0.0".linux-x64"#, "gz")
            .replace("file_name = \"x\"", "file_name = \"bin/x\"");
        assert!(Catalog::from_toml(&source).is_err());
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = Catalog::from_toml("").unwrap();
        assert_eq!(catalog.tool_names().count(), 0);
    }
}
