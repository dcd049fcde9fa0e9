//! Exposing installed tools in a project's bin directory.
//!
//! On Unix-like systems each tool gets a symlink. On Windows it gets three
//! shim scripts (`sh`, `.cmd`, `.ps1`) so it runs from any shell. Only
//! entries that point at the tool's own target are ever removed.

use crate::error::{Error, Result};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use toolpin_core::{Platform, ResolvedTool};

/// What a link or unlink call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// A new link or shim set was written.
    Created,
    /// The link already pointed at the target.
    AllGood,
    /// A link to the target was removed.
    Removed,
    /// Nothing there belonged to the target.
    DidNothing,
}

impl fmt::Display for LinkOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Created => "link created",
            Self::AllGood => "all good",
            Self::Removed => "link removed",
            Self::DidNothing => "nothing to do",
        };
        f.write_str(text)
    }
}

/// How tools are exposed in the bin directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStrategy {
    /// One symlink per tool.
    Symlink,
    /// `sh`, `.cmd` and `.ps1` shims per tool.
    Shims,
}

impl LinkStrategy {
    /// The strategy used on `platform`.
    #[must_use]
    pub fn for_platform(platform: Platform) -> Self {
        if platform.uses_shims() {
            Self::Shims
        } else {
            Self::Symlink
        }
    }
}

/// Creates and removes links in one bin directory.
#[derive(Debug, Clone)]
pub struct Linker {
    bin_dir: PathBuf,
    strategy: LinkStrategy,
}

impl Linker {
    /// Link into `bin_dir` using `strategy`.
    pub fn new(bin_dir: impl Into<PathBuf>, strategy: LinkStrategy) -> Self {
        Self {
            bin_dir: bin_dir.into(),
            strategy,
        }
    }

    /// The bin directory.
    #[must_use]
    pub fn bin_dir(&self) -> &Path {
        &self.bin_dir
    }

    /// The primary link path for `name`.
    #[must_use]
    pub fn link_path(&self, name: &str) -> PathBuf {
        self.bin_dir.join(name)
    }

    /// Make `tool` available in the bin directory.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if an existing entry cannot be replaced.
    pub fn link(&self, tool: &ResolvedTool) -> Result<LinkOutcome> {
        match self.strategy {
            LinkStrategy::Symlink => self.link_symlink(tool),
            LinkStrategy::Shims => self.link_shims(tool),
        }
    }

    /// Remove `tool`'s link if, and only if, it points at `tool`'s target.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if an entry cannot be inspected or removed.
    pub fn unlink(&self, tool: &ResolvedTool) -> Result<LinkOutcome> {
        match self.strategy {
            LinkStrategy::Symlink => self.unlink_symlink(tool),
            LinkStrategy::Shims => self.unlink_shims(tool),
        }
    }

    fn link_symlink(&self, tool: &ResolvedTool) -> Result<LinkOutcome> {
        let link = self.link_path(&tool.name);
        let target = absolute_target(tool)?;
        if read_link(&link)?.as_deref() == Some(target.as_path()) {
            return Ok(LinkOutcome::AllGood);
        }
        remove_entry(&link)?;
        symlink(&target, &link).map_err(|e| Error::io(e, &link, "create symlink"))?;
        Ok(LinkOutcome::Created)
    }

    fn unlink_symlink(&self, tool: &ResolvedTool) -> Result<LinkOutcome> {
        let link = self.link_path(&tool.name);
        let target = absolute_target(tool)?;
        if read_link(&link)?.as_deref() != Some(target.as_path()) {
            return Ok(LinkOutcome::DidNothing);
        }
        remove_entry(&link)?;
        Ok(LinkOutcome::Removed)
    }

    fn shims(&self, tool: &ResolvedTool) -> Result<[(PathBuf, String); 3]> {
        let target = &absolute_target(tool)?;
        Ok([
            (self.link_path(&tool.name), sh_shim(target)),
            (
                self.bin_dir.join(format!("{}.cmd", tool.name)),
                cmd_shim(target),
            ),
            (
                self.bin_dir.join(format!("{}.ps1", tool.name)),
                ps1_shim(target),
            ),
        ])
    }

    fn link_shims(&self, tool: &ResolvedTool) -> Result<LinkOutcome> {
        let shims = self.shims(tool)?;
        let mut up_to_date = true;
        for (path, content) in &shims {
            if read_file(path)?.as_deref() != Some(content.as_bytes()) {
                up_to_date = false;
            }
        }
        if up_to_date {
            return Ok(LinkOutcome::AllGood);
        }
        for (path, content) in &shims {
            remove_entry(path)?;
            std::fs::write(path, content).map_err(|e| Error::io(e, path, "write shim"))?;
        }
        Ok(LinkOutcome::Created)
    }

    fn unlink_shims(&self, tool: &ResolvedTool) -> Result<LinkOutcome> {
        let mut removed = false;
        for (path, content) in &self.shims(tool)? {
            if read_file(path)?.as_deref() == Some(content.as_bytes()) {
                remove_entry(path)?;
                removed = true;
            }
        }
        Ok(if removed {
            LinkOutcome::Removed
        } else {
            LinkOutcome::DidNothing
        })
    }
}

/// POSIX shell shim. Single quotes in the path are closed, escaped and
/// reopened.
#[must_use]
pub fn sh_shim(target: &Path) -> String {
    let quoted = target.to_string_lossy().replace('\'', r#"'"'"'"#);
    format!("#!/bin/sh\n'{quoted}' \"$@\"\n")
}

/// `cmd.exe` shim.
#[must_use]
pub fn cmd_shim(target: &Path) -> String {
    format!("@ECHO off\r\n\"{}\" %*\r\n", target.to_string_lossy())
}

/// PowerShell shim. Single quotes in the path are doubled.
#[must_use]
pub fn ps1_shim(target: &Path) -> String {
    let quoted = target.to_string_lossy().replace('\'', "''");
    format!("& '{quoted}' $args\r\n")
}

/// `tool`'s target path resolved against the working directory. Link
/// targets are interpreted relative to the bin directory, so they must be
/// absolute.
fn absolute_target(tool: &ResolvedTool) -> Result<PathBuf> {
    std::path::absolute(&tool.target_path)
        .map_err(|e| Error::io(e, &tool.target_path, "resolve target path"))
}

/// The symlink target at `path`, or `None` if nothing is there or it is not
/// a symlink.
fn read_link(path: &Path) -> Result<Option<PathBuf>> {
    match std::fs::read_link(path) {
        Ok(target) => Ok(Some(target)),
        Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::InvalidInput) => {
            Ok(None)
        }
        Err(e) => Err(Error::io(e, path, "read link")),
    }
}

/// The content at `path`, or `None` if nothing is there or it is not a file.
fn read_file(path: &Path) -> Result<Option<Vec<u8>>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) if path.is_dir() => {
            tracing::debug!(path = %path.display(), error = %e, "Shim path is a directory");
            Ok(None)
        }
        Err(e) => Err(Error::io(e, path, "read shim")),
    }
}

fn remove_entry(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::io(e, path, "remove link")),
    }
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use toolpin_core::{ArchiveKind, AssetDescriptor};

    fn tool(root: &Path, name: &str, version: &str) -> ResolvedTool {
        ResolvedTool::new(
            root,
            name,
            version,
            AssetDescriptor {
                hash: "0".repeat(64),
                url: format!("https://example.test/{name}.gz"),
                file_size: 1,
                file_name: name.to_string(),
                archive: ArchiveKind::Gz,
            },
        )
    }

    #[test]
    fn test_shim_contents() {
        let target = Path::new("C:/Users/o'neil/tools/elm/0.19.1/elm.exe");
        assert_eq!(
            sh_shim(target),
            "#!/bin/sh\n'C:/Users/o'\"'\"'neil/tools/elm/0.19.1/elm.exe' \"$@\"\n"
        );
        assert_eq!(
            cmd_shim(target),
            "@ECHO off\r\n\"C:/Users/o'neil/tools/elm/0.19.1/elm.exe\" %*\r\n"
        );
        assert_eq!(
            ps1_shim(target),
            "& 'C:/Users/o''neil/tools/elm/0.19.1/elm.exe' $args\r\n"
        );
    }

    #[test]
    fn test_strategy_for_platform() {
        assert_eq!(
            LinkStrategy::for_platform("windows-x64".parse().unwrap()),
            LinkStrategy::Shims
        );
        assert_eq!(
            LinkStrategy::for_platform("linux-x64".parse().unwrap()),
            LinkStrategy::Symlink
        );
    }

    #[test]
    fn test_shims_link_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let linker = Linker::new(dir.path(), LinkStrategy::Shims);
        let elm = tool(Path::new("/tools"), "elm", "0.19.1");

        assert_eq!(linker.link(&elm).unwrap(), LinkOutcome::Created);
        assert_eq!(linker.link(&elm).unwrap(), LinkOutcome::AllGood);
        assert!(dir.path().join("elm").is_file());
        assert!(dir.path().join("elm.cmd").is_file());
        assert!(dir.path().join("elm.ps1").is_file());
    }

    #[test]
    fn test_shims_rewritten_for_new_version() {
        let dir = TempDir::new().unwrap();
        let linker = Linker::new(dir.path(), LinkStrategy::Shims);
        let old = tool(Path::new("/tools"), "elm", "0.19.0");
        let new = tool(Path::new("/tools"), "elm", "0.19.1");

        linker.link(&old).unwrap();
        assert_eq!(linker.link(&new).unwrap(), LinkOutcome::Created);
        assert_eq!(linker.unlink(&old).unwrap(), LinkOutcome::DidNothing);
        assert_eq!(linker.unlink(&new).unwrap(), LinkOutcome::Removed);
        assert!(!dir.path().join("elm.cmd").exists());
    }

    #[test]
    fn test_shims_leave_foreign_files() {
        let dir = TempDir::new().unwrap();
        let linker = Linker::new(dir.path(), LinkStrategy::Shims);
        let elm = tool(Path::new("/tools"), "elm", "0.19.1");
        std::fs::write(dir.path().join("elm.cmd"), "@ECHO my own script\r\n").unwrap();

        assert_eq!(linker.unlink(&elm).unwrap(), LinkOutcome::DidNothing);
        assert!(dir.path().join("elm.cmd").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_lifecycle() {
        let dir = TempDir::new().unwrap();
        let linker = Linker::new(dir.path(), LinkStrategy::Symlink);
        let elm = tool(Path::new("/tools"), "elm", "0.19.1");

        assert_eq!(linker.link(&elm).unwrap(), LinkOutcome::Created);
        assert_eq!(linker.link(&elm).unwrap(), LinkOutcome::AllGood);
        assert_eq!(
            std::fs::read_link(dir.path().join("elm")).unwrap(),
            elm.target_path
        );
        assert_eq!(linker.unlink(&elm).unwrap(), LinkOutcome::Removed);
        assert_eq!(linker.unlink(&elm).unwrap(), LinkOutcome::DidNothing);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_replaces_plain_file_but_unlink_keeps_it() {
        let dir = TempDir::new().unwrap();
        let linker = Linker::new(dir.path(), LinkStrategy::Symlink);
        let elm = tool(Path::new("/tools"), "elm", "0.19.1");
        std::fs::write(dir.path().join("elm"), "stale").unwrap();

        assert_eq!(linker.unlink(&elm).unwrap(), LinkOutcome::DidNothing);
        assert!(dir.path().join("elm").is_file());
        assert_eq!(linker.link(&elm).unwrap(), LinkOutcome::Created);
        assert!(std::fs::symlink_metadata(dir.path().join("elm"))
            .unwrap()
            .file_type()
            .is_symlink());
    }

    #[cfg(unix)]
    #[test]
    fn test_relative_install_root_links_to_absolute_target() {
        let root = tempfile::Builder::new().tempdir_in(".").unwrap();
        let relative_root = root.path().strip_prefix(".").unwrap_or(root.path());
        assert!(relative_root.is_relative());
        let elm = tool(relative_root, "elm", "0.19.1");
        std::fs::create_dir_all(elm.target_path.parent().unwrap()).unwrap();
        std::fs::write(&elm.target_path, "#!/bin/sh\n").unwrap();

        let bin = TempDir::new().unwrap();
        let linker = Linker::new(bin.path(), LinkStrategy::Symlink);
        assert_eq!(linker.link(&elm).unwrap(), LinkOutcome::Created);

        let link = bin.path().join("elm");
        assert!(std::fs::read_link(&link).unwrap().is_absolute());
        assert!(link.exists(), "link should resolve to the installed file");
        assert_eq!(linker.link(&elm).unwrap(), LinkOutcome::AllGood);
        assert_eq!(linker.unlink(&elm).unwrap(), LinkOutcome::Removed);
    }

    #[test]
    fn test_relative_install_root_shims_use_absolute_target() {
        let bin = TempDir::new().unwrap();
        let linker = Linker::new(bin.path(), LinkStrategy::Shims);
        let elm = tool(Path::new("toolpin-home/tools"), "elm", "0.19.1");

        linker.link(&elm).unwrap();
        let expected = std::env::current_dir().unwrap().join(&elm.target_path);
        assert_eq!(
            std::fs::read_to_string(bin.path().join("elm.ps1")).unwrap(),
            ps1_shim(&expected)
        );
        assert_eq!(linker.unlink(&elm).unwrap(), LinkOutcome::Removed);
    }

    #[cfg(unix)]
    #[test]
    fn test_directory_in_the_way_is_an_error() {
        let dir = TempDir::new().unwrap();
        let linker = Linker::new(dir.path(), LinkStrategy::Symlink);
        let elm = tool(Path::new("/tools"), "elm", "0.19.1");
        std::fs::create_dir(dir.path().join("elm")).unwrap();

        assert!(linker.link(&elm).is_err());
    }
}
