//! Path configuration for installed tools and project links.
//!
//! | Item | Location |
//! |------|----------|
//! | toolpin home | `$TOOLPIN_HOME`, else `~/.toolpin` (Windows: `%APPDATA%\toolpin`) |
//! | install root | `<home>/tools` |
//! | executables | `<install root>/<tool>/<version>/<file name>` |
//! | manifest | `toolpin.json`, found by walking up from the working directory |
//! | links | `<project dir>/node_modules/.bin/<tool>` |

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Environment variable overriding the toolpin home directory.
pub const HOME_ENV: &str = "TOOLPIN_HOME";

/// File name of the project manifest.
pub const MANIFEST_FILE: &str = "toolpin.json";

/// Get the toolpin home directory.
///
/// Resolution order:
/// 1. `TOOLPIN_HOME` environment variable, made absolute against the
///    working directory
/// 2. `%APPDATA%\toolpin` on Windows, `~/.toolpin` elsewhere
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn home_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(HOME_ENV)
        && !dir.is_empty()
    {
        return absolute_home(dir);
    }

    if cfg!(windows) {
        let base = dirs::config_dir()
            .ok_or_else(|| Error::configuration("Could not determine %APPDATA%"))?;
        Ok(base.join("toolpin"))
    } else {
        let base = dirs::home_dir()
            .ok_or_else(|| Error::configuration("Could not determine home directory"))?;
        Ok(base.join(".toolpin"))
    }
}

/// Make a configured home directory absolute.
///
/// Links point at executables under the home, so a relative home would
/// produce links that resolve against the bin directory instead.
///
/// # Errors
///
/// Returns [`Error::Io`] if the working directory cannot be read.
pub fn absolute_home(dir: impl AsRef<Path>) -> Result<PathBuf> {
    let dir = dir.as_ref();
    std::path::absolute(dir).map_err(|e| Error::io(e, dir, "resolve home directory"))
}

/// Install root below a given toolpin home.
#[must_use]
pub fn install_root_in(home: &Path) -> PathBuf {
    home.join("tools")
}

/// Get the install root under the resolved toolpin home.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn install_root() -> Result<PathBuf> {
    Ok(install_root_in(&home_dir()?))
}

/// Local binary directory of a project.
#[must_use]
pub fn bin_dir(project_dir: &Path) -> PathBuf {
    project_dir.join("node_modules").join(".bin")
}

/// Walk up from `start` looking for `toolpin.json`.
///
/// Returns the manifest path, or `None` when no ancestor has one.
#[must_use]
pub fn find_manifest(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(MANIFEST_FILE))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_home_dir_default() {
        temp_env::with_var_unset(HOME_ENV, || {
            let dir = home_dir().expect("home_dir should succeed");
            assert!(dir.ends_with(".toolpin") || dir.ends_with("toolpin"), "{:?}", dir);
        });
    }

    #[test]
    fn test_home_dir_override() {
        let test_dir = "/tmp/toolpin-test-home";
        temp_env::with_var(HOME_ENV, Some(test_dir), || {
            assert_eq!(home_dir().unwrap(), PathBuf::from(test_dir));
            assert_eq!(
                install_root().unwrap(),
                PathBuf::from(test_dir).join("tools")
            );
        });
    }

    #[test]
    fn test_relative_override_is_made_absolute() {
        temp_env::with_var(HOME_ENV, Some("relative-toolpin-home"), || {
            let dir = home_dir().unwrap();
            assert!(dir.is_absolute(), "{}", dir.display());
            assert_eq!(
                dir,
                std::env::current_dir().unwrap().join("relative-toolpin-home")
            );
        });
    }

    #[test]
    fn test_absolute_home_keeps_absolute_paths() {
        let temp = TempDir::new().unwrap();
        assert_eq!(absolute_home(temp.path()).unwrap(), temp.path());
    }

    #[test]
    fn test_empty_override_is_ignored() {
        temp_env::with_var(HOME_ENV, Some(""), || {
            let dir = home_dir().unwrap();
            assert_ne!(dir, PathBuf::new());
        });
    }

    #[test]
    fn test_bin_dir() {
        assert_eq!(
            bin_dir(Path::new("/work/app")),
            PathBuf::from("/work/app/node_modules/.bin")
        );
    }

    #[test]
    fn test_find_manifest_walks_up() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("src").join("deep");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(temp.path().join(MANIFEST_FILE), "{}").unwrap();

        assert_eq!(
            find_manifest(&nested),
            Some(temp.path().join(MANIFEST_FILE))
        );
    }

    #[test]
    fn test_find_manifest_ignores_directories() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join(MANIFEST_FILE)).unwrap();
        let found = find_manifest(temp.path());
        assert_ne!(found, Some(temp.path().join(MANIFEST_FILE)));
    }
}
