//! Streaming extraction of downloaded archives into a tool's target path.
//!
//! Bytes are fed in as they arrive. Gzip is inflated into a buffer that is
//! drained to the target through tokio's file API after every chunk, so the
//! runtime's worker threads never block on disk. Tarballs are piped into
//! `tar`. Zip files are spooled to a temporary file beside the target and
//! handed to `tar` once complete. Any failure removes the partially written
//! target.

use crate::error::{Error, Result};
use flate2::write::GzDecoder;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStderr, ChildStdin, Command};
use tokio::task::JoinHandle;
use toolpin_core::ArchiveKind;
use tracing::debug;

/// Default program used for tar and zip archives.
pub const DEFAULT_TAR: &str = "tar";

/// An extraction in progress for one target file.
#[derive(Debug)]
pub struct Extractor {
    target: PathBuf,
    state: State,
}

#[derive(Debug)]
enum State {
    Gz {
        decoder: GzDecoder<Vec<u8>>,
        file: tokio::fs::File,
    },
    Tgz {
        command: String,
        child: Child,
        stdin: Option<ChildStdin>,
        stderr: Option<JoinHandle<String>>,
    },
    Zip {
        tar: String,
        temp: PathBuf,
        file: tokio::fs::File,
    },
}

impl Extractor {
    /// Prepare to extract an archive of `kind` into `target`.
    ///
    /// The target's directory must already exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ArchiveToolMissing`] if `tar` is needed and absent,
    /// or an I/O error if the output file cannot be created.
    pub async fn start(kind: ArchiveKind, target: &Path, tar: &str) -> Result<Self> {
        let state = match kind {
            ArchiveKind::Gz => {
                let file = tokio::fs::File::create(target)
                    .await
                    .map_err(|e| Error::io(e, target, "create executable"))?;
                State::Gz {
                    decoder: GzDecoder::new(Vec::new()),
                    file,
                }
            }
            ArchiveKind::Tgz => {
                let (dir, entry) = split_target(target)?;
                let command = format!(
                    "{tar} zxf - -C {} {}",
                    dir.display(),
                    entry.to_string_lossy()
                );
                let mut child = Command::new(tar)
                    .arg("zxf")
                    .arg("-")
                    .arg("-C")
                    .arg(dir)
                    .arg(entry)
                    .stdin(Stdio::piped())
                    .stdout(Stdio::null())
                    .stderr(Stdio::piped())
                    .kill_on_drop(true)
                    .spawn()
                    .map_err(|e| spawn_error(e, tar, &command))?;
                let stdin = child.stdin.take();
                let stderr = child.stderr.take().map(collect_stderr);
                debug!(command = %command, "Started tar");
                State::Tgz {
                    command,
                    child,
                    stdin,
                    stderr,
                }
            }
            ArchiveKind::Zip => {
                let temp = zip_temp_path(target);
                let file = tokio::fs::File::create(&temp)
                    .await
                    .map_err(|e| Error::io(e, &temp, "create temporary zip"))?;
                State::Zip {
                    tar: tar.to_string(),
                    temp,
                    file,
                }
            }
        };
        Ok(Self {
            target: target.to_path_buf(),
            state,
        })
    }

    /// The file being produced.
    #[must_use]
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Feed the next chunk of archive bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if decompression, the pipe into `tar`, or the
    /// temporary file write fails.
    pub async fn write(&mut self, chunk: &[u8]) -> Result<()> {
        match &mut self.state {
            State::Gz { decoder, file } => {
                decoder
                    .write_all(chunk)
                    .map_err(|source| Error::Decompress {
                        path: self.target.clone(),
                        source,
                    })?;
                let decoded = std::mem::take(decoder.get_mut());
                file.write_all(&decoded)
                    .await
                    .map_err(|e| Error::io(e, &self.target, "write executable"))
            }
            State::Tgz { stdin, .. } => {
                let Some(pipe) = stdin.as_mut() else {
                    return Ok(());
                };
                let written = pipe.write_all(chunk).await;
                if let Err(e) = written {
                    debug!(error = %e, "Pipe into tar closed early");
                    stdin.take();
                    return Err(self.tar_failure(e).await);
                }
                Ok(())
            }
            State::Zip { temp, file, .. } => file
                .write_all(chunk)
                .await
                .map_err(|e| Error::io(e, temp, "write temporary zip")),
        }
    }

    async fn tar_failure(&mut self, write_error: std::io::Error) -> Error {
        let State::Tgz {
            command,
            child,
            stderr,
            ..
        } = &mut self.state
        else {
            return Error::io(write_error, &self.target, "extract");
        };
        let status = match child.wait().await {
            Ok(status) => status,
            Err(e) => return Error::io(e, &self.target, "wait for tar"),
        };
        let stderr = join_stderr(stderr.take()).await;
        if status.success() {
            Error::io(write_error, &self.target, "extract")
        } else {
            Error::ExtractFailed {
                command: command.clone(),
                status: status.to_string(),
                stderr,
            }
        }
    }

    /// Complete extraction and mark the result executable.
    ///
    /// On failure the partial target is removed.
    ///
    /// # Errors
    ///
    /// Returns the extraction error, with any cleanup failure appended.
    pub async fn finish(self) -> Result<()> {
        let target = self.target.clone();
        match self.complete().await {
            Ok(()) => Ok(()),
            Err(error) => Err(error.with_cleanup(remove_if_exists(&target).await)),
        }
    }

    async fn complete(self) -> Result<()> {
        let target = self.target;
        match self.state {
            State::Gz { decoder, mut file } => {
                let rest = decoder.finish().map_err(|source| Error::Decompress {
                        path: target.clone(),
                        source,
                    })?;
                file.write_all(&rest)
                    .await
                    .map_err(|e| Error::io(e, &target, "write executable"))?;
                file.flush()
                    .await
                    .map_err(|e| Error::io(e, &target, "write executable"))?;
            }
            State::Tgz {
                command,
                mut child,
                stdin,
                stderr,
            } => {
                drop(stdin);
                let status = child
                    .wait()
                    .await
                    .map_err(|e| Error::io(e, &target, "wait for tar"))?;
                let stderr = join_stderr(stderr).await;
                if !status.success() {
                    return Err(Error::ExtractFailed {
                        command,
                        status: status.to_string(),
                        stderr,
                    });
                }
            }
            State::Zip {
                tar,
                temp,
                mut file,
            } => {
                let written = file
                    .flush()
                    .await
                    .map_err(|e| Error::io(e, &temp, "write temporary zip"));
                drop(file);
                let extracted = match written {
                    Ok(()) => unzip(&tar, &temp, &target).await,
                    Err(e) => Err(e),
                };
                let removed = tokio::fs::remove_file(&temp)
                    .await
                    .map_err(|e| Error::io(e, &temp, "remove temporary zip"));
                match (extracted, removed) {
                    (Ok(()), removed) => removed?,
                    (Err(error), removed) => return Err(error.with_cleanup(removed)),
                }
            }
        }

        match tokio::fs::metadata(&target).await {
            Ok(metadata) if metadata.is_file() => {}
            _ => {
                return Err(Error::EntryMissing {
                    entry: entry_name(&target),
                });
            }
        }
        make_executable(&target).await
    }

    /// Abandon extraction, stopping `tar` and removing everything written.
    ///
    /// # Errors
    ///
    /// Returns the first cleanup step that failed.
    pub async fn abort(self) -> Result<()> {
        let temp = match self.state {
            State::Gz { file, .. } => {
                drop(file);
                None
            }
            State::Tgz {
                mut child, stderr, ..
            } => {
                if let Err(e) = child.kill().await {
                    debug!(error = %e, "tar already exited");
                }
                if let Some(handle) = stderr {
                    handle.abort();
                }
                None
            }
            State::Zip { temp, file, .. } => {
                drop(file);
                Some(temp)
            }
        };
        let removed_temp = match temp {
            Some(temp) => remove_if_exists(&temp).await,
            None => Ok(()),
        };
        let removed_target = remove_if_exists(&self.target).await;
        removed_temp.and(removed_target)
    }
}

/// `<target>.zip`, beside the target.
fn zip_temp_path(target: &Path) -> PathBuf {
    let mut name = OsString::from(target.as_os_str());
    name.push(".zip");
    PathBuf::from(name)
}

fn split_target(target: &Path) -> Result<(&Path, &std::ffi::OsStr)> {
    match (target.parent(), target.file_name()) {
        (Some(dir), Some(entry)) => Ok((dir, entry)),
        _ => Err(Error::io(
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "target has no file name"),
            target,
            "extract",
        )),
    }
}

fn entry_name(target: &Path) -> String {
    target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn spawn_error(e: std::io::Error, program: &str, command: &str) -> Error {
    if e.kind() == std::io::ErrorKind::NotFound {
        Error::ArchiveToolMissing {
            program: program.to_string(),
        }
    } else {
        Error::Spawn {
            command: command.to_string(),
            source: e,
        }
    }
}

async fn unzip(tar: &str, archive: &Path, target: &Path) -> Result<()> {
    let (dir, entry) = split_target(target)?;
    let command = format!(
        "{tar} xf {} -C {} {}",
        archive.display(),
        dir.display(),
        entry.to_string_lossy()
    );
    debug!(command = %command, "Extracting zip");
    let output = Command::new(tar)
        .arg("xf")
        .arg(archive)
        .arg("-C")
        .arg(dir)
        .arg(entry)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| spawn_error(e, tar, &command))?;
    if output.status.success() {
        Ok(())
    } else {
        Err(Error::ExtractFailed {
            command,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

fn collect_stderr(mut stderr: ChildStderr) -> JoinHandle<String> {
    tokio::spawn(async move {
        let mut text = String::new();
        let mut bytes = Vec::new();
        if stderr.read_to_end(&mut bytes).await.is_ok() {
            text = String::from_utf8_lossy(&bytes).into_owned();
        }
        text
    })
}

async fn join_stderr(handle: Option<JoinHandle<String>>) -> String {
    match handle {
        Some(handle) => handle.await.unwrap_or_default(),
        None => String::new(),
    }
}

/// Remove `path`, treating an already-missing file as success.
pub(crate) async fn remove_if_exists(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::io(e, path, "remove partial file")),
    }
}

#[cfg(unix)]
async fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .await
        .map_err(|e| Error::io(e, path, "set permissions"))
}

#[cfg(not(unix))]
async fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
