//! Streaming downloads with a program fallback chain.
//!
//! The first available mechanism wins: `curl`, then `wget`, then the
//! built-in HTTP client. A mechanism is skipped only when its program does
//! not exist; once one starts, its failures are final.

use crate::error::{Error, Result};
use bytes::Bytes;
use regex::Regex;
use std::process::Stdio;
use std::sync::LazyLock;
use std::time::{Duration, Instant};
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

/// Maximum number of redirects the built-in client follows.
pub const MAX_REDIRECTS: usize = 50;

const CHUNK_SIZE: usize = 64 * 1024;
const STDERR_TAIL: usize = 8 * 1024;
const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

#[allow(clippy::expect_used)]
static PERCENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:[.,]\d+)?)%").expect("valid percent regex"));

/// One way of fetching a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// `curl -#fL <url>`
    Curl {
        /// Program to run.
        program: String,
    },
    /// `wget -O - <url>`
    Wget {
        /// Program to run.
        program: String,
    },
    /// Built-in HTTP client.
    Http,
}

impl Strategy {
    fn args<'a>(&self, url: &'a str) -> Vec<&'a str> {
        match self {
            Self::Curl { .. } => vec!["-#fL", url],
            Self::Wget { .. } => vec!["-O", "-", url],
            Self::Http => vec![url],
        }
    }

    /// The command line shown in errors for `url`.
    #[must_use]
    pub fn command_line(&self, url: &str) -> String {
        match self {
            Self::Curl { program } | Self::Wget { program } => {
                format!("{program} {}", self.args(url).join(" "))
            }
            Self::Http => format!("GET {url}"),
        }
    }
}

/// Starts downloads using the first available [`Strategy`].
#[derive(Debug, Clone)]
pub struct Downloader {
    strategies: Vec<Strategy>,
}

impl Default for Downloader {
    fn default() -> Self {
        Self::new()
    }
}

impl Downloader {
    /// The standard chain: curl, wget, built-in client.
    #[must_use]
    pub fn new() -> Self {
        Self::with_strategies(vec![
            Strategy::Curl {
                program: "curl".to_string(),
            },
            Strategy::Wget {
                program: "wget".to_string(),
            },
            Strategy::Http,
        ])
    }

    /// Use an explicit chain, tried in order.
    #[must_use]
    pub fn with_strategies(strategies: Vec<Strategy>) -> Self {
        Self { strategies }
    }

    /// The configured chain.
    #[must_use]
    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    /// Start fetching `url`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoDownloader`] if every program in the chain is
    /// missing, or the error of the first mechanism that could start.
    pub async fn start(&self, url: &str) -> Result<Download> {
        let mut tried = Vec::new();
        for strategy in &self.strategies {
            let command = strategy.command_line(url);
            match strategy {
                Strategy::Curl { program } | Strategy::Wget { program } => {
                    match spawn_program(program, &strategy.args(url), &command)? {
                        Some(download) => return Ok(download),
                        None => {
                            debug!(program = %program, "Download program not found, trying next");
                            tried.push(program.clone());
                        }
                    }
                }
                Strategy::Http => return request(url, command).await,
            }
        }
        Err(Error::NoDownloader { tried })
    }
}

/// A running download.
///
/// Pull bytes with [`Download::next_chunk`] until it returns `None`, then
/// call [`Download::finish`] to learn whether the transfer succeeded.
#[derive(Debug)]
pub struct Download {
    command: String,
    body: Body,
}

#[derive(Debug)]
enum Body {
    Process {
        child: Child,
        stdout: ChildStdout,
        progress: watch::Receiver<Option<u8>>,
        stderr: Option<JoinHandle<String>>,
    },
    Http {
        response: Option<reqwest::Response>,
        total: Option<u64>,
        received: u64,
        reported: Option<u8>,
        last_report: Option<Instant>,
        pending: Option<u8>,
    },
}

fn spawn_program(program: &str, args: &[&str], command: &str) -> Result<Option<Download>> {
    let spawned = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn();

    let mut child = match spawned {
        Ok(child) => child,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(Error::Spawn {
                command: command.to_string(),
                source,
            });
        }
    };

    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        return Err(Error::Stream {
            command: command.to_string(),
            source: std::io::Error::other("process pipes were not captured"),
        });
    };

    let (tx, rx) = watch::channel(None);
    debug!(command = %command, "Started download process");
    Ok(Some(Download {
        command: command.to_string(),
        body: Body::Process {
            child,
            stdout,
            progress: rx,
            stderr: Some(tokio::spawn(watch_stderr(stderr, tx))),
        },
    }))
}

async fn request(url: &str, command: String) -> Result<Download> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("toolpin/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .build()
        .map_err(|source| Error::Http {
            command: command.clone(),
            source,
        })?;

    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) if e.is_redirect() => return Err(Error::TooManyRedirects { command }),
        Err(source) => return Err(Error::Http { command, source }),
    };

    if !response.status().is_success() {
        return Err(Error::HttpStatus {
            command,
            status: response.status().as_u16(),
        });
    }

    debug!(command = %command, length = ?response.content_length(), "Started HTTP download");
    Ok(Download {
        command,
        body: Body::Http {
            total: response.content_length(),
            response: Some(response),
            received: 0,
            reported: None,
            last_report: None,
            pending: None,
        },
    })
}

/// Reads a download program's stderr, publishing progress percentages and
/// keeping the non-progress text for error messages.
async fn watch_stderr(mut stderr: ChildStderr, progress: watch::Sender<Option<u8>>) -> String {
    let mut tail = String::new();
    let mut buf = vec![0u8; 4096];
    loop {
        let n = match stderr.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        let text = String::from_utf8_lossy(&buf[..n]);
        for segment in text.split(['\r', '\n']) {
            if let Some(percent) = parse_percent(segment) {
                progress.send_if_modified(|current| {
                    let changed = *current != Some(percent);
                    *current = Some(percent);
                    changed
                });
            } else if !segment.trim().is_empty() {
                tail.push_str(segment);
                tail.push('\n');
            }
        }
        if tail.len() > STDERR_TAIL {
            let mut cut = tail.len() - STDERR_TAIL;
            while !tail.is_char_boundary(cut) {
                cut += 1;
            }
            tail.drain(..cut);
        }
    }
    tail
}

/// The last percentage in a line of download program output.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn parse_percent(line: &str) -> Option<u8> {
    let value = PERCENT.captures_iter(line).last()?.get(1)?.as_str();
    let value: f64 = value.replace(',', ".").parse().ok()?;
    Some(value.floor().clamp(0.0, 100.0) as u8)
}

fn percent_of(received: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let percent = received.saturating_mul(100) / total;
    u8::try_from(percent.min(100)).unwrap_or(100)
}

impl Download {
    /// The command line or request being run.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// The next chunk of the body, or `None` at the end of the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if reading from the process or connection fails.
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        match &mut self.body {
            Body::Process { stdout, .. } => {
                let mut buf = vec![0u8; CHUNK_SIZE];
                let n = stdout.read(&mut buf).await.map_err(|source| Error::Stream {
                    command: self.command.clone(),
                    source,
                })?;
                if n == 0 {
                    return Ok(None);
                }
                buf.truncate(n);
                Ok(Some(Bytes::from(buf)))
            }
            Body::Http {
                response,
                total,
                received,
                reported,
                last_report,
                pending,
            } => {
                let Some(active) = response.as_mut() else {
                    return Ok(None);
                };
                let chunk = active.chunk().await.map_err(|source| Error::Http {
                    command: self.command.clone(),
                    source,
                })?;
                let Some(chunk) = chunk else {
                    return Ok(None);
                };

                *received += chunk.len() as u64;
                if let Some(total) = *total {
                    let percent = percent_of(*received, total);
                    let due = last_report.is_none_or(|at| at.elapsed() >= PROGRESS_INTERVAL);
                    if *reported != Some(percent) && (due || percent == 100) {
                        *reported = Some(percent);
                        *last_report = Some(Instant::now());
                        *pending = Some(percent);
                    }
                }
                Ok(Some(chunk))
            }
        }
    }

    /// The latest progress percentage not yet taken, if the mechanism
    /// reports one.
    pub fn take_progress(&mut self) -> Option<u8> {
        match &mut self.body {
            Body::Process { progress, .. } => {
                if progress.has_changed().unwrap_or(false) {
                    *progress.borrow_and_update()
                } else {
                    None
                }
            }
            Body::Http { pending, .. } => pending.take(),
        }
    }

    /// Wait for the transfer to end and check that it succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DownloadFailed`] with the program's stderr if it
    /// exited unsuccessfully.
    pub async fn finish(&mut self) -> Result<()> {
        let Body::Process { child, stderr, .. } = &mut self.body else {
            return Ok(());
        };
        let status = child.wait().await.map_err(|source| Error::Stream {
            command: self.command.clone(),
            source,
        })?;
        let stderr = match stderr.take() {
            Some(handle) => handle.await.unwrap_or_default(),
            None => String::new(),
        };
        if status.success() {
            Ok(())
        } else {
            Err(Error::DownloadFailed {
                command: self.command.clone(),
                status: status.to_string(),
                stderr,
            })
        }
    }

    /// Stop the transfer. Safe to call more than once.
    pub async fn kill(&mut self) {
        match &mut self.body {
            Body::Process { child, stderr, .. } => {
                if let Err(e) = child.kill().await {
                    debug!(command = %self.command, error = %e, "Download process already gone");
                }
                if let Some(handle) = stderr.take() {
                    handle.abort();
                }
            }
            Body::Http { response, .. } => {
                response.take();
            }
        }
    }
}
