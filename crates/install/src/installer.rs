//! Reconciling a project's bin directory with an [`InstallPlan`].
//!
//! Missing tools are fetched concurrently, one task per tool, each running
//! download, streaming verification and extraction before linking. A failed
//! tool never cancels its siblings; every failure is collected into the
//! [`InstallReport`].

use crate::download::Downloader;
use crate::error::{Error, Result};
use crate::extract::{DEFAULT_TAR, Extractor};
use crate::link::{LinkOutcome, LinkStrategy, Linker};
use crate::report::{InstallReport, ToolFailure};
use crate::verify::Verifier;
use futures::future::join_all;
use std::path::{Path, PathBuf};
use toolpin_core::plan::{classify, is_installed, resolve_tool};
use toolpin_core::{Catalog, InstallPlan, Platform, Resolution, ResolvedTool, ToolError};
use toolpin_events::{
    emit_tool_extracting, emit_tool_failed, emit_tool_linked, emit_tool_progress,
    emit_tool_queued, emit_tool_removed, emit_tool_unsupported, emit_tool_verifying,
};
use tracing::{debug, info, trace};

/// Where one missing tool is in its pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadState {
    /// Waiting to start.
    Pending,
    /// Streaming, with the last reported percentage.
    Downloading(u8),
    /// Stream complete, checking size and hash.
    Verifying,
    /// Finishing extraction.
    Extracting,
    /// Extracted and linked.
    Linked,
    /// Gave up.
    Failed,
}

/// Moves a tool through [`DownloadState`]s, emitting an event per step.
struct Progress<'t> {
    tool: &'t ResolvedTool,
    state: DownloadState,
}

impl<'t> Progress<'t> {
    fn start(tool: &'t ResolvedTool) -> Self {
        emit_tool_queued!(tool.name, tool.version);
        Self {
            tool,
            state: DownloadState::Pending,
        }
    }

    fn advance(&mut self, next: DownloadState) {
        if self.state == next {
            return;
        }
        trace!(tool = %self.tool.label(), from = ?self.state, to = ?next, "Download state");
        let (name, version) = (&self.tool.name, &self.tool.version);
        match next {
            DownloadState::Downloading(percent) if percent > 0 => {
                emit_tool_progress!(name, version, percent);
            }
            DownloadState::Verifying => emit_tool_verifying!(name, version),
            DownloadState::Extracting => emit_tool_extracting!(name, version),
            _ => {}
        }
        self.state = next;
    }
}

/// Installs, links and unlinks tools from one catalog into one install root.
#[derive(Debug, Clone)]
pub struct Installer<'a> {
    catalog: &'a Catalog,
    install_root: PathBuf,
    platform: Platform,
    downloader: Downloader,
    tar: String,
}

impl<'a> Installer<'a> {
    /// Install `catalog` tools for `platform` under `install_root`.
    pub fn new(catalog: &'a Catalog, install_root: impl Into<PathBuf>, platform: Platform) -> Self {
        Self {
            catalog,
            install_root: install_root.into(),
            platform,
            downloader: Downloader::new(),
            tar: DEFAULT_TAR.to_string(),
        }
    }

    /// Use a different download chain.
    #[must_use]
    pub fn with_downloader(mut self, downloader: Downloader) -> Self {
        self.downloader = downloader;
        self
    }

    /// Use a different archive program.
    #[must_use]
    pub fn with_tar_program(mut self, tar: impl Into<String>) -> Self {
        self.tar = tar.into();
        self
    }

    /// Root of the `<name>/<version>/<file>` tree.
    #[must_use]
    pub fn install_root(&self) -> &Path {
        &self.install_root
    }

    /// Platform tools are installed for.
    #[must_use]
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Classify `(name, range)` requests against this installer's catalog,
    /// install root and platform.
    pub fn plan<'r, I>(&self, requests: I) -> (InstallPlan, Vec<ToolError>)
    where
        I: IntoIterator<Item = (&'r str, &'r str)>,
    {
        classify(self.catalog, &self.install_root, self.platform, requests)
    }

    /// Make `bin_dir` match `plan`.
    ///
    /// Downloads every missing tool concurrently, links existing ones,
    /// unlinks tools no longer requested and reports unsupported ones.
    ///
    /// # Errors
    ///
    /// Only fails outright if `bin_dir` cannot be created. Per-tool failures
    /// are collected in the returned report.
    pub async fn install(&self, plan: &InstallPlan, bin_dir: &Path) -> Result<InstallReport> {
        tokio::fs::create_dir_all(bin_dir)
            .await
            .map_err(|e| Error::io(e, bin_dir, "create bin directory"))?;

        let linker = Linker::new(bin_dir, LinkStrategy::for_platform(self.platform));
        let mut report = InstallReport::default();
        info!(
            missing = plan.missing.len(),
            existing = plan.existing.len(),
            bin_dir = %bin_dir.display(),
            "Installing tools"
        );

        let fetched = join_all(
            plan.missing
                .iter()
                .map(|tool| self.install_missing(tool, &linker)),
        )
        .await;
        for (tool, result) in plan.missing.iter().zip(fetched) {
            collect(&mut report, tool, result);
        }

        for tool in &plan.existing {
            let result = linker.link(tool).inspect(|link| {
                emit_tool_linked!(tool.name, tool.version, *link == LinkOutcome::Created);
            });
            collect(&mut report, tool, result);
        }

        self.sweep(plan, &linker, &mut report);

        for tool in &plan.unsupported {
            let message = tool.to_string();
            emit_tool_unsupported!(tool.name, tool.version, message);
            report.messages.push(message);
        }

        info!(
            succeeded = report.outcomes.len(),
            failed = report.failures.len(),
            "Install finished"
        );
        Ok(report)
    }

    /// Path to the executable for `name` at the newest version matching
    /// `range`, downloading it first if needed. Nothing is linked.
    ///
    /// # Errors
    ///
    /// Returns a resolution error, [`Error::Unsupported`] for platforms
    /// without a build, or the first failure of the download pipeline.
    pub async fn get_executable(&self, name: &str, range: &str) -> Result<PathBuf> {
        let tool = match resolve_tool(self.catalog, &self.install_root, self.platform, name, range)?
        {
            Resolution::Supported(tool) => tool,
            Resolution::Unsupported(tool) => return Err(Error::unsupported(tool.to_string())),
        };

        if is_installed(&tool)? {
            debug!(tool = %tool.label(), "Executable already present");
            return Ok(tool.target_path);
        }

        ensure_parent(&tool.target_path).await?;
        self.fetch(&tool, &mut Progress::start(&tool)).await?;
        Ok(tool.target_path)
    }

    /// Unlink every catalog tool the plan does not mention.
    fn sweep(&self, plan: &InstallPlan, linker: &Linker, report: &mut InstallReport) {
        for (name, version) in self.catalog.entries() {
            if plan.mentions(name) {
                continue;
            }
            let Some(asset) = self.catalog.asset(name, version, self.platform) else {
                continue;
            };
            let tool = ResolvedTool::new(&self.install_root, name, version, asset.clone());
            match linker.unlink(&tool) {
                Ok(LinkOutcome::Removed) => {
                    emit_tool_removed!(tool.name, tool.version);
                    report.record(name, version, LinkOutcome::Removed);
                }
                Ok(_) => {}
                Err(error) => collect(report, &tool, Err(error)),
            }
        }
    }

    async fn install_missing(&self, tool: &ResolvedTool, linker: &Linker) -> Result<LinkOutcome> {
        let mut progress = Progress::start(tool);
        let result = async {
            ensure_parent(&tool.target_path).await?;
            self.fetch(tool, &mut progress).await?;
            linker.link(tool)
        }
        .await;

        match &result {
            Ok(link) => {
                progress.advance(DownloadState::Linked);
                emit_tool_linked!(tool.name, tool.version, *link == LinkOutcome::Created);
            }
            Err(error) => {
                progress.advance(DownloadState::Failed);
                debug!(tool = %tool.label(), %error, "Install failed");
            }
        }
        result
    }

    /// Download, verify and extract one tool to its target path.
    async fn fetch(&self, tool: &ResolvedTool, progress: &mut Progress<'_>) -> Result<()> {
        let mut download = self.downloader.start(&tool.asset.url).await?;
        let mut extractor =
            match Extractor::start(tool.asset.archive, &tool.target_path, &self.tar).await {
                Ok(extractor) => extractor,
                Err(error) => {
                    download.kill().await;
                    return Err(error);
                }
            };
        let mut verifier = Verifier::new();
        progress.advance(DownloadState::Downloading(0));

        let streamed = async {
            while let Some(chunk) = download.next_chunk().await? {
                verifier.update(&chunk);
                extractor.write(&chunk).await?;
                if let Some(percent) = download.take_progress() {
                    progress.advance(DownloadState::Downloading(percent));
                }
            }
            download.finish().await
        }
        .await;
        if let Err(error) = streamed {
            download.kill().await;
            return Err(error.with_cleanup(extractor.abort().await));
        }

        progress.advance(DownloadState::Verifying);
        if let Err(error) = verifier.verify(&tool.asset, download.command()) {
            return Err(error.with_cleanup(extractor.abort().await));
        }

        progress.advance(DownloadState::Extracting);
        extractor.finish().await?;
        debug!(tool = %tool.label(), path = %tool.target_path.display(), "Extracted");
        Ok(())
    }
}

fn collect(report: &mut InstallReport, tool: &ResolvedTool, result: Result<LinkOutcome>) {
    match result {
        Ok(link) => report.record(&tool.name, &tool.version, link),
        Err(error) => {
            emit_tool_failed!(tool.name, tool.version, error);
            report.failures.push(ToolFailure {
                name: tool.name.clone(),
                version: tool.version.clone(),
                target_path: tool.target_path.clone(),
                url: tool.asset.url.clone(),
                error,
            });
        }
    }
}

async fn ensure_parent(target: &Path) -> Result<()> {
    let Some(dir) = target.parent() else {
        return Ok(());
    };
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| Error::io(e, dir, "create destination directory"))
}
