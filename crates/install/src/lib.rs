//! Download, verification, extraction and linking of pinned tools.
//!
//! [`Installer::install`] takes an [`InstallPlan`](toolpin_core::InstallPlan)
//! and reconciles a project's bin directory with it:
//!
//! ```text
//!  missing ──► Downloader ──┬─► Verifier (size + sha256)
//!                           └─► Extractor (gz | tgz | zip) ──► Linker
//!  existing ─────────────────────────────────────────────────► Linker
//!  not requested ─────────────────────────────────────────────► unlink
//! ```
//!
//! Progress is reported through `toolpin_events` emit macros; nothing here
//! writes to the terminal.

pub mod download;
pub mod error;
pub mod extract;
pub mod installer;
pub mod link;
pub mod report;
pub mod verify;

pub use download::{Download, Downloader, Strategy};
pub use error::{Error, Result};
pub use extract::Extractor;
pub use installer::{DownloadState, Installer};
pub use link::{LinkOutcome, LinkStrategy, Linker};
pub use report::{InstallReport, ToolFailure, ToolOutcome};
pub use verify::Verifier;
