//! Core types for toolpin.
//!
//! This crate holds everything that can be decided without touching the
//! network:
//! - [`catalog`]: the compiled-in table of tools, versions and assets
//! - [`version`]: range parsing and resolution
//! - [`plan`]: sorting requested tools into existing, missing and unsupported
//! - [`platform`]: host detection
//! - [`paths`]: install root, manifest and link locations
//!
//! # Example
//!
//! ```rust,no_run
//! use toolpin_core::{Catalog, Platform, plan};
//! use std::path::Path;
//!
//! # fn main() -> toolpin_core::Result<()> {
//! let catalog = Catalog::builtin()?;
//! let (plan, errors) = plan::classify(
//!     catalog,
//!     Path::new("/home/me/.toolpin/tools"),
//!     Platform::current()?,
//!     [("elm", "^0.19.1")],
//! );
//! assert!(errors.is_empty());
//! # let _ = plan;
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod error;
pub mod paths;
pub mod plan;
pub mod platform;
pub mod version;

pub use catalog::{ArchiveKind, AssetDescriptor, Catalog};
pub use error::{Error, Result};
pub use plan::{InstallPlan, Resolution, ResolvedTool, ToolError, UnsupportedTool};
pub use platform::{Arch, Os, Platform};
pub use version::VersionRange;
