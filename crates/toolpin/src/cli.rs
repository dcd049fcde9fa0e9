//! Command-line arguments.

use crate::tracing::{LogLevel, TracingFormat};
use clap::builder::FalseyValueParser;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Install pinned tool binaries into a project.
#[derive(Parser, Debug)]
#[command(name = "toolpin")]
#[command(about = "Install pinned tool binaries into a project")]
#[command(version)]
pub struct Cli {
    /// What to do.
    #[command(subcommand)]
    pub command: Commands,

    /// Logging level for diagnostics on stderr.
    #[arg(long, global = true, default_value = "warn", value_enum)]
    pub log_level: LogLevel,

    /// Format for diagnostics on stderr.
    #[arg(long, global = true, default_value = "compact", value_enum)]
    pub log_format: TracingFormat,

    /// Emit events as JSON lines instead of human-readable output.
    #[arg(long, global = true)]
    pub json: bool,

    /// Base directory for downloaded tools (installed under `<home>/tools`).
    #[arg(long, global = true, env = "TOOLPIN_HOME")]
    pub home: Option<PathBuf>,

    /// Disable colored output.
    #[arg(long, global = true, env = "NO_COLOR", value_parser = FalseyValueParser::new())]
    pub no_color: bool,

    /// Show per-step progress.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Download, link and clean up the tools listed in toolpin.json.
    Install,
    /// Print the path to a tool's executable, downloading it if needed.
    Which {
        /// Tool name, e.g. `elm`.
        name: String,
        /// Version range, e.g. `^0.19.1` or `=0.19.1`.
        range: String,
    },
    /// List every known tool, version and supported platform.
    List,
}

impl Commands {
    /// Name used in command lifecycle events.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Which { .. } => "which",
            Self::List => "list",
        }
    }

    /// Positional arguments used in command lifecycle events.
    #[must_use]
    pub fn args(&self) -> Vec<String> {
        match self {
            Self::Which { name, range } => vec![name.clone(), range.clone()],
            Self::Install | Self::List => Vec::new(),
        }
    }
}

/// Parse arguments from the process environment.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_which_arguments() {
        let cli = Cli::try_parse_from(["toolpin", "which", "elm", "^0.19.1"]).unwrap();
        assert_eq!(
            cli.command,
            Commands::Which {
                name: "elm".to_string(),
                range: "^0.19.1".to_string(),
            }
        );
        assert_eq!(cli.command.name(), "which");
        assert_eq!(cli.command.args(), vec!["elm", "^0.19.1"]);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "toolpin",
            "install",
            "--json",
            "--home",
            "/tmp/toolpin",
            "--log-level",
            "debug",
            "-v",
        ])
        .unwrap();
        assert!(cli.json);
        assert!(cli.verbose);
        assert_eq!(cli.home, Some(PathBuf::from("/tmp/toolpin")));
        assert!(matches!(cli.log_level, LogLevel::Debug));
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["toolpin"]).is_err());
    }
}
