//! Subcommand implementations.
//!
//! Commands report through `toolpin_events` emit macros and return an exit
//! code; the binary owns rendering.

pub mod install;
pub mod list;
pub mod which;

use crate::cli::{Cli, Commands};
use crate::errors::CliError;
use std::path::PathBuf;
use toolpin_core::paths;

/// Run the selected subcommand.
///
/// # Errors
///
/// Returns the command's error; per-tool install failures are reported in
/// the exit code instead.
pub async fn execute(cli: &Cli) -> Result<i32, CliError> {
    match &cli.command {
        Commands::Install => install::execute(cli).await,
        Commands::Which { name, range } => which::execute(cli, name, range).await,
        Commands::List => list::execute(),
    }
}

/// `--home`, `TOOLPIN_HOME`, or `~/.toolpin`, always absolute.
pub(crate) fn home(cli: &Cli) -> Result<PathBuf, CliError> {
    match &cli.home {
        Some(home) => Ok(paths::absolute_home(home)?),
        None => Ok(paths::home_dir()?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_relative_home_flag_is_made_absolute() {
        let cli = Cli::try_parse_from(["toolpin", "--home", "pins", "list"]).unwrap();
        let home = home(&cli).unwrap();
        assert!(home.is_absolute(), "{}", home.display());
        assert_eq!(home, std::env::current_dir().unwrap().join("pins"));
    }
}
