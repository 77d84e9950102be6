//! Command execution implementations

use super::Commands;
use super::{check, dump, upgrade};

impl Commands {
    /// Execute the selected command.
    ///
    /// # Errors
    /// Returns an error if the underlying command fails.
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            Commands::Check {
                paths,
                recursive,
                kind,
                quiet,
            } => check::execute(paths, *recursive, kind.forced(), *quiet),
            Commands::Dump {
                path,
                kind,
                json,
                raw,
            } => dump::execute(path, kind.forced(), *json, *raw),
            Commands::Upgrade {
                path,
                output,
                kind,
                no_backup,
                generator,
            } => upgrade::execute(path, output.as_deref(), kind.forced(), !*no_backup, generator),
        }
    }
}
