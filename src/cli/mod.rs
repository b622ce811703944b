//! Command-line argument parsing and dispatch (spec §C: deliberately thin —
//! argument parsing itself is an out-of-scope external collaborator, only
//! the surface needed to invoke `install` and pass through `npm install`
//! arguments is implemented).

pub mod cache;
pub mod install;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// A drop-in accelerator for `npm install` on projects with Git-sourced
/// dependencies.
#[derive(Debug, Parser)]
#[command(name = "gitcache", version, about)]
pub struct Cli {
    /// Enable debug-level logging (equivalent to `GITCACHE_VERBOSE=1`).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Accelerate and run `npm install`.
    Install(install::InstallArgs),

    /// Manage the local gitcache cache.
    #[command(subcommand)]
    Cache(cache::CacheCommand),
}

impl Cli {
    /// Dispatches to the selected subcommand, defaulting to `install` with
    /// no extra arguments when none is given (so `gitcache` alone behaves
    /// like `gitcache install`, matching `npm`'s own bare-command ergonomics).
    pub async fn run(self) -> Result<i32> {
        match self.command {
            Some(Commands::Install(args)) => install::run(args).await,
            Some(Commands::Cache(cmd)) => cache::run(cmd).await,
            None => install::run(install::InstallArgs::default()).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_install_with_passthrough_args() {
        let cli = Cli::parse_from(["gitcache", "install", "--", "--no-audit"]);
        match cli.command {
            Some(Commands::Install(args)) => {
                assert_eq!(args.npm_args, vec!["--no-audit"]);
            }
            other => panic!("expected Install, got {other:?}"),
        }
    }

    #[test]
    fn parses_bare_verbose_flag() {
        let cli = Cli::parse_from(["gitcache", "-v", "install"]);
        assert!(cli.verbose);
    }
}
