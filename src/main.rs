//! gitcache CLI entry point.
//!
//! `gitcache install` wraps `npm install`: it accelerates the Git-sourced
//! slice of a project's dependencies before handing off to npm for the rest.

use gitcache_cli::cli;
use gitcache_cli::core::error::user_friendly_error;
use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Logging rules, matching the teacher's:
    // 1. RUST_LOG set -> use it, regardless of --verbose.
    // 2. RUST_LOG unset, --verbose or GITCACHE_VERBOSE=1 -> debug.
    // 3. Otherwise -> off.
    let rust_log_exists = std::env::var("RUST_LOG").is_ok();
    let is_verbose = cli.verbose || gitcache_cli::config::verbose_requested();

    let filter = if rust_log_exists {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error"))
    } else if is_verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("off")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.run().await {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
