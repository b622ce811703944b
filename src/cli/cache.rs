//! `gitcache cache`: direct access to `CacheHierarchy`/`LocalCache`
//! operations, mirroring the teacher's `agpm cache` command shape
//! (spec §B).

use crate::cache::{CacheLayout, KeyedLocks, LocalCache};
use crate::config;
use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use std::sync::Arc;

#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// Remove every cached tarball.
    Clear,
    /// Print the cache root directory.
    Path,
}

pub async fn run(cmd: CacheCommand) -> Result<i32> {
    let cache_root = config::cache_root()?;

    match cmd {
        CacheCommand::Clear => {
            let layout = Arc::new(CacheLayout::new(cache_root));
            let platform = crate::utils::platform::platform_id();
            let local = LocalCache::new(layout, platform, Arc::new(KeyedLocks::new()));
            local.clear_sync()?;
            println!("{}", "cache cleared".green());
        }
        CacheCommand::Path => {
            println!("{}", cache_root_display(&cache_root));
        }
    }

    Ok(0)
}

fn cache_root_display(path: &std::path::Path) -> String {
    path.display().to_string()
}
