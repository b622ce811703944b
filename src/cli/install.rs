//! `gitcache install`: accelerate the Git-sourced dependencies in the
//! project's lockfile, then hand off to `npm install` (spec §4.8).

use crate::installer::{self, InstallOptions};
use anyhow::Result;
use clap::Args;

#[derive(Debug, Default, Args)]
pub struct InstallArgs {
    /// Project directory containing the lockfile (defaults to the current
    /// directory).
    #[arg(long)]
    pub dir: Option<std::path::PathBuf>,

    /// Bound on concurrent reference resolutions (spec §4.2 default 8).
    #[arg(long)]
    pub max_parallel_resolve: Option<usize>,

    /// Bound on concurrent tarball builds (spec §4.6 default 4).
    #[arg(long)]
    pub max_parallel_build: Option<usize>,

    /// Arguments forwarded verbatim to `npm install`.
    #[arg(last = true)]
    pub npm_args: Vec<String>,
}

pub async fn run(args: InstallArgs) -> Result<i32> {
    let mut opts = InstallOptions {
        passthrough_args: args.npm_args,
        ..InstallOptions::default()
    };
    if let Some(dir) = args.dir {
        opts.project_dir = dir;
    }
    if let Some(n) = args.max_parallel_resolve {
        opts.resolver_max_parallel = n;
    }
    if let Some(n) = args.max_parallel_build {
        opts.builder_max_parallel = n;
    }

    installer::install(opts).await
}
