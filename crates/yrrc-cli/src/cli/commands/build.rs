//! `yrrc-build`: sync the working copy, then bootstrap, configure and make.

use anyhow::{Context, Result};
use std::path::Path;
use yrrc_core::build;
use yrrc_core::config::BuildConfig;
use yrrc_core::process::SystemRunner;
use yrrc_core::repo;

pub fn run_build(config_path: &Path) -> Result<()> {
    let cfg = BuildConfig::load(config_path)
        .with_context(|| format!("load config {}", config_path.display()))?;
    tracing::debug!("loaded build config: {:?}", cfg);

    let action = repo::sync_repo(
        &SystemRunner,
        &cfg.git_bin,
        &cfg.git_repo_url,
        &cfg.git_tag,
        &cfg.build_dir,
        |event| println!("{}", event),
    )
    .with_context(|| format!("sync working copy {}", cfg.build_dir.display()))?;
    tracing::info!(?action, revision = %cfg.git_tag, "working copy ready");

    build::run_build(&SystemRunner, &cfg.build_dir)
        .with_context(|| format!("build in {}", cfg.build_dir.display()))?;
    tracing::info!(dir = %cfg.build_dir.display(), "build finished");
    Ok(())
}
