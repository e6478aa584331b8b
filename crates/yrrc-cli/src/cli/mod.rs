//! Argument parsing for the yrrc binaries.

mod commands;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use yrrc_core::config;

pub use commands::{render_rules, run_build, run_fetch, run_rules};

/// Clone or update the YARA working copy and build it.
#[derive(Debug, Parser)]
#[command(name = "yrrc-build", version)]
#[command(about = "Sync a YARA checkout and run bootstrap/configure/make", long_about = None)]
pub struct BuildCli {
    /// JSON config file with git_bin, git_repo_url, git_tag and build_dir.
    #[arg(short = 'c', long, value_name = "FILE", default_value = config::DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,
}

impl BuildCli {
    pub fn run_from_args() -> Result<()> {
        let cli = Self::parse();
        run_build(&cli.config)
    }
}

/// Download every sample listed in the hashes file that the cache lacks.
#[derive(Debug, Parser)]
#[command(name = "yrrc-fetch", version)]
#[command(about = "Fetch missing malware samples into the local cache", long_about = None)]
pub struct FetchCli {
    /// JSON config file with cache_dir, hashes_file and vt_key.
    #[arg(short = 'c', long, value_name = "FILE", default_value = config::DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,
}

impl FetchCli {
    pub async fn run_from_args() -> Result<()> {
        let cli = Self::parse();
        run_fetch(&cli.config).await
    }
}

/// Which rules pass `yrrc` runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RulesMode {
    /// Print the hashes named in rule metadata with the rules expecting them.
    Collect,
    /// Scan cached samples listed in the hashes file and print the results.
    Scan,
}

/// Collect expected hashes from YARA rules, or scan the cached samples.
#[derive(Debug, Parser)]
#[command(name = "yrrc", version)]
#[command(about = "YARA rules regression checker", long_about = None)]
pub struct RulesCli {
    /// JSON config file with rules_file plus meta_key (collect) or hashes_file and cache_dir (scan).
    #[arg(short = 'c', long, value_name = "FILE", default_value = config::DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    #[arg(short = 'm', long, value_enum)]
    pub mode: RulesMode,
}

impl RulesCli {
    pub fn run_from_args() -> Result<()> {
        let cli = Self::parse();
        run_rules(&cli.config, cli.mode)
    }
}

#[cfg(test)]
mod tests;
