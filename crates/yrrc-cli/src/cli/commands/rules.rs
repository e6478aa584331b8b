//! `yrrc`: collect expected hashes from rule metadata, or scan cached samples.

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;
use yrrc_core::config::{CollectConfig, ScanConfig};
use yrrc_core::{hashes, rules};

use crate::cli::RulesMode;

pub fn run_rules(config_path: &Path, mode: RulesMode) -> Result<()> {
    let document = render_rules(config_path, mode)?;
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}

/// Build the JSON document `yrrc` prints for `mode`.
pub fn render_rules(config_path: &Path, mode: RulesMode) -> Result<Value> {
    let document = match mode {
        RulesMode::Collect => {
            let cfg = CollectConfig::load(config_path)
                .with_context(|| format!("load config {}", config_path.display()))?;
            tracing::debug!("loaded collect config: {:?}", cfg);
            let compiled = rules::compile_rules(&cfg.rules_file)?;
            rules::collect_expected(&compiled, &cfg.meta_key)
        }
        RulesMode::Scan => {
            let cfg = ScanConfig::load(config_path)
                .with_context(|| format!("load config {}", config_path.display()))?;
            tracing::debug!("loaded scan config: {:?}", cfg);
            let mut entries = hashes::load_hashes_json(&cfg.hashes_file)?;
            let compiled = rules::compile_rules(&cfg.rules_file)?;
            rules::scan_samples(&compiled, &cfg.cache_dir, &mut entries);
            entries
        }
    };
    Ok(Value::Object(document))
}
