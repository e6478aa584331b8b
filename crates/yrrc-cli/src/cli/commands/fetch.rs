//! `yrrc-fetch`: download the samples named in the hashes file into the cache.

use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};
use std::path::Path;
use yrrc_core::config::FetchConfig;
use yrrc_core::credential;
use yrrc_core::fetcher::{self, FetchOptions, SampleEvent};
use yrrc_core::hashes;

const NO_HASHES: &str = "No hashes file to parse";

pub async fn run_fetch(config_path: &Path) -> Result<()> {
    let cfg = FetchConfig::load(config_path)
        .with_context(|| format!("load config {}", config_path.display()))?;
    tracing::debug!("loaded fetch config: {:?}", cfg);

    if !cfg.cache_dir.is_dir() {
        bail!("Cache directory does not exist: {}", cfg.cache_dir.display());
    }

    let entries = match entries_to_fetch(&cfg.hashes_file) {
        Ok(entries) => entries,
        Err(message) => {
            println!("{}", message);
            return Ok(());
        }
    };

    let credential = credential::read_credential(&cfg.vt_key)?;
    let samples = hashes::select_hashes(&entries);
    tracing::info!(
        entries = entries.len(),
        valid = samples.len(),
        "hashes file parsed"
    );

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<SampleEvent>();
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            println!("{}", event);
        }
    });

    let summary = fetcher::fetch_samples_async(
        samples,
        credential,
        cfg.cache_dir.clone(),
        FetchOptions::with_api_url(cfg.vt_api_url.clone()),
        Some(tx),
    )
    .await
    .context("fetch samples")?;
    printer.await.context("progress printer join")?;

    tracing::info!(
        cached = summary.already_cached,
        requested = summary.requested(),
        written = summary.written(),
        unavailable = summary.unavailable(),
        failed = summary.failed(),
        "fetch finished"
    );
    Ok(())
}

/// Top-level entries of the hashes file, or the line to print when there is
/// nothing to fetch (empty object, or a file that could not be loaded).
pub(crate) fn entries_to_fetch(path: &Path) -> Result<Map<String, Value>, String> {
    match hashes::load_hashes_json(path) {
        Ok(entries) if !entries.is_empty() => Ok(entries),
        Ok(_) => Err(NO_HASHES.to_string()),
        Err(e) => {
            tracing::error!("{}", e);
            Err(format!("{}: {}", NO_HASHES, e))
        }
    }
}
