//! Concurrent sample fetcher.
//!
//! Takes the requested hash set, drops hashes already present in the cache
//! directory, and downloads the rest from the files endpoint in one curl
//! multi batch: every request is added up front and a single-threaded event
//! loop drives them until all have settled. Each sample is independent; a
//! non-200 status or transport error only affects that sample.

mod handler;
mod outcome;
mod request;
mod run;

use anyhow::Context;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

use crate::cache;
use crate::config::DEFAULT_VT_API_URL;
use crate::credential::Credential;

pub use outcome::SampleOutcome;
pub use request::{parse_base_url, sample_url};

/// Largest body chunk handed to the cache file per write (curl receive buffer size).
pub const CHUNK_SIZE: usize = 10 * 1024;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("cannot list cache directory {path}: {source}")]
    CacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid API URL {url}: {reason}")]
    BaseUrl { url: String, reason: String },

    #[error("curl setup: {0}")]
    Curl(#[from] curl::Error),

    #[error("curl multi: {0}")]
    Multi(#[from] curl::MultiError),
}

/// Request settings shared by every transfer in a batch.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Files endpoint; each sample is fetched from `<api_url>/<hash>/download`.
    pub api_url: String,
    pub chunk_size: usize,
    pub connect_timeout: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_VT_API_URL.to_string(),
            chunk_size: CHUNK_SIZE,
            connect_timeout: Duration::from_secs(30),
        }
    }
}

impl FetchOptions {
    pub fn with_api_url(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Self::default()
        }
    }
}

/// Sent once per finished sample, in completion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleEvent {
    pub hash: String,
    pub outcome: SampleOutcome,
}

impl fmt::Display for SampleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.hash, self.outcome)
    }
}

/// Per-sample results of one batch.
#[derive(Debug, Clone, Default)]
pub struct FetchSummary {
    /// Requested hashes skipped because the cache already had them.
    pub already_cached: usize,
    pub outcomes: BTreeMap<String, SampleOutcome>,
}

impl FetchSummary {
    /// Number of requests issued.
    pub fn requested(&self) -> usize {
        self.outcomes.len()
    }

    pub fn written(&self) -> usize {
        self.count(|o| matches!(o, SampleOutcome::Written { .. }))
    }

    pub fn unavailable(&self) -> usize {
        self.count(|o| matches!(o, SampleOutcome::Status(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, SampleOutcome::Failed(_)))
    }

    fn count(&self, pred: impl Fn(&SampleOutcome) -> bool) -> usize {
        self.outcomes.values().filter(|o| pred(o)).count()
    }
}

/// Download every hash in `samples` that is not already in `cache_dir`.
/// Blocks until all transfers have settled; call from `spawn_blocking` if used
/// from async code (or use [`fetch_samples_async`]).
/// If `events` is `Some`, each finished sample is sent as a [`SampleEvent`].
pub fn fetch_samples(
    samples: &HashSet<String>,
    credential: &Credential,
    cache_dir: &Path,
    opts: &FetchOptions,
    events: Option<&UnboundedSender<SampleEvent>>,
) -> Result<FetchSummary, FetchError> {
    let base = parse_base_url(&opts.api_url)?;
    let cached = cache::cached_names(cache_dir).map_err(|source| FetchError::CacheDir {
        path: cache_dir.to_path_buf(),
        source,
    })?;
    let pending = cache::pending(samples, &cached);
    let already_cached = samples.len() - pending.len();
    tracing::info!(
        requested = samples.len(),
        cached = already_cached,
        pending = pending.len(),
        "fetching samples"
    );

    let mut summary = if pending.is_empty() {
        FetchSummary::default()
    } else {
        run::run_multi(&base, credential, cache_dir, pending, opts, events)?
    };
    summary.already_cached = already_cached;
    Ok(summary)
}

/// Runs [`fetch_samples`] on a blocking thread.
pub async fn fetch_samples_async(
    samples: HashSet<String>,
    credential: Credential,
    cache_dir: PathBuf,
    opts: FetchOptions,
    events: Option<UnboundedSender<SampleEvent>>,
) -> anyhow::Result<FetchSummary> {
    tokio::task::spawn_blocking(move || {
        fetch_samples(&samples, &credential, &cache_dir, &opts, events.as_ref())
            .map_err(anyhow::Error::from)
    })
    .await
    .context("fetch task join")?
}
