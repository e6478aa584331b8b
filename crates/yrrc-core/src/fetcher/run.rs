//! Curl multi event loop: add every pending sample, then perform / messages /
//! wait until all transfers have completed.

use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use url::Url;

use crate::credential::Credential;

use super::handler::SampleHandler;
use super::outcome::{finish_sample, SampleOutcome};
use super::request::add_sample_to_multi;
use super::{FetchError, FetchOptions, FetchSummary, SampleEvent};

const WAIT_MS: u64 = 100;

/// Launch one transfer per pending hash and drive them all to completion.
/// Per-sample failures are recorded in the summary; only multi-handle errors abort the batch.
pub(super) fn run_multi(
    base: &Url,
    credential: &Credential,
    cache_dir: &Path,
    pending: Vec<String>,
    opts: &FetchOptions,
    events: Option<&UnboundedSender<SampleEvent>>,
) -> Result<FetchSummary, FetchError> {
    let multi = curl::multi::Multi::new();
    let mut active: Vec<curl::multi::Easy2Handle<SampleHandler>> = Vec::with_capacity(pending.len());
    for hash in &pending {
        active.push(add_sample_to_multi(
            &multi, base, credential, cache_dir, hash, opts,
        )?);
    }

    let mut summary = FetchSummary::default();
    while !active.is_empty() {
        let running = multi.perform()?;

        let mut completed: Vec<(usize, Result<(), curl::Error>)> = Vec::new();
        multi.messages(|msg| {
            for (i, handle) in active.iter().enumerate() {
                if let Some(res) = msg.result_for2(handle) {
                    completed.push((i, res));
                    break;
                }
            }
        });
        completed.sort_by(|a, b| b.0.cmp(&a.0));

        for (i, res) in completed {
            let handle = active.remove(i);
            let mut easy = multi.remove2(handle)?;
            let code = easy.response_code().unwrap_or(0);
            let handler = easy.get_mut();
            let outcome = finish_sample(code, res, handler);
            log_outcome(&handler.hash, &outcome);
            if let Some(tx) = events {
                let _ = tx.send(SampleEvent {
                    hash: handler.hash.clone(),
                    outcome: outcome.clone(),
                });
            }
            summary.outcomes.insert(handler.hash.clone(), outcome);
        }

        if running > 0 {
            multi.wait(&mut [], Duration::from_millis(WAIT_MS))?;
        }
    }

    tracing::info!(
        written = summary.written(),
        unavailable = summary.unavailable(),
        failed = summary.failed(),
        "sample batch finished"
    );
    Ok(summary)
}

fn log_outcome(hash: &str, outcome: &SampleOutcome) {
    match outcome {
        SampleOutcome::Written { bytes } => tracing::debug!(hash, bytes, "sample written"),
        SampleOutcome::Status(status) => tracing::warn!(hash, status, "sample not downloaded"),
        SampleOutcome::Failed(reason) => {
            tracing::warn!(hash, reason = %reason, "sample download failed")
        }
    }
}
