//! YARA rule side of yrrc.
//!
//! Collect walks the compiled rules and gathers every string metadata value
//! whose identifier starts with the configured `meta_key`; each value is a
//! sample hash the rule is expected to match. The result is the hashes file
//! `yrrc-fetch` reads:
//!
//! ```json
//! { "<hash>": { "expected": ["rule_a", "rule_b"] } }
//! ```
//!
//! Scan takes that document, runs the rules over `<cache_dir>/<hash>` for each
//! entry and records `"matches"` and `"yara_error"` next to `"expected"`.

use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const EXPECTED_KEY: &str = "expected";
pub const MATCHES_KEY: &str = "matches";
pub const YARA_ERROR_KEY: &str = "yara_error";

// libyara result codes, kept so scan reports stay comparable across engines.
pub const YARA_SUCCESS: i64 = 0;
pub const YARA_COULD_NOT_OPEN_FILE: i64 = 3;
pub const YARA_SCAN_TIMEOUT: i64 = 26;
pub const YARA_INTERNAL_FATAL_ERROR: i64 = 31;

#[derive(Debug, Error)]
pub enum RulesError {
    #[error("cannot read rules file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("rule compilation failed for {path}:\n{message}")]
    Compile { path: PathBuf, message: String },
}

/// Compile the YARA source in `path`. Warnings are logged, errors returned.
pub fn compile_rules(path: &Path) -> Result<yara_x::Rules, RulesError> {
    let text = fs::read_to_string(path).map_err(|source| RulesError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let origin = path.display().to_string();

    let mut compiler = yara_x::Compiler::new();
    let source = yara_x::SourceCode::from(text.as_str()).with_origin(origin.as_str());
    compiler
        .add_source(source)
        .map_err(|e| RulesError::Compile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    for warning in compiler.warnings() {
        tracing::warn!("rules {}: {}", origin, warning);
    }

    let rules = compiler.build();
    tracing::debug!(rules = rules.iter().count(), file = %origin, "rules compiled");
    Ok(rules)
}

/// Map each hash named in rule metadata to the rules expecting it.
/// A rule appears once per matching metadata entry, in declaration order.
pub fn collect_expected(rules: &yara_x::Rules, meta_key: &str) -> Map<String, Value> {
    let mut hashes = Map::new();
    for rule in rules.iter() {
        for (identifier, value) in rule.metadata() {
            let yara_x::MetaValue::String(hash) = value else {
                continue;
            };
            if !identifier.starts_with(meta_key) {
                continue;
            }
            let entry = hashes
                .entry(hash.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            push_expected(entry, rule.identifier());
        }
    }
    tracing::info!(hashes = hashes.len(), meta_key, "collected expected hashes");
    hashes
}

fn push_expected(entry: &mut Value, rule: &str) {
    let Value::Object(fields) = entry else {
        return;
    };
    let list = fields
        .entry(EXPECTED_KEY)
        .or_insert_with(|| Value::Array(Vec::new()));
    if let Value::Array(names) = list {
        names.push(Value::from(rule));
    }
}

/// Result of scanning one cached sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleScan {
    pub matches: Vec<String>,
    /// libyara-style result code; [`YARA_SUCCESS`] when the scan completed.
    pub code: i64,
}

/// Scan one file and list the rules it matches.
pub fn scan_sample(scanner: &mut yara_x::Scanner<'_>, path: &Path) -> SampleScan {
    match scanner.scan_file(path) {
        Ok(results) => SampleScan {
            matches: results
                .matching_rules()
                .map(|rule| rule.identifier().to_string())
                .collect(),
            code: YARA_SUCCESS,
        },
        Err(e) => {
            tracing::warn!(path = %path.display(), "scan failed: {}", e);
            SampleScan {
                matches: Vec::new(),
                code: scan_error_code(&e),
            }
        }
    }
}

fn scan_error_code(err: &yara_x::ScanError) -> i64 {
    match err {
        yara_x::ScanError::OpenError { .. } => YARA_COULD_NOT_OPEN_FILE,
        yara_x::ScanError::Timeout { .. } => YARA_SCAN_TIMEOUT,
        _ => YARA_INTERNAL_FATAL_ERROR,
    }
}

/// A hash key usable as a file name directly under the cache directory.
fn is_plain_name(hash: &str) -> bool {
    !hash.is_empty() && Path::new(hash).file_name().and_then(|n| n.to_str()) == Some(hash)
}

/// Scan `<cache_dir>/<hash>` for every entry of `hashes` and record the
/// outcome in place. Entries that aren't objects are replaced by one.
pub fn scan_samples(rules: &yara_x::Rules, cache_dir: &Path, hashes: &mut Map<String, Value>) {
    let mut scanner = yara_x::Scanner::new(rules);
    let mut failed = 0usize;
    for (hash, entry) in hashes.iter_mut() {
        let scan = if is_plain_name(hash) {
            scan_sample(&mut scanner, &cache_dir.join(hash))
        } else {
            tracing::warn!(hash = %hash, "not a cache file name, skipped");
            SampleScan {
                matches: Vec::new(),
                code: YARA_COULD_NOT_OPEN_FILE,
            }
        };
        if scan.code != YARA_SUCCESS {
            failed += 1;
        }

        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        if let Value::Object(fields) = entry {
            fields.insert(
                MATCHES_KEY.to_string(),
                Value::Array(scan.matches.into_iter().map(Value::from).collect()),
            );
            fields.insert(YARA_ERROR_KEY.to_string(), Value::from(scan.code));
        }
    }
    tracing::info!(scanned = hashes.len(), failed, "scan finished");
}
