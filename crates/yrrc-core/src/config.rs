//! Flat JSON configuration shared by the yrrc tools.
//!
//! All tools read the same `config.json`: a single JSON object of string keys
//! to string values. Each tool pulls out only the keys it needs; unknown keys
//! are ignored so the file can also carry settings for the other yrrc tools.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Files endpoint used when `vt_api_url` is not set.
pub const DEFAULT_VT_API_URL: &str = "https://www.virustotal.com/api/v3/files";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot decode config: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("cannot decode config: top-level value is not a JSON object")]
    NotAnObject,

    /// A required key is missing or a value has the wrong type.
    #[error("invalid config: {0}")]
    Invalid(#[source] serde_json::Error),
}

/// The config file's top-level object, before any tool picks its keys out.
#[derive(Debug, Clone, Default)]
pub struct RawConfig {
    entries: Map<String, Value>,
}

impl RawConfig {
    /// Read and parse the config file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&data)
    }

    /// Parse config text. The top-level value must be an object.
    pub fn parse(data: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(data).map_err(ConfigError::Decode)?;
        match value {
            Value::Object(entries) => Ok(Self { entries }),
            _ => Err(ConfigError::NotAnObject),
        }
    }

    /// Deserialize one tool's settings; keys it doesn't know are ignored.
    pub fn extract<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        serde_json::from_value(Value::Object(self.entries.clone())).map_err(ConfigError::Invalid)
    }
}

fn default_vt_api_url() -> String {
    DEFAULT_VT_API_URL.to_string()
}

/// Settings for `yrrc-build`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Path to the git executable.
    pub git_bin: PathBuf,
    /// Remote repository to clone.
    pub git_repo_url: String,
    /// Revision to check out after updating; "master" means stay on master.
    pub git_tag: String,
    /// Local working copy, also the build directory.
    pub build_dir: PathBuf,
}

impl BuildConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        RawConfig::load(path)?.extract()
    }
}

/// Settings for `yrrc-fetch`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Existing directory holding one file per fetched sample.
    pub cache_dir: PathBuf,
    /// JSON object whose keys are the sample hashes to fetch.
    pub hashes_file: PathBuf,
    /// File containing the API key (not the key itself).
    pub vt_key: PathBuf,
    /// Base URL of the files endpoint.
    #[serde(default = "default_vt_api_url")]
    pub vt_api_url: String,
}

impl FetchConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        RawConfig::load(path)?.extract()
    }
}

/// Settings for `yrrc --mode collect`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectConfig {
    /// YARA source file to compile.
    pub rules_file: PathBuf,
    /// Metadata identifier prefix naming the sample hashes in each rule.
    pub meta_key: String,
}

impl CollectConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        RawConfig::load(path)?.extract()
    }
}

/// Settings for `yrrc --mode scan`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfig {
    pub rules_file: PathBuf,
    pub hashes_file: PathBuf,
    pub cache_dir: PathBuf,
}

impl ScanConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        RawConfig::load(path)?.extract()
    }
}
