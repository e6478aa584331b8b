//! API key loaded from the credential file named by `vt_key`.

use anyhow::{Context, Result};
use std::fmt;
use std::fs;
use std::path::Path;

/// Request header carrying the API key.
pub const API_KEY_HEADER: &str = "X-apikey";

/// The credential file's contents, exactly as read.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Contents as read, including any trailing newline.
    pub fn raw(&self) -> &str {
        &self.0
    }

    /// Value for the request header. Trailing CR/LF is dropped since a line
    /// break cannot be sent inside a header; everything else is kept.
    pub fn header_value(&self) -> &str {
        self.0.trim_end_matches(['\r', '\n'])
    }

    /// Full `X-apikey: <key>` header line for curl.
    /// curl drops a `Name:` line with nothing after the colon, so a blank key
    /// uses its `Name;` form, which sends the header with an empty value.
    pub fn header_line(&self) -> String {
        let value = self.header_value();
        if value.trim().is_empty() {
            format!("{};", API_KEY_HEADER)
        } else {
            format!("{}: {}", API_KEY_HEADER, value)
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential(<{} bytes>)", self.0.len())
    }
}

/// Read the whole credential file.
pub fn read_credential(path: &Path) -> Result<Credential> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read credential file {}", path.display()))?;
    Ok(Credential(raw))
}
