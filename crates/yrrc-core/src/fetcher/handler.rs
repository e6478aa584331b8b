//! Easy2 Handler for one sample transfer.
//! Writes the body to the cache file only when the final response is 200.

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::str;

/// Handler state for one sample download. Implements curl's Handler for Easy2.
pub struct SampleHandler {
    pub(super) hash: String,
    pub(super) path: PathBuf,
    pub(super) response_headers: Vec<String>,
    /// None = body not seen yet; Some(true) = status 200, writing; Some(false) = discarding.
    pub(super) status_ok: Option<bool>,
    pub(super) file: Option<File>,
    pub(super) bytes_written: u64,
    pub(super) write_error: Option<io::Error>,
}

impl SampleHandler {
    pub(super) fn new(hash: String, path: PathBuf) -> Self {
        Self {
            hash,
            path,
            response_headers: Vec::new(),
            status_ok: None,
            file: None,
            bytes_written: 0,
            write_error: None,
        }
    }

    /// Create (or truncate) the cache file if it isn't open yet.
    pub(super) fn open_file(&mut self) -> io::Result<&mut File> {
        if self.file.is_none() {
            self.file = Some(File::create(&self.path)?);
        }
        match self.file.as_mut() {
            Some(f) => Ok(f),
            None => Err(io::Error::new(io::ErrorKind::Other, "cache file not open")),
        }
    }
}

/// Status code from the last `HTTP/` line (the final response after redirects).
pub(super) fn parse_http_status(headers: &[String]) -> Option<u32> {
    headers
        .iter()
        .rev()
        .find(|l| l.starts_with("HTTP/"))
        .and_then(|l| l.split_whitespace().nth(1))
        .and_then(|code| code.parse().ok())
}

impl curl::easy::Handler for SampleHandler {
    fn header(&mut self, data: &[u8]) -> bool {
        if let Ok(s) = str::from_utf8(data) {
            let line = s.trim_end();
            if line.starts_with("HTTP/") {
                self.response_headers.clear();
            }
            self.response_headers.push(line.to_string());
        }
        true
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, curl::easy::WriteError> {
        if self.status_ok.is_none() {
            self.status_ok = Some(parse_http_status(&self.response_headers) == Some(200));
        }
        if self.status_ok == Some(false) {
            return Ok(data.len());
        }
        let res = self.open_file().and_then(|f| f.write_all(data));
        match res {
            Ok(()) => {
                self.bytes_written += data.len() as u64;
                Ok(data.len())
            }
            Err(e) => {
                self.write_error = Some(e);
                Ok(0)
            }
        }
    }
}
