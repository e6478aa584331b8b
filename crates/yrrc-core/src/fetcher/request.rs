//! Endpoint URLs and Easy2 setup for sample downloads.

use std::path::Path;
use url::Url;

use crate::credential::Credential;

use super::handler::SampleHandler;
use super::{FetchError, FetchOptions};

/// Parse the files endpoint base URL (e.g. `https://www.virustotal.com/api/v3/files`).
pub fn parse_base_url(base: &str) -> Result<Url, FetchError> {
    let url = Url::parse(base).map_err(|e| FetchError::BaseUrl {
        url: base.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(FetchError::BaseUrl {
            url: base.to_string(),
            reason: "cannot be a base URL".to_string(),
        });
    }
    Ok(url)
}

/// `<base>/<hash>/download`. A trailing slash on the base is not doubled.
pub fn sample_url(base: &Url, hash: &str) -> Result<Url, FetchError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| FetchError::BaseUrl {
            url: base.to_string(),
            reason: "cannot be a base URL".to_string(),
        })?
        .pop_if_empty()
        .push(hash)
        .push("download");
    Ok(url)
}

/// Add a GET for `hash` to the multi handle. The body lands in `cache_dir/<hash>`.
pub(super) fn add_sample_to_multi(
    multi: &curl::multi::Multi,
    base: &Url,
    credential: &Credential,
    cache_dir: &Path,
    hash: &str,
    opts: &FetchOptions,
) -> Result<curl::multi::Easy2Handle<SampleHandler>, FetchError> {
    let url = sample_url(base, hash)?;
    let handler = SampleHandler::new(hash.to_string(), cache_dir.join(hash));
    let mut easy = curl::easy::Easy2::new(handler);
    easy.url(url.as_str())?;
    easy.get(true)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.buffer_size(opts.chunk_size)?;
    easy.connect_timeout(opts.connect_timeout)?;

    let mut list = curl::easy::List::new();
    list.append(&credential.header_line())?;
    easy.http_headers(list)?;

    tracing::debug!(hash, url = %url, "queued sample");
    Ok(multi.add2(easy)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH: &str = "d41d8cd98f00b204e9800998ecf8427e";

    #[test]
    fn sample_url_appends_hash_and_download() {
        let base = parse_base_url("https://www.virustotal.com/api/v3/files").unwrap();
        assert_eq!(
            sample_url(&base, HASH).unwrap().as_str(),
            "https://www.virustotal.com/api/v3/files/d41d8cd98f00b204e9800998ecf8427e/download"
        );
    }

    #[test]
    fn sample_url_trailing_slash_not_doubled() {
        let base = parse_base_url("http://127.0.0.1:8080/files/").unwrap();
        assert_eq!(
            sample_url(&base, HASH).unwrap().as_str(),
            "http://127.0.0.1:8080/files/d41d8cd98f00b204e9800998ecf8427e/download"
        );
    }

    #[test]
    fn bad_base_url_rejected() {
        assert!(matches!(
            parse_base_url("not a url"),
            Err(FetchError::BaseUrl { .. })
        ));
        assert!(matches!(
            parse_base_url("mailto:someone@example.com"),
            Err(FetchError::BaseUrl { .. })
        ));
    }
}
