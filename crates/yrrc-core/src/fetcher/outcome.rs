//! Build SampleOutcome from a completed Easy2 transfer (code + curl result + handler state).

use std::fmt;

use super::handler::SampleHandler;

/// How one sample download ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleOutcome {
    /// Status 200; body written to the cache file.
    Written { bytes: u64 },
    /// Any other final status; nothing written.
    Status(u32),
    /// Transport or local write failure; any partial file was removed.
    Failed(String),
}

impl fmt::Display for SampleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleOutcome::Written { .. } => write!(f, "200"),
            SampleOutcome::Status(code) => write!(f, "{}", code),
            SampleOutcome::Failed(reason) => write!(f, "error: {}", reason),
        }
    }
}

/// Close the cache file and decide the outcome. Partial files from failed
/// transfers are removed so a later run does not treat them as cached.
pub(super) fn finish_sample(
    code: u32,
    transfer: Result<(), curl::Error>,
    handler: &mut SampleHandler,
) -> SampleOutcome {
    if let Some(e) = handler.write_error.take() {
        discard_partial(handler);
        return SampleOutcome::Failed(format!("write {}: {}", handler.path.display(), e));
    }
    if let Err(e) = transfer {
        discard_partial(handler);
        return SampleOutcome::Failed(e.to_string());
    }
    if code != 200 {
        return SampleOutcome::Status(code);
    }
    // An empty 200 body never reaches write(); still leave an (empty) file.
    let created = handler.open_file().map(|_| ());
    if let Err(e) = created {
        return SampleOutcome::Failed(format!("create {}: {}", handler.path.display(), e));
    }
    handler.file.take();
    SampleOutcome::Written {
        bytes: handler.bytes_written,
    }
}

fn discard_partial(handler: &mut SampleHandler) {
    if handler.file.take().is_some() {
        if let Err(e) = std::fs::remove_file(&handler.path) {
            tracing::warn!("could not remove partial {}: {}", handler.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curl::easy::Handler;

    const HASH: &str = "d41d8cd98f00b204e9800998ecf8427e";

    fn handler_in(dir: &tempfile::TempDir) -> SampleHandler {
        SampleHandler::new(HASH.to_string(), dir.path().join(HASH))
    }

    #[test]
    fn ok_200_reports_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let mut h = handler_in(&dir);
        h.header(b"HTTP/1.1 200 OK\r\n");
        h.write(b"sample").unwrap();
        let outcome = finish_sample(200, Ok(()), &mut h);
        assert_eq!(outcome, SampleOutcome::Written { bytes: 6 });
        assert!(h.file.is_none(), "file closed after finish");
        assert_eq!(std::fs::read(dir.path().join(HASH)).unwrap(), b"sample");
    }

    #[test]
    fn empty_200_still_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut h = handler_in(&dir);
        let outcome = finish_sample(200, Ok(()), &mut h);
        assert_eq!(outcome, SampleOutcome::Written { bytes: 0 });
        assert_eq!(std::fs::metadata(dir.path().join(HASH)).unwrap().len(), 0);
    }

    #[test]
    fn non_200_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut h = handler_in(&dir);
        h.header(b"HTTP/1.1 404 Not Found\r\n");
        h.write(b"nope").unwrap();
        assert_eq!(finish_sample(404, Ok(()), &mut h), SampleOutcome::Status(404));
        assert!(!dir.path().join(HASH).exists());
    }

    #[test]
    fn transport_error_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut h = handler_in(&dir);
        h.header(b"HTTP/1.1 200 OK\r\n");
        h.write(b"partial").unwrap();
        assert!(dir.path().join(HASH).exists());
        // CURLE_PARTIAL_FILE
        let outcome = finish_sample(200, Err(curl::Error::new(18)), &mut h);
        assert!(matches!(outcome, SampleOutcome::Failed(_)));
        assert!(!dir.path().join(HASH).exists());
    }

    #[test]
    fn display_matches_console_format() {
        assert_eq!(SampleOutcome::Written { bytes: 3 }.to_string(), "200");
        assert_eq!(SampleOutcome::Status(404).to_string(), "404");
        assert_eq!(
            SampleOutcome::Failed("boom".into()).to_string(),
            "error: boom"
        );
    }
}
