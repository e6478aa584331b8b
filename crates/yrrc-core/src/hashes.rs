//! Hashes file loading and hash-shaped key selection.
//!
//! The hashes file is a JSON object keyed by sample hash (as produced by
//! `yrrc -m collect`). Only keys shaped like an MD5, SHA1 or SHA256 hex digest
//! are fetched; anything else in the object is ignored.

use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Digest family a hash-shaped identifier belongs to, by length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashKind {
    Md5,
    Sha1,
    Sha256,
}

impl HashKind {
    /// Classify `s` if it is 32, 40 or 64 ASCII hex digits (either case).
    pub fn classify(s: &str) -> Option<HashKind> {
        let kind = match s.len() {
            32 => HashKind::Md5,
            40 => HashKind::Sha1,
            64 => HashKind::Sha256,
            _ => return None,
        };
        if s.bytes().all(|b| b.is_ascii_hexdigit()) {
            Some(kind)
        } else {
            None
        }
    }
}

#[derive(Debug, Error)]
pub enum HashesError {
    #[error("cannot read hashes file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse hashes file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("hashes file {path} is not a JSON object")]
    NotAnObject { path: PathBuf },
}

/// Read the hashes file and return its top-level object.
/// Fails if the file can't be read, isn't JSON, or isn't an object; callers
/// decide whether that is fatal or just means there is nothing to do.
pub fn load_hashes_json(path: &Path) -> Result<Map<String, Value>, HashesError> {
    let data = fs::read_to_string(path).map_err(|source| HashesError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    match serde_json::from_str::<Value>(&data) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(HashesError::NotAnObject {
            path: path.to_path_buf(),
        }),
        Err(source) => Err(HashesError::Parse {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Keys of `hashes` that look like a hex digest.
pub fn select_hashes(hashes: &Map<String, Value>) -> HashSet<String> {
    hashes
        .keys()
        .filter(|k| HashKind::classify(k).is_some())
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MD5: &str = "d41d8cd98f00b204e9800998ecf8427e";
    const SHA1: &str = "DA39A3EE5E6B4B0D3255BFEF95601890AFD80709";
    const SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn classify_by_length_and_alphabet() {
        assert_eq!(HashKind::classify(MD5), Some(HashKind::Md5));
        assert_eq!(HashKind::classify(SHA1), Some(HashKind::Sha1));
        assert_eq!(HashKind::classify(SHA256), Some(HashKind::Sha256));
        assert_eq!(HashKind::classify("abc"), None);
        assert_eq!(HashKind::classify(""), None);
        // right length, wrong alphabet
        assert_eq!(HashKind::classify("g41d8cd98f00b204e9800998ecf8427e"), None);
        // 33 and 63 hex digits
        assert_eq!(HashKind::classify(&format!("{}0", MD5)), None);
        assert_eq!(HashKind::classify(&SHA256[1..]), None);
        // whitespace is not trimmed
        assert_eq!(HashKind::classify(&format!(" {}", &MD5[1..])), None);
    }

    #[test]
    fn select_keeps_only_hash_shaped_keys() {
        let map: Map<String, Value> =
            serde_json::from_str(r#"{"abc": 1, "d41d8cd98f00b204e9800998ecf8427e": 1}"#).unwrap();
        let selected = select_hashes(&map);
        assert_eq!(selected.len(), 1);
        assert!(selected.contains(MD5));
    }

    #[test]
    fn select_mixed_kinds() {
        let json = format!(
            r#"{{"{}": {{"expected": []}}, "{}": {{}}, "{}": null, "rules": "x.yar"}}"#,
            MD5, SHA1, SHA256
        );
        let map: Map<String, Value> = serde_json::from_str(&json).unwrap();
        let selected = select_hashes(&map);
        assert_eq!(selected.len(), 3);
        assert!(!selected.contains("rules"));
    }

    #[test]
    fn load_valid_object() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"{{"{}": {{"expected": ["rule_a"]}}}}"#, MD5).unwrap();
        f.flush().unwrap();
        let map = load_hashes_json(f.path()).expect("object");
        assert!(map.contains_key(MD5));
    }

    #[test]
    fn load_failures_carry_the_cause() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_hashes_json(&dir.path().join("missing.json")),
            Err(HashesError::Read { .. })
        ));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{not json").unwrap();
        assert!(matches!(
            load_hashes_json(&bad),
            Err(HashesError::Parse { .. })
        ));

        let list = dir.path().join("list.json");
        std::fs::write(&list, format!(r#"["{}"]"#, MD5)).unwrap();
        let err = load_hashes_json(&list).unwrap_err();
        assert!(matches!(err, HashesError::NotAnObject { .. }));
        assert!(err.to_string().contains("list.json"));
    }
}
