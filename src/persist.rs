//! Filter token persistence as a URL-embeddable query string
//! (`q[]=status%3AQUEUED&q[]=job%3Aetl`).

use crate::filter::{dedup_tokens, FilterToken};
use crate::traits::FilterStore;
use color_eyre::eyre::{eyre, Result};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const QUERY_KEY: &str = "q[]";

pub fn encode_tokens(tokens: &[FilterToken]) -> String {
    tokens
        .iter()
        .map(|t| format!("{QUERY_KEY}={}", urlencoding::encode(&t.canonical())))
        .collect::<Vec<_>>()
        .join("&")
}

/// Unknown kinds, malformed pairs and foreign keys are skipped, not errors.
pub fn decode_tokens(query: &str) -> Vec<FilterToken> {
    let query = query.trim().trim_start_matches('?');
    let tokens = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            let key = urlencoding::decode(key).ok()?;
            if key != QUERY_KEY && key != "q" {
                return None;
            }
            let spaced = value.replace('+', " ");
            let raw = urlencoding::decode(&spaced).ok()?;
            match raw.parse::<FilterToken>() {
                Ok(token) => Some(token),
                Err(e) => {
                    tracing::debug!(token = %raw, error = %e, "dropping persisted filter token");
                    None
                }
            }
        })
        .collect();
    dedup_tokens(tokens)
}

/// In-memory query string, as a URL would hold it.
#[derive(Debug, Default)]
pub struct QueryStringStore {
    query: Mutex<String>,
}

impl QueryStringStore {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: Mutex::new(query.into()),
        }
    }

    pub fn query(&self) -> String {
        self.query
            .lock()
            .map(|q| q.clone())
            .unwrap_or_default()
    }
}

impl FilterStore for QueryStringStore {
    fn load(&self) -> Vec<FilterToken> {
        decode_tokens(&self.query())
    }

    fn save(&self, tokens: &[FilterToken]) -> Result<()> {
        let mut query = self
            .query
            .lock()
            .map_err(|_| eyre!("query string store poisoned"))?;
        *query = encode_tokens(tokens);
        Ok(())
    }
}

/// Query string kept in a file under the state directory.
#[derive(Debug, Clone)]
pub struct FileFilterStore {
    path: PathBuf,
}

impl FileFilterStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn in_state_dir() -> Self {
        Self::new(state_dir().join("filters"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FilterStore for FileFilterStore {
    fn load(&self) -> Vec<FilterToken> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => decode_tokens(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                tracing::warn!("failed to read {:?}: {e}", self.path);
                Vec::new()
            }
        }
    }

    fn save(&self, tokens: &[FilterToken]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| eyre!("Failed to create state directory {parent:?}: {e}"))?;
        }
        std::fs::write(&self.path, encode_tokens(tokens))
            .map_err(|e| eyre!("Failed to write {:?}: {e}", self.path))
    }
}

/// `$XDG_STATE_HOME/runw`, falling back to `~/.local/state/runw`.
pub fn state_dir() -> PathBuf {
    if let Some(state) = std::env::var_os("XDG_STATE_HOME") {
        PathBuf::from(state).join("runw")
    } else if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".local").join("state").join("runw")
    } else {
        std::env::temp_dir().join("runw")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(s: &str) -> FilterToken {
        s.parse().unwrap()
    }

    #[test]
    fn encodes_reserved_characters() {
        let query = encode_tokens(&[tok("status:QUEUED"), tok("tag:team=data eng")]);
        assert_eq!(
            query,
            "q[]=status%3AQUEUED&q[]=tag%3Ateam%3Ddata%20eng"
        );
        assert_eq!(
            decode_tokens(&query),
            vec![tok("status:QUEUED"), tok("tag:team=data eng")]
        );
    }

    #[test]
    fn decode_skips_unknown_kinds_and_garbage() {
        let tokens = decode_tokens("?q[]=owner%3Ame&q[]=job%3Aetl&junk&page=2&q[]=%ZZ&q[]=");
        assert_eq!(tokens, vec![tok("job:etl")]);
    }

    #[test]
    fn decode_accepts_plain_q_and_plus_spaces() {
        assert_eq!(
            decode_tokens("q=tag%3Aowner%3Dme+too"),
            vec![tok("tag:owner=me too")]
        );
    }

    #[test]
    fn decode_keeps_encoded_plus_and_spaces() {
        assert_eq!(
            decode_tokens("q[]=tag%3Ak%3Da%2Bb+c&q[]=job%3Anightly+etl"),
            vec![tok("tag:k=a+b c"), tok("job:nightly etl")]
        );
    }

    #[test]
    fn decode_drops_duplicates() {
        assert_eq!(
            decode_tokens("q[]=job%3Aa&q[]=job%3Aa"),
            vec![tok("job:a")]
        );
    }

    #[test]
    fn query_string_store_round_trip() {
        let store = QueryStringStore::default();
        assert!(store.load().is_empty());
        store.save(&[tok("id:abc")]).unwrap();
        assert_eq!(store.query(), "q[]=id%3Aabc");
        assert_eq!(store.load(), vec![tok("id:abc")]);
    }

    #[test]
    fn file_store_missing_file_is_empty() {
        let path = std::env::temp_dir().join(format!("runw-test-missing-{}", std::process::id()));
        let store = FileFilterStore::new(path.join("filters"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn file_store_round_trip() {
        let dir = std::env::temp_dir().join(format!("runw-test-store-{}", std::process::id()));
        let store = FileFilterStore::new(dir.join("nested").join("filters"));
        store.save(&[tok("status:FAILURE"), tok("job:etl")]).unwrap();
        assert_eq!(store.load(), vec![tok("status:FAILURE"), tok("job:etl")]);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
