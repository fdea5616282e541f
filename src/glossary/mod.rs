//! Local legal glossary.
//!
//! The active dictionary is an immutable [`Glossary`] behind a single
//! pointer. [`GlossaryResolver::load`] builds a complete replacement before
//! swapping it in, so a lookup racing a reload sees either the old or the
//! new dictionary, never a mix. A failed load leaves the active dictionary
//! untouched.

use crate::models::GlossaryEntry;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum GlossaryError {
    #[error("failed to read glossary {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to fetch glossary from {url}: {message}")]
    Fetch { url: String, message: String },
    #[error("glossary is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Where to load a dictionary from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlossarySource {
    File(PathBuf),
    Url(String),
    /// Dictionary JSON held in memory.
    Inline(String),
}

impl GlossarySource {
    /// Interpret a config/CLI value: `http(s)://` is a URL, anything else a path.
    pub fn from_location(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            GlossarySource::Url(location.to_string())
        } else {
            GlossarySource::File(PathBuf::from(location))
        }
    }
}

/// Both dictionary layouts seen in the wild.
#[derive(Deserialize)]
#[serde(untagged)]
enum DictionaryFile {
    /// `[{ "term": ..., "definition": ... }]`
    Entries(Vec<GlossaryEntry>),
    /// `{ "term": "definition" }`
    Map(BTreeMap<String, String>),
}

/// An immutable, case-insensitive dictionary.
#[derive(Debug, Default)]
pub struct Glossary {
    entries: HashMap<String, GlossaryEntry>,
}

impl Glossary {
    /// Parse dictionary JSON. Later entries win over earlier ones with the same key.
    pub fn from_json(text: &str) -> Result<Self, GlossaryError> {
        let entries = match serde_json::from_str::<DictionaryFile>(text)? {
            DictionaryFile::Entries(entries) => entries,
            DictionaryFile::Map(map) => map
                .into_iter()
                .map(|(term, definition)| GlossaryEntry { term, definition })
                .collect(),
        };

        Ok(Self::from_entries(entries))
    }

    pub fn from_entries(entries: impl IntoIterator<Item = GlossaryEntry>) -> Self {
        let mut glossary = Self::default();

        for entry in entries {
            let key = normalize_term(&entry.term);
            if key.is_empty() {
                warn!("Skipping glossary entry with empty term");
                continue;
            }
            if glossary.entries.insert(key, entry).is_some() {
                debug!("Duplicate glossary term replaced by later entry");
            }
        }

        glossary
    }

    pub fn get(&self, term: &str) -> Option<&GlossaryEntry> {
        self.entries.get(&normalize_term(term))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Upper bound on a URL fetch when no timeout is configured.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(60);

fn normalize_term(term: &str) -> String {
    term.trim().to_lowercase()
}

/// Owns the active dictionary and its reload policy.
pub struct GlossaryResolver {
    active: RwLock<Arc<Glossary>>,
    http_client: reqwest::Client,
}

impl Default for GlossaryResolver {
    fn default() -> Self {
        Self::new(DEFAULT_FETCH_TIMEOUT)
    }
}

impl GlossaryResolver {
    /// Create a resolver with an empty dictionary.
    ///
    /// `fetch_timeout` bounds the whole of a URL load, so an unresponsive
    /// host fails the load instead of stalling the caller.
    pub fn new(fetch_timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(fetch_timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build glossary HTTP client, URL loads will fail: {}", e);
                reqwest::Client::new()
            });

        Self {
            active: RwLock::new(Arc::new(Glossary::default())),
            http_client,
        }
    }

    /// Create a resolver with a dictionary already in place.
    #[cfg(test)]
    pub fn with_glossary(glossary: Glossary) -> Self {
        let resolver = Self::default();
        resolver.swap(glossary);
        resolver
    }

    /// Replace the active dictionary with the one at `source`.
    ///
    /// Returns the number of entries now active. On error the previous
    /// dictionary stays in place; the error is for the caller to log.
    pub async fn load(&self, source: &GlossarySource) -> Result<usize, GlossaryError> {
        let text = self.read_source(source).await?;
        let glossary = Glossary::from_json(&text)?;
        let count = glossary.len();

        self.swap(glossary);
        info!("Loaded {} glossary entries", count);
        Ok(count)
    }

    async fn read_source(&self, source: &GlossarySource) -> Result<String, GlossaryError> {
        match source {
            GlossarySource::Inline(text) => Ok(text.clone()),
            GlossarySource::File(path) => {
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| GlossaryError::Io {
                        path: path.clone(),
                        source,
                    })
            }
            GlossarySource::Url(url) => {
                let fetch_err = |e: reqwest::Error| GlossaryError::Fetch {
                    url: url.clone(),
                    message: e.to_string(),
                };
                let response = self
                    .http_client
                    .get(url)
                    .send()
                    .await
                    .and_then(|r| r.error_for_status())
                    .map_err(fetch_err)?;
                response.text().await.map_err(fetch_err)
            }
        }
    }

    fn swap(&self, glossary: Glossary) {
        let mut active = self.active.write().unwrap_or_else(PoisonError::into_inner);
        *active = Arc::new(glossary);
    }

    /// The dictionary active right now. Unaffected by later reloads.
    pub fn snapshot(&self) -> Arc<Glossary> {
        Arc::clone(&self.active.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Case-insensitive, whitespace-trimmed exact lookup.
    pub fn lookup(&self, term: &str) -> Option<GlossaryEntry> {
        self.snapshot().get(term).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tokio_test::{assert_err, assert_ok};

    const ENTRIES_JSON: &str = r#"[
        { "term": "Force Majeure", "definition": "Unforeseeable circumstances preventing performance." },
        { "term": "Indemnity", "definition": "Security against loss." }
    ]"#;

    #[test]
    fn test_lookup_is_case_insensitive_and_trimmed() {
        let glossary = assert_ok!(Glossary::from_json(ENTRIES_JSON));

        assert!(glossary.get("force majeure").is_some());
        assert!(glossary.get("  FORCE MAJEURE ").is_some());
        assert_eq!(
            glossary.get("Force Majeure").map(|e| e.term.as_str()),
            Some("Force Majeure")
        );
    }

    #[test]
    fn test_lookup_is_exact_only() {
        let glossary = assert_ok!(Glossary::from_json(ENTRIES_JSON));
        assert!(glossary.get("force").is_none());
        assert!(glossary.get("force majeure clause").is_none());
    }

    #[test]
    fn test_map_format() {
        let glossary = assert_ok!(Glossary::from_json(
            r#"{ "arbitration": "Private dispute resolution.", "lien": "A right to keep possession." }"#
        ));
        assert_eq!(glossary.len(), 2);
        assert_eq!(
            glossary.get("Lien").map(|e| e.definition.as_str()),
            Some("A right to keep possession.")
        );
    }

    #[test]
    fn test_last_duplicate_wins() {
        let glossary = assert_ok!(Glossary::from_json(
            r#"[
                { "term": "Waiver", "definition": "old" },
                { "term": "waiver ", "definition": "new" }
            ]"#
        ));
        assert_eq!(glossary.len(), 1);
        assert_eq!(glossary.get("WAIVER").map(|e| e.definition.as_str()), Some("new"));
    }

    #[test]
    fn test_blank_terms_are_skipped() {
        let glossary = Glossary::from_entries(vec![GlossaryEntry {
            term: "  ".to_string(),
            definition: "nothing".to_string(),
        }]);
        assert!(glossary.is_empty());
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_previous_dictionary() {
        let resolver = GlossaryResolver::default();
        assert_eq!(
            assert_ok!(resolver.load(&GlossarySource::Inline(ENTRIES_JSON.to_string())).await),
            2
        );

        let err = assert_err!(
            resolver
                .load(&GlossarySource::Inline("{ not json".to_string()))
                .await
        );
        assert!(matches!(err, GlossaryError::Parse(_)));
        assert!(resolver.lookup("indemnity").is_some());
    }

    #[tokio::test]
    async fn test_failed_first_load_leaves_empty_dictionary() {
        let resolver = GlossaryResolver::default();
        let missing = GlossarySource::File(PathBuf::from("/nonexistent/dictionary.json"));

        let err = assert_err!(resolver.load(&missing).await);
        assert!(matches!(err, GlossaryError::Io { .. }));
        assert!(resolver.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(ENTRIES_JSON.as_bytes()).unwrap();

        let resolver = GlossaryResolver::default();
        let source = GlossarySource::File(file.path().to_path_buf());

        assert_eq!(assert_ok!(resolver.load(&source).await), 2);
        assert!(resolver.lookup("Indemnity").is_some());
    }

    #[tokio::test]
    async fn test_reload_replaces_whole_dictionary() {
        let resolver = GlossaryResolver::default();
        assert_ok!(resolver.load(&GlossarySource::Inline(ENTRIES_JSON.to_string())).await);
        let before = resolver.snapshot();

        assert_ok!(
            resolver
                .load(&GlossarySource::Inline(r#"{ "estoppel": "A bar." }"#.to_string()))
                .await
        );

        assert_eq!(before.len(), 2);
        assert!(before.get("indemnity").is_some());
        assert!(resolver.lookup("indemnity").is_none());
        assert!(resolver.lookup("estoppel").is_some());
    }

    #[tokio::test]
    async fn test_unresponsive_url_fails_within_timeout() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/dictionary.json", listener.local_addr().unwrap());
        tokio::spawn(async move {
            // Accept and hold the connection without ever answering
            let (_stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(3600)).await;
        });

        let resolver = GlossaryResolver::new(Duration::from_millis(200));
        let loaded = tokio::time::timeout(
            Duration::from_secs(5),
            resolver.load(&GlossarySource::Url(url)),
        )
        .await;

        let err = assert_err!(assert_ok!(loaded));
        assert!(matches!(err, GlossaryError::Fetch { .. }));
        assert!(resolver.snapshot().is_empty());
    }

    #[test]
    fn test_source_from_location() {
        assert_eq!(
            GlossarySource::from_location("https://example.com/dictionary.json"),
            GlossarySource::Url("https://example.com/dictionary.json".to_string())
        );
        assert_eq!(
            GlossarySource::from_location("dictionary.json"),
            GlossarySource::File(PathBuf::from("dictionary.json"))
        );
    }
}
