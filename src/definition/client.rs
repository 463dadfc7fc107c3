//! Dictionary lookup service client

use crate::config::DictionaryConfig;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::time::Duration;
use tokio::runtime::Handle;
use url::Url;

/// Why a lookup produced no usable definition
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupMiss {
    /// Service answered with a non-success status
    #[error("dictionary returned status {0}")]
    Status(u16),

    /// Request never completed (connect failure, timeout, ...)
    #[error("dictionary request failed: {0}")]
    Transport(String),

    /// Body was not the expected JSON shape
    #[error("malformed dictionary response: {0}")]
    Malformed(String),

    /// Response parsed but held no definition
    #[error("no definition in dictionary response")]
    NoEntry,
}

/// One dictionary entry (the service returns a list of these)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DictionaryEntry {
    #[serde(default)]
    pub meanings: Vec<Meaning>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Meaning {
    #[serde(default)]
    pub definitions: Vec<Sense>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Sense {
    pub definition: String,
    #[serde(default)]
    pub example: Option<String>,
}

/// Source of raw dictionary entries for a normalized word
pub trait DictionaryClient: Send + Sync {
    /// Fetch entries for `word`. Blocks until the lookup completes or times out.
    fn fetch(&self, word: &str) -> std::result::Result<Vec<DictionaryEntry>, LookupMiss>;
}

/// Parse a service response body
pub fn parse_entries(body: &[u8]) -> std::result::Result<Vec<DictionaryEntry>, LookupMiss> {
    serde_json::from_slice(body).map_err(|e| LookupMiss::Malformed(e.to_string()))
}

/// HTTP client for a dictionaryapi.dev compatible service.
///
/// Requests run on the tokio runtime behind `handle` and are awaited with
/// `Handle::block_on`, so `fetch` must be called from a blocking thread
/// (e.g. inside `spawn_blocking`), never from an async task.
pub struct HttpDictionaryClient {
    client: reqwest::Client,
    base_url: Url,
    handle: Handle,
}

impl HttpDictionaryClient {
    pub fn new(config: &DictionaryConfig, handle: Handle) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| Error::InvalidConfig {
            reason: format!("dictionary.base_url: {}", e),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidConfig {
                reason: format!("dictionary.base_url cannot take a path: {}", base_url),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(Error::HttpClient)?;

        Ok(Self {
            client,
            base_url,
            handle,
        })
    }

    /// URL for a word, appended as an encoded path segment
    pub fn entry_url(&self, word: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(word);
        }
        url
    }
}

impl DictionaryClient for HttpDictionaryClient {
    fn fetch(&self, word: &str) -> std::result::Result<Vec<DictionaryEntry>, LookupMiss> {
        let url = self.entry_url(word);
        tracing::debug!(%url, "Dictionary lookup");

        self.handle.block_on(async {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| LookupMiss::Transport(e.to_string()))?;

            if !response.status().is_success() {
                return Err(LookupMiss::Status(response.status().as_u16()));
            }

            let body = response
                .bytes()
                .await
                .map_err(|e| LookupMiss::Transport(e.to_string()))?;

            parse_entries(&body)
        })
    }
}
