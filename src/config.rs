//! Server configuration
//!
//! Defaults are merged with an optional TOML file and `PDF_GLOSS_*`
//! environment variables. Nested keys use a double underscore, e.g.
//! `PDF_GLOSS_DICTIONARY__TIMEOUT_SECS=5`.

use crate::error::{Error, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable naming the TOML config file
pub const CONFIG_PATH_ENV: &str = "PDF_GLOSS_CONFIG";

/// Config file read when `PDF_GLOSS_CONFIG` is unset
pub const DEFAULT_CONFIG_FILE: &str = "pdf-gloss.toml";

const ENV_PREFIX: &str = "PDF_GLOSS_";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub pipeline: PipelineConfig,
    pub dictionary: DictionaryConfig,
    pub cache: CacheConfig,
    pub lexicon: LexiconConfig,
    pub pdfium: PdfiumConfig,
    pub server: ServerConfig,
}

/// Limits applied while walking a document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Pages beyond this index are never read (default: 500)
    pub max_pages: usize,
    /// Maximum annotated words per page (default: 20)
    pub max_words_per_page: usize,
    /// Candidates shorter than this are never classified (default: 7)
    pub min_word_length: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_pages: 500,
            max_words_per_page: 20,
            min_word_length: 7,
        }
    }
}

/// Dictionary lookup service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DictionaryConfig {
    /// Base URL; the word is appended as a path segment
    pub base_url: String,
    /// Per-request timeout in seconds (default: 3)
    pub timeout_secs: u64,
}

impl Default for DictionaryConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.dictionaryapi.dev/api/v2/entries/en".to_string(),
            timeout_secs: 3,
        }
    }
}

/// Eviction policy for the definition cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CachePolicy {
    /// Grow for the life of the process
    #[default]
    Unbounded,
    /// Least-recently-used with entry and byte limits
    Lru,
}

/// Definition cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub policy: CachePolicy,
    /// Maximum cached words under the LRU policy (default: 10000)
    pub max_entries: usize,
    /// Maximum cached definition bytes under the LRU policy (default: 16MB)
    pub max_bytes: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            policy: CachePolicy::Unbounded,
            max_entries: 10_000,
            max_bytes: 16 * 1024 * 1024,
        }
    }
}

/// Optional replacements for the built-in word lists
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LexiconConfig {
    pub complex_patterns_path: Option<PathBuf>,
    pub common_words_path: Option<PathBuf>,
}

/// Where to find the PDFium shared library
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfiumConfig {
    /// Directory containing the PDFium library, tried before the defaults
    pub library_dir: Option<String>,
}

/// Security settings for the MCP surface
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Directories that path sources and output paths must live in.
    /// Empty means unrestricted.
    pub resource_dirs: Vec<String>,
}

impl Config {
    /// Load configuration from defaults, the config file and the environment
    pub fn load() -> Result<Self> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::figment(Toml::file(path)).extract().map_err(|e| Error::InvalidConfig {
            reason: e.to_string(),
        })
    }

    /// Load configuration from defaults and a TOML string (no environment)
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::string(toml))
            .extract()
            .map_err(|e| Error::InvalidConfig {
                reason: e.to_string(),
            })
    }

    fn figment(file: figment::providers::Data<Toml>) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(file)
            .merge(Env::prefixed(ENV_PREFIX).ignore(&["config"]).split("__"))
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.pipeline.max_words_per_page == 0 {
            return Err(Error::InvalidConfig {
                reason: "pipeline.max_words_per_page must be at least 1".to_string(),
            });
        }
        if self.dictionary.timeout_secs == 0 {
            return Err(Error::InvalidConfig {
                reason: "dictionary.timeout_secs must be at least 1".to_string(),
            });
        }
        if self.cache.policy == CachePolicy::Lru && self.cache.max_entries == 0 {
            return Err(Error::InvalidConfig {
                reason: "cache.max_entries must be at least 1 for the lru policy".to_string(),
            });
        }
        Ok(())
    }
}
