//! Word lists used by the difficulty classifier
//!
//! Both lists ship as plain text under `data/` so they can be reviewed and
//! edited without touching code. Either list can be swapped for a file named
//! in [`LexiconConfig`].

use crate::config::LexiconConfig;
use crate::error::{Error, Result};
use std::collections::HashSet;
use std::path::Path;

const COMPLEX_PATTERNS: &str = include_str!("../data/complex_patterns.txt");
const COMMON_WORDS: &str = include_str!("../data/common_words.txt");

/// Complex spelling patterns plus the common-word whitelist
#[derive(Debug, Clone)]
pub struct Lexicon {
    patterns: Vec<String>,
    common_words: HashSet<String>,
}

impl Lexicon {
    /// The lists bundled with the crate
    pub fn builtin() -> Self {
        Self::parse(COMPLEX_PATTERNS, COMMON_WORDS)
    }

    /// Build a lexicon from list sources.
    ///
    /// Entries are whitespace separated; `#` starts a comment. Pattern order is
    /// preserved, duplicate patterns keep their first position.
    pub fn parse(patterns: &str, common_words: &str) -> Self {
        let mut seen = HashSet::new();
        let patterns = entries(patterns)
            .filter(|p| seen.insert(p.clone()))
            .collect();

        Self {
            patterns,
            common_words: entries(common_words).collect(),
        }
    }

    /// Built-in lists with any file overrides from configuration applied
    pub fn load(config: &LexiconConfig) -> Result<Self> {
        let patterns = match &config.complex_patterns_path {
            Some(path) => read_list(path)?,
            None => COMPLEX_PATTERNS.to_string(),
        };
        let common_words = match &config.common_words_path {
            Some(path) => read_list(path)?,
            None => COMMON_WORDS.to_string(),
        };

        let lexicon = Self::parse(&patterns, &common_words);
        tracing::debug!(
            patterns = lexicon.patterns.len(),
            common_words = lexicon.common_words.len(),
            "Loaded lexicon"
        );
        Ok(lexicon)
    }

    /// Complex patterns in match order
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Whether a normalized word is on the common-word whitelist
    pub fn is_common(&self, word: &str) -> bool {
        self.common_words.contains(word)
    }

    pub fn common_word_count(&self) -> usize {
        self.common_words.len()
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::builtin()
    }
}

fn entries(source: &str) -> impl Iterator<Item = String> + '_ {
    source
        .lines()
        .map(|line| line.split('#').next().unwrap_or_default())
        .flat_map(str::split_whitespace)
        .map(str::to_lowercase)
}

fn read_list(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| Error::Lexicon {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}
