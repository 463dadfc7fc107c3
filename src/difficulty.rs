//! Word difficulty heuristic
//!
//! Four independent checks each add one point; a word is hard at two points.

use crate::lexicon::Lexicon;
use serde::Serialize;
use std::fmt;

const VOWELS: &str = "aeiouy";

/// Words longer than this many characters are "long"
pub const LONG_WORD_THRESHOLD: usize = 8;

/// Words with more syllables than this are "many syllables"
pub const SYLLABLE_THRESHOLD: usize = 3;

/// Minimum number of triggered checks for a hard word
pub const HARD_SCORE_THRESHOLD: usize = 2;

/// Why a check fired, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    LongWord,
    ManySyllables,
    ComplexPattern,
    UncommonWord,
}

impl Reason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reason::LongWord => "long_word",
            Reason::ManySyllables => "many_syllables",
            Reason::ComplexPattern => "complex_pattern",
            Reason::UncommonWord => "uncommon_word",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification result for one word
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// Lower-cased, trimmed form that was scored
    pub word: String,
    pub is_hard: bool,
    pub reasons: Vec<Reason>,
    /// Estimated syllable count (always at least 1)
    pub syllables: usize,
    /// Consonant cluster or list pattern that triggered `ComplexPattern`
    pub matched_pattern: Option<String>,
}

impl Verdict {
    /// Number of checks that fired
    pub fn score(&self) -> usize {
        self.reasons.len()
    }
}

/// Scores words against a [`Lexicon`]
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    lexicon: Lexicon,
}

impl Classifier {
    pub fn new(lexicon: Lexicon) -> Self {
        Self { lexicon }
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Classify a word. Case-insensitive and total over all inputs.
    pub fn classify(&self, word: &str) -> Verdict {
        let normalized = word.trim().to_lowercase();
        let syllables = count_syllables(&normalized);

        if normalized.is_empty() {
            return Verdict {
                word: normalized,
                is_hard: false,
                reasons: Vec::new(),
                syllables,
                matched_pattern: None,
            };
        }

        let mut reasons = Vec::with_capacity(4);

        if normalized.chars().count() > LONG_WORD_THRESHOLD {
            reasons.push(Reason::LongWord);
        }

        if syllables > SYLLABLE_THRESHOLD {
            reasons.push(Reason::ManySyllables);
        }

        let matched_pattern = self.complex_pattern(&normalized).map(str::to_string);
        if matched_pattern.is_some() {
            reasons.push(Reason::ComplexPattern);
        }

        if !self.lexicon.is_common(&normalized) {
            reasons.push(Reason::UncommonWord);
        }

        let is_hard = reasons.len() >= HARD_SCORE_THRESHOLD;

        tracing::debug!(
            word = %normalized,
            score = reasons.len(),
            syllables,
            hard = is_hard,
            pattern = ?matched_pattern,
            "Classified word"
        );

        Verdict {
            word: normalized,
            is_hard,
            reasons,
            syllables,
            matched_pattern,
        }
    }

    /// First complex spelling feature in `word`: a three-consonant run if any,
    /// otherwise the first list pattern contained in the word.
    pub fn complex_pattern<'a>(&'a self, word: &'a str) -> Option<&'a str> {
        consonant_cluster(word).or_else(|| {
            self.lexicon
                .patterns()
                .iter()
                .find(|pattern| word.contains(pattern.as_str()))
                .map(String::as_str)
        })
    }
}

/// Estimate syllables by counting vowel groups.
///
/// A trailing silent "e" is dropped when more than one group was seen. The
/// result is never below 1.
pub fn count_syllables(word: &str) -> usize {
    let word = word.to_lowercase();
    let mut count = 0;
    let mut previous_was_vowel = false;

    for c in word.chars() {
        let is_vowel = VOWELS.contains(c);
        if is_vowel && !previous_was_vowel {
            count += 1;
        }
        previous_was_vowel = is_vowel;
    }

    if word.ends_with('e') && count > 1 {
        count -= 1;
    }

    count.max(1)
}

fn is_consonant(c: char) -> bool {
    c.is_ascii_lowercase() && !VOWELS.contains(c) || c == 'y'
}

/// First run of three consecutive consonants ("y" counts as one here)
fn consonant_cluster(word: &str) -> Option<&str> {
    let indices: Vec<(usize, char)> = word.char_indices().collect();

    indices.windows(3).find_map(|window| {
        if window.iter().all(|&(_, c)| is_consonant(c)) {
            let start = window[0].0;
            let end = window[2].0 + window[2].1.len_utf8();
            Some(&word[start..end])
        } else {
            None
        }
    })
}
