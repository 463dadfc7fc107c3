//! Definition lookup and caching

pub mod client;
pub mod store;

pub use client::{
    parse_entries, DictionaryClient, DictionaryEntry, HttpDictionaryClient, LookupMiss, Meaning,
    Sense,
};
pub use store::{build_store, DefinitionStore, LruStore, UnboundedStore};

use std::sync::Arc;

/// Maximum definitions rendered per word
pub const MAX_DEFINITIONS: usize = 2;

/// Maximum usage examples rendered per word, across all definitions
pub const MAX_EXAMPLES: usize = 3;

/// Formatted definition text, or why none is available
pub type Resolution = std::result::Result<String, LookupMiss>;

/// Resolves words to formatted definitions, consulting the store first.
///
/// Misses of any kind are returned, never cached, so a later call for the
/// same word retries the lookup.
pub struct DefinitionResolver {
    client: Arc<dyn DictionaryClient>,
    store: Arc<dyn DefinitionStore>,
}

impl DefinitionResolver {
    pub fn new(client: Arc<dyn DictionaryClient>, store: Arc<dyn DefinitionStore>) -> Self {
        Self { client, store }
    }

    pub fn store(&self) -> &Arc<dyn DefinitionStore> {
        &self.store
    }

    /// Resolve a word. May block on the network on a cache miss.
    pub fn resolve(&self, word: &str) -> Resolution {
        let key = word.trim().to_lowercase();
        if key.is_empty() {
            return Err(LookupMiss::NoEntry);
        }

        if let Some(cached) = self.store.get(&key) {
            tracing::debug!(word = %key, "Definition cache hit");
            return Ok(cached);
        }

        let entries = self.client.fetch(&key)?;
        let entry = entries.first().ok_or(LookupMiss::NoEntry)?;
        let text = render_definition(&key, entry).ok_or(LookupMiss::NoEntry)?;

        self.store.put(key, text.clone());
        Ok(text)
    }
}

/// Render up to [`MAX_DEFINITIONS`] senses and [`MAX_EXAMPLES`] examples.
///
/// Examples are taken from any sense in entry order, so an example may follow
/// a definition it does not belong to once the definition cap is reached.
/// Returns `None` when the entry has no definitions.
pub fn render_definition(word: &str, entry: &DictionaryEntry) -> Option<String> {
    let mut lines = Vec::new();
    let mut definitions = 0;
    let mut examples = 0;

    for meaning in &entry.meanings {
        for sense in &meaning.definitions {
            if definitions < MAX_DEFINITIONS {
                lines.push(format!("• {}", sense.definition));
                definitions += 1;
            }

            if let Some(example) = &sense.example {
                if examples < MAX_EXAMPLES {
                    lines.push(format!("  Example: {}", example));
                    examples += 1;
                }
            }

            if definitions >= MAX_DEFINITIONS && examples >= MAX_EXAMPLES {
                break;
            }
        }
    }

    if definitions == 0 {
        return None;
    }

    Some(format!("{}\n{}", capitalize(word), lines.join("\n")))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
