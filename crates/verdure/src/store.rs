//! Thread-safe store of compiled grammars.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::grammar::{CompiledGrammar, GrammarConfig};
use crate::languages;

/// Lazily compiles grammars on first use and caches them for sharing.
///
/// Lookups that miss (unknown language, or a grammar whose queries fail to
/// compile) are cached negatively, so repeated requests for the same bad
/// language stay cheap.
///
/// The store is `Sync`; share it between threads with an `Arc` and give each
/// thread its own [`crate::Highlighter`].
pub struct GrammarStore {
    cache: RwLock<HashMap<String, Option<Arc<CompiledGrammar>>>>,
}

impl Default for GrammarStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GrammarStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Get the compiled grammar for a language, compiling it on first use.
    ///
    /// Language names are normalized (`py` resolves to `python`). Returns
    /// `None` for languages with no registered grammar.
    pub fn get(&self, language: &str) -> Option<Arc<CompiledGrammar>> {
        let canonical = languages::normalize(language);

        {
            let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
            if let Some(entry) = cache.get(canonical) {
                return entry.clone();
            }
        }

        let compiled = languages::lookup(canonical).and_then(|def| {
            let config = GrammarConfig {
                language: def.language,
                highlights_query: def.highlights_query,
                injections_query: def.injections_query,
            };
            match CompiledGrammar::new(config) {
                Ok(grammar) => Some(Arc::new(grammar)),
                Err(e) => {
                    tracing::warn!(language = canonical, error = %e, "grammar failed to compile");
                    None
                }
            }
        });

        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        cache
            .entry(canonical.to_string())
            .or_insert(compiled)
            .clone()
    }

    /// Whether a grammar is available for this language.
    pub fn is_supported(&self, language: &str) -> bool {
        self.get(language).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(feature = "lang-rust")]
    fn compiles_once_and_caches() {
        let store = GrammarStore::new();
        let first = store.get("rust").unwrap();
        let second = store.get("rust").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    #[cfg(feature = "lang-python")]
    fn resolves_aliases() {
        let store = GrammarStore::new();
        let canonical = store.get("python").unwrap();
        let aliased = store.get("py").unwrap();
        assert!(Arc::ptr_eq(&canonical, &aliased));
    }

    #[test]
    fn unknown_language_is_negative_cached() {
        let store = GrammarStore::new();
        assert!(store.get("klingon").is_none());
        assert!(!store.is_supported("klingon"));
        let cache = store.cache.read().unwrap();
        assert!(matches!(cache.get("klingon"), Some(None)));
    }
}
