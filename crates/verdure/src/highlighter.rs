//! High-level syntax highlighting API with thread-safe grammar sharing.
//!
//! Grammars are compiled once and shared via `Arc<GrammarStore>`. Each
//! highlighter owns its parse context (cheap to create), so use
//! [`Highlighter::fork`] to get an independent highlighter for another thread.
//!
//! ```rust,ignore
//! use verdure::Highlighter;
//!
//! let mut hl = Highlighter::new();
//! let html = hl.highlight("python", "print(1)")?;
//! ```

use std::sync::Arc;

use crate::error::Error;
use crate::grammar::{CompiledGrammar, ParseContext};
use crate::render::{HtmlFormat, spans_to_html};
use crate::store::GrammarStore;
use crate::types::{Injection, Span};

/// Options controlling highlighting behavior.
#[derive(Debug, Clone)]
pub struct HighlightOptions {
    /// How deep to recurse into embedded languages. `0` disables injection
    /// processing entirely.
    pub max_injection_depth: u32,
    /// HTML output format for rendered spans.
    pub html_format: HtmlFormat,
}

impl Default for HighlightOptions {
    fn default() -> Self {
        Self {
            max_injection_depth: 2,
            html_format: HtmlFormat::default(),
        }
    }
}

impl HighlightOptions {
    /// Fast options: skip injection scanning, trading embedded-language
    /// highlighting for speed.
    pub fn fast() -> Self {
        Self {
            max_injection_depth: 0,
            ..Self::default()
        }
    }
}

/// High-level syntax highlighter producing class-based HTML.
///
/// Forked highlighters share compiled grammars but parse independently:
///
/// ```rust,ignore
/// let hl = Highlighter::new();
/// let hl2 = hl.fork();
/// std::thread::spawn(move || {
///     let mut hl = hl2;
///     hl.highlight("rust", code)
/// });
/// ```
pub struct Highlighter {
    store: Arc<GrammarStore>,
    ctx: Option<ParseContext>,
    options: HighlightOptions,
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Highlighter {
    /// Equivalent to [`fork`](Self::fork).
    fn clone(&self) -> Self {
        self.fork()
    }
}

impl Highlighter {
    /// Create a highlighter with default options and a fresh grammar store.
    pub fn new() -> Self {
        Self::with_store_and_options(Arc::new(GrammarStore::new()), HighlightOptions::default())
    }

    /// Create a highlighter with custom options.
    pub fn with_options(options: HighlightOptions) -> Self {
        Self::with_store_and_options(Arc::new(GrammarStore::new()), options)
    }

    /// Create a highlighter sharing an existing grammar store.
    pub fn with_store(store: Arc<GrammarStore>) -> Self {
        Self::with_store_and_options(store, HighlightOptions::default())
    }

    /// Create a highlighter with a shared store and custom options.
    pub fn with_store_and_options(store: Arc<GrammarStore>, options: HighlightOptions) -> Self {
        Self {
            store,
            ctx: None,
            options,
        }
    }

    /// Fork this highlighter: same store and options, independent parse context.
    pub fn fork(&self) -> Self {
        Self {
            store: self.store.clone(),
            ctx: None,
            options: self.options.clone(),
        }
    }

    /// The shared grammar store.
    pub fn store(&self) -> &Arc<GrammarStore> {
        &self.store
    }

    /// Whether a grammar is available for this language.
    pub fn supports(&self, language: &str) -> bool {
        self.store.is_supported(language)
    }

    /// Highlight source code and return an HTML fragment.
    pub fn highlight(&mut self, language: &str, source: &str) -> Result<String, Error> {
        let spans = self.highlight_spans(language, source)?;
        Ok(spans_to_html(source, spans, &self.options.html_format))
    }

    /// Highlight and return raw spans, for custom rendering.
    pub fn highlight_spans(&mut self, language: &str, source: &str) -> Result<Vec<Span>, Error> {
        let grammar = self
            .store
            .get(language)
            .ok_or_else(|| Error::UnsupportedLanguage {
                language: language.to_string(),
            })?;

        let ctx = self.ctx.get_or_insert_with(ParseContext::new);
        ctx.set_language(grammar.language())
            .map_err(|e| Error::Parse {
                language: language.to_string(),
                message: e.to_string(),
            })?;

        let result = grammar.parse(ctx, source);
        let mut all_spans = result.spans;

        if self.options.max_injection_depth > 0 {
            self.process_injections(
                source,
                result.injections,
                0,
                self.options.max_injection_depth,
                &mut all_spans,
            );
        }

        Ok(all_spans)
    }

    /// Recursively highlight embedded-language regions, offsetting their
    /// spans into host-document coordinates.
    fn process_injections(
        &mut self,
        source: &str,
        injections: Vec<Injection>,
        base_offset: u32,
        remaining_depth: u32,
        all_spans: &mut Vec<Span>,
    ) {
        if remaining_depth == 0 {
            return;
        }

        for injection in injections {
            let start = injection.start as usize;
            let end = injection.end as usize;

            if start >= end || end > source.len() {
                continue;
            }
            if !source.is_char_boundary(start) || !source.is_char_boundary(end) {
                continue;
            }

            let injected_source = &source[start..end];

            let Some(grammar) = self.store.get(&injection.language) else {
                continue;
            };

            let ctx = self.ctx.get_or_insert_with(ParseContext::new);
            if ctx.set_language(grammar.language()).is_err() {
                continue;
            }

            let result = grammar.parse(ctx, injected_source);

            let offset = base_offset + injection.start;
            for mut span in result.spans {
                span.start += offset;
                span.end += offset;
                all_spans.push(span);
            }

            self.process_injections(
                injected_source,
                result.injections,
                offset,
                remaining_depth - 1,
                all_spans,
            );
        }
    }
}
