//! Compiled tree-sitter grammars and per-thread parse state.
//!
//! A [`CompiledGrammar`] holds the language plus its compiled queries and is
//! immutable after creation, so it can be shared across threads behind an
//! `Arc`. The mutable parsing machinery (parser, query cursor) lives in
//! [`ParseContext`], which each thread owns privately.

use crate::types::{Injection, ParseResult, Span};
use streaming_iterator::StreamingIterator;
use tree_sitter::{Language, Parser, Query, QueryCursor};

/// Configuration for compiling a grammar.
pub struct GrammarConfig {
    /// The tree-sitter language.
    pub language: Language,
    /// The highlights query source (required).
    pub highlights_query: &'static str,
    /// The injections query source (empty string when the grammar has none).
    pub injections_query: &'static str,
}

/// Error when compiling a grammar.
#[derive(Debug)]
pub enum GrammarError {
    /// The language version is incompatible with the linked tree-sitter runtime.
    Language(String),
    /// A query failed to compile.
    Query(String),
}

impl std::fmt::Display for GrammarError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GrammarError::Language(e) => write!(f, "language error: {}", e),
            GrammarError::Query(e) => write!(f, "query compilation error: {}", e),
        }
    }
}

impl std::error::Error for GrammarError {}

/// A grammar with its queries compiled, ready for parsing.
pub struct CompiledGrammar {
    language: Language,
    highlights_query: Query,
    injections_query: Option<Query>,
}

impl CompiledGrammar {
    /// Compile the grammar's queries.
    pub fn new(config: GrammarConfig) -> Result<Self, GrammarError> {
        // Validate the language against the runtime before compiling queries
        let mut probe = Parser::new();
        probe
            .set_language(&config.language)
            .map_err(|e| GrammarError::Language(e.to_string()))?;

        let highlights_query = Query::new(&config.language, config.highlights_query)
            .map_err(|e| GrammarError::Query(e.to_string()))?;

        let injections_query = if config.injections_query.is_empty() {
            None
        } else {
            Some(
                Query::new(&config.language, config.injections_query)
                    .map_err(|e| GrammarError::Query(e.to_string()))?,
            )
        };

        Ok(Self {
            language: config.language,
            highlights_query,
            injections_query,
        })
    }

    /// The tree-sitter language this grammar parses.
    pub fn language(&self) -> &Language {
        &self.language
    }

    /// Parse `text` using the given context, collecting highlight spans and
    /// injection regions.
    ///
    /// The context's parser must already be set to this grammar's language
    /// (see [`ParseContext::set_language`]).
    pub fn parse(&self, ctx: &mut ParseContext, text: &str) -> ParseResult {
        let Some(tree) = ctx.parser.parse(text, None) else {
            return ParseResult::default();
        };

        let root_node = tree.root_node();
        let source = text.as_bytes();

        let mut spans = Vec::new();

        {
            let mut matches = ctx
                .query_cursor
                .matches(&self.highlights_query, root_node, source);

            while let Some(m) = matches.next() {
                for capture in m.captures {
                    let capture_name =
                        self.highlights_query.capture_names()[capture.index as usize];

                    // Internal and injection captures are not highlight spans
                    if capture_name.starts_with('_') || capture_name.starts_with("injection.") {
                        continue;
                    }

                    let node = capture.node;
                    spans.push(Span {
                        start: node.start_byte() as u32,
                        end: node.end_byte() as u32,
                        capture: capture_name.to_string(),
                        pattern_index: m.pattern_index,
                    });
                }
            }
        }

        let injections = match self.injections_query {
            Some(ref query) => collect_injections(query, &mut ctx.query_cursor, root_node, source),
            None => Vec::new(),
        };

        ParseResult { spans, injections }
    }
}

fn collect_injections(
    query: &Query,
    cursor: &mut QueryCursor,
    root_node: tree_sitter::Node<'_>,
    source: &[u8],
) -> Vec<Injection> {
    let mut content_idx = None;
    let mut language_idx = None;
    for (i, name) in query.capture_names().iter().enumerate() {
        match *name {
            "injection.content" => content_idx = Some(i as u32),
            "injection.language" => language_idx = Some(i as u32),
            _ => {}
        }
    }

    let mut injections = Vec::new();
    let mut matches = cursor.matches(query, root_node, source);

    while let Some(m) = matches.next() {
        let mut content_node = None;
        let mut language_name = None;

        // A fixed language can be declared via #set! injection.language
        for prop in query.property_settings(m.pattern_index) {
            if prop.key.as_ref() == "injection.language" {
                if let Some(ref value) = prop.value {
                    language_name = Some(value.to_string());
                }
            }
        }

        for capture in m.captures {
            if Some(capture.index) == content_idx {
                content_node = Some(capture.node);
            } else if Some(capture.index) == language_idx && language_name.is_none() {
                if let Ok(lang) = capture.node.utf8_text(source) {
                    language_name = Some(lang.to_string());
                }
            }
        }

        if let (Some(node), Some(lang)) = (content_node, language_name) {
            injections.push(Injection {
                start: node.start_byte() as u32,
                end: node.end_byte() as u32,
                language: lang,
            });
        }
    }

    injections
}

/// Mutable parse state owned by a single thread.
pub struct ParseContext {
    parser: Parser,
    query_cursor: QueryCursor,
}

impl Default for ParseContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ParseContext {
    /// Create a fresh parse context.
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
            query_cursor: QueryCursor::new(),
        }
    }

    /// Point the parser at a grammar's language.
    pub fn set_language(&mut self, language: &Language) -> Result<(), GrammarError> {
        self.parser
            .set_language(language)
            .map_err(|e| GrammarError::Language(e.to_string()))
    }
}
