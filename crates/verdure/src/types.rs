//! Core data types produced by grammar parsing.

/// A highlighted region of source text.
///
/// Byte offsets, with `start` inclusive and `end` exclusive. The capture name
/// comes straight from the highlights query (`keyword`, `function.builtin`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    /// Byte offset where the span starts (inclusive).
    pub start: u32,
    /// Byte offset where the span ends (exclusive).
    pub end: u32,
    /// Capture name from the highlights query.
    pub capture: String,
    /// Index of the query pattern that produced this span. Later patterns
    /// override earlier ones when two spans cover the same range.
    pub pattern_index: usize,
}

/// An embedded-language region found by an injections query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Injection {
    /// Byte offset where the injected content starts (inclusive).
    pub start: u32,
    /// Byte offset where the injected content ends (exclusive).
    pub end: u32,
    /// Name of the injected language.
    pub language: String,
}

/// Result of parsing a piece of source text.
#[derive(Debug, Clone, Default)]
pub struct ParseResult {
    /// Highlight spans, in query-match order.
    pub spans: Vec<Span>,
    /// Embedded-language regions.
    pub injections: Vec<Injection>,
}
