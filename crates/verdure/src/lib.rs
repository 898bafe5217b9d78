//! Verdure - tree-sitter syntax highlighting with a thread-safe grammar store.
//!
//! This crate glues crates.io tree-sitter grammars to a small rendering
//! pipeline that produces class-based `<span>` HTML:
//!
//! - [`GrammarStore`]: compiles grammars lazily and shares them across threads
//! - [`Highlighter`]: the main entry point; fork it for parallel use
//! - [`spans_to_html`]: span deduplication, coalescing, and HTML emission
//!
//! # Example
//!
//! ```rust,ignore
//! use verdure::Highlighter;
//!
//! let mut hl = Highlighter::new();
//! let html = hl.highlight("python", "print(\"hi\")")?;
//! assert!(html.contains("<span class=\"hl-"));
//! ```
//!
//! Languages are enabled through `lang-*` feature flags; `all-languages`
//! (default) enables every built-in grammar.

mod error;
mod grammar;
mod highlighter;
mod render;
mod store;
mod types;

pub mod languages;

pub use error::Error;
pub use grammar::{CompiledGrammar, GrammarConfig, GrammarError, ParseContext};
pub use highlighter::{HighlightOptions, Highlighter};
pub use render::{CLASSES, HtmlFormat, class_for_capture, html_escape, spans_to_html};
pub use store::GrammarStore;
pub use types::{Injection, ParseResult, Span};
