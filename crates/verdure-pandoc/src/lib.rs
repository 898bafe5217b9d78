//! Post-process pandoc HTML output to add syntax highlighting to code blocks.
//!
//! Pandoc emits fenced code blocks as `<pre class="sourceCode LANG"><code>`
//! when invoked without its own highlighter. This crate rewrites such
//! documents offline:
//!
//! 1. **HTML transformation**: streams through each file with lol_html,
//!    reads the `pre` element's class list, and tries each language token
//!    against a tree-sitter highlighter. The first token that highlights
//!    wins; blocks where every token fails keep their original markup.
//!
//! 2. **CSS injection**: appends a generated theme stylesheet to each
//!    rewritten document's `<head>`. The stylesheet's marker comment also
//!    makes re-runs a no-op.
//!
//! # Usage
//!
//! ```bash
//! verdure-pandoc ./site ./site-highlighted
//! ```

mod css;
mod html;
mod processor;

pub use css::{CSS_MARKER, generate_theme_css};
pub use html::{
    FallbackPolicy, SOURCE_CODE_CLASS, TransformError, TransformOptions, TransformResult,
    transform_html,
};
pub use processor::{ProcessError, ProcessOptions, Processor, ProcessorStats};
