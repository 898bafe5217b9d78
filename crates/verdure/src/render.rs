//! HTML rendering from highlight spans.
//!
//! Raw spans from grammar parsing overlap and repeat: several query patterns
//! can capture the same node, and injections add spans on top of the host
//! document's. Rendering deduplicates ranges, folds capture names down to a
//! small set of CSS classes, coalesces adjacent same-class spans, and emits
//! `<span class="...">` markup with escaped text.

use crate::types::Span;
use std::collections::HashMap;

/// CSS class slots emitted by the renderer, without prefix.
pub const CLASSES: &[&str] = &[
    "keyword",
    "function",
    "string",
    "comment",
    "type",
    "variable",
    "constant",
    "number",
    "operator",
    "punctuation",
    "property",
    "attribute",
    "tag",
    "label",
    "namespace",
    "constructor",
    "macro",
    "escape",
];

/// Controls the `class` attribute written on highlight spans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlFormat {
    /// Bare class names: `<span class="keyword">`.
    ClassNames,
    /// Prefixed class names: `<span class="hl-keyword">` for prefix `hl`.
    ClassNamesWithPrefix(String),
}

impl Default for HtmlFormat {
    fn default() -> Self {
        HtmlFormat::ClassNamesWithPrefix("hl".to_string())
    }
}

/// Map a query capture name to its CSS class slot.
///
/// Captures are folded by their first dotted segment, so `keyword.function`
/// and `keyword.import` both land on `keyword`. Captures with no slot (e.g.
/// `spell`) produce no markup.
pub fn class_for_capture(capture: &str) -> Option<&'static str> {
    let head = capture.split('.').next().unwrap_or(capture);
    match head {
        "keyword" | "include" | "conditional" | "repeat" | "exception" => Some("keyword"),
        "function" | "method" => Some("function"),
        "string" | "character" => Some("string"),
        "comment" => Some("comment"),
        "type" => Some("type"),
        "variable" | "parameter" => Some("variable"),
        "constant" | "boolean" => Some("constant"),
        "number" | "float" => Some("number"),
        "operator" => Some("operator"),
        "punctuation" | "delimiter" => Some("punctuation"),
        "property" | "field" => Some("property"),
        "attribute" => Some("attribute"),
        "tag" => Some("tag"),
        "label" => Some("label"),
        "namespace" | "module" => Some("namespace"),
        "constructor" => Some("constructor"),
        "macro" => Some("macro"),
        "escape" => Some("escape"),
        _ => None,
    }
}

fn make_html_tags(class: &str, format: &HtmlFormat) -> (String, &'static str) {
    let open = match format {
        HtmlFormat::ClassNames => format!("<span class=\"{class}\">"),
        HtmlFormat::ClassNamesWithPrefix(prefix) => {
            format!("<span class=\"{prefix}-{class}\">")
        }
    };
    (open, "</span>")
}

#[derive(Debug, Clone)]
struct NormalizedSpan {
    start: u32,
    end: u32,
    class: &'static str,
}

/// Map spans to class slots and merge adjacent spans with the same class.
fn normalize_and_coalesce(spans: Vec<Span>) -> Vec<NormalizedSpan> {
    let mut normalized: Vec<NormalizedSpan> = spans
        .into_iter()
        .filter_map(|span| {
            class_for_capture(&span.capture).map(|class| NormalizedSpan {
                start: span.start,
                end: span.end,
                class,
            })
        })
        .collect();

    normalized.sort_by_key(|s| (s.start, s.end));

    let mut coalesced: Vec<NormalizedSpan> = Vec::with_capacity(normalized.len());
    for span in normalized {
        if let Some(last) = coalesced.last_mut() {
            if span.class == last.class && span.start <= last.end {
                last.end = last.end.max(span.end);
                continue;
            }
        }
        coalesced.push(span);
    }

    coalesced
}

/// Deduplicate spans and convert to HTML.
///
/// When two spans cover the exact same range, the one from the later query
/// pattern wins (tree-sitter convention: later patterns override earlier
/// ones), and styled captures win over unstyled ones.
///
/// Trailing newlines are trimmed so the output sits cleanly inside
/// `<pre><code>` without a blank last line.
pub fn spans_to_html(source: &str, spans: Vec<Span>, format: &HtmlFormat) -> String {
    let source = source.trim_end_matches('\n');

    if spans.is_empty() {
        return html_escape(source);
    }

    let mut spans = spans;
    spans.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| b.end.cmp(&a.end)));

    let mut deduped: HashMap<(u32, u32), Span> = HashMap::new();
    for span in spans {
        let key = (span.start, span.end);
        let new_styled = class_for_capture(&span.capture).is_some();

        if let Some(existing) = deduped.get(&key) {
            let existing_styled = class_for_capture(&existing.capture).is_some();
            let should_replace = match (new_styled, existing_styled) {
                (true, false) => true,
                (false, true) => false,
                _ => span.pattern_index >= existing.pattern_index,
            };
            if should_replace {
                deduped.insert(key, span);
            }
        } else {
            deduped.insert(key, span);
        }
    }

    let spans = normalize_and_coalesce(deduped.into_values().collect());

    if spans.is_empty() {
        return html_escape(source);
    }

    let mut spans = spans;
    spans.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| b.end.cmp(&a.end)));

    // (pos, is_start, span_index); ends sort before starts at the same position
    let mut events: Vec<(u32, bool, usize)> = Vec::new();
    for (i, span) in spans.iter().enumerate() {
        events.push((span.start, true, i));
        events.push((span.end, false, i));
    }
    events.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

    let mut html = String::with_capacity(source.len() * 2);
    let mut last_pos: usize = 0;
    let mut stack: Vec<usize> = Vec::new();

    let mut emit = |html: &mut String, text: &str, stack: &[usize]| {
        if let Some(&top_idx) = stack.last() {
            let (open_tag, close_tag) = make_html_tags(spans[top_idx].class, format);
            html.push_str(&open_tag);
            html.push_str(&html_escape(text));
            html.push_str(close_tag);
        } else {
            html.push_str(&html_escape(text));
        }
    };

    for (pos, is_start, span_idx) in events {
        // Spans may extend past the trimmed length when they covered the
        // trailing newline
        let pos = (pos as usize).min(source.len());

        if pos > last_pos {
            emit(&mut html, &source[last_pos..pos], &stack);
            last_pos = pos;
        }

        if is_start {
            stack.push(span_idx);
        } else if let Some(idx) = stack.iter().rposition(|&x| x == span_idx) {
            stack.remove(idx);
        }
    }

    if last_pos < source.len() {
        emit(&mut html, &source[last_pos..], &stack);
    }

    html
}

/// Escape HTML special characters.
pub fn html_escape(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }
    result
}
