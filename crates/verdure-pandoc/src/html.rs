//! Streaming HTML transformation of pandoc code blocks.
//!
//! Pandoc marks fenced code blocks as `<pre class="sourceCode LANG"><code>`,
//! with the language name sitting next to the generic `sourceCode` marker in
//! the parent's class list. The transform reads that class list, tries each
//! candidate token against the highlighter, and splices the first successful
//! rendering into the `code` element. Blocks that yield nothing keep their
//! original markup, and blocks that already contain element markup of their
//! own (a highlighter has been over the document before) are left alone.

use std::cell::RefCell;
use std::rc::Rc;

use lol_html::html_content::{ContentType, EndTag};
use lol_html::{HandlerResult, HtmlRewriter, Settings, element, text};
use verdure::Highlighter;

/// Pandoc's generic marker class. Never a language name.
pub const SOURCE_CODE_CLASS: &str = "sourceCode";

/// How language candidates are derived from the parent's class attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    /// Split the class list on whitespace, skip the `sourceCode` marker, and
    /// try each token in order. Failures are logged and suppressed; a block
    /// where every candidate fails keeps its original markup.
    #[default]
    TryEach,
    /// Treat the entire class attribute as a single language name, with no
    /// splitting. A highlighter failure aborts the whole transform.
    WholeClass,
}

/// Options for a single transform pass.
#[derive(Debug, Clone, Default)]
pub struct TransformOptions {
    /// Candidate-selection and failure policy.
    pub policy: FallbackPolicy,
    /// Stylesheet to append to the document `<head>`, if any.
    pub css: Option<String>,
}

/// Statistics from one transform pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TransformResult {
    /// Code blocks whose content was replaced with highlighted markup.
    pub blocks_highlighted: usize,
    /// Code blocks left untouched (no class, no usable candidate, markup
    /// already present, or all candidates failed).
    pub blocks_skipped: usize,
    /// Distinct candidate tokens that were tried and rejected.
    pub unsupported_languages: Vec<String>,
}

/// Errors from [`transform_html`].
#[derive(Debug)]
pub enum TransformError {
    /// The HTML rewriter failed.
    Rewrite(String),
    /// A highlight failure under [`FallbackPolicy::WholeClass`].
    Highlight(verdure::Error),
}

impl std::fmt::Display for TransformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransformError::Rewrite(msg) => write!(f, "HTML rewrite error: {}", msg),
            TransformError::Highlight(e) => write!(f, "highlight error: {}", e),
        }
    }
}

impl std::error::Error for TransformError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransformError::Rewrite(_) => None,
            TransformError::Highlight(e) => Some(e),
        }
    }
}

/// Per-block state while streaming through a `pre > code` element.
struct BlockState {
    candidates: Vec<String>,
    buffer: String,
}

fn record_unsupported(langs: &mut Vec<String>, language: &str) {
    if !langs.iter().any(|l| l == language) {
        langs.push(language.to_string());
    }
}

/// Transform a pandoc HTML document, highlighting its code blocks.
///
/// Each `code` element directly inside a `pre` is processed according to the
/// policy in `options`. The block's text is buffered across text nodes and
/// the rendered result is spliced in at the closing tag, so the element's
/// content is replaced wholesale. Blocks that contain child elements keep
/// their markup untouched, which also makes running the transform over its
/// own output a no-op. Blocks that were not highlighted pass through
/// byte-identical.
pub fn transform_html(
    html: &str,
    highlighter: &Highlighter,
    options: &TransformOptions,
) -> Result<(String, TransformResult), TransformError> {
    let mut output: Vec<u8> = Vec::new();

    // End tag handlers must own their state, so the per-pass state lives
    // behind Rc
    let hl = Rc::new(RefCell::new(highlighter.fork()));
    let pre_class: RefCell<Option<String>> = RefCell::new(None);
    let block: Rc<RefCell<Option<BlockState>>> = Rc::new(RefCell::new(None));
    let result: Rc<RefCell<TransformResult>> = Rc::new(RefCell::new(TransformResult::default()));
    let policy = options.policy;

    let rewriter_result = {
        let mut rewriter = HtmlRewriter::new(
            Settings {
                element_content_handlers: vec![
                    element!("pre", |el| {
                        *pre_class.borrow_mut() = el.get_attribute("class");
                        Ok(())
                    }),
                    element!("pre > code", |el| {
                        let class_attr = pre_class.borrow().clone();

                        let state = match policy {
                            FallbackPolicy::TryEach => plan_try_each(
                                class_attr.as_deref(),
                                &hl.borrow(),
                                &mut result.borrow_mut(),
                            ),
                            // The whole attribute is the language; a missing
                            // or empty attribute leaves the block as-is
                            FallbackPolicy::WholeClass => {
                                match class_attr.filter(|a| !a.is_empty()) {
                                    Some(attr) => Some(BlockState {
                                        candidates: vec![attr],
                                        buffer: String::new(),
                                    }),
                                    None => {
                                        result.borrow_mut().blocks_skipped += 1;
                                        None
                                    }
                                }
                            }
                        };

                        let planned = state.is_some();
                        *block.borrow_mut() = state;

                        if planned && let Some(handlers) = el.end_tag_handlers() {
                            let hl = Rc::clone(&hl);
                            let block = Rc::clone(&block);
                            let result = Rc::clone(&result);
                            let handler: lol_html::EndTagHandler<'static> =
                                Box::new(move |end| {
                                    let Some(state) = block.borrow_mut().take() else {
                                        return Ok(());
                                    };
                                    finish_block(
                                        end,
                                        state,
                                        &mut hl.borrow_mut(),
                                        &mut result.borrow_mut(),
                                        policy,
                                    )
                                });
                            handlers.push(handler);
                        }
                        Ok(())
                    }),
                    // A child element means the block carries markup of its
                    // own (pandoc's highlighter, or an earlier run of this
                    // tool); put the buffered text back and leave the block
                    // alone
                    element!("pre > code *", |el| {
                        if let Some(state) = block.borrow_mut().take() {
                            if !state.buffer.is_empty() {
                                el.before(&state.buffer, ContentType::Html);
                            }
                            result.borrow_mut().blocks_skipped += 1;
                        }
                        Ok(())
                    }),
                    text!("pre > code", |chunk| {
                        if let Some(state) = block.borrow_mut().as_mut() {
                            state.buffer.push_str(chunk.as_str());
                            chunk.remove();
                        }
                        Ok(())
                    }),
                    element!("head", |el| {
                        if let Some(css) = &options.css {
                            el.append(&format!("<style>{}</style>", css), ContentType::Html);
                        }
                        Ok(())
                    }),
                ],
                ..Settings::default()
            },
            |c: &[u8]| output.extend_from_slice(c),
        );

        match rewriter.write(html.as_bytes()) {
            Ok(()) => rewriter.end(),
            Err(e) => Err(e),
        }
    };

    if let Err(e) = rewriter_result {
        return Err(match e {
            lol_html::errors::RewritingError::ContentHandlerError(err) => {
                match err.downcast::<verdure::Error>() {
                    Ok(highlight_err) => TransformError::Highlight(*highlight_err),
                    Err(other) => TransformError::Rewrite(other.to_string()),
                }
            }
            other => TransformError::Rewrite(other.to_string()),
        });
    }

    let transformed =
        String::from_utf8(output).map_err(|e| TransformError::Rewrite(e.to_string()))?;

    let stats = std::mem::take(&mut *result.borrow_mut());
    Ok((transformed, stats))
}

/// Run the candidate loop for a fully buffered block, splicing the outcome
/// in before the closing tag.
fn finish_block(
    end: &mut EndTag,
    state: BlockState,
    hl: &mut Highlighter,
    result: &mut TransformResult,
    policy: FallbackPolicy,
) -> HandlerResult {
    let raw = state.buffer;
    let source = html_escape::decode_html_entities(&raw);

    for candidate in &state.candidates {
        match hl.highlight(candidate, &source) {
            Ok(rendered) => {
                end.before(&rendered, ContentType::Html);
                result.blocks_highlighted += 1;
                return Ok(());
            }
            Err(e) if policy == FallbackPolicy::WholeClass => {
                return Err(Box::new(e));
            }
            Err(e) => {
                tracing::debug!(
                    language = %candidate,
                    error = %e,
                    "candidate rejected"
                );
                if let verdure::Error::UnsupportedLanguage { language } = &e {
                    record_unsupported(&mut result.unsupported_languages, language);
                }
            }
        }
    }

    // Every candidate failed; restore the original text
    end.before(&raw, ContentType::Html);
    result.blocks_skipped += 1;
    Ok(())
}

/// Build the candidate plan for one block under the token policy.
///
/// Blocks with no class, only the `sourceCode` marker, or no supported
/// candidate at all are skipped up front so their bytes pass through
/// untouched. The candidate loop itself runs once the block's text has been
/// buffered.
fn plan_try_each(
    class_attr: Option<&str>,
    highlighter: &Highlighter,
    result: &mut TransformResult,
) -> Option<BlockState> {
    let Some(attr) = class_attr else {
        result.blocks_skipped += 1;
        return None;
    };

    let candidates: Vec<String> = attr
        .split_whitespace()
        .filter(|token| *token != SOURCE_CODE_CLASS)
        .map(String::from)
        .collect();

    if candidates.is_empty() {
        result.blocks_skipped += 1;
        return None;
    }

    if !candidates.iter().any(|c| highlighter.supports(c)) {
        for candidate in &candidates {
            record_unsupported(&mut result.unsupported_languages, candidate);
        }
        result.blocks_skipped += 1;
        return None;
    }

    Some(BlockState {
        candidates,
        buffer: String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn transform(html: &str, options: &TransformOptions) -> (String, TransformResult) {
        let hl = Highlighter::new();
        transform_html(html, &hl, options).unwrap()
    }

    fn rendering_of(language: &str, source: &str) -> String {
        Highlighter::new().highlight(language, source).unwrap()
    }

    #[test]
    fn highlights_python_block() {
        let html = r#"<pre class="sourceCode python"><code>print(1)</code></pre>"#;
        let (out, result) = transform(html, &TransformOptions::default());

        assert_eq!(result.blocks_highlighted, 1);
        assert_eq!(result.blocks_skipped, 0);
        assert!(out.contains(&rendering_of("python", "print(1)")), "got: {out}");
    }

    #[test]
    fn no_class_passes_through_unchanged() {
        let html = "<pre><code>plain text</code></pre>";
        let (out, result) = transform(html, &TransformOptions::default());

        assert_eq!(out, html);
        assert_eq!(result.blocks_highlighted, 0);
        assert_eq!(result.blocks_skipped, 1);
    }

    #[test]
    fn source_code_marker_alone_passes_through() {
        let html = r#"<pre class="sourceCode"><code>no language here</code></pre>"#;
        let (out, result) = transform(html, &TransformOptions::default());

        assert_eq!(out, html);
        assert_eq!(result.blocks_skipped, 1);
    }

    #[test]
    fn unknown_candidates_pass_through_and_are_reported() {
        let html = r#"<pre class="sourceCode klingon romulan"><code>qapla'</code></pre>"#;
        let (out, result) = transform(html, &TransformOptions::default());

        assert_eq!(out, html);
        assert_eq!(result.blocks_skipped, 1);
        assert_eq!(result.unsupported_languages, vec!["klingon", "romulan"]);
    }

    #[test]
    fn unknown_candidate_rejected_then_known_wins() {
        let html = r#"<pre class="sourceCode klingon python"><code>print(1)</code></pre>"#;
        let (out, result) = transform(html, &TransformOptions::default());

        assert_eq!(result.blocks_highlighted, 1);
        assert!(result.unsupported_languages.contains(&"klingon".to_string()));
        assert!(out.contains(&rendering_of("python", "print(1)")));
    }

    #[test]
    fn first_accepted_candidate_wins() {
        let html =
            r#"<pre class="sourceCode python rust"><code>def f():
    pass</code></pre>"#;
        let (out, result) = transform(html, &TransformOptions::default());

        assert_eq!(result.blocks_highlighted, 1);
        assert!(out.contains(&rendering_of("python", "def f():\n    pass")));
    }

    #[test]
    fn block_spanning_multiple_text_nodes_is_replaced_wholesale() {
        // A comment node splits the text into two text nodes; the block must
        // still be highlighted as one piece of source
        let html =
            "<pre class=\"sourceCode python\"><code>x = 1\n<!-- -->y = 2</code></pre>";
        let (out, result) = transform(html, &TransformOptions::default());

        assert_eq!(result.blocks_highlighted, 1);
        assert!(out.contains(&rendering_of("python", "x = 1\ny = 2")), "got: {out}");
    }

    #[test]
    fn block_with_child_markup_passes_through_unchanged() {
        let html = "<pre class=\"sourceCode python\"><code>x = 1\n<span class=\"kw\">y</span> = 2</code></pre>";
        let (out, result) = transform(html, &TransformOptions::default());

        assert_eq!(out, html);
        assert_eq!(result.blocks_highlighted, 0);
        assert_eq!(result.blocks_skipped, 1);
    }

    #[test]
    fn rehighlighting_own_output_is_a_noop() {
        let html = r#"<pre class="sourceCode python"><code>def f():
    pass</code></pre>"#;
        let (first, result) = transform(html, &TransformOptions::default());
        assert_eq!(result.blocks_highlighted, 1);

        let (second, result) = transform(&first, &TransformOptions::default());
        assert_eq!(second, first);
        assert_eq!(result.blocks_highlighted, 0);
        assert_eq!(result.blocks_skipped, 1);
    }

    #[test]
    fn decodes_entities_before_highlighting() {
        let html = r#"<pre class="sourceCode python"><code>1 &lt; 2</code></pre>"#;
        let (out, result) = transform(html, &TransformOptions::default());

        assert_eq!(result.blocks_highlighted, 1);
        // Re-escaped on output, never double-escaped
        assert!(out.contains("&lt;"), "got: {out}");
        assert!(!out.contains("&amp;lt;"), "got: {out}");
    }

    #[test]
    fn multiple_blocks_processed_independently() {
        let html = indoc! {r#"
            <pre class="sourceCode python"><code>print(1)</code></pre>
            <pre><code>plain</code></pre>
            <pre class="sourceCode rust"><code>fn main() {}</code></pre>
        "#};
        let (out, result) = transform(html, &TransformOptions::default());

        assert_eq!(result.blocks_highlighted, 2);
        assert_eq!(result.blocks_skipped, 1);
        assert!(out.contains("<pre><code>plain</code></pre>"));
    }

    #[test]
    fn code_outside_pre_is_untouched() {
        let html = r#"<p>inline <code>x = 1</code> here</p>"#;
        let (out, result) = transform(html, &TransformOptions::default());

        assert_eq!(out, html);
        assert_eq!(result.blocks_highlighted, 0);
        assert_eq!(result.blocks_skipped, 0);
    }

    #[test]
    fn whole_class_policy_highlights_single_language() {
        let html = r#"<pre class="python"><code>print(1)</code></pre>"#;
        let options = TransformOptions {
            policy: FallbackPolicy::WholeClass,
            css: None,
        };
        let (out, result) = transform(html, &options);

        assert_eq!(result.blocks_highlighted, 1);
        assert!(out.contains(&rendering_of("python", "print(1)")));
    }

    #[test]
    fn whole_class_policy_propagates_failure() {
        let html = r#"<pre class="notalang"><code>x</code></pre>"#;
        let options = TransformOptions {
            policy: FallbackPolicy::WholeClass,
            css: None,
        };
        let hl = Highlighter::new();
        let err = transform_html(html, &hl, &options).unwrap_err();

        assert!(matches!(
            err,
            TransformError::Highlight(verdure::Error::UnsupportedLanguage { ref language })
                if language == "notalang"
        ));
    }

    #[test]
    fn whole_class_policy_skips_classless_blocks() {
        let html = "<pre><code>hello world</code></pre>";
        let options = TransformOptions {
            policy: FallbackPolicy::WholeClass,
            css: None,
        };
        let (out, result) = transform(html, &options);

        assert_eq!(out, html);
        assert_eq!(result.blocks_highlighted, 0);
        assert_eq!(result.blocks_skipped, 1);
    }

    #[test]
    fn whole_class_policy_skips_empty_class() {
        let html = r#"<pre class=""><code>hello world</code></pre>"#;
        let options = TransformOptions {
            policy: FallbackPolicy::WholeClass,
            css: None,
        };
        let (out, result) = transform(html, &options);

        assert_eq!(out, html);
        assert_eq!(result.blocks_skipped, 1);
    }

    #[test]
    fn whole_class_policy_does_not_split() {
        // "sourceCode python" as one token is not a language
        let html = r#"<pre class="sourceCode python"><code>print(1)</code></pre>"#;
        let options = TransformOptions {
            policy: FallbackPolicy::WholeClass,
            css: None,
        };
        let hl = Highlighter::new();
        assert!(transform_html(html, &hl, &options).is_err());
    }

    #[test]
    fn css_appended_to_head() {
        let html = "<html><head><title>t</title></head><body></body></html>";
        let options = TransformOptions {
            policy: FallbackPolicy::TryEach,
            css: Some(".hl-keyword { color: red; }".to_string()),
        };
        let (out, _) = transform(html, &options);

        assert!(out.contains("<style>.hl-keyword { color: red; }</style>"));
    }
}
