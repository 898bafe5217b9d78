//! Theme stylesheet for highlighted code blocks.
//!
//! The generated CSS is appended to each rewritten document's `<head>`. The
//! marker comment doubles as the idempotence guard: a file that already
//! contains it has been processed and is skipped on later runs.

/// First line of the generated stylesheet.
pub const CSS_MARKER: &str = "/* verdure syntax highlighting */";

/// (class slot, light color, dark color) for every class the renderer emits.
const PALETTE: &[(&str, &str, &str)] = &[
    ("keyword", "#a626a4", "#c678dd"),
    ("function", "#4078f2", "#61afef"),
    ("string", "#50a14f", "#98c379"),
    ("comment", "#a0a1a7", "#5c6370"),
    ("type", "#c18401", "#e5c07b"),
    ("variable", "#383a42", "#abb2bf"),
    ("constant", "#986801", "#d19a66"),
    ("number", "#986801", "#d19a66"),
    ("operator", "#0184bc", "#56b6c2"),
    ("punctuation", "#383a42", "#abb2bf"),
    ("property", "#e45649", "#e06c75"),
    ("attribute", "#986801", "#d19a66"),
    ("tag", "#e45649", "#e06c75"),
    ("label", "#4078f2", "#61afef"),
    ("namespace", "#c18401", "#e5c07b"),
    ("constructor", "#c18401", "#e5c07b"),
    ("macro", "#4078f2", "#61afef"),
    ("escape", "#0184bc", "#56b6c2"),
];

/// Generate the theme stylesheet: light colors plus a
/// `prefers-color-scheme: dark` override, scoped to the `hl-` class prefix.
pub fn generate_theme_css() -> String {
    let mut css = String::with_capacity(2048);

    css.push_str(CSS_MARKER);
    css.push('\n');

    for (class, light, _) in PALETTE {
        css.push_str(&format!(".hl-{} {{ color: {}; }}\n", class, light));
    }
    css.push_str(".hl-comment { font-style: italic; }\n");
    css.push_str(".hl-keyword { font-weight: 600; }\n");

    css.push_str("@media (prefers-color-scheme: dark) {\n");
    for (class, _, dark) in PALETTE {
        css.push_str(&format!("  .hl-{} {{ color: {}; }}\n", class, dark));
    }
    css.push_str("}\n");

    css
}
