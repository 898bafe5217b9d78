//! Built-in language registry.
//!
//! Each entry pairs a tree-sitter grammar from crates.io with its bundled
//! highlight (and, where available, injection) queries. Languages are enabled
//! via `lang-*` feature flags; the `all-languages` feature (on by default)
//! turns everything on.

use tree_sitter::Language;

/// A registry entry: the language plus its query sources.
pub struct LanguageDef {
    /// The tree-sitter language.
    pub language: Language,
    /// Highlights query bundled with the grammar crate.
    pub highlights_query: &'static str,
    /// Injections query, or `""` when the grammar ships none.
    pub injections_query: &'static str,
}

/// Normalize a language name to its canonical registry form.
///
/// Unknown names pass through unchanged so the caller can report them as-is.
pub fn normalize(language: &str) -> &str {
    match language {
        "rs" => "rust",
        "py" | "py3" | "python3" => "python",
        "golang" => "go",
        "h" => "c",
        "c++" | "cxx" | "cc" | "hpp" => "cpp",
        "js" | "jsx" | "mjs" | "cjs" => "javascript",
        "htm" => "html",
        "sh" | "shell" | "zsh" => "bash",
        "conf" | "cfg" => "ini",
        "xsl" | "xslt" | "svg" => "xml",
        "rkt" | "scheme" => "racket",
        other => other,
    }
}

/// Look up a canonical language name in the registry.
pub fn lookup(language: &str) -> Option<LanguageDef> {
    match language {
        #[cfg(feature = "lang-rust")]
        "rust" => Some(LanguageDef {
            language: tree_sitter_rust::LANGUAGE.into(),
            highlights_query: tree_sitter_rust::HIGHLIGHTS_QUERY,
            injections_query: tree_sitter_rust::INJECTIONS_QUERY,
        }),
        #[cfg(feature = "lang-python")]
        "python" => Some(LanguageDef {
            language: tree_sitter_python::LANGUAGE.into(),
            highlights_query: tree_sitter_python::HIGHLIGHTS_QUERY,
            injections_query: "",
        }),
        #[cfg(feature = "lang-go")]
        "go" => Some(LanguageDef {
            language: tree_sitter_go::LANGUAGE.into(),
            highlights_query: tree_sitter_go::HIGHLIGHTS_QUERY,
            injections_query: "",
        }),
        #[cfg(feature = "lang-c")]
        "c" => Some(LanguageDef {
            language: tree_sitter_c::LANGUAGE.into(),
            highlights_query: tree_sitter_c::HIGHLIGHT_QUERY,
            injections_query: "",
        }),
        #[cfg(feature = "lang-cpp")]
        "cpp" => Some(LanguageDef {
            language: tree_sitter_cpp::LANGUAGE.into(),
            highlights_query: tree_sitter_cpp::HIGHLIGHT_QUERY,
            injections_query: "",
        }),
        #[cfg(feature = "lang-java")]
        "java" => Some(LanguageDef {
            language: tree_sitter_java::LANGUAGE.into(),
            highlights_query: tree_sitter_java::HIGHLIGHTS_QUERY,
            injections_query: "",
        }),
        #[cfg(feature = "lang-javascript")]
        "javascript" => Some(LanguageDef {
            language: tree_sitter_javascript::LANGUAGE.into(),
            highlights_query: tree_sitter_javascript::HIGHLIGHT_QUERY,
            injections_query: tree_sitter_javascript::INJECTIONS_QUERY,
        }),
        #[cfg(feature = "lang-html")]
        "html" => Some(LanguageDef {
            language: tree_sitter_html::LANGUAGE.into(),
            highlights_query: tree_sitter_html::HIGHLIGHTS_QUERY,
            injections_query: tree_sitter_html::INJECTIONS_QUERY,
        }),
        #[cfg(feature = "lang-css")]
        "css" => Some(LanguageDef {
            language: tree_sitter_css::LANGUAGE.into(),
            highlights_query: tree_sitter_css::HIGHLIGHTS_QUERY,
            injections_query: "",
        }),
        #[cfg(feature = "lang-json")]
        "json" => Some(LanguageDef {
            language: tree_sitter_json::LANGUAGE.into(),
            highlights_query: tree_sitter_json::HIGHLIGHTS_QUERY,
            injections_query: "",
        }),
        #[cfg(feature = "lang-bash")]
        "bash" => Some(LanguageDef {
            language: tree_sitter_bash::LANGUAGE.into(),
            highlights_query: tree_sitter_bash::HIGHLIGHT_QUERY,
            injections_query: "",
        }),
        #[cfg(feature = "lang-php")]
        "php" => Some(LanguageDef {
            language: tree_sitter_php::LANGUAGE_PHP.into(),
            highlights_query: tree_sitter_php::HIGHLIGHTS_QUERY,
            injections_query: "",
        }),
        #[cfg(feature = "lang-ini")]
        "ini" => Some(LanguageDef {
            language: tree_sitter_ini::LANGUAGE.into(),
            highlights_query: tree_sitter_ini::HIGHLIGHTS_QUERY,
            injections_query: "",
        }),
        #[cfg(feature = "lang-xml")]
        "xml" => Some(LanguageDef {
            language: tree_sitter_xml::LANGUAGE_XML.into(),
            highlights_query: tree_sitter_xml::XML_HIGHLIGHT_QUERY,
            injections_query: "",
        }),
        #[cfg(feature = "lang-racket")]
        "racket" => Some(LanguageDef {
            language: tree_sitter_racket::LANGUAGE.into(),
            highlights_query: tree_sitter_racket::HIGHLIGHTS_QUERY,
            injections_query: "",
        }),
        _ => None,
    }
}

/// Canonical names of all languages enabled at build time.
pub fn supported() -> Vec<&'static str> {
    let mut langs = Vec::new();
    if cfg!(feature = "lang-rust") {
        langs.push("rust");
    }
    if cfg!(feature = "lang-python") {
        langs.push("python");
    }
    if cfg!(feature = "lang-go") {
        langs.push("go");
    }
    if cfg!(feature = "lang-c") {
        langs.push("c");
    }
    if cfg!(feature = "lang-cpp") {
        langs.push("cpp");
    }
    if cfg!(feature = "lang-java") {
        langs.push("java");
    }
    if cfg!(feature = "lang-javascript") {
        langs.push("javascript");
    }
    if cfg!(feature = "lang-html") {
        langs.push("html");
    }
    if cfg!(feature = "lang-css") {
        langs.push("css");
    }
    if cfg!(feature = "lang-json") {
        langs.push("json");
    }
    if cfg!(feature = "lang-bash") {
        langs.push("bash");
    }
    if cfg!(feature = "lang-php") {
        langs.push("php");
    }
    if cfg!(feature = "lang-ini") {
        langs.push("ini");
    }
    if cfg!(feature = "lang-xml") {
        langs.push("xml");
    }
    if cfg!(feature = "lang-racket") {
        langs.push("racket");
    }
    langs
}
