//! Error types for the highlighting API.

/// Errors returned by [`crate::Highlighter`].
#[derive(Debug)]
pub enum Error {
    /// The requested language has no registered grammar.
    UnsupportedLanguage {
        /// The language that was requested.
        language: String,
    },
    /// Parsing failed for a supported language.
    Parse {
        /// The language being parsed.
        language: String,
        /// What went wrong.
        message: String,
    },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::UnsupportedLanguage { language } => {
                write!(f, "unsupported language: {}", language)
            }
            Error::Parse { language, message } => {
                write!(f, "parse error for {}: {}", language, message)
            }
        }
    }
}

impl std::error::Error for Error {}
