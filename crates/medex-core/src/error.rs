//! Error types for the medex-core library.

use thiserror::Error;

/// Main error type for the medex library.
#[derive(Error, Debug)]
pub enum MedexError {
    /// Error from the NER layer.
    #[error("NER error: {0}")]
    Ner(#[from] medex_ner::NerError),

    /// A configured pattern failed to compile.
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for the medex library.
pub type Result<T> = std::result::Result<T, MedexError>;
