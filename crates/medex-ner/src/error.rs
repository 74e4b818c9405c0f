//! Error types for the NER layer.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading or running a NER backend.
#[derive(Error, Debug)]
pub enum NerError {
    /// A required model artifact is missing.
    #[error("model artifact not found: {}", .0.display())]
    ModelNotFound(PathBuf),

    /// Failed to load the model or create an inference session.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// The tokenizer failed to encode the input.
    #[error("tokenization failed: {0}")]
    Tokenization(String),

    /// Inference execution or output extraction failed.
    #[error("inference failed: {0}")]
    Inference(String),

    /// The label configuration is missing or malformed.
    #[error("invalid label configuration: {0}")]
    InvalidLabels(String),

    /// The external tagger could not be run or produced unusable output.
    #[error("tagger failed: {0}")]
    Tagger(String),

    /// The requested backend was not compiled into this build.
    #[error("unsupported backend: {0}")]
    Unsupported(String),

    /// I/O error when reading artifacts or talking to a tagger process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
