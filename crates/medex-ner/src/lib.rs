//! Person-name recognition for medex.
//!
//! This crate wraps third-party named-entity models behind a single
//! capability, [`NerBackend::find_person_spans`]:
//! - ONNX token classification with `ort` on native platforms
//! - the same model through `tract` when a pure-Rust build is wanted
//! - an external tagger process whose line-oriented output is parsed
//!
//! Backends are chosen once by [`load_backend`], which reports missing
//! artifacts as [`NerInit::Unavailable`] instead of failing.

mod backend;
mod classifier;
mod config;
mod error;
mod segment;
mod span;
mod tagger;

pub use backend::{load_backend, NerBackend, NerInit};
pub use classifier::{load_labels, ClassifierSession, EncodedInput, TokenClassifier};
pub use config::{BackendKind, NerConfig, TaggerConfig};
pub use error::NerError;
pub use segment::{split_sentences, tokenize, Token};
pub use span::{spans_from_tags, Boundary, EntityCategory, EntitySpan, EntityTag, TaggedSentence};
pub use tagger::{parse_tagged_output, TaggedOutputBackend};

#[cfg(feature = "native")]
pub use backend::ort::OrtSession;

#[cfg(feature = "pure-rust")]
pub use backend::tract::TractSession;

/// Result type for NER operations.
pub type Result<T> = std::result::Result<T, NerError>;
