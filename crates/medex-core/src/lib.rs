//! Core library for patient information extraction from medical reports.
//!
//! This crate provides:
//! - Patient name extraction (NER with cue-pattern fallback)
//! - Context-aware date of birth extraction
//! - Claim identifier extraction
//! - Text, JSON-serializable extraction results

pub mod config;
pub mod demo;
pub mod error;
pub mod extract;
pub mod patterns;
pub mod pipeline;
pub mod result;

pub use config::{ContextWindow, ExtractionConfig, MedexConfig};
pub use demo::DEMO_DOCUMENT;
pub use error::{MedexError, Result};
pub use extract::{ClaimIdExtractor, DateOfBirthExtractor, FieldExtractor, NameExtractor, NameStrategy};
pub use patterns::PatternSet;
pub use pipeline::{read_document, PatientInfoExtractor};
pub use result::ExtractionResult;

/// Re-export NER types.
pub use medex_ner::{load_backend, BackendKind, NerBackend, NerConfig, NerInit, TaggerConfig};
