//! NER backend trait and construction.

#[cfg(feature = "native")]
pub mod ort;

#[cfg(feature = "pure-rust")]
pub mod tract;

use std::fmt;

use tracing::{info, warn};

use crate::config::{BackendKind, NerConfig};
use crate::error::NerError;
use crate::span::TaggedSentence;
use crate::tagger::TaggedOutputBackend;
use crate::Result;

/// Trait for person-name recognisers.
///
/// Every backend answers the same question - which token spans in this
/// document are persons - so the name extractor never needs to know which
/// engine produced them.
pub trait NerBackend: Send + Sync {
    /// Backend identifier used in logs (e.g. "ort", "tract", "tagger").
    fn backend_id(&self) -> &str;

    /// Split `text` into sentences and return the PERSON spans of each.
    fn find_person_spans(&self, text: &str) -> Result<Vec<TaggedSentence>>;

    /// Forget any context learned from the current document.
    fn clear_adaptive_data(&self) {}
}

/// Outcome of NER initialization.
pub enum NerInit {
    /// A backend loaded and is ready for use.
    Ready(Box<dyn NerBackend>),
    /// No backend could be loaded; names fall back to cue patterns.
    Unavailable { reason: String },
}

impl NerInit {
    pub fn ready(backend: impl NerBackend + 'static) -> Self {
        NerInit::Ready(Box::new(backend))
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        NerInit::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn backend(&self) -> Option<&dyn NerBackend> {
        match self {
            NerInit::Ready(backend) => Some(backend.as_ref()),
            NerInit::Unavailable { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, NerInit::Ready(_))
    }
}

impl fmt::Debug for NerInit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NerInit::Ready(backend) => f.debug_tuple("Ready").field(&backend.backend_id()).finish(),
            NerInit::Unavailable { reason } => f
                .debug_struct("Unavailable")
                .field("reason", reason)
                .finish(),
        }
    }
}

/// Construct the configured NER backend.
///
/// Missing or broken artifacts never fail here; they produce
/// [`NerInit::Unavailable`] with the reason, logged once.
pub fn load_backend(config: &NerConfig) -> NerInit {
    let loaded = match config.backend {
        BackendKind::Disabled => return NerInit::unavailable("disabled by configuration"),
        BackendKind::Onnx => load_onnx(config),
        BackendKind::Tract => load_tract(config),
        BackendKind::Tagger => load_tagger(config),
        BackendKind::Auto => load_auto(config),
    };

    match loaded {
        Ok(backend) => {
            info!("NER backend ready: {}", backend.backend_id());
            NerInit::Ready(backend)
        }
        Err(e) => {
            warn!("NER unavailable, names will use cue patterns: {}", e);
            NerInit::unavailable(e.to_string())
        }
    }
}

fn load_auto(config: &NerConfig) -> Result<Box<dyn NerBackend>> {
    let missing = config.missing_artifacts();

    if missing.is_empty() {
        if cfg!(feature = "native") {
            return load_onnx(config);
        }
        if cfg!(feature = "pure-rust") {
            return load_tract(config);
        }
    }

    if config.tagger.is_some() {
        return load_tagger(config);
    }

    match missing.into_iter().next() {
        Some(path) => Err(NerError::ModelNotFound(path)),
        None => Err(NerError::Unsupported(
            "no ONNX engine compiled in and no tagger configured".to_string(),
        )),
    }
}

#[cfg(feature = "native")]
fn load_onnx(config: &NerConfig) -> Result<Box<dyn NerBackend>> {
    use crate::classifier::TokenClassifier;

    let session = ort::OrtSession::from_file(config.model_path())?;
    Ok(Box::new(TokenClassifier::from_config(session, config)?))
}

#[cfg(not(feature = "native"))]
fn load_onnx(_config: &NerConfig) -> Result<Box<dyn NerBackend>> {
    Err(NerError::Unsupported(
        "ONNX Runtime backend requires the `native` feature".to_string(),
    ))
}

#[cfg(feature = "pure-rust")]
fn load_tract(config: &NerConfig) -> Result<Box<dyn NerBackend>> {
    use crate::classifier::TokenClassifier;

    let session = tract::TractSession::from_file(config.model_path(), config.max_sequence_length)?;
    Ok(Box::new(TokenClassifier::from_config(session, config)?))
}

#[cfg(not(feature = "pure-rust"))]
fn load_tract(_config: &NerConfig) -> Result<Box<dyn NerBackend>> {
    Err(NerError::Unsupported(
        "tract backend requires the `pure-rust` feature".to_string(),
    ))
}

fn load_tagger(config: &NerConfig) -> Result<Box<dyn NerBackend>> {
    let tagger = config
        .tagger
        .as_ref()
        .ok_or_else(|| NerError::Tagger("no tagger configured".to_string()))?;

    Ok(Box::new(TaggedOutputBackend::new(tagger)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TaggerConfig;

    fn config_in(dir: &std::path::Path) -> NerConfig {
        NerConfig {
            model_dir: dir.to_path_buf(),
            ..NerConfig::default()
        }
    }

    #[test]
    fn test_disabled_backend_is_unavailable() {
        let config = NerConfig {
            backend: BackendKind::Disabled,
            ..NerConfig::default()
        };

        let init = load_backend(&config);
        assert!(!init.is_available());
        assert!(init.backend().is_none());
    }

    #[test]
    fn test_auto_without_artifacts_reports_missing_model() {
        let dir = tempfile::tempdir().unwrap();
        let init = load_backend(&config_in(dir.path()));

        match init {
            NerInit::Unavailable { reason } => assert!(reason.contains("model.onnx"), "{}", reason),
            NerInit::Ready(_) => panic!("expected unavailable backend"),
        }
    }

    #[test]
    fn test_onnx_without_model_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let config = NerConfig {
            backend: BackendKind::Onnx,
            ..config_in(dir.path())
        };

        assert!(!load_backend(&config).is_available());
    }

    #[test]
    fn test_tagger_without_program_is_unavailable() {
        let config = NerConfig {
            backend: BackendKind::Tagger,
            tagger: Some(TaggerConfig {
                program: "medex-no-such-tagger".to_string(),
                args: Vec::new(),
            }),
            ..NerConfig::default()
        };

        assert!(!load_backend(&config).is_available());
    }

    #[test]
    fn test_auto_falls_through_to_tagger() {
        let dir = tempfile::tempdir().unwrap();
        let config = NerConfig {
            tagger: Some(TaggerConfig {
                program: "medex-no-such-tagger".to_string(),
                args: Vec::new(),
            }),
            ..config_in(dir.path())
        };

        match load_backend(&config) {
            NerInit::Unavailable { reason } => assert!(reason.contains("medex-no-such-tagger")),
            NerInit::Ready(_) => panic!("expected unavailable backend"),
        }
    }
}
