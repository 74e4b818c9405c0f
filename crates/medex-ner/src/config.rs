//! NER backend configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Which NER backend to construct.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// ONNX Runtime, then tract, then the external tagger - whichever has
    /// its artifacts available first.
    #[default]
    Auto,
    /// ONNX Runtime token classifier.
    Onnx,
    /// Pure-Rust tract token classifier.
    Tract,
    /// External tagger process.
    Tagger,
    /// No NER; names come from cue patterns only.
    Disabled,
}

/// External tagger invocation.
///
/// The tagger reads the document on stdin and writes one `word ... TAG`
/// line per token to stdout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggerConfig {
    /// Program name or path.
    pub program: String,
    /// Arguments passed to the program.
    #[serde(default)]
    pub args: Vec<String>,
}

/// NER configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NerConfig {
    /// Backend selection.
    pub backend: BackendKind,

    /// Directory containing the model artifacts.
    pub model_dir: PathBuf,

    /// Token classification model file name.
    pub model_file: String,

    /// HuggingFace tokenizer definition file name.
    pub tokenizer_file: String,

    /// Model config file holding the `id2label` table.
    pub labels_file: String,

    /// Maximum number of sub-word tokens per sentence.
    pub max_sequence_length: usize,

    /// Minimum PERSON probability for re-tagging a token already seen as a
    /// person earlier in the same document.
    pub adaptive_threshold: f32,

    /// External tagger, if one is installed.
    pub tagger: Option<TaggerConfig>,
}

impl Default for NerConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Auto,
            model_dir: PathBuf::from("models"),
            model_file: "model.onnx".to_string(),
            tokenizer_file: "tokenizer.json".to_string(),
            labels_file: "config.json".to_string(),
            max_sequence_length: 128,
            adaptive_threshold: 0.35,
            tagger: None,
        }
    }
}

impl NerConfig {
    pub fn model_path(&self) -> PathBuf {
        self.model_dir.join(&self.model_file)
    }

    pub fn tokenizer_path(&self) -> PathBuf {
        self.model_dir.join(&self.tokenizer_file)
    }

    pub fn labels_path(&self) -> PathBuf {
        self.model_dir.join(&self.labels_file)
    }

    /// Model artifacts that do not exist on disk.
    pub fn missing_artifacts(&self) -> Vec<PathBuf> {
        [self.model_path(), self.tokenizer_path(), self.labels_path()]
            .into_iter()
            .filter(|path| !path.exists())
            .collect()
    }
}
