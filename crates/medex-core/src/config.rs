//! Configuration structures for the extraction pipeline.

use std::path::Path;

use serde::{Deserialize, Serialize};

use medex_ner::NerConfig;

use crate::error::MedexError;
use crate::Result;

/// Main configuration for medex.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MedexConfig {
    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// Named-entity recognition configuration.
    pub ner: NerConfig,
}

/// How much text after a birth cue is searched for dates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextWindow {
    /// Everything up to the end of the line.
    #[default]
    RestOfLine,
    /// At most N characters, stopping early at `.`, `;` or a line break.
    Bounded(usize),
}

/// Field extraction configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Context window used for birth-date cues.
    pub context_window: ContextWindow,

    /// Extra claim-id regexes tried after the built-in ones.
    pub extra_claim_id_patterns: Vec<String>,

    /// Use the name cues when NER ran successfully but found nobody.
    pub fallback_on_empty_ner: bool,
}

impl MedexConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| MedexError::Config(e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| MedexError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
