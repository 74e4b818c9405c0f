//! Token-classification NER on top of an ONNX session.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;

use ndarray::{Array2, ArrayView1};
use serde::Deserialize;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info};

use crate::backend::NerBackend;
use crate::config::NerConfig;
use crate::error::NerError;
use crate::segment::{split_sentences, tokenize};
use crate::span::{spans_from_tags, Boundary, EntityCategory, EntityTag, TaggedSentence};
use crate::Result;

/// Model inputs for one sentence, in sub-word token order.
#[derive(Debug, Clone, Default)]
pub struct EncodedInput {
    pub input_ids: Vec<i64>,
    pub attention_mask: Vec<i64>,
    pub token_type_ids: Vec<i64>,
}

impl EncodedInput {
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }
}

/// A loaded token-classification model.
///
/// Implemented once per inference engine so that the same model file gives
/// the same spans regardless of the runtime executing it.
pub trait ClassifierSession: Send + Sync {
    /// Short engine identifier used in logs.
    fn engine(&self) -> &'static str;

    /// Run the model on one encoded sentence.
    ///
    /// Returns logits shaped `[input.len(), num_labels]`.
    fn logits(&self, input: &EncodedInput) -> Result<Array2<f32>>;
}

#[derive(Deserialize)]
struct LabelConfig {
    id2label: std::collections::HashMap<String, String>,
}

/// Load the label table of a token-classification model.
///
/// Accepts a HuggingFace `config.json` (`id2label` object) or a plain text
/// file with one label per line.
pub fn load_labels(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(NerError::ModelNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let labels = if is_json {
        let config: LabelConfig = serde_json::from_str(&content)
            .map_err(|e| NerError::InvalidLabels(format!("{}: {}", path.display(), e)))?;

        let mut indexed = config
            .id2label
            .into_iter()
            .map(|(id, label)| {
                id.parse::<usize>()
                    .map(|id| (id, label))
                    .map_err(|_| NerError::InvalidLabels(format!("non-numeric label id '{}'", id)))
            })
            .collect::<Result<Vec<_>>>()?;
        indexed.sort_by_key(|(id, _)| *id);

        for (expected, (id, _)) in indexed.iter().enumerate() {
            if *id != expected {
                return Err(NerError::InvalidLabels(format!("label id {} is missing", expected)));
            }
        }

        indexed.into_iter().map(|(_, label)| label).collect()
    } else {
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>()
    };

    if labels.is_empty() {
        return Err(NerError::InvalidLabels(format!("{} has no labels", path.display())));
    }

    Ok(labels)
}

/// Sentence-by-sentence person finder driven by a token classifier.
pub struct TokenClassifier<S> {
    session: S,
    tokenizer: Tokenizer,
    labels: Vec<EntityTag>,
    person_labels: Vec<usize>,
    adaptive_threshold: f32,
    /// Words tagged as persons earlier in the current document.
    adaptive: Mutex<HashSet<String>>,
}

impl<S: ClassifierSession> TokenClassifier<S> {
    /// Build a classifier from an already loaded session, tokenizer and labels.
    pub fn new(
        session: S,
        mut tokenizer: Tokenizer,
        labels: &[String],
        config: &NerConfig,
    ) -> Result<Self> {
        tokenizer.with_padding(None);
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: config.max_sequence_length,
                ..Default::default()
            }))
            .map_err(|e| NerError::Tokenization(e.to_string()))?;

        let labels: Vec<EntityTag> = labels.iter().map(|l| EntityTag::parse(l)).collect();
        let person_labels: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, tag)| tag.is_person())
            .map(|(idx, _)| idx)
            .collect();

        if person_labels.is_empty() {
            return Err(NerError::InvalidLabels(
                "model has no PERSON label".to_string(),
            ));
        }

        Ok(Self {
            session,
            tokenizer,
            labels,
            person_labels,
            adaptive_threshold: config.adaptive_threshold,
            adaptive: Mutex::new(HashSet::new()),
        })
    }

    /// Load the tokenizer and labels named in `config` around `session`.
    pub fn from_config(session: S, config: &NerConfig) -> Result<Self> {
        let tokenizer_path = config.tokenizer_path();
        if !tokenizer_path.exists() {
            return Err(NerError::ModelNotFound(tokenizer_path));
        }

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| NerError::ModelLoad(format!("tokenizer load failed: {}", e)))?;
        let labels = load_labels(&config.labels_path())?;

        info!(
            "{} token classifier loaded from {} ({} labels)",
            session.engine(),
            config.model_dir.display(),
            labels.len()
        );

        Self::new(session, tokenizer, &labels, config)
    }

    fn encode(&self, words: &[&str]) -> Result<(EncodedInput, Vec<Option<u32>>)> {
        let encoding = self
            .tokenizer
            .encode(words.to_vec(), true)
            .map_err(|e| NerError::Tokenization(e.to_string()))?;

        let input = EncodedInput {
            input_ids: encoding.get_ids().iter().map(|&id| id as i64).collect(),
            attention_mask: encoding
                .get_attention_mask()
                .iter()
                .map(|&m| m as i64)
                .collect(),
            token_type_ids: encoding.get_type_ids().iter().map(|&t| t as i64).collect(),
        };

        Ok((input, encoding.get_word_ids().to_vec()))
    }

    /// Tag each word with the label of its first sub-word token.
    fn tag_words(&self, words: &[&str]) -> Result<Vec<EntityTag>> {
        let (input, word_ids) = self.encode(words)?;
        if input.is_empty() {
            return Ok(vec![EntityTag::Outside; words.len()]);
        }

        let logits = self.session.logits(&input)?;
        if logits.nrows() != input.len() || logits.ncols() != self.labels.len() {
            return Err(NerError::Inference(format!(
                "unexpected logits shape {:?}, expected [{}, {}]",
                logits.shape(),
                input.len(),
                self.labels.len()
            )));
        }

        let mut memory = self
            .adaptive
            .lock()
            .map_err(|_| NerError::Inference("adaptive data lock poisoned".to_string()))?;

        let mut tags = vec![EntityTag::Outside; words.len()];
        let mut seen = vec![false; words.len()];

        for (row, word_id) in word_ids.iter().enumerate() {
            let Some(word_idx) = word_id.map(|w| w as usize) else {
                continue;
            };
            if word_idx >= words.len() || seen[word_idx] {
                continue;
            }
            seen[word_idx] = true;

            let probs = softmax(logits.row(row));
            let best = argmax(&probs);
            let mut tag = self.labels[best];

            if tag == EntityTag::Outside && memory.contains(words[word_idx]) {
                let person_prob: f32 = self.person_labels.iter().map(|&i| probs[i]).sum();
                if person_prob >= self.adaptive_threshold {
                    debug!("re-tagging '{}' as person from document context", words[word_idx]);
                    tag = EntityTag::Entity {
                        boundary: Boundary::Inside,
                        category: EntityCategory::Person,
                    };
                }
            }

            tags[word_idx] = tag;
        }

        for (word, tag) in words.iter().zip(&tags) {
            if tag.is_person() {
                memory.insert((*word).to_string());
            }
        }

        Ok(tags)
    }
}

impl<S: ClassifierSession> NerBackend for TokenClassifier<S> {
    fn backend_id(&self) -> &str {
        self.session.engine()
    }

    fn find_person_spans(&self, text: &str) -> Result<Vec<TaggedSentence>> {
        let mut sentences = Vec::new();

        for sentence in split_sentences(text) {
            let words: Vec<&str> = tokenize(sentence).iter().map(|t| t.text).collect();
            if words.is_empty() {
                continue;
            }

            let tags = self.tag_words(&words)?;
            let spans = spans_from_tags(&tags)
                .into_iter()
                .filter(|span| span.category == EntityCategory::Person)
                .collect();

            sentences.push(TaggedSentence::new(
                words.into_iter().map(str::to_string).collect(),
                spans,
            ));
        }

        Ok(sentences)
    }

    fn clear_adaptive_data(&self) {
        if let Ok(mut memory) = self.adaptive.lock() {
            memory.clear();
        }
    }
}

fn softmax(row: ArrayView1<'_, f32>) -> Vec<f32> {
    let max = row.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = row.iter().map(|&v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|v| v / sum).collect()
}

fn argmax(values: &[f32]) -> usize {
    values
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}
