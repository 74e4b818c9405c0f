//! Tract session for pure-Rust ONNX inference.

use std::path::Path;

use ndarray::Array2;
use tract_onnx::prelude::*;
use tracing::debug;

use crate::classifier::{ClassifierSession, EncodedInput};
use crate::error::NerError;
use crate::Result;

type TractPlan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Token-classification session backed by tract.
///
/// Tract optimizes for a concrete shape, so every sentence is padded to
/// `max_sequence_length` and the padding rows are dropped from the logits.
pub struct TractSession {
    model: TractPlan,
    input_count: usize,
    max_sequence_length: usize,
}

impl TractSession {
    /// Load a model from a file path.
    pub fn from_file<P: AsRef<Path>>(path: P, max_sequence_length: usize) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(NerError::ModelNotFound(path.to_path_buf()));
        }
        debug!("Loading NER model with Tract from: {}", path.display());

        let model = tract_onnx::onnx()
            .model_for_path(path)
            .map_err(|e| NerError::ModelLoad(format!("Failed to load model: {}", e)))?;

        Self::prepare(model, max_sequence_length)
    }

    /// Load a model from bytes.
    pub fn from_bytes(bytes: &[u8], max_sequence_length: usize) -> Result<Self> {
        debug!("Loading NER model with Tract from {} bytes", bytes.len());

        let model = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(bytes))
            .map_err(|e| NerError::ModelLoad(format!("Failed to load model: {}", e)))?;

        Self::prepare(model, max_sequence_length)
    }

    fn prepare(mut model: InferenceModel, max_sequence_length: usize) -> Result<Self> {
        let input_count = model
            .input_outlets()
            .map_err(|e| NerError::ModelLoad(e.to_string()))?
            .len()
            .min(3);

        // input_ids, attention_mask and (for BERT) token_type_ids, all [1, seq]
        for idx in 0..input_count {
            model
                .set_input_fact(
                    idx,
                    InferenceFact::dt_shape(i64::datum_type(), &[1, max_sequence_length][..]),
                )
                .map_err(|e| NerError::ModelLoad(format!("Failed to set input shape: {}", e)))?;
        }

        let model = model
            .into_typed()
            .map_err(|e| NerError::ModelLoad(format!("Failed to type model: {}", e)))?
            .into_optimized()
            .map_err(|e| NerError::ModelLoad(format!("Failed to optimize: {}", e)))?
            .into_runnable()
            .map_err(|e| NerError::ModelLoad(e.to_string()))?;

        Ok(Self {
            model,
            input_count,
            max_sequence_length,
        })
    }

    fn padded(&self, values: &[i64]) -> Result<TValue> {
        let mut data = vec![0_i64; self.max_sequence_length];
        data[..values.len()].copy_from_slice(values);

        let array = tract_ndarray::ArrayD::from_shape_vec(
            tract_ndarray::IxDyn(&[1, self.max_sequence_length]),
            data,
        )
        .map_err(|e| NerError::Inference(e.to_string()))?;
        Ok(array.into_tvalue())
    }
}

impl ClassifierSession for TractSession {
    fn engine(&self) -> &'static str {
        "tract"
    }

    fn logits(&self, input: &EncodedInput) -> Result<Array2<f32>> {
        let seq_len = input.len();
        if seq_len > self.max_sequence_length {
            return Err(NerError::Inference(format!(
                "{} tokens exceed the fixed sequence length {}",
                seq_len, self.max_sequence_length
            )));
        }

        let sources = [&input.input_ids, &input.attention_mask, &input.token_type_ids];
        let tract_inputs: TVec<TValue> = sources
            .iter()
            .take(self.input_count)
            .map(|values| self.padded(values))
            .collect::<Result<TVec<_>>>()?;

        let outputs = self
            .model
            .run(tract_inputs)
            .map_err(|e| NerError::Inference(e.to_string()))?;

        let output = outputs
            .first()
            .ok_or_else(|| NerError::Inference("model produced no outputs".to_string()))?;
        let view = output
            .to_array_view::<f32>()
            .map_err(|e| NerError::Inference(e.to_string()))?;

        // Output shape: [1, max_sequence_length, num_labels]
        let shape = view.shape().to_vec();
        if shape.len() != 3 || shape[1] < seq_len {
            return Err(NerError::Inference(format!("unexpected output shape {:?}", shape)));
        }

        let num_labels = shape[2];
        let data: Vec<f32> = view.iter().take(seq_len * num_labels).cloned().collect();
        Array2::from_shape_vec((seq_len, num_labels), data)
            .map_err(|e| NerError::Inference(e.to_string()))
    }
}
