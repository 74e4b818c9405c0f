//! ONNX Runtime (ort) session for native platforms with XNNPACK.

use std::path::Path;
use std::sync::Mutex;

use ndarray::Array2;
use ort::ep::XNNPACK;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use tracing::debug;

use crate::classifier::{ClassifierSession, EncodedInput};
use crate::error::NerError;
use crate::Result;

/// Token-classification session backed by ONNX Runtime.
pub struct OrtSession {
    session: Mutex<Session>,
    input_names: Vec<String>,
}

impl OrtSession {
    /// Load a model from a file path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(NerError::ModelNotFound(path.to_path_buf()));
        }
        debug!("Loading NER model from: {}", path.display());

        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Load a model from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        debug!("Loading NER model from {} bytes", bytes.len());

        let session = Session::builder()
            .map_err(|e| NerError::ModelLoad(e.to_string()))?
            .with_execution_providers([XNNPACK::default().build()])
            .map_err(|e| NerError::ModelLoad(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| NerError::ModelLoad(e.to_string()))?
            .with_intra_threads(2)
            .map_err(|e| NerError::ModelLoad(e.to_string()))?
            .commit_from_memory(bytes)
            .map_err(|e| NerError::ModelLoad(e.to_string()))?;

        let input_names: Vec<String> = session
            .inputs()
            .iter()
            .map(|i| i.name().to_string())
            .collect();

        debug!("Model inputs: {:?}", input_names);

        Ok(Self {
            session: Mutex::new(session),
            input_names,
        })
    }

    /// Pick the tensor for a model input by its conventional BERT name.
    fn input_for<'a>(&self, name: &str, input: &'a EncodedInput) -> Result<&'a [i64]> {
        match name {
            "input_ids" => Ok(&input.input_ids),
            "attention_mask" => Ok(&input.attention_mask),
            "token_type_ids" => Ok(&input.token_type_ids),
            other => Err(NerError::Inference(format!("unsupported model input '{}'", other))),
        }
    }
}

impl ClassifierSession for OrtSession {
    fn engine(&self) -> &'static str {
        "ort"
    }

    fn logits(&self, input: &EncodedInput) -> Result<Array2<f32>> {
        let seq_len = input.len();
        let shape = vec![1_i64, seq_len as i64];

        let ort_inputs: Vec<(&str, ort::session::SessionInputValue<'static>)> = self
            .input_names
            .iter()
            .map(|name| {
                let data = self.input_for(name, input)?.to_vec();
                let value = Tensor::from_array((shape.clone(), data))
                    .map(Into::into)
                    .map_err(|e| NerError::Inference(e.to_string()))?;
                Ok((name.as_str(), value))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| NerError::Inference(format!("Failed to lock session: {}", e)))?;

        let outputs = session
            .run(ort_inputs)
            .map_err(|e| NerError::Inference(e.to_string()))?;

        let (_, value) = outputs
            .iter()
            .next()
            .ok_or_else(|| NerError::Inference("model produced no outputs".to_string()))?;

        // Output shape: [1, seq_len, num_labels]
        let (shape_ref, data) = value
            .try_extract_tensor::<f32>()
            .map_err(|e| NerError::Inference(e.to_string()))?;

        if shape_ref.len() != 3 || shape_ref[1] as usize != seq_len {
            return Err(NerError::Inference(format!(
                "unexpected output shape {:?} for {} tokens",
                shape_ref, seq_len
            )));
        }

        let num_labels = shape_ref[2] as usize;
        Array2::from_shape_vec((seq_len, num_labels), data.to_vec())
            .map_err(|e| NerError::Inference(e.to_string()))
    }
}
