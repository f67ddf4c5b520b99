use anyhow::{anyhow, Result};
use std::path::Path;
use tracing::info;

use super::predictor::Predictor;

/// Sequence model exported to ONNX, run with ONNX Runtime.
/// Input is `[batch=1, window, features=1]`, output is one normalized close.
pub struct OnnxPredictor {
    session: ort::session::Session,
    window_size: usize,
    name: String,
}

impl OnnxPredictor {
    /// Load an ONNX model from file
    pub fn load(path: impl AsRef<Path>, window_size: usize) -> Result<Self> {
        let path = path.as_ref();
        let session = ort::session::Session::builder()?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
            .commit_from_file(path)?;

        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("onnx")
            .to_string();
        info!("Loaded ONNX model '{}' from {}", name, path.display());

        Ok(Self { session, window_size, name })
    }
}

impl Predictor for OnnxPredictor {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_len(&self) -> Option<usize> {
        Some(self.window_size)
    }

    fn predict(&mut self, window: &[f64]) -> Result<f64> {
        if window.len() != self.window_size {
            return Err(anyhow!("Expected {} inputs, got {}", self.window_size, window.len()));
        }
        let input: Vec<f32> = window.iter().map(|&v| v as f32).collect();

        let input_tensor = ort::value::Tensor::from_array(
            ([1usize, self.window_size, 1usize], input.into_boxed_slice()),
        )?;

        let outputs = self.session.run(ort::inputs![input_tensor])?;

        let (_shape, data) = outputs[0].try_extract_tensor::<f32>()?;
        data.first()
            .map(|v| *v as f64)
            .ok_or_else(|| anyhow!("Model '{}' returned an empty tensor", self.name))
    }
}
