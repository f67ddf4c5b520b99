use anyhow::{anyhow, Result};
use ndarray::{Array1, ArrayView1};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

use super::predictor::Predictor;

/// Model weights for persistence (autoregressive coefficients, oldest input first)
#[derive(Debug, Clone, Deserialize)]
struct ModelWeights {
    coefficients: Vec<f64>,
    intercept: f64,
    /// Clamp outputs into the normalized range the model was trained on
    #[serde(default)]
    clip: Option<(f64, f64)>,
}

/// Linear autoregressive model over a fixed window of normalized closes
pub struct LinearPredictor {
    coefficients: Array1<f64>,
    intercept: f64,
    clip: Option<(f64, f64)>,
    name: String,
}

impl LinearPredictor {
    fn from_weights(weights: ModelWeights, name: &str) -> Result<Self> {
        if weights.coefficients.is_empty() {
            return Err(anyhow!("Model has no coefficients"));
        }
        if weights.coefficients.iter().any(|c| !c.is_finite()) || !weights.intercept.is_finite() {
            return Err(anyhow!("Model weights must be finite"));
        }
        if let Some((lo, hi)) = weights.clip {
            if lo >= hi {
                return Err(anyhow!("Invalid clip range [{}, {}]", lo, hi));
            }
        }

        Ok(Self {
            coefficients: Array1::from(weights.coefficients),
            intercept: weights.intercept,
            clip: weights.clip,
            name: name.to_string(),
        })
    }

    fn from_json(json: &str, name: &str) -> Result<Self> {
        let weights: ModelWeights = serde_json::from_str(json)?;
        Self::from_weights(weights, name)
    }

    /// Load model weights from a JSON file; the file stem becomes the model name.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read model {}: {}", path.display(), e))?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("linear");
        let model = Self::from_json(&json, name)?;

        info!("Loaded linear model '{}' with {} inputs", model.name, model.coefficients.len());
        Ok(model)
    }
}

impl Predictor for LinearPredictor {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_len(&self) -> Option<usize> {
        Some(self.coefficients.len())
    }

    fn predict(&mut self, window: &[f64]) -> Result<f64> {
        if window.len() != self.coefficients.len() {
            return Err(anyhow!(
                "Expected {} inputs, got {}",
                self.coefficients.len(),
                window.len()
            ));
        }

        let z = self.coefficients.dot(&ArrayView1::from(window)) + self.intercept;
        Ok(match self.clip {
            Some((lo, hi)) => z.clamp(lo, hi),
            None => z,
        })
    }
}
