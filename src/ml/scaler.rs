use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PipelineError, Result};

/// Fitted min/max of the data the scaler was fit on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalerState {
    pub min: f64,
    pub max: f64,
}

impl ScalerState {
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn is_constant(&self) -> bool {
        self.span() == 0.0
    }
}

/// Min-max normalizer into a target range.
///
/// A constant input maps every value to the midpoint of the range, and the
/// inverse of any value is the constant itself.
#[derive(Debug, Clone)]
pub struct MinMaxScaler {
    range: (f64, f64),
    state: Option<ScalerState>,
}

impl MinMaxScaler {
    pub fn new() -> Self {
        Self { range: (0.0, 1.0), state: None }
    }

    pub fn with_range(lo: f64, hi: f64) -> Result<Self> {
        if !(lo.is_finite() && hi.is_finite()) || lo >= hi {
            return Err(PipelineError::Config(format!(
                "feature range [{}, {}] must be finite and increasing",
                lo, hi
            )));
        }
        Ok(Self { range: (lo, hi), state: None })
    }

    pub fn state(&self) -> Option<ScalerState> {
        self.state
    }

    /// Fits on `values` and returns them normalized. Refitting replaces the
    /// previous state.
    pub fn fit_transform(&mut self, values: &[f64]) -> Result<Vec<f64>> {
        if values.is_empty() {
            return Err(PipelineError::NoData(None));
        }

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let state = ScalerState { min, max };
        debug!("Scaler fit on {} values: min={:.4}, max={:.4}", values.len(), min, max);

        self.state = Some(state);
        Ok(self.apply(state, values))
    }

    pub fn inverse_transform(&self, values: &[f64]) -> Result<Vec<f64>> {
        let state = self.state.ok_or(PipelineError::NotFitted)?;
        let (lo, hi) = self.range;

        let restored = if state.is_constant() {
            vec![state.min; values.len()]
        } else {
            values
                .iter()
                .map(|v| (v - lo) / (hi - lo) * state.span() + state.min)
                .collect()
        };
        Ok(restored)
    }

    fn apply(&self, state: ScalerState, values: &[f64]) -> Vec<f64> {
        let (lo, hi) = self.range;
        if state.is_constant() {
            let mid = (lo + hi) / 2.0;
            return vec![mid; values.len()];
        }
        values
            .iter()
            .map(|v| (v - state.min) / state.span() * (hi - lo) + lo)
            .collect()
    }
}

impl Default for MinMaxScaler {
    fn default() -> Self {
        Self::new()
    }
}
