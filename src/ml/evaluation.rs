use serde::Serialize;
use std::fmt;
use tracing::debug;

use super::predictor::Predictor;
use super::scaler::MinMaxScaler;
use super::window::WindowBuilder;
use crate::error::{PipelineError, Result};

/// One-step-ahead accuracy of a model over holdout windows, in price units.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorMetrics {
    pub samples: usize,
    pub mae: f64,
    pub mse: f64,
    pub rmse: f64,
    /// Mean absolute percentage error, in percent
    pub mape: f64,
}

impl ErrorMetrics {
    pub fn from_pairs(predicted: &[f64], actual: &[f64]) -> Result<Self> {
        if predicted.len() != actual.len() {
            return Err(PipelineError::InvalidSeries(format!(
                "predicted ({}) and actual ({}) lengths differ",
                predicted.len(),
                actual.len()
            )));
        }
        if predicted.is_empty() {
            return Err(PipelineError::InsufficientData { required: 1, actual: 0 });
        }

        let n = predicted.len() as f64;
        let mut abs_sum = 0.0;
        let mut sq_sum = 0.0;
        let mut pct_sum = 0.0;
        let mut pct_count = 0usize;

        for (p, a) in predicted.iter().zip(actual) {
            let err = p - a;
            abs_sum += err.abs();
            sq_sum += err * err;
            if *a != 0.0 {
                pct_sum += (err / a).abs();
                pct_count += 1;
            }
        }

        let mse = sq_sum / n;
        Ok(Self {
            samples: predicted.len(),
            mae: abs_sum / n,
            mse,
            rmse: mse.sqrt(),
            mape: if pct_count > 0 { pct_sum / pct_count as f64 * 100.0 } else { 0.0 },
        })
    }
}

impl fmt::Display for ErrorMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} samples, MAE {:.4}, RMSE {:.4}, MAPE {:.2}%",
            self.samples, self.mae, self.rmse, self.mape
        )
    }
}

/// Predicts every target of `windows` from its own window of real values and
/// compares the results with the actual prices.
pub fn evaluate<P>(
    windows: &WindowBuilder<'_>,
    predictor: &mut P,
    scaler: &MinMaxScaler,
) -> Result<ErrorMetrics>
where
    P: Predictor + ?Sized,
{
    if windows.is_empty() {
        return Err(PipelineError::InsufficientData { required: 1, actual: 0 });
    }

    let mut predicted = Vec::with_capacity(windows.len());
    let mut targets = Vec::with_capacity(windows.len());

    for (window, target) in windows {
        let y = predictor
            .predict(window)
            .map_err(|e| PipelineError::Prediction(e.to_string()))?;
        if !y.is_finite() {
            return Err(PipelineError::Prediction(format!(
                "model '{}' returned non-finite value {} during evaluation",
                predictor.name(),
                y
            )));
        }
        predicted.push(y);
        targets.push(target);
    }

    let predicted = scaler.inverse_transform(&predicted)?;
    let actual = scaler.inverse_transform(&targets)?;
    let metrics = ErrorMetrics::from_pairs(&predicted, &actual)?;
    debug!("Holdout evaluation with '{}': {}", predictor.name(), metrics);
    Ok(metrics)
}
