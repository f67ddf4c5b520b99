use tracing::debug;

use super::predictor::Predictor;
use super::scaler::MinMaxScaler;
use crate::error::{PipelineError, Result};

/// Multi-step forecaster built on a one-step [`Predictor`].
///
/// Each prediction is appended to a working buffer and becomes part of the
/// input for the following steps, so errors compound over the horizon.
#[derive(Debug, Clone, Copy)]
pub struct Forecaster {
    window_size: usize,
    steps: usize,
    smoothing_window: usize,
}

impl Forecaster {
    pub fn new(window_size: usize, steps: usize, smoothing_window: usize) -> Self {
        Self { window_size, steps, smoothing_window }
    }

    /// Runs `steps` autoregressive predictions from `seed` (normalized scale).
    /// Only the last `window_size` values of the seed are used.
    pub fn rollout<P>(&self, seed: &[f64], predictor: &mut P) -> Result<Vec<f64>>
    where
        P: Predictor + ?Sized,
    {
        if seed.len() < self.window_size {
            return Err(PipelineError::InsufficientData {
                required: self.window_size,
                actual: seed.len(),
            });
        }
        if let Some(expected) = predictor.input_len() {
            if expected != self.window_size {
                return Err(PipelineError::Prediction(format!(
                    "model '{}' expects {} inputs, window size is {}",
                    predictor.name(),
                    expected,
                    self.window_size
                )));
            }
        }

        let mut buffer = seed[seed.len() - self.window_size..].to_vec();
        buffer.reserve(self.steps);
        let mut predictions = Vec::with_capacity(self.steps);

        for step in 0..self.steps {
            let input = &buffer[buffer.len() - self.window_size..];
            let next = predictor
                .predict(input)
                .map_err(|e| PipelineError::Prediction(format!("step {}: {}", step, e)))?;

            if !next.is_finite() {
                return Err(PipelineError::Prediction(format!(
                    "step {}: model '{}' returned non-finite value {}",
                    step,
                    predictor.name(),
                    next
                )));
            }

            predictions.push(next);
            buffer.push(next);
        }

        debug!("Rollout with '{}' produced {} steps", predictor.name(), predictions.len());
        Ok(predictions)
    }

    /// Rollout, smoothing, then back to price scale.
    pub fn forecast<P>(
        &self,
        seed: &[f64],
        predictor: &mut P,
        scaler: &MinMaxScaler,
    ) -> Result<Vec<f64>>
    where
        P: Predictor + ?Sized,
    {
        let raw = self.rollout(seed, predictor)?;
        let smoothed = smooth(&raw, self.smoothing_window);
        scaler.inverse_transform(&smoothed)
    }
}

/// Trailing simple moving average of size `window`. The first `window - 1`
/// values are passed through unsmoothed so the length is unchanged, which
/// leaves a visible step where the averaged segment starts.
pub fn smooth(values: &[f64], window: usize) -> Vec<f64> {
    if window <= 1 || values.len() < window {
        return values.to_vec();
    }

    let mut out = Vec::with_capacity(values.len());
    out.extend_from_slice(&values[..window - 1]);

    let mut sum: f64 = values[..window].iter().sum();
    out.push(sum / window as f64);
    for i in window..values.len() {
        sum += values[i] - values[i - window];
        out.push(sum / window as f64);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::predictor::{FnPredictor, PersistencePredictor};

    #[test]
    fn test_rollout_length() {
        let forecaster = Forecaster::new(5, 30, 3);
        let seed = vec![0.1, 0.2, 0.3, 0.4, 0.5];

        let mut constant = FnPredictor::new("constant", |_: &[f64]| Ok(0.42));
        let preds = forecaster.rollout(&seed, &mut constant).unwrap();
        assert_eq!(preds.len(), 30);
        assert!(preds.iter().all(|p| *p == 0.42));

        let preds = forecaster.rollout(&seed, &mut PersistencePredictor).unwrap();
        assert_eq!(preds, vec![0.5; 30]);
    }

    #[test]
    fn test_predictions_feed_back_into_input() {
        let forecaster = Forecaster::new(3, 4, 1);
        let seed = vec![1.0, 2.0, 3.0];

        let mut seen = Vec::new();
        let mut next_int = FnPredictor::new("increment", |w: &[f64]| {
            seen.push(w.to_vec());
            Ok(w[w.len() - 1] + 1.0)
        });
        let preds = forecaster.rollout(&seed, &mut next_int).unwrap();
        drop(next_int);

        assert_eq!(preds, vec![4.0, 5.0, 6.0, 7.0]);
        assert_eq!(seen[0], vec![1.0, 2.0, 3.0]);
        assert_eq!(seen[3], vec![4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_rollout_uses_last_window_of_longer_seed() {
        let forecaster = Forecaster::new(2, 1, 1);
        let mut sum = FnPredictor::new("sum", |w: &[f64]| Ok(w.iter().sum()));
        let preds = forecaster.rollout(&[100.0, 1.0, 2.0], &mut sum).unwrap();
        assert_eq!(preds, vec![3.0]);
    }

    #[test]
    fn test_rollout_errors() {
        let forecaster = Forecaster::new(3, 5, 3);

        let short = forecaster.rollout(&[0.1], &mut PersistencePredictor);
        assert!(matches!(short, Err(PipelineError::InsufficientData { .. })));

        let mut failing = FnPredictor::new("failing", |_: &[f64]| Err(anyhow::anyhow!("model offline")));
        let err = forecaster.rollout(&[0.1, 0.2, 0.3], &mut failing).unwrap_err();
        assert!(matches!(err, PipelineError::Prediction(_)));

        let mut nan = FnPredictor::new("nan", |_: &[f64]| Ok(f64::NAN));
        assert!(matches!(
            forecaster.rollout(&[0.1, 0.2, 0.3], &mut nan),
            Err(PipelineError::Prediction(_))
        ));
    }

    #[test]
    fn test_smooth_keeps_length_and_head() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let smoothed = smooth(&values, 3);

        assert_eq!(smoothed.len(), values.len());
        assert_eq!(&smoothed[..2], &[1.0, 2.0]);
        assert_eq!(&smoothed[2..], &[2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_smooth_edge_windows() {
        let values = vec![3.0, 9.0];
        assert_eq!(smooth(&values, 3), values);
        assert_eq!(smooth(&values, 1), values);
        assert_eq!(smooth(&values, 0), values);
        assert_eq!(smooth(&values, 2), vec![3.0, 6.0]);
    }

    #[test]
    fn test_forecast_returns_prices() {
        let mut scaler = MinMaxScaler::new();
        let seed = scaler.fit_transform(&[100.0, 150.0, 200.0]).unwrap();
        let forecaster = Forecaster::new(3, 4, 3);

        let prices = forecaster.forecast(&seed, &mut PersistencePredictor, &scaler).unwrap();
        assert_eq!(prices.len(), 4);
        for p in prices {
            assert!((p - 200.0).abs() < 1e-9);
        }
    }
}
