use anyhow::Result;

/// A pretrained one-step model: given a fixed-size window of normalized
/// closes, return the next normalized close.
pub trait Predictor {
    fn name(&self) -> &str;

    /// Input length the model was built for, when it is fixed.
    fn input_len(&self) -> Option<usize> {
        None
    }

    fn predict(&mut self, window: &[f64]) -> Result<f64>;
}

impl<P: Predictor + ?Sized> Predictor for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn input_len(&self) -> Option<usize> {
        (**self).input_len()
    }

    fn predict(&mut self, window: &[f64]) -> Result<f64> {
        (**self).predict(window)
    }
}

/// Repeats the last observed value. Baseline when no model file is given.
#[derive(Debug, Clone, Default)]
pub struct PersistencePredictor;

impl Predictor for PersistencePredictor {
    fn name(&self) -> &str {
        "persistence"
    }

    fn predict(&mut self, window: &[f64]) -> Result<f64> {
        window
            .last()
            .copied()
            .ok_or_else(|| anyhow::anyhow!("empty input window"))
    }
}

/// Adapts a closure into a [`Predictor`].
pub struct FnPredictor<F> {
    name: String,
    f: F,
}

impl<F> FnPredictor<F>
where
    F: FnMut(&[f64]) -> Result<f64>,
{
    pub fn new(name: &str, f: F) -> Self {
        Self { name: name.to_string(), f }
    }
}

impl<F> Predictor for FnPredictor<F>
where
    F: FnMut(&[f64]) -> Result<f64>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&mut self, window: &[f64]) -> Result<f64> {
        (self.f)(window)
    }
}
