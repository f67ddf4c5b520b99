use crate::error::{PipelineError, Result};

pub const DEFAULT_WINDOW_SIZE: usize = 100;

/// Slices a series into overlapping fixed-length inputs and next-step targets.
#[derive(Debug, Clone, Copy)]
pub struct WindowBuilder<'a> {
    series: &'a [f64],
    window_size: usize,
}

impl<'a> WindowBuilder<'a> {
    pub fn build(series: &'a [f64], window_size: usize) -> Result<Self> {
        if window_size == 0 || series.len() <= window_size {
            return Err(PipelineError::InsufficientData {
                required: window_size,
                actual: series.len(),
            });
        }
        Ok(Self { series, window_size })
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Number of (window, target) pairs.
    pub fn len(&self) -> usize {
        self.series.len() - self.window_size
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fresh iterator from the start; may be called any number of times.
    pub fn iter(&self) -> Windows<'a> {
        Windows { series: self.series, window_size: self.window_size, next: self.window_size }
    }

    /// The trailing `window_size` values, used to seed a rollout.
    pub fn last_window(&self) -> &'a [f64] {
        &self.series[self.series.len() - self.window_size..]
    }
}

impl<'a> IntoIterator for &WindowBuilder<'a> {
    type Item = (&'a [f64], f64);
    type IntoIter = Windows<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct Windows<'a> {
    series: &'a [f64],
    window_size: usize,
    next: usize,
}

impl<'a> Iterator for Windows<'a> {
    type Item = (&'a [f64], f64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.series.len() {
            return None;
        }
        let i = self.next;
        self.next += 1;
        Some((&self.series[i - self.window_size..i], self.series[i]))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.series.len().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Windows<'_> {}
