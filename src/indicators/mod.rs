use serde::Serialize;

pub fn sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let sum: f64 = values.iter().rev().take(period).sum();
    Some(sum / period as f64)
}

/// Latest 100- and 200-day averages of the closing history.
#[derive(Debug, Clone, Serialize)]
pub struct MovingAverageSummary {
    pub last_close: Option<f64>,
    pub ma_100: Option<f64>,
    pub ma_200: Option<f64>,
}

impl MovingAverageSummary {
    pub fn from_closes(closes: &[f64]) -> Self {
        Self {
            last_close: closes.last().copied(),
            ma_100: sma(closes, 100),
            ma_200: sma(closes, 200),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sma() {
        assert_eq!(sma(&[1.0, 2.0, 3.0, 4.0], 2), Some(3.5));
        assert_eq!(sma(&[1.0], 2), None);
        assert_eq!(sma(&[1.0], 0), None);
    }

    #[test]
    fn test_summary() {
        let closes: Vec<f64> = (0..250).map(|v| v as f64).collect();
        let summary = MovingAverageSummary::from_closes(&closes);

        assert_eq!(summary.last_close, Some(249.0));
        assert_eq!(summary.ma_100, Some(199.5));
        assert_eq!(summary.ma_200, Some(149.5));

        let short = MovingAverageSummary::from_closes(&closes[..150]);
        assert!(short.ma_200.is_none());
        assert_eq!(short.ma_100, Some(99.5));
    }
}
