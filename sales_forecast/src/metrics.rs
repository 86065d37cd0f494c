//! Metrics for evaluating forecast accuracy

use crate::error::{ForecastError, Result};

/// Calculate accuracy metrics for a forecast vs actual values
pub fn forecast_accuracy(forecast: &[f64], actual: &[f64]) -> Result<ForecastAccuracy> {
    if forecast.len() != actual.len() || forecast.is_empty() {
        return Err(ForecastError::ValidationError(
            "Forecast and actual values must have the same non-zero length".to_string(),
        ));
    }

    let n = forecast.len() as f64;

    let errors: Vec<f64> = forecast
        .iter()
        .zip(actual.iter())
        .map(|(&f, &a)| a - f)
        .collect();

    let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;
    let mse = errors.iter().map(|e| e.powi(2)).sum::<f64>() / n;
    let rmse = mse.sqrt();

    // Symmetric MAPE stays defined for zero-quantity days
    let smape = actual
        .iter()
        .zip(forecast.iter())
        .map(|(&a, &f)| {
            let denom = a.abs() + f.abs();
            if denom == 0.0 {
                0.0
            } else {
                200.0 * (a - f).abs() / denom
            }
        })
        .sum::<f64>()
        / n;

    Ok(ForecastAccuracy {
        mae,
        mse,
        rmse,
        smape,
    })
}

/// Forecast accuracy metrics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastAccuracy {
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Symmetric Mean Absolute Percentage Error
    pub smape: f64,
}

impl std::fmt::Display for ForecastAccuracy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MAE {:.4}, MSE {:.4}, RMSE {:.4}, SMAPE {:.2}%",
            self.mae, self.mse, self.rmse, self.smape
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_forecast_accuracy() {
        let forecast = [105.0, 106.0, 107.0];
        let actual = [106.0, 107.0, 108.0];
        let accuracy = forecast_accuracy(&forecast, &actual).unwrap();

        assert_relative_eq!(accuracy.mae, 1.0);
        assert_relative_eq!(accuracy.mse, 1.0);
        assert_relative_eq!(accuracy.rmse, 1.0);
        assert!(accuracy.smape > 0.0);
    }

    #[test]
    fn test_zero_days_do_not_divide_by_zero() {
        let accuracy = forecast_accuracy(&[0.0, 2.0], &[0.0, 4.0]).unwrap();

        assert_relative_eq!(accuracy.mae, 1.0);
        assert_relative_eq!(accuracy.smape, 200.0 * 2.0 / 6.0 / 2.0);
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        assert!(forecast_accuracy(&[1.0], &[1.0, 2.0]).is_err());
        assert!(forecast_accuracy(&[], &[]).is_err());
    }

    #[test]
    fn test_display() {
        let accuracy = forecast_accuracy(&[1.0], &[3.0]).unwrap();
        assert_eq!(accuracy.to_string(), "MAE 2.0000, MSE 4.0000, RMSE 2.0000, SMAPE 100.00%");
    }
}
