//! Statistical analysis
//!
//! Stateless functions shared by the pipeline and the rule catalog:
//! confidence scoring from sample size and variance, z-score anomaly
//! detection, and linear-regression trend forecasting. Insufficient sample
//! sizes never raise errors; the affected function returns `None` or empty
//! and callers skip emission.

use crate::types::{ConfidenceMetrics, PredictionResult, TrendDirection};

/// Minimum observations for anomaly detection and trend fitting
pub const MIN_SERIES_LEN: usize = 3;

/// Default z-score threshold for anomaly flagging
pub const DEFAULT_Z_THRESHOLD: f64 = 2.0;

/// Slope magnitude below which a trend counts as stable
const STABLE_SLOPE_BAND: f64 = 0.1;

/// Confidence floor
const MIN_CONFIDENCE: f64 = 0.1;

/// Maximum variance penalty subtracted from the base confidence
const MAX_VARIANCE_PENALTY: f64 = 0.2;

/// Score how trustworthy an estimate over `sample_size` observations is.
///
/// Base confidence by sample-size bucket (0-2 observations 0.3, 3-5
/// observations 0.6, 6-10 observations 0.8, above 0.9) minus a variance
/// penalty of `clamp(variance / 10, 0, 0.2)`, floored at 0.1.
pub fn confidence(sample_size: usize, variance: f64) -> ConfidenceMetrics {
    let base = match sample_size {
        0..=2 => 0.3,
        3..=5 => 0.6,
        6..=10 => 0.8,
        _ => 0.9,
    };

    let penalty = (variance / 10.0).clamp(0.0, MAX_VARIANCE_PENALTY);
    let standard_error = if sample_size > 0 {
        (variance / sample_size as f64).sqrt()
    } else {
        0.0
    };

    ConfidenceMetrics {
        sample_size,
        standard_error,
        confidence_score: (base - penalty).clamp(MIN_CONFIDENCE, 1.0),
    }
}

/// Flag values whose z-score exceeds `z_threshold`.
///
/// Returns an empty list for fewer than three values. Each value is scored
/// against the population mean and standard deviation (n denominator) of the
/// *remaining* values: at small sample sizes a single extreme point inflates
/// the overall spread enough to cap its own z-score below 2.0, so scoring it
/// against the rest keeps it from masking itself. A value that deviates from
/// an otherwise perfectly uniform series is always flagged.
pub fn detect_anomalies(values: &[f64], z_threshold: f64) -> Vec<bool> {
    if values.len() < MIN_SERIES_LEN {
        return Vec::new();
    }

    values
        .iter()
        .enumerate()
        .map(|(i, &value)| {
            let rest: Vec<f64> = values
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(_, &v)| v)
                .collect();
            let rest_mean = mean(&rest);
            let rest_std = population_std(&rest, rest_mean);
            if rest_std > 0.0 {
                (value - rest_mean).abs() / rest_std > z_threshold
            } else {
                // Uniform rest: any deviation at all is anomalous
                (value - rest_mean).abs() > f64::EPSILON
            }
        })
        .collect()
}

/// Fit an ordinary-least-squares line over `values` and forecast one step
/// ahead.
///
/// Returns `None` for fewer than three values. The slope classifies the
/// trend direction (stable inside +/-0.1); the one-step-ahead prediction is
/// clamped to the metric's valid `domain`. The confidence interval is a
/// fixed unit-width band around the prediction.
pub fn predict_trend(
    values: &[f64],
    metric_label: &str,
    domain: (f64, f64),
) -> Option<PredictionResult> {
    if values.len() < MIN_SERIES_LEN {
        return None;
    }

    let n = values.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = mean(values);

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for (i, &y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        sxy += dx * (y - y_mean);
        sxx += dx * dx;
    }
    if sxx == 0.0 {
        return None;
    }

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;

    let trend_direction = if slope > STABLE_SLOPE_BAND {
        TrendDirection::Increasing
    } else if slope < -STABLE_SLOPE_BAND {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Stable
    };

    let predicted_value = (slope * n + intercept).clamp(domain.0, domain.1);

    Some(PredictionResult {
        forecast_label: format!("next-period {metric_label}"),
        predicted_value,
        trend_direction,
        confidence_interval: (predicted_value - 1.0, predicted_value + 1.0),
    })
}

/// Arithmetic mean; 0.0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance (n denominator); 0.0 for an empty slice
pub fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

fn population_std(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
