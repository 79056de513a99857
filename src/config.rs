//! Engine configuration
//!
//! Tunable cutoffs and significance settings for the rule catalog. Defaults
//! match the shipped product behavior; callers override individual fields
//! before constructing a processor.

use serde::{Deserialize, Serialize};

/// Default generation window in days
pub const DEFAULT_WINDOW_DAYS: u32 = 7;

/// Number of prior windows folded into the historical rolling average
pub const DEFAULT_HISTORICAL_PERIODS: u32 = 4;

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Hour at which morning ends (exclusive)
    pub morning_end_hour: u32,
    /// Hour at which afternoon ends (exclusive)
    pub afternoon_end_hour: u32,
    /// Sessions ending at or after this hour count as late-night
    pub late_night_hour: u32,
    /// Minimum duration in hours for the long-session bucket
    pub long_session_min_hours: f64,
    /// Maximum duration in hours for the short-session bucket
    pub short_session_max_hours: f64,
    /// Two group averages are notably different at or beyond this gap,
    /// expressed on the normalized [0,1] rating scale (0.2 = one point on
    /// the app's 1-5 scale)
    pub difference_threshold: f64,
    /// Relative margin for comparing a period total against an adaptive
    /// threshold (0.2 = +/-20%)
    pub relative_margin: f64,
    /// Z-score threshold for anomaly detection
    pub z_threshold: f64,
    /// Breathing completions below this count pair with high workload to
    /// trigger the recovery suggestion
    pub min_breathing_sessions_for_high_workload: u32,
    /// Sentiment scores at or above this are positive
    pub positive_sentiment_cutoff: f64,
    /// Sentiment scores at or below this are negative
    pub negative_sentiment_cutoff: f64,
    /// Number of prior windows folded into the historical rolling average
    pub historical_periods: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            morning_end_hour: 12,
            afternoon_end_hour: 18,
            late_night_hour: 22,
            long_session_min_hours: 3.0,
            short_session_max_hours: 1.0,
            difference_threshold: 0.2,
            relative_margin: 0.2,
            z_threshold: 2.0,
            min_breathing_sessions_for_high_workload: 3,
            positive_sentiment_cutoff: 0.3,
            negative_sentiment_cutoff: -0.3,
            historical_periods: DEFAULT_HISTORICAL_PERIODS,
        }
    }
}
