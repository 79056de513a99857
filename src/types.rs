//! Core data types
//!
//! This module defines the raw input shapes produced by the caller's storage
//! layer, the canonical records that flow through the engine after
//! normalization, and the `Insight` output type with its statistical
//! companions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Raw input shapes (caller storage layer)
// ============================================================================

/// A work-session check-in as the caller's storage layer produces it.
///
/// Ratings use the app's discrete 1-5 scale. Entries may be incomplete
/// (an in-flight session has no `ended_at`); the normalizer filters those out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCheckIn {
    /// Session start time
    pub started_at: DateTime<Utc>,
    /// Session end time, absent while a session is still running
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    /// Stress rating on the 1-5 scale
    #[serde(default)]
    pub stress_rating: Option<f64>,
    /// Focus rating on the 1-5 scale
    #[serde(default)]
    pub focus_rating: Option<f64>,
    /// Workplace the session was logged at
    #[serde(default)]
    pub workplace_name: Option<String>,
    /// Free-text note attached to the session
    #[serde(default)]
    pub session_note: Option<String>,
}

/// A breathing-exercise completion as stored by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawBreathingLog {
    /// Completion time, absent for interrupted exercises
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Exercise duration in seconds
    #[serde(default)]
    pub duration_sec: u32,
    /// Exercise type identifier (e.g. "box", "4-7-8")
    #[serde(default)]
    pub exercise_type: Option<String>,
}

/// A journal entry as stored by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawJournalEntry {
    /// Entry timestamp, absent on malformed rows
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Entry title
    #[serde(default)]
    pub title: String,
    /// Entry body text
    #[serde(default)]
    pub text: String,
    /// Optional stress rating on the 1-5 scale
    #[serde(default)]
    pub stress_rating: Option<f64>,
    /// Optional focus rating on the 1-5 scale
    #[serde(default)]
    pub focus_rating: Option<f64>,
}

// ============================================================================
// Canonical records (post-normalization, ratings on [0,1])
// ============================================================================

/// A completed work-session check-in. Immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckInRecord {
    /// Session start time
    pub started_at: DateTime<Utc>,
    /// Session end time
    pub ended_at: DateTime<Utc>,
    /// Session duration in seconds
    pub session_duration_sec: u32,
    /// Stress level normalized to [0,1]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stress_level: Option<f64>,
    /// Focus level normalized to [0,1]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus_level: Option<f64>,
    /// Workplace the session was logged at
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workplace_name: Option<String>,
    /// Free-text note attached to the session
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_note: Option<String>,
}

impl CheckInRecord {
    /// Session duration in hours
    pub fn duration_hours(&self) -> f64 {
        f64::from(self.session_duration_sec) / 3600.0
    }

    /// Whether the user reflected on this session (left a stress or focus rating)
    pub fn is_reflected(&self) -> bool {
        self.stress_level.is_some() || self.focus_level.is_some()
    }
}

/// A completed breathing exercise. Immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreathingRecord {
    /// Completion time
    pub completed_at: DateTime<Utc>,
    /// Exercise duration in seconds
    pub duration_sec: u32,
    /// Exercise type identifier
    pub exercise_type: String,
}

/// A journal entry. Immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalRecord {
    /// Entry timestamp
    pub timestamp: DateTime<Utc>,
    /// Entry title
    pub title: String,
    /// Entry body text
    pub text: String,
    /// Stress level normalized to [0,1]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stress_level: Option<f64>,
    /// Focus score normalized to [0,1]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus_score: Option<f64>,
}

// ============================================================================
// Statistical companions
// ============================================================================

/// Confidence estimate derived from sample size and variance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceMetrics {
    /// Number of observations the estimate is based on
    pub sample_size: usize,
    /// Standard error of the mean
    pub standard_error: f64,
    /// Confidence score in [0.1, 1.0]
    pub confidence_score: f64,
}

/// Sign/magnitude classification of a fitted linear slope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

impl TrendDirection {
    pub fn label(&self) -> &'static str {
        match self {
            TrendDirection::Increasing => "increasing",
            TrendDirection::Decreasing => "decreasing",
            TrendDirection::Stable => "stable",
        }
    }
}

/// Forecast produced by linear-trend fitting over a recent value sequence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Human-readable label for what is being forecast
    pub forecast_label: String,
    /// Next-period value, clamped to the metric's valid domain
    pub predicted_value: f64,
    /// Direction of the fitted slope
    pub trend_direction: TrendDirection,
    /// Fixed unit-width band around the predicted value
    pub confidence_interval: (f64, f64),
}

// ============================================================================
// Insight output
// ============================================================================

/// Category of a generated insight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightType {
    Observation,
    Question,
    Suggestion,
    Affirmation,
    Alert,
    Prediction,
    Anomaly,
    Warning,
    Celebration,
    Trend,
    Correlation,
    GoalProgress,
    WorkplaceSpecific,
}

/// A single ranked, typed, natural-language observation for one user in one
/// generation cycle.
///
/// `id` is derived deterministically from the rule identifier and the data
/// points that triggered it, so a dismissed insight keeps matching across
/// cycles for as long as the underlying signal holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    /// Stable, content-derived identifier
    pub id: String,
    /// Natural-language message
    pub message: String,
    /// Insight category
    pub insight_type: InsightType,
    /// Urgency on a 0-10 scale
    pub priority: u8,
    /// Statistical confidence in [0,1]
    pub confidence: f64,
    /// Whether this insight flags a statistical anomaly
    #[serde(default)]
    pub is_anomaly: bool,
    /// Attached forecast, present on prediction/trend insights
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction: Option<PredictionResult>,
}
