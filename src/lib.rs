//! Meridian Insights - On-device insight-generation engine for personal
//! work-wellbeing signals
//!
//! The engine turns raw behavioral logs (work-session check-ins,
//! breathing-exercise completions, free-text journal notes) into a ranked
//! list of short natural-language observations through a deterministic
//! pipeline: record normalization → period aggregation → adaptive-threshold
//! update → statistical analysis → rule catalog → ranking.
//!
//! One generation cycle is a pure, synchronous computation over an in-memory
//! snapshot; no network or disk access happens inside it. The adaptive
//! threshold snapshot is the only state that outlives a cycle and it travels
//! through the caller, who must serialize cycles per user. Rules are
//! read-only over the shared aggregate snapshot.
//!
//! ## Modules
//!
//! - **Pipeline**: one-shot `generate_insights` and the stateful
//!   `InsightProcessor`
//! - **Rules**: the canonical comparison-rule catalog
//! - **Stats**: confidence scoring, anomaly detection, trend forecasting
//! - **Thresholds**: bounded exponential-moving-average decision boundaries

pub mod aggregates;
pub mod config;
pub mod error;
pub mod normalizer;
pub mod pipeline;
pub mod ranker;
pub mod rules;
pub mod sentiment;
pub mod stats;
pub mod thresholds;
pub mod types;

pub use config::EngineConfig;
pub use error::InsightError;
pub use pipeline::{generate_insights, GenerateOptions, InsightOutcome, InsightProcessor};
pub use sentiment::{NeutralSentiment, SentimentScorer, StyleRewriter};
pub use thresholds::{AdaptiveThresholdStore, ThresholdSnapshot};
pub use types::{
    BreathingRecord, CheckInRecord, ConfidenceMetrics, Insight, InsightType, JournalRecord,
    PredictionResult, RawBreathingLog, RawCheckIn, RawJournalEntry, TrendDirection,
};

/// Engine version embedded in CLI output
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for CLI output
pub const PRODUCER_NAME: &str = "meridian-insights";
