//! Injected language collaborators
//!
//! The engine consumes an external sentiment scorer for journal free text and
//! declares the tone-rewrite capability applied by callers after generation.
//! Neither is implemented here; the engine only defines the seams and the
//! neutral fallback used when no service is wired up.

use crate::config::EngineConfig;
use crate::error::InsightError;

/// External NLP service scoring free text on [-1, 1]
pub trait SentimentScorer {
    fn score(&self, text: &str) -> Result<f64, InsightError>;
}

/// Fallback scorer treating every note as neutral
#[derive(Debug, Clone, Copy, Default)]
pub struct NeutralSentiment;

impl SentimentScorer for NeutralSentiment {
    fn score(&self, _text: &str) -> Result<f64, InsightError> {
        Ok(0.0)
    }
}

/// External tone-adjustment service.
///
/// Applied by callers to the canonical message *after* generation; rule logic
/// never rewrites its own output.
pub trait StyleRewriter {
    fn rewrite(&self, message: &str, hint: &str) -> Result<String, InsightError>;
}

/// Sentiment classification of a single note
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentimentClass {
    Positive,
    Negative,
    Neutral,
}

/// Classify a score against the configured cutoffs
pub fn classify_sentiment(score: f64, config: &EngineConfig) -> SentimentClass {
    if score >= config.positive_sentiment_cutoff {
        SentimentClass::Positive
    } else if score <= config.negative_sentiment_cutoff {
        SentimentClass::Negative
    } else {
        SentimentClass::Neutral
    }
}
