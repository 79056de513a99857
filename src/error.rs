//! Error types for Meridian Insights

use thiserror::Error;

/// Errors that can occur during insight generation
#[derive(Debug, Error)]
pub enum InsightError {
    #[error("Invalid generation window: {0}")]
    InvalidWindow(String),

    #[error("Invalid threshold snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to parse request: {0}")]
    ParseError(String),

    #[error("Sentiment scoring failed: {0}")]
    SentimentError(String),

    #[error("Style rewrite failed: {0}")]
    RewriteError(String),
}
