//! Journal sentiment rules
//!
//! Classifies externally scored note sentiment and reacts to a period with a
//! clear positive or negative lean. Scoring itself happens upstream through
//! the injected collaborator; these rules only read the results.

use crate::rules::{make_insight, rule_ids, RuleContext};
use crate::sentiment::{classify_sentiment, SentimentClass};
use crate::stats;
use crate::types::{Insight, InsightType};

/// Minimum notes of one polarity before the rule fires
const MIN_POLARITY_NOTES: usize = 2;

/// A period of positive-leaning or negative-leaning journal notes
pub fn journal_sentiment(ctx: &RuleContext) -> Vec<Insight> {
    let notes = &ctx.snapshot.scored_notes;
    if notes.is_empty() {
        return Vec::new();
    }

    let mut positive = 0usize;
    let mut negative = 0usize;
    for note in notes {
        match classify_sentiment(note.sentiment, ctx.config) {
            SentimentClass::Positive => positive += 1,
            SentimentClass::Negative => negative += 1,
            SentimentClass::Neutral => {}
        }
    }

    let scores: Vec<f64> = notes.iter().map(|n| n.sentiment).collect();
    let confidence =
        stats::confidence(notes.len(), stats::population_variance(&scores)).confidence_score;

    if positive >= MIN_POLARITY_NOTES && positive > negative {
        let messages = [
            format!(
                "Your journal has a bright tone lately, with {positive} upbeat notes \
                 this period. Hold on to whatever is fueling that."
            ),
            format!(
                "{positive} of your recent notes read clearly positive. Sounds like \
                 a good stretch."
            ),
        ];
        return vec![make_insight(
            rule_ids::JOURNAL_SENTIMENT,
            &format!("positive|{positive}|{negative}"),
            &messages,
            InsightType::Affirmation,
            4,
            confidence,
        )];
    }

    if negative >= MIN_POLARITY_NOTES && negative > positive {
        let messages = [
            format!(
                "{negative} of your recent notes carry a heavy tone. Is there one \
                 thing you could take off your plate this week?"
            ),
            format!(
                "Your journal has leaned difficult lately ({negative} tough notes). \
                 What would make the next few days lighter?"
            ),
        ];
        return vec![make_insight(
            rule_ids::JOURNAL_SENTIMENT,
            &format!("negative|{positive}|{negative}"),
            &messages,
            InsightType::Question,
            6,
            confidence,
        )];
    }

    Vec::new()
}
