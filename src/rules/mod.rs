//! Rule catalog
//!
//! An ordered list of independently evaluable comparison rules. Every rule
//! reads the same immutable `PeriodSnapshot` and the already-updated
//! threshold store, gates on minimum sample sizes, and emits zero or more
//! candidate insights. Catalog order is part of the engine contract: it
//! breaks priority ties in the final ranking.
//!
//! Insight identity is derived from the rule identifier plus the data points
//! that triggered it (UUIDv5), so an insight dismissed by the user keeps
//! matching on later cycles while the signal holds. Message templates are
//! picked from the same fingerprint, never from an unseeded random source.

pub mod journal;
pub mod schedule;
pub mod sessions;
pub mod workload;
pub mod workplace;

use crate::aggregates::{PeriodSnapshot, RatingStats};
use crate::config::EngineConfig;
use crate::stats;
use crate::thresholds::AdaptiveThresholdStore;
use crate::types::{Insight, InsightType};
use uuid::Uuid;

/// Namespace for content-derived insight ids
const INSIGHT_NAMESPACE: Uuid = Uuid::from_u128(0x6d65_7269_6469_616e_2d69_6e73_6967_6874);

/// Stable rule identifiers, part of every insight id
pub mod rule_ids {
    pub const WORKLOAD_RECOVERY: &str = "workload_recovery";
    pub const BREATHING_TREND: &str = "breathing_trend";
    pub const FOCUS_STRESS_LEVELS: &str = "focus_stress_levels";
    pub const LATE_NIGHT_SESSIONS: &str = "late_night_sessions";
    pub const WEEKEND_SESSIONS: &str = "weekend_sessions";
    pub const SESSION_DURATION_EFFECTS: &str = "session_duration_effects";
    pub const BREATHING_DAY_EFFECTS: &str = "breathing_day_effects";
    pub const REFLECTION_NUDGE: &str = "reflection_nudge";
    pub const WORKPLACE_COMPARISON: &str = "workplace_comparison";
    pub const TIME_BLOCK_COMPARISON: &str = "time_block_comparison";
    pub const WEEKDAY_COMPARISON: &str = "weekday_comparison";
    pub const JOURNAL_SENTIMENT: &str = "journal_sentiment";
    pub const WORK_HOURS_ANOMALY: &str = "work_hours_anomaly";
    pub const STRESS_FORECAST: &str = "stress_forecast";
    pub const WORK_HOURS_FORECAST: &str = "work_hours_forecast";
}

/// Read-only context shared by every rule in one cycle
pub struct RuleContext<'a> {
    pub config: &'a EngineConfig,
    pub snapshot: &'a PeriodSnapshot,
    pub thresholds: &'a AdaptiveThresholdStore,
}

/// A rule consumes the shared context and emits candidate insights
pub type RuleFn = fn(&RuleContext) -> Vec<Insight>;

/// The canonical catalog, in emission order
pub const RULE_CATALOG: &[(&str, RuleFn)] = &[
    (rule_ids::WORKLOAD_RECOVERY, workload::workload_recovery),
    (rule_ids::BREATHING_TREND, workload::breathing_trend),
    (rule_ids::FOCUS_STRESS_LEVELS, workload::focus_stress_levels),
    (rule_ids::LATE_NIGHT_SESSIONS, schedule::late_night_sessions),
    (rule_ids::WEEKEND_SESSIONS, schedule::weekend_sessions),
    (
        rule_ids::SESSION_DURATION_EFFECTS,
        sessions::session_duration_effects,
    ),
    (rule_ids::BREATHING_DAY_EFFECTS, sessions::breathing_day_effects),
    (rule_ids::REFLECTION_NUDGE, workload::reflection_nudge),
    (rule_ids::WORKPLACE_COMPARISON, workplace::workplace_comparison),
    (rule_ids::TIME_BLOCK_COMPARISON, schedule::time_block_comparison),
    (rule_ids::WEEKDAY_COMPARISON, schedule::weekday_comparison),
    (rule_ids::JOURNAL_SENTIMENT, journal::journal_sentiment),
];

/// Evaluate the full catalog in order
pub fn evaluate_catalog(ctx: &RuleContext) -> Vec<Insight> {
    let mut insights = Vec::new();
    for (rule_id, rule) in RULE_CATALOG {
        let emitted = rule(ctx);
        if !emitted.is_empty() {
            log::debug!("rule {rule_id} emitted {} insight(s)", emitted.len());
        }
        insights.extend(emitted);
    }
    insights
}

/// Derive the stable id for a rule firing on specific data points
pub fn insight_id(rule_id: &str, discriminant: &str) -> Uuid {
    Uuid::new_v5(
        &INSIGHT_NAMESPACE,
        format!("{rule_id}|{discriminant}").as_bytes(),
    )
}

/// Build an insight with a fingerprint-derived id and message pick
pub(crate) fn make_insight(
    rule_id: &str,
    discriminant: &str,
    messages: &[String],
    insight_type: InsightType,
    priority: u8,
    confidence: f64,
) -> Insight {
    let id = insight_id(rule_id, discriminant);
    let message = messages[pick_index(&id, messages.len())].clone();
    Insight {
        id: id.to_string(),
        message,
        insight_type,
        priority,
        confidence,
        is_anomaly: false,
        prediction: None,
    }
}

/// Deterministic template selection from the insight fingerprint
fn pick_index(id: &Uuid, len: usize) -> usize {
    debug_assert!(len > 0);
    id.as_bytes()[15] as usize % len
}

/// Two group averages are notably different at or beyond the threshold
pub(crate) fn notably_different(a: f64, b: f64, threshold: f64) -> bool {
    (a - b).abs() >= threshold
}

/// Confidence for an insight comparing two rated groups
pub(crate) fn pair_confidence(a: &RatingStats, b: &RatingStats) -> f64 {
    let variance = f64::max(a.variance, b.variance);
    stats::confidence(a.samples + b.samples, variance).confidence_score
}

/// Confidence for an insight over a single rated group
pub(crate) fn group_confidence(group: &RatingStats) -> f64 {
    stats::confidence(group.samples, group.variance).confidence_score
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insight_id_is_deterministic() {
        let a = insight_id("workload_recovery", "55.0|1");
        let b = insight_id("workload_recovery", "55.0|1");
        assert_eq!(a, b);
    }

    #[test]
    fn test_insight_id_varies_with_data() {
        let a = insight_id("workload_recovery", "55.0|1");
        let b = insight_id("workload_recovery", "60.0|1");
        assert_ne!(a, b);
    }

    #[test]
    fn test_make_insight_message_pick_is_stable() {
        let messages = vec!["first".to_string(), "second".to_string()];
        let one = make_insight("rule", "data", &messages, InsightType::Observation, 5, 0.8);
        let two = make_insight("rule", "data", &messages, InsightType::Observation, 5, 0.8);
        assert_eq!(one.message, two.message);
        assert_eq!(one.id, two.id);
    }

    #[test]
    fn test_notably_different() {
        assert!(notably_different(0.7, 0.5, 0.2));
        assert!(notably_different(0.5, 0.7, 0.2));
        assert!(!notably_different(0.6, 0.5, 0.2));
    }

    #[test]
    fn test_catalog_ids_are_unique() {
        let mut seen = std::collections::BTreeSet::new();
        for (rule_id, _) in RULE_CATALOG {
            assert!(seen.insert(rule_id), "duplicate rule id {rule_id}");
        }
    }
}
