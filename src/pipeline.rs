//! Insight pipeline orchestration
//!
//! The public API for insight generation. One cycle is a pure, synchronous
//! computation over an in-memory snapshot: normalize records, build the
//! period aggregates, feed the adaptive thresholds exactly once per metric,
//! derive statistical insights, evaluate the rule catalog, and rank the
//! merged candidates. Callers serialize cycles per user; the threshold
//! snapshot is the only state that crosses cycles and it travels through the
//! caller.

use crate::aggregates::{PeriodSnapshot, ScoredNote};
use crate::config::{EngineConfig, DEFAULT_WINDOW_DAYS};
use crate::error::InsightError;
use crate::normalizer::{journal_in_window, RecordNormalizer};
use crate::ranker;
use crate::rules::{self, rule_ids, RuleContext};
use crate::sentiment::SentimentScorer;
use crate::stats;
use crate::thresholds::{names, AdaptiveThresholdStore, ThresholdSnapshot};
use crate::types::{
    Insight, InsightType, RawBreathingLog, RawCheckIn, RawJournalEntry, TrendDirection,
};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;

/// Options for one generation cycle
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// End of the current window (exclusive)
    pub reference_date: DateTime<Utc>,
    /// Window length in days
    pub window_days: u32,
    /// Ids of insights the user has dismissed on earlier cycles
    pub dismissed_insight_ids: HashSet<String>,
    /// Optional cap on the returned list
    pub max_count: Option<usize>,
}

impl GenerateOptions {
    /// Default options for the window ending at `reference_date`
    pub fn new(reference_date: DateTime<Utc>) -> Self {
        Self {
            reference_date,
            window_days: DEFAULT_WINDOW_DAYS,
            dismissed_insight_ids: HashSet::new(),
            max_count: None,
        }
    }
}

/// Result of one generation cycle
#[derive(Debug, Clone, serde::Serialize)]
pub struct InsightOutcome {
    /// Ranked insights, priority descending
    pub insights: Vec<Insight>,
    /// Updated threshold snapshot for the caller to persist
    pub thresholds: ThresholdSnapshot,
}

/// Run one generation cycle with default configuration (stateless, one-shot).
///
/// A missing `threshold_snapshot` is a cold start: thresholds initialize to
/// their baselines. The updated snapshot comes back in the outcome for the
/// caller to persist.
pub fn generate_insights(
    check_ins: &[RawCheckIn],
    breathing_logs: &[RawBreathingLog],
    journal_entries: &[RawJournalEntry],
    options: &GenerateOptions,
    threshold_snapshot: Option<ThresholdSnapshot>,
    scorer: &dyn SentimentScorer,
) -> Result<InsightOutcome, InsightError> {
    let config = EngineConfig::default();
    let mut store = threshold_snapshot
        .map(AdaptiveThresholdStore::from_snapshot)
        .unwrap_or_default();

    let insights = run_cycle(
        &config,
        &mut store,
        check_ins,
        breathing_logs,
        journal_entries,
        options,
        scorer,
    )?;

    Ok(InsightOutcome {
        insights,
        thresholds: store.snapshot(),
    })
}

/// Stateful processor keeping thresholds across cycles.
///
/// Use this when the caller drives repeated cycles for one user and wants to
/// manage snapshot persistence once instead of per call.
pub struct InsightProcessor {
    config: EngineConfig,
    thresholds: AdaptiveThresholdStore,
}

impl Default for InsightProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl InsightProcessor {
    /// Create a processor with default configuration and cold thresholds
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            thresholds: AdaptiveThresholdStore::new(),
        }
    }

    /// Create a processor with custom configuration
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            thresholds: AdaptiveThresholdStore::new(),
        }
    }

    /// Run one generation cycle, updating the internal thresholds
    pub fn process(
        &mut self,
        check_ins: &[RawCheckIn],
        breathing_logs: &[RawBreathingLog],
        journal_entries: &[RawJournalEntry],
        options: &GenerateOptions,
        scorer: &dyn SentimentScorer,
    ) -> Result<Vec<Insight>, InsightError> {
        run_cycle(
            &self.config,
            &mut self.thresholds,
            check_ins,
            breathing_logs,
            journal_entries,
            options,
            scorer,
        )
    }

    /// Current value of a named threshold
    pub fn threshold(&self, name: &str) -> f64 {
        self.thresholds.get(name)
    }

    /// Serialize threshold state to JSON for persistence
    pub fn save_thresholds(&self) -> Result<String, InsightError> {
        self.thresholds.to_json().map_err(InsightError::from)
    }

    /// Restore threshold state from snapshot JSON
    pub fn load_thresholds(&mut self, json: &str) -> Result<(), InsightError> {
        self.thresholds = AdaptiveThresholdStore::from_json(json)
            .map_err(|e| InsightError::InvalidSnapshot(e.to_string()))?;
        Ok(())
    }

    /// Reset thresholds to their cold-start baselines
    pub fn clear_thresholds(&mut self) {
        self.thresholds = AdaptiveThresholdStore::new();
    }
}

fn run_cycle(
    config: &EngineConfig,
    store: &mut AdaptiveThresholdStore,
    check_ins: &[RawCheckIn],
    breathing_logs: &[RawBreathingLog],
    journal_entries: &[RawJournalEntry],
    options: &GenerateOptions,
    scorer: &dyn SentimentScorer,
) -> Result<Vec<Insight>, InsightError> {
    if options.window_days == 0 {
        return Err(InsightError::InvalidWindow(
            "window_days must be at least 1".to_string(),
        ));
    }

    // Stage 1: normalize storage-layer records
    let check_in_records = RecordNormalizer::normalize_check_ins(check_ins);
    let breathing_records = RecordNormalizer::normalize_breathing_logs(breathing_logs);
    let journal_records = RecordNormalizer::normalize_journal_entries(journal_entries);
    log::debug!(
        "normalized {} check-ins, {} breathing logs, {} journal entries",
        check_in_records.len(),
        breathing_records.len(),
        journal_records.len()
    );

    // Stage 2: score journal sentiment through the injected collaborator.
    // A scorer failure affects only that note, never the cycle.
    let window_start = options.reference_date - Duration::days(i64::from(options.window_days));
    let scored_notes: Vec<ScoredNote> =
        journal_in_window(&journal_records, window_start, options.reference_date)
            .into_iter()
            .map(|record| {
                let sentiment = scorer.score(&record.text).unwrap_or_else(|e| {
                    log::warn!("sentiment scoring failed for note at {}: {e}", record.timestamp);
                    0.0
                });
                ScoredNote {
                    timestamp: record.timestamp,
                    title: record.title,
                    sentiment,
                }
            })
            .collect();

    // Stage 3: build the immutable aggregate snapshot
    let snapshot = PeriodSnapshot::build(
        &check_in_records,
        &breathing_records,
        scored_notes,
        options.reference_date,
        options.window_days,
        config,
    );

    // Stage 4: feed the adaptive thresholds, once per metric, before any
    // rule reads them. Metrics without data this period leave their
    // thresholds untouched.
    if snapshot.session_count > 0 {
        store.update(names::MAX_WEEKLY_HOURS, snapshot.total_work_hours);
    }
    if let Some(avg_stress) = snapshot.stress.mean {
        store.update(names::HIGH_STRESS, avg_stress);
    }
    if let Some(avg_focus) = snapshot.focus.mean {
        store.update(names::LOW_FOCUS, avg_focus);
    }
    if let Some(avg_hours) = snapshot.avg_session_hours {
        store.update(names::SESSION_DURATION, avg_hours);
    }

    // Stage 5: statistical insights, then the rule catalog
    let mut candidates = statistical_insights(&snapshot, config);
    let ctx = RuleContext {
        config,
        snapshot: &snapshot,
        thresholds: store,
    };
    candidates.extend(rules::evaluate_catalog(&ctx));
    log::debug!("{} candidate insight(s) before ranking", candidates.len());

    // Stage 6: rank
    Ok(ranker::rank(
        candidates,
        &options.dismissed_insight_ids,
        options.max_count,
    ))
}

/// Convert anomaly and forecast analysis into insights
fn statistical_insights(snapshot: &PeriodSnapshot, config: &EngineConfig) -> Vec<Insight> {
    let mut insights = Vec::new();

    insights.extend(work_hours_anomaly(snapshot, config));
    insights.extend(stress_forecast(snapshot));
    insights.extend(work_hours_forecast(snapshot));

    insights
}

/// A single day of work hours far outside the rest of the window.
///
/// Only unusually heavy days are surfaced; a zero-hour weekend is an
/// expected gap, not an anomaly worth an insight.
fn work_hours_anomaly(snapshot: &PeriodSnapshot, config: &EngineConfig) -> Vec<Insight> {
    let series = &snapshot.daily_work_hours;
    let flags = stats::detect_anomalies(series, config.z_threshold);
    if flags.is_empty() {
        return Vec::new();
    }

    let series_mean = stats::mean(series);
    let mut heaviest: Option<(usize, f64)> = None;
    for (i, (&hours, &flagged)) in series.iter().zip(flags.iter()).enumerate() {
        if !flagged || hours <= series_mean {
            continue;
        }
        if heaviest.map_or(true, |(_, best)| hours > best) {
            heaviest = Some((i, hours));
        }
    }
    let Some((index, hours)) = heaviest else {
        return Vec::new();
    };

    let date = snapshot.daily_dates[index];
    let day_name = date.format("%A").to_string();
    let confidence = stats::confidence(series.len(), stats::population_variance(series))
        .confidence_score;

    let messages = [
        format!(
            "Your {hours:.1}-hour day on {day_name} stood out sharply from the rest \
             of the week."
        ),
        format!(
            "{day_name} was an outlier: {hours:.1} hours of work in a single day. \
             Anything unusual going on?"
        ),
    ];
    let mut insight = rules::make_insight(
        rule_ids::WORK_HOURS_ANOMALY,
        &format!("{date}|{hours:.1}"),
        &messages,
        InsightType::Anomaly,
        7,
        confidence,
    );
    insight.is_anomaly = true;
    vec![insight]
}

/// Forecast over the daily mean-stress series
fn stress_forecast(snapshot: &PeriodSnapshot) -> Vec<Insight> {
    let series = &snapshot.daily_mean_stress;
    let Some(prediction) = stats::predict_trend(series, "stress", (0.0, 1.0)) else {
        return Vec::new();
    };
    if prediction.trend_direction == TrendDirection::Stable {
        return Vec::new();
    }

    let predicted_pct = prediction.predicted_value * 100.0;
    let confidence =
        stats::confidence(series.len(), stats::population_variance(series)).confidence_score;
    let messages = match prediction.trend_direction {
        TrendDirection::Increasing => [
            format!(
                "Your stress has been climbing through the period and projects to \
                 around {predicted_pct:.0}% of the scale next week. Worth planning \
                 some recovery time."
            ),
            format!(
                "Stress is trending upward; if the pattern holds it lands near \
                 {predicted_pct:.0}% of the scale next week."
            ),
        ],
        _ => [
            format!(
                "Your stress has been easing day by day, projecting to around \
                 {predicted_pct:.0}% of the scale next week. Keep doing what works."
            ),
            format!(
                "Stress is trending down; the projection puts it near \
                 {predicted_pct:.0}% of the scale next week."
            ),
        ],
    };

    let mut insight = rules::make_insight(
        rule_ids::STRESS_FORECAST,
        &format!(
            "{}|{:.2}",
            prediction.trend_direction.label(),
            prediction.predicted_value
        ),
        &messages,
        InsightType::Prediction,
        6,
        confidence,
    );
    insight.prediction = Some(prediction);
    vec![insight]
}

/// Forecast over the daily work-hours series
fn work_hours_forecast(snapshot: &PeriodSnapshot) -> Vec<Insight> {
    let series = &snapshot.daily_work_hours;
    let Some(prediction) = stats::predict_trend(series, "daily work hours", (0.0, 24.0)) else {
        return Vec::new();
    };
    if prediction.trend_direction == TrendDirection::Stable {
        return Vec::new();
    }

    let predicted = prediction.predicted_value;
    let confidence =
        stats::confidence(series.len(), stats::population_variance(series)).confidence_score;
    let direction_word = match prediction.trend_direction {
        TrendDirection::Increasing => "up",
        _ => "down",
    };
    let messages = [
        format!(
            "Your daily work hours are trending {direction_word}, heading toward \
             {predicted:.1} hours a day."
        ),
        format!(
            "Day-to-day workload is moving {direction_word} across the period \
             (projected {predicted:.1} hours next)."
        ),
    ];

    let mut insight = rules::make_insight(
        rule_ids::WORK_HOURS_FORECAST,
        &format!(
            "{}|{:.1}",
            prediction.trend_direction.label(),
            prediction.predicted_value
        ),
        &messages,
        InsightType::Trend,
        5,
        confidence,
    );
    insight.prediction = Some(prediction);
    vec![insight]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentiment::NeutralSentiment;
    use chrono::TimeZone;

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 22, 0, 0, 0).unwrap()
    }

    fn raw_check_in(day: u32, start_hour: u32, hours: u32) -> RawCheckIn {
        let started_at = Utc.with_ymd_and_hms(2024, 1, day, start_hour, 0, 0).unwrap();
        RawCheckIn {
            started_at,
            ended_at: Some(started_at + Duration::hours(i64::from(hours))),
            stress_rating: None,
            focus_rating: None,
            workplace_name: None,
            session_note: None,
        }
    }

    fn raw_breathing(day: u32) -> RawBreathingLog {
        RawBreathingLog {
            completed_at: Some(Utc.with_ymd_and_hms(2024, 1, day, 8, 0, 0).unwrap()),
            duration_sec: 300,
            exercise_type: Some("box".to_string()),
        }
    }

    /// 55 hours across the week against a 50-hour baseline with a single
    /// breathing session produces the top-priority recovery suggestion.
    #[test]
    fn test_high_workload_low_recovery_end_to_end() {
        let check_ins: Vec<RawCheckIn> =
            (15..20).map(|day| raw_check_in(day, 9, 11)).collect();
        let breathing = vec![raw_breathing(16)];

        let outcome = generate_insights(
            &check_ins,
            &breathing,
            &[],
            &GenerateOptions::new(reference()),
            None,
            &NeutralSentiment,
        )
        .unwrap();

        let top = &outcome.insights[0];
        assert_eq!(top.insight_type, InsightType::Suggestion);
        assert_eq!(top.priority, 10);
        assert!(top.message.contains("55"));
        assert!(top.message.contains('1'));

        // The threshold drifted toward the heavy week: 0.9 * 50 + 0.1 * 55
        let updated = &outcome.thresholds[names::MAX_WEEKLY_HOURS];
        assert!((updated.current_value - 50.5).abs() < 0.001);
    }

    #[test]
    fn test_empty_inputs_produce_empty_list() {
        let outcome = generate_insights(
            &[],
            &[],
            &[],
            &GenerateOptions::new(reference()),
            None,
            &NeutralSentiment,
        )
        .unwrap();

        assert!(outcome.insights.is_empty());
        // Thresholds stay at their baselines with nothing to feed them
        assert_eq!(outcome.thresholds[names::MAX_WEEKLY_HOURS].current_value, 50.0);
    }

    #[test]
    fn test_generation_is_deterministic() {
        let check_ins: Vec<RawCheckIn> =
            (15..20).map(|day| raw_check_in(day, 9, 11)).collect();
        let breathing = vec![raw_breathing(16)];
        let options = GenerateOptions::new(reference());

        let first = generate_insights(
            &check_ins,
            &breathing,
            &[],
            &options,
            None,
            &NeutralSentiment,
        )
        .unwrap();
        let second = generate_insights(
            &check_ins,
            &breathing,
            &[],
            &options,
            None,
            &NeutralSentiment,
        )
        .unwrap();

        assert_eq!(first.insights.len(), second.insights.len());
        for (a, b) in first.insights.iter().zip(second.insights.iter()) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.message, b.message);
            assert_eq!(a.priority, b.priority);
        }
    }

    #[test]
    fn test_priorities_are_non_increasing() {
        let mut check_ins: Vec<RawCheckIn> =
            (15..20).map(|day| raw_check_in(day, 9, 11)).collect();
        // Late-night and weekend sessions to trigger more rules
        check_ins.push(raw_check_in(20, 20, 3));
        check_ins.push(raw_check_in(21, 20, 3));
        let breathing = vec![raw_breathing(16)];

        let outcome = generate_insights(
            &check_ins,
            &breathing,
            &[],
            &GenerateOptions::new(reference()),
            None,
            &NeutralSentiment,
        )
        .unwrap();

        assert!(outcome.insights.len() > 1);
        for pair in outcome.insights.windows(2) {
            assert!(pair[0].priority >= pair[1].priority);
        }
    }

    #[test]
    fn test_dismissed_insight_stays_gone() {
        let check_ins: Vec<RawCheckIn> =
            (15..20).map(|day| raw_check_in(day, 9, 11)).collect();
        let breathing = vec![raw_breathing(16)];

        let first = generate_insights(
            &check_ins,
            &breathing,
            &[],
            &GenerateOptions::new(reference()),
            None,
            &NeutralSentiment,
        )
        .unwrap();
        let dismissed_id = first.insights[0].id.clone();

        let mut options = GenerateOptions::new(reference());
        options.dismissed_insight_ids.insert(dismissed_id.clone());
        let second = generate_insights(
            &check_ins,
            &breathing,
            &[],
            &options,
            None,
            &NeutralSentiment,
        )
        .unwrap();

        assert!(second.insights.iter().all(|i| i.id != dismissed_id));
    }

    #[test]
    fn test_max_count_is_honored() {
        let mut check_ins: Vec<RawCheckIn> =
            (15..20).map(|day| raw_check_in(day, 9, 11)).collect();
        check_ins.push(raw_check_in(20, 20, 3));
        check_ins.push(raw_check_in(21, 20, 3));

        let mut options = GenerateOptions::new(reference());
        options.max_count = Some(1);
        let outcome = generate_insights(
            &check_ins,
            &[raw_breathing(16)],
            &[],
            &options,
            None,
            &NeutralSentiment,
        )
        .unwrap();

        assert_eq!(outcome.insights.len(), 1);
        assert_eq!(outcome.insights[0].priority, 10);
    }

    #[test]
    fn test_zero_window_is_rejected() {
        let mut options = GenerateOptions::new(reference());
        options.window_days = 0;

        let result = generate_insights(&[], &[], &[], &options, None, &NeutralSentiment);
        assert!(matches!(result, Err(InsightError::InvalidWindow(_))));
    }

    #[test]
    fn test_failing_sentiment_scorer_does_not_abort() {
        struct FailingScorer;
        impl SentimentScorer for FailingScorer {
            fn score(&self, _text: &str) -> Result<f64, InsightError> {
                Err(InsightError::SentimentError("service offline".to_string()))
            }
        }

        let journal = vec![
            RawJournalEntry {
                timestamp: Some(Utc.with_ymd_and_hms(2024, 1, 16, 20, 0, 0).unwrap()),
                title: "one".to_string(),
                text: "a great day".to_string(),
                stress_rating: None,
                focus_rating: None,
            },
            RawJournalEntry {
                timestamp: Some(Utc.with_ymd_and_hms(2024, 1, 17, 20, 0, 0).unwrap()),
                title: "two".to_string(),
                text: "another great day".to_string(),
                stress_rating: None,
                focus_rating: None,
            },
        ];

        let outcome = generate_insights(
            &[],
            &[],
            &journal,
            &GenerateOptions::new(reference()),
            None,
            &FailingScorer,
        )
        .unwrap();

        // Failed notes score neutral, so the sentiment rule stays silent
        assert!(outcome.insights.is_empty());
    }

    #[test]
    fn test_keyword_scorer_drives_sentiment_rule() {
        struct KeywordScorer;
        impl SentimentScorer for KeywordScorer {
            fn score(&self, text: &str) -> Result<f64, InsightError> {
                if text.contains("great") {
                    Ok(0.6)
                } else if text.contains("awful") {
                    Ok(-0.6)
                } else {
                    Ok(0.0)
                }
            }
        }

        let journal: Vec<RawJournalEntry> = (15..18)
            .map(|day| RawJournalEntry {
                timestamp: Some(Utc.with_ymd_and_hms(2024, 1, day, 20, 0, 0).unwrap()),
                title: "entry".to_string(),
                text: "a great day of work".to_string(),
                stress_rating: None,
                focus_rating: None,
            })
            .collect();

        let outcome = generate_insights(
            &[],
            &[],
            &journal,
            &GenerateOptions::new(reference()),
            None,
            &KeywordScorer,
        )
        .unwrap();

        assert_eq!(outcome.insights.len(), 1);
        assert_eq!(outcome.insights[0].insight_type, InsightType::Affirmation);
    }

    #[test]
    fn test_processor_keeps_thresholds_across_cycles() {
        let check_ins: Vec<RawCheckIn> =
            (15..20).map(|day| raw_check_in(day, 9, 11)).collect();
        let options = GenerateOptions::new(reference());

        let mut processor = InsightProcessor::new();
        processor
            .process(&check_ins, &[], &[], &options, &NeutralSentiment)
            .unwrap();
        assert!((processor.threshold(names::MAX_WEEKLY_HOURS) - 50.5).abs() < 0.001);

        processor
            .process(&check_ins, &[], &[], &options, &NeutralSentiment)
            .unwrap();
        // Second cycle drifts further: 0.9 * 50.5 + 0.1 * 55
        assert!((processor.threshold(names::MAX_WEEKLY_HOURS) - 50.95).abs() < 0.001);
    }

    #[test]
    fn test_processor_threshold_round_trip() {
        let check_ins: Vec<RawCheckIn> =
            (15..20).map(|day| raw_check_in(day, 9, 11)).collect();
        let mut processor = InsightProcessor::new();
        processor
            .process(
                &check_ins,
                &[],
                &[],
                &GenerateOptions::new(reference()),
                &NeutralSentiment,
            )
            .unwrap();

        let saved = processor.save_thresholds().unwrap();

        let mut restored = InsightProcessor::new();
        restored.load_thresholds(&saved).unwrap();
        assert!(
            (restored.threshold(names::MAX_WEEKLY_HOURS)
                - processor.threshold(names::MAX_WEEKLY_HOURS))
            .abs()
                < 1e-9
        );

        assert!(restored.load_thresholds("not json").is_err());
    }

    #[test]
    fn test_work_hours_anomaly_surfaces_heavy_day() {
        // Six steady days around two hours, one twelve-hour spike
        let mut check_ins: Vec<RawCheckIn> = Vec::new();
        for day in [15u32, 16, 17, 19, 20, 21] {
            check_ins.push(raw_check_in(day, 9, 2));
        }
        check_ins.push(raw_check_in(18, 8, 12));

        let outcome = generate_insights(
            &check_ins,
            &[],
            &[],
            &GenerateOptions::new(reference()),
            None,
            &NeutralSentiment,
        )
        .unwrap();

        let anomaly = outcome
            .insights
            .iter()
            .find(|i| i.insight_type == InsightType::Anomaly)
            .expect("anomaly insight");
        assert!(anomaly.is_anomaly);
        assert_eq!(anomaly.priority, 7);
        // Jan 18 2024 is a Thursday
        assert!(anomaly.message.contains("Thursday"));
        assert!(anomaly.message.contains("12.0"));
    }

    #[test]
    fn test_stress_forecast_attaches_prediction() {
        // Stress climbing steadily through the week
        let mut check_ins = Vec::new();
        for (i, day) in (15..20).enumerate() {
            let started_at = Utc.with_ymd_and_hms(2024, 1, day, 9, 0, 0).unwrap();
            check_ins.push(RawCheckIn {
                started_at,
                ended_at: Some(started_at + Duration::hours(2)),
                stress_rating: Some(1.0 + i as f64),
                focus_rating: None,
                workplace_name: None,
                session_note: None,
            });
        }

        let outcome = generate_insights(
            &check_ins,
            &[],
            &[],
            &GenerateOptions::new(reference()),
            None,
            &NeutralSentiment,
        )
        .unwrap();

        let forecast = outcome
            .insights
            .iter()
            .find(|i| i.insight_type == InsightType::Prediction)
            .expect("prediction insight");
        let prediction = forecast.prediction.as_ref().unwrap();
        assert_eq!(prediction.trend_direction, TrendDirection::Increasing);
        assert!(prediction.predicted_value <= 1.0);
    }
}
