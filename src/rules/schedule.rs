//! Schedule rules
//!
//! Late-night and weekend session frequency, plus pairwise focus/stress
//! comparisons between time-of-day blocks and between weekdays.

use crate::aggregates::{SliceStats, TimeBlock, WEEKDAY_LABELS};
use crate::rules::{make_insight, notably_different, pair_confidence, rule_ids, RuleContext};
use crate::stats;
use crate::types::{Insight, InsightType};

/// Minimum late-night or weekend sessions before those rules fire
const MIN_SCHEDULE_SESSIONS: usize = 2;

/// Minimum reflected sessions per compared block or weekday
const MIN_GROUP_SESSIONS: usize = 3;

/// Frequent sessions running past the late-night hour
pub fn late_night_sessions(ctx: &RuleContext) -> Vec<Insight> {
    let count = ctx.snapshot.late_night_count;
    if count < MIN_SCHEDULE_SESSIONS {
        return Vec::new();
    }

    let hour = ctx.config.late_night_hour;
    let confidence = stats::confidence(count, 0.0).confidence_score;
    let messages = [
        format!(
            "{count} of your sessions ran past {hour}:00 this period. Is late-night \
             work a choice or a spillover?"
        ),
        format!(
            "You worked late into the night {count} times this period. How does \
             your focus hold up at that hour?"
        ),
    ];

    vec![make_insight(
        rule_ids::LATE_NIGHT_SESSIONS,
        &format!("{count}"),
        &messages,
        InsightType::Question,
        6,
        confidence,
    )]
}

/// Frequent weekend sessions
pub fn weekend_sessions(ctx: &RuleContext) -> Vec<Insight> {
    let count = ctx.snapshot.weekend_count;
    if count < MIN_SCHEDULE_SESSIONS {
        return Vec::new();
    }

    let confidence = stats::confidence(count, 0.0).confidence_score;
    let messages = [
        format!(
            "You logged {count} work sessions over the weekend. Is that by design, \
             or is the week spilling over?"
        ),
        format!(
            "{count} weekend sessions this period. Worth checking whether your \
             weekdays are leaving enough room."
        ),
    ];

    vec![make_insight(
        rule_ids::WEEKEND_SESSIONS,
        &format!("{count}"),
        &messages,
        InsightType::Question,
        5,
        confidence,
    )]
}

/// Focus/stress differences between time-of-day blocks
pub fn time_block_comparison(ctx: &RuleContext) -> Vec<Insight> {
    // Labels carry their preposition so the shared templates read naturally
    let labels: Vec<String> = TimeBlock::ALL
        .iter()
        .map(|block| format!("in {}", block.label()))
        .collect();
    let slices: Vec<(&str, &SliceStats)> = labels
        .iter()
        .map(String::as_str)
        .zip(ctx.snapshot.time_block_slices.iter())
        .collect();

    compare_groups(ctx, rule_ids::TIME_BLOCK_COMPARISON, &slices)
}

/// Focus/stress differences between weekdays
pub fn weekday_comparison(ctx: &RuleContext) -> Vec<Insight> {
    let labels: Vec<String> = WEEKDAY_LABELS
        .iter()
        .map(|day| format!("on {day}"))
        .collect();
    let slices: Vec<(&str, &SliceStats)> = labels
        .iter()
        .map(String::as_str)
        .zip(ctx.snapshot.weekday_slices.iter())
        .collect();

    compare_groups(ctx, rule_ids::WEEKDAY_COMPARISON, &slices)
}

/// Emit the most significant focus gap and the most significant stress gap
/// across a labelled family of slices.
///
/// Only the widest gap per metric is reported; a seven-way weekday split
/// would otherwise flood the list with near-duplicate pairs.
fn compare_groups(
    ctx: &RuleContext,
    rule_id: &str,
    slices: &[(&str, &SliceStats)],
) -> Vec<Insight> {
    let threshold = ctx.config.difference_threshold;
    let mut insights = Vec::new();

    if let Some((high, low)) = widest_gap(slices, threshold, |s| s.focus.mean) {
        let (high_label, high_slice) = high;
        let (low_label, low_slice) = low;
        let high_pct = high_slice.focus.mean.unwrap_or_default() * 100.0;
        let low_pct = low_slice.focus.mean.unwrap_or_default() * 100.0;
        let messages = [
            format!(
                "Your focus runs highest {high_label} ({high_pct:.0}% of the \
                 scale) and lowest {low_label} ({low_pct:.0}%). Could your most \
                 demanding work land where you're sharpest?"
            ),
            format!(
                "There's a clear focus gap between your sessions {high_label} \
                 ({high_pct:.0}%) and {low_label} ({low_pct:.0}%)."
            ),
        ];
        insights.push(make_insight(
            rule_id,
            &format!("focus|{high_label}|{low_label}|{high_pct:.0}|{low_pct:.0}"),
            &messages,
            InsightType::Observation,
            5,
            pair_confidence(&high_slice.focus, &low_slice.focus),
        ));
    }

    if let Some((high, low)) = widest_gap(slices, threshold, |s| s.stress.mean) {
        let (high_label, high_slice) = high;
        let (low_label, low_slice) = low;
        let high_pct = high_slice.stress.mean.unwrap_or_default() * 100.0;
        let low_pct = low_slice.stress.mean.unwrap_or_default() * 100.0;
        let messages = [
            format!(
                "Sessions {high_label} carry noticeably more stress \
                 ({high_pct:.0}% of the scale) than those {low_label} \
                 ({low_pct:.0}%)."
            ),
            format!(
                "Stress peaks {high_label} ({high_pct:.0}%) and eases \
                 {low_label} ({low_pct:.0}%). What's different there?"
            ),
        ];
        insights.push(make_insight(
            rule_id,
            &format!("stress|{high_label}|{low_label}|{high_pct:.0}|{low_pct:.0}"),
            &messages,
            InsightType::Observation,
            5,
            pair_confidence(&high_slice.stress, &low_slice.stress),
        ));
    }

    insights
}

type Labelled<'a> = (&'a str, &'a SliceStats);

/// Widest significant gap between qualifying slices, returned as
/// (higher, lower). Ties keep the first pair in slice order.
fn widest_gap<'a>(
    slices: &[Labelled<'a>],
    threshold: f64,
    metric: impl Fn(&SliceStats) -> Option<f64>,
) -> Option<(Labelled<'a>, Labelled<'a>)> {
    let mut best: Option<(Labelled<'a>, Labelled<'a>, f64)> = None;

    for (i, &(label_a, slice_a)) in slices.iter().enumerate() {
        if slice_a.sessions < MIN_GROUP_SESSIONS {
            continue;
        }
        let Some(value_a) = metric(slice_a) else {
            continue;
        };
        for &(label_b, slice_b) in slices.iter().skip(i + 1) {
            if slice_b.sessions < MIN_GROUP_SESSIONS {
                continue;
            }
            let Some(value_b) = metric(slice_b) else {
                continue;
            };
            if !notably_different(value_a, value_b, threshold) {
                continue;
            }

            let gap = (value_a - value_b).abs();
            if best.as_ref().map_or(true, |&(_, _, best_gap)| gap > best_gap) {
                let (high, low) = if value_a >= value_b {
                    ((label_a, slice_a), (label_b, slice_b))
                } else {
                    ((label_b, slice_b), (label_a, slice_a))
                };
                best = Some((high, low, gap));
            }
        }
    }

    best.map(|(high, low, _)| (high, low))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregates::PeriodSnapshot;
    use crate::config::EngineConfig;
    use crate::thresholds::AdaptiveThresholdStore;
    use crate::types::CheckInRecord;
    use chrono::{Duration, TimeZone, Utc};

    fn check_in_at(day: u32, hour: u32, hours: u32, focus: Option<f64>) -> CheckInRecord {
        let started_at = Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap();
        CheckInRecord {
            started_at,
            ended_at: started_at + Duration::hours(i64::from(hours)),
            session_duration_sec: hours * 3600,
            stress_level: None,
            focus_level: focus,
            workplace_name: None,
            session_note: None,
        }
    }

    fn snapshot(check_ins: &[CheckInRecord], config: &EngineConfig) -> PeriodSnapshot {
        PeriodSnapshot::build(
            check_ins,
            &[],
            Vec::new(),
            Utc.with_ymd_and_hms(2024, 1, 22, 0, 0, 0).unwrap(),
            7,
            config,
        )
    }

    #[test]
    fn test_late_night_rule_gates_on_two_sessions() {
        let config = EngineConfig::default();
        let one = vec![check_in_at(15, 21, 2, None)];
        let snap = snapshot(&one, &config);
        let thresholds = AdaptiveThresholdStore::new();
        let ctx = RuleContext {
            config: &config,
            snapshot: &snap,
            thresholds: &thresholds,
        };
        assert!(late_night_sessions(&ctx).is_empty());

        let two = vec![
            check_in_at(15, 21, 2, None),
            check_in_at(16, 20, 3, None),
        ];
        let snap = snapshot(&two, &config);
        let ctx = RuleContext {
            config: &config,
            snapshot: &snap,
            thresholds: &thresholds,
        };
        let insights = late_night_sessions(&ctx);
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].insight_type, InsightType::Question);
        assert_eq!(insights[0].priority, 6);
    }

    #[test]
    fn test_weekend_rule() {
        let config = EngineConfig::default();
        // Jan 20-21 2024 is a weekend
        let check_ins = vec![
            check_in_at(20, 10, 2, None),
            check_in_at(21, 10, 2, None),
        ];
        let snap = snapshot(&check_ins, &config);
        let thresholds = AdaptiveThresholdStore::new();
        let ctx = RuleContext {
            config: &config,
            snapshot: &snap,
            thresholds: &thresholds,
        };

        let insights = weekend_sessions(&ctx);
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].priority, 5);
        assert!(insights[0].message.contains('2'));
    }

    #[test]
    fn test_time_block_comparison_reports_widest_focus_gap() {
        let config = EngineConfig::default();
        let mut check_ins = Vec::new();
        // Three high-focus morning sessions, three low-focus evening sessions
        for day in 15..18 {
            check_ins.push(check_in_at(day, 9, 1, Some(0.9)));
            check_ins.push(check_in_at(day, 19, 1, Some(0.4)));
        }
        let snap = snapshot(&check_ins, &config);
        let thresholds = AdaptiveThresholdStore::new();
        let ctx = RuleContext {
            config: &config,
            snapshot: &snap,
            thresholds: &thresholds,
        };

        let insights = time_block_comparison(&ctx);
        assert_eq!(insights.len(), 1);
        assert!(insights[0].message.contains("the morning"));
        assert!(insights[0].message.contains("the evening"));
        assert_eq!(insights[0].insight_type, InsightType::Observation);
    }

    #[test]
    fn test_comparison_skips_sparse_groups() {
        let config = EngineConfig::default();
        // Only two sessions per block, below the three-session gate
        let check_ins = vec![
            check_in_at(15, 9, 1, Some(0.9)),
            check_in_at(16, 9, 1, Some(0.9)),
            check_in_at(15, 19, 1, Some(0.3)),
            check_in_at(16, 19, 1, Some(0.3)),
        ];
        let snap = snapshot(&check_ins, &config);
        let thresholds = AdaptiveThresholdStore::new();
        let ctx = RuleContext {
            config: &config,
            snapshot: &snap,
            thresholds: &thresholds,
        };

        assert!(time_block_comparison(&ctx).is_empty());
    }

    #[test]
    fn test_weekday_comparison() {
        let config = EngineConfig::default();
        let mut check_ins = Vec::new();
        // Monday Jan 15: three focused sessions; Wednesday Jan 17: three scattered ones
        for hour in [9, 11, 14] {
            check_ins.push(check_in_at(15, hour, 1, Some(0.85)));
            check_ins.push(check_in_at(17, hour, 1, Some(0.35)));
        }
        let snap = snapshot(&check_ins, &config);
        let thresholds = AdaptiveThresholdStore::new();
        let ctx = RuleContext {
            config: &config,
            snapshot: &snap,
            thresholds: &thresholds,
        };

        let insights = weekday_comparison(&ctx);
        assert_eq!(insights.len(), 1);
        assert!(insights[0].message.contains("Monday"));
        assert!(insights[0].message.contains("Wednesday"));
    }
}
