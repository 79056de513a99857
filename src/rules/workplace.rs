//! Workplace comparison rules
//!
//! Pairwise focus/stress comparison between workplaces, for users who log
//! sessions from more than one location.

use crate::aggregates::SliceStats;
use crate::rules::{make_insight, notably_different, pair_confidence, rule_ids, RuleContext};
use crate::types::{Insight, InsightType};

/// Minimum reflected sessions per compared workplace
const MIN_WORKPLACE_SESSIONS: usize = 3;

/// Focus/stress differences between workplaces
pub fn workplace_comparison(ctx: &RuleContext) -> Vec<Insight> {
    let qualifying: Vec<(&String, &SliceStats)> = ctx
        .snapshot
        .by_workplace
        .iter()
        .filter(|(_, slice)| slice.sessions >= MIN_WORKPLACE_SESSIONS)
        .collect();
    if qualifying.len() < 2 {
        return Vec::new();
    }

    let threshold = ctx.config.difference_threshold;
    let mut insights = Vec::new();

    for (i, &(name_a, slice_a)) in qualifying.iter().enumerate() {
        for &(name_b, slice_b) in qualifying.iter().skip(i + 1) {
            if let (Some(focus_a), Some(focus_b)) = (slice_a.focus.mean, slice_b.focus.mean) {
                if notably_different(focus_a, focus_b, threshold) {
                    let (better, worse, better_pct, worse_pct) = if focus_a > focus_b {
                        (name_a, name_b, focus_a * 100.0, focus_b * 100.0)
                    } else {
                        (name_b, name_a, focus_b * 100.0, focus_a * 100.0)
                    };
                    let messages = [
                        format!(
                            "You focus noticeably better at {better} ({better_pct:.0}% \
                             of the scale) than at {worse} ({worse_pct:.0}%)."
                        ),
                        format!(
                            "{better} seems to suit your deep work: focus averages \
                             {better_pct:.0}% there versus {worse_pct:.0}% at {worse}."
                        ),
                    ];
                    insights.push(make_insight(
                        rule_ids::WORKPLACE_COMPARISON,
                        &format!("focus|{better}|{worse}|{better_pct:.0}|{worse_pct:.0}"),
                        &messages,
                        InsightType::WorkplaceSpecific,
                        6,
                        pair_confidence(&slice_a.focus, &slice_b.focus),
                    ));
                }
            }

            if let (Some(stress_a), Some(stress_b)) = (slice_a.stress.mean, slice_b.stress.mean) {
                if notably_different(stress_a, stress_b, threshold) {
                    let (calmer, tenser, calmer_pct, tenser_pct) = if stress_a < stress_b {
                        (name_a, name_b, stress_a * 100.0, stress_b * 100.0)
                    } else {
                        (name_b, name_a, stress_b * 100.0, stress_a * 100.0)
                    };
                    let messages = [
                        format!(
                            "Sessions at {tenser} run more stressful ({tenser_pct:.0}% \
                             of the scale) than at {calmer} ({calmer_pct:.0}%)."
                        ),
                        format!(
                            "{calmer} is your calmer spot: stress averages \
                             {calmer_pct:.0}% there against {tenser_pct:.0}% at {tenser}."
                        ),
                    ];
                    insights.push(make_insight(
                        rule_ids::WORKPLACE_COMPARISON,
                        &format!("stress|{calmer}|{tenser}|{calmer_pct:.0}|{tenser_pct:.0}"),
                        &messages,
                        InsightType::WorkplaceSpecific,
                        6,
                        pair_confidence(&slice_a.stress, &slice_b.stress),
                    ));
                }
            }
        }
    }

    insights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregates::PeriodSnapshot;
    use crate::config::EngineConfig;
    use crate::thresholds::AdaptiveThresholdStore;
    use crate::types::CheckInRecord;
    use chrono::{Duration, TimeZone, Utc};

    fn check_in(
        day: u32,
        hour: u32,
        workplace: &str,
        stress: f64,
        focus: f64,
    ) -> CheckInRecord {
        let started_at = Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap();
        CheckInRecord {
            started_at,
            ended_at: started_at + Duration::hours(2),
            session_duration_sec: 7200,
            stress_level: Some(stress),
            focus_level: Some(focus),
            workplace_name: Some(workplace.to_string()),
            session_note: None,
        }
    }

    fn build_ctx_snapshot(check_ins: &[CheckInRecord], config: &EngineConfig) -> PeriodSnapshot {
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
    fn test_two_workplaces_with_clear_gaps() {
        let config = EngineConfig::default();
        let mut check_ins = Vec::new();
        for day in 15..18 {
            check_ins.push(check_in(day, 9, "Home Office", 0.2, 0.9));
            check_ins.push(check_in(day, 14, "Downtown Cowork", 0.7, 0.4));
        }
        let snap = build_ctx_snapshot(&check_ins, &config);
        let thresholds = AdaptiveThresholdStore::new();
        let ctx = RuleContext {
            config: &config,
            snapshot: &snap,
            thresholds: &thresholds,
        };

        let insights = workplace_comparison(&ctx);
        // One focus comparison and one stress comparison
        assert_eq!(insights.len(), 2);
        assert!(insights
            .iter()
            .all(|i| i.insight_type == InsightType::WorkplaceSpecific));
        assert!(insights[0].message.contains("Home Office"));
    }

    #[test]
    fn test_single_workplace_emits_nothing() {
        let config = EngineConfig::default();
        let check_ins: Vec<CheckInRecord> = (15..19)
            .map(|day| check_in(day, 9, "Home Office", 0.4, 0.6))
            .collect();
        let snap = build_ctx_snapshot(&check_ins, &config);
        let thresholds = AdaptiveThresholdStore::new();
        let ctx = RuleContext {
            config: &config,
            snapshot: &snap,
            thresholds: &thresholds,
        };

        assert!(workplace_comparison(&ctx).is_empty());
    }

    #[test]
    fn test_sparse_workplace_is_excluded() {
        let config = EngineConfig::default();
        let mut check_ins: Vec<CheckInRecord> = (15..19)
            .map(|day| check_in(day, 9, "Home Office", 0.2, 0.9))
            .collect();
        // Only two sessions at the second workplace, below the gate
        check_ins.push(check_in(19, 9, "Downtown Cowork", 0.7, 0.4));
        check_ins.push(check_in(20, 9, "Downtown Cowork", 0.7, 0.4));

        let snap = build_ctx_snapshot(&check_ins, &config);
        let thresholds = AdaptiveThresholdStore::new();
        let ctx = RuleContext {
            config: &config,
            snapshot: &snap,
            thresholds: &thresholds,
        };

        assert!(workplace_comparison(&ctx).is_empty());
    }
}
