//! Session-shape rules
//!
//! Correlates session length and breathing-day overlap with focus and
//! stress ratings.

use crate::rules::{make_insight, notably_different, pair_confidence, rule_ids, RuleContext};
use crate::types::{Insight, InsightType};

/// Minimum reflected sessions per compared bucket
const MIN_BUCKET_SESSIONS: usize = 2;

/// Long sessions compared with short ones on focus and stress
pub fn session_duration_effects(ctx: &RuleContext) -> Vec<Insight> {
    let long = &ctx.snapshot.long_sessions;
    let short = &ctx.snapshot.short_sessions;
    if long.sessions < MIN_BUCKET_SESSIONS || short.sessions < MIN_BUCKET_SESSIONS {
        return Vec::new();
    }

    let threshold = ctx.config.difference_threshold;
    let long_hours = ctx.config.long_session_min_hours;
    let mut insights = Vec::new();

    if let (Some(long_focus), Some(short_focus)) = (long.focus.mean, short.focus.mean) {
        if notably_different(long_focus, short_focus, threshold) {
            let (better, worse, better_pct, worse_pct) = if long_focus > short_focus {
                ("longer", "shorter", long_focus * 100.0, short_focus * 100.0)
            } else {
                ("shorter", "longer", short_focus * 100.0, long_focus * 100.0)
            };
            let messages = [
                format!(
                    "Your {better} sessions come with better focus ({better_pct:.0}% \
                     vs {worse_pct:.0}% in {worse} ones)."
                ),
                format!(
                    "Focus looks stronger in your {better} sessions: {better_pct:.0}% \
                     of the scale against {worse_pct:.0}% in {worse} ones."
                ),
            ];
            insights.push(make_insight(
                rule_ids::SESSION_DURATION_EFFECTS,
                &format!("focus|{long_focus:.2}|{short_focus:.2}"),
                &messages,
                InsightType::Correlation,
                6,
                pair_confidence(&long.focus, &short.focus),
            ));
        }
    }

    if let (Some(long_stress), Some(short_stress)) = (long.stress.mean, short.stress.mean) {
        if notably_different(long_stress, short_stress, threshold) && long_stress > short_stress {
            let long_pct = long_stress * 100.0;
            let short_pct = short_stress * 100.0;
            let messages = [
                format!(
                    "Sessions of {long_hours:.0} hours or more run noticeably more \
                     stressful ({long_pct:.0}% vs {short_pct:.0}%). Breaking them up \
                     might help."
                ),
                format!(
                    "Stress climbs in your marathon sessions: {long_pct:.0}% of the \
                     scale against {short_pct:.0}% in short ones."
                ),
            ];
            insights.push(make_insight(
                rule_ids::SESSION_DURATION_EFFECTS,
                &format!("stress|{long_stress:.2}|{short_stress:.2}"),
                &messages,
                InsightType::Correlation,
                6,
                pair_confidence(&long.stress, &short.stress),
            ));
        }
    }

    insights
}

/// Days with a breathing completion compared with days without
pub fn breathing_day_effects(ctx: &RuleContext) -> Vec<Insight> {
    let with = &ctx.snapshot.breathing_day_sessions;
    let without = &ctx.snapshot.non_breathing_day_sessions;
    if with.sessions < MIN_BUCKET_SESSIONS || without.sessions < MIN_BUCKET_SESSIONS {
        return Vec::new();
    }

    let threshold = ctx.config.difference_threshold;
    let mut insights = Vec::new();

    if let (Some(with_focus), Some(without_focus)) = (with.focus.mean, without.focus.mean) {
        if notably_different(with_focus, without_focus, threshold) && with_focus > without_focus {
            let with_pct = with_focus * 100.0;
            let without_pct = without_focus * 100.0;
            let messages = [
                format!(
                    "On days with a breathing session your focus averages \
                     {with_pct:.0}% of the scale, against {without_pct:.0}% on days \
                     without. The practice seems to be paying off."
                ),
                format!(
                    "Breathing days come with sharper focus: {with_pct:.0}% vs \
                     {without_pct:.0}% on other days."
                ),
            ];
            insights.push(make_insight(
                rule_ids::BREATHING_DAY_EFFECTS,
                &format!("focus|{with_focus:.2}|{without_focus:.2}"),
                &messages,
                InsightType::Correlation,
                7,
                pair_confidence(&with.focus, &without.focus),
            ));
        }
    }

    if let (Some(with_stress), Some(without_stress)) = (with.stress.mean, without.stress.mean) {
        if notably_different(with_stress, without_stress, threshold)
            && with_stress < without_stress
        {
            let with_pct = with_stress * 100.0;
            let without_pct = without_stress * 100.0;
            let messages = [
                format!(
                    "Stress runs lower on breathing days: {with_pct:.0}% of the \
                     scale against {without_pct:.0}% on days you skip it."
                ),
                format!(
                    "Days with a breathing session show less stress ({with_pct:.0}% \
                     vs {without_pct:.0}%). Worth protecting that habit."
                ),
            ];
            insights.push(make_insight(
                rule_ids::BREATHING_DAY_EFFECTS,
                &format!("stress|{with_stress:.2}|{without_stress:.2}"),
                &messages,
                InsightType::Correlation,
                7,
                pair_confidence(&with.stress, &without.stress),
            ));
        }
    }

    insights
}
