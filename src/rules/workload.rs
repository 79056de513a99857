//! Workload and recovery rules
//!
//! Compares current-period work hours against the adaptive weekly ceiling
//! and breathing-exercise uptake, tracks breathing usage across periods,
//! checks average focus/stress against the adaptive bands, and nudges users
//! who log sessions without reflecting on them.

use crate::rules::{
    group_confidence, make_insight, rule_ids, RuleContext,
};
use crate::stats;
use crate::thresholds::names;
use crate::types::{Insight, InsightType};

/// Minimum sessions before the balance affirmation can fire
const MIN_SESSIONS_FOR_AFFIRMATION: usize = 2;

/// Minimum reflected sessions before level rules engage
const MIN_REFLECTED_SESSIONS: usize = 3;

/// Minimum completed sessions before the reflection nudge fires
const MIN_SESSIONS_FOR_NUDGE: usize = 3;

/// Work hours above the adaptive ceiling without enough recovery, hours far
/// above the ceiling, or a healthy balance worth affirming.
pub fn workload_recovery(ctx: &RuleContext) -> Vec<Insight> {
    let s = ctx.snapshot;
    if s.session_count == 0 {
        return Vec::new();
    }

    let hours = s.total_work_hours;
    let ceiling = ctx.thresholds.get(names::MAX_WEEKLY_HOURS);
    let breathing = s.breathing_count;
    let min_breathing = ctx.config.min_breathing_sessions_for_high_workload as usize;
    let confidence = stats::confidence(
        s.session_count,
        stats::population_variance(&s.daily_work_hours),
    )
    .confidence_score;

    let mut insights = Vec::new();

    if hours > ceiling && breathing < min_breathing {
        let plural = if breathing == 1 { "" } else { "s" };
        let messages = [
            format!(
                "You logged {hours:.0} hours of focused work this period but only \
                 {breathing} breathing session{plural}. A few short breathing breaks \
                 could help you recover."
            ),
            format!(
                "That's {hours:.0} hours on the clock with just {breathing} breathing \
                 session{plural} to balance it. Consider scheduling a recovery pause \
                 before the next long stretch."
            ),
        ];
        insights.push(make_insight(
            rule_ids::WORKLOAD_RECOVERY,
            &format!("high-load|{hours:.1}|{breathing}"),
            &messages,
            InsightType::Suggestion,
            10,
            confidence,
        ));
    } else if hours > ceiling * (1.0 + ctx.config.relative_margin) {
        let messages = [
            format!(
                "Your {hours:.0} work hours this period are well above your usual \
                 ceiling of {ceiling:.0}. Watch for signs of fatigue."
            ),
            format!(
                "{hours:.0} hours is a big jump past your typical {ceiling:.0}-hour \
                 ceiling. It might be worth planning a lighter stretch."
            ),
        ];
        insights.push(make_insight(
            rule_ids::WORKLOAD_RECOVERY,
            &format!("over-ceiling|{hours:.1}"),
            &messages,
            InsightType::Warning,
            8,
            confidence,
        ));
    } else if hours < ceiling
        && breathing >= min_breathing
        && s.session_count >= MIN_SESSIONS_FOR_AFFIRMATION
    {
        let messages = [
            format!(
                "Nice balance this period: {hours:.0} work hours alongside \
                 {breathing} breathing sessions."
            ),
            format!(
                "You kept your workload at {hours:.0} hours and made time for \
                 {breathing} breathing sessions. That balance tends to pay off."
            ),
        ];
        insights.push(make_insight(
            rule_ids::WORKLOAD_RECOVERY,
            &format!("balanced|{hours:.1}|{breathing}"),
            &messages,
            InsightType::Affirmation,
            5,
            confidence,
        ));
    }

    insights
}

/// Breathing usage compared between the current and previous period
pub fn breathing_trend(ctx: &RuleContext) -> Vec<Insight> {
    let current = ctx.snapshot.breathing_count;
    let previous = ctx.snapshot.previous_breathing_count;
    let margin = ctx.config.relative_margin;
    let confidence = stats::confidence(current + previous, 0.0).confidence_score;

    if previous >= 2 && current as f64 >= previous as f64 * (1.0 + margin) {
        let messages = [
            format!(
                "You completed {current} breathing sessions this period, up from \
                 {previous} last period. Keep it going!"
            ),
            format!(
                "Breathing practice is trending up: {current} sessions versus \
                 {previous} the period before."
            ),
        ];
        return vec![make_insight(
            rule_ids::BREATHING_TREND,
            &format!("up|{current}|{previous}"),
            &messages,
            InsightType::Celebration,
            5,
            confidence,
        )];
    }

    if previous >= 3 && current as f64 <= previous as f64 * (1.0 - margin) {
        let messages = [
            format!(
                "You completed {current} breathing sessions this period, down from \
                 {previous}. Has something been getting in the way?"
            ),
            format!(
                "Breathing practice dipped from {previous} sessions to {current}. \
                 Would a regular reminder time help?"
            ),
        ];
        return vec![make_insight(
            rule_ids::BREATHING_TREND,
            &format!("down|{current}|{previous}"),
            &messages,
            InsightType::Question,
            4,
            confidence,
        )];
    }

    Vec::new()
}

/// Average focus and stress against the adaptive bands
pub fn focus_stress_levels(ctx: &RuleContext) -> Vec<Insight> {
    let s = ctx.snapshot;
    if s.reflected_count < MIN_REFLECTED_SESSIONS {
        return Vec::new();
    }

    let high_stress = ctx.thresholds.get(names::HIGH_STRESS);
    let low_focus = ctx.thresholds.get(names::LOW_FOCUS);
    let gap = ctx.config.difference_threshold;
    let mut insights = Vec::new();

    if let Some(avg_stress) = s.stress.mean {
        if avg_stress >= high_stress {
            let pct = avg_stress * 100.0;
            let messages = [
                format!(
                    "Your average stress ran at {pct:.0}% of the scale this period, \
                     above your usual high-water mark. What's been weighing on you?"
                ),
                format!(
                    "Stress has been elevated this period ({pct:.0}% of the scale). \
                     It could be a good moment to look at what's driving it."
                ),
            ];
            insights.push(make_insight(
                rule_ids::FOCUS_STRESS_LEVELS,
                &format!("high-stress|{avg_stress:.2}"),
                &messages,
                InsightType::Alert,
                8,
                group_confidence(&s.stress),
            ));
        }
    }

    if let Some(avg_focus) = s.focus.mean {
        if avg_focus <= low_focus {
            let pct = avg_focus * 100.0;
            let messages = [
                format!(
                    "Focus averaged {pct:.0}% of the scale this period, below your \
                     usual range. Is anything in your environment making it harder \
                     to concentrate?"
                ),
                format!(
                    "Your focus ratings have been low this period ({pct:.0}% of the \
                     scale). Would changing when or where you work help?"
                ),
            ];
            insights.push(make_insight(
                rule_ids::FOCUS_STRESS_LEVELS,
                &format!("low-focus|{avg_focus:.2}"),
                &messages,
                InsightType::Question,
                5,
                group_confidence(&s.focus),
            ));
        }
    }

    if let (Some(avg_stress), Some(avg_focus)) = (s.stress.mean, s.focus.mean) {
        if avg_stress <= high_stress - gap && avg_focus >= low_focus + gap {
            let messages = [
                "Focus up, stress down: your sessions this period sat comfortably \
                 in your good range."
                    .to_string(),
                "Your ratings this period show steady focus with stress well under \
                 control. Whatever you're doing, it's working."
                    .to_string(),
            ];
            insights.push(make_insight(
                rule_ids::FOCUS_STRESS_LEVELS,
                &format!("in-range|{avg_stress:.2}|{avg_focus:.2}"),
                &messages,
                InsightType::Affirmation,
                4,
                group_confidence(&s.focus),
            ));
        }
    }

    insights
}

/// Sessions logged without any reflection
pub fn reflection_nudge(ctx: &RuleContext) -> Vec<Insight> {
    let s = ctx.snapshot;
    if s.session_count < MIN_SESSIONS_FOR_NUDGE || s.reflected_count > 0 {
        return Vec::new();
    }

    let count = s.session_count;
    let confidence = stats::confidence(count, 0.0).confidence_score;
    let messages = [
        format!(
            "You completed {count} sessions this period without rating any of them. \
             A quick reflection after each session sharpens these insights."
        ),
        format!(
            "{count} sessions logged, zero reflections. Even a one-tap rating after \
             a session helps spot your patterns."
        ),
    ];

    vec![make_insight(
        rule_ids::REFLECTION_NUDGE,
        &format!("{count}"),
        &messages,
        InsightType::Suggestion,
        3,
        confidence,
    )]
}
