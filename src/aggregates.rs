//! Period aggregation
//!
//! Builds the immutable `PeriodSnapshot` consumed by the statistical stage
//! and every rule in the catalog: totals and averages over the current
//! window, the historical rolling average over the preceding windows, and
//! breakdowns by workplace, weekday, time-of-day block, session-duration
//! bucket, and breathing-day overlap. Rules only read this snapshot; nothing
//! mutates it after construction.

use crate::config::EngineConfig;
use crate::normalizer::{breathing_in_window, check_ins_in_window};
use crate::stats;
use crate::types::{BreathingRecord, CheckInRecord};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};
use std::collections::{BTreeMap, BTreeSet};

/// Time-of-day block a session starts in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBlock {
    Morning,
    Afternoon,
    Evening,
}

impl TimeBlock {
    pub const ALL: [TimeBlock; 3] = [TimeBlock::Morning, TimeBlock::Afternoon, TimeBlock::Evening];

    /// Classify an hour-of-day against the configured cutoffs
    pub fn of_hour(hour: u32, config: &EngineConfig) -> TimeBlock {
        if hour < config.morning_end_hour {
            TimeBlock::Morning
        } else if hour < config.afternoon_end_hour {
            TimeBlock::Afternoon
        } else {
            TimeBlock::Evening
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimeBlock::Morning => "the morning",
            TimeBlock::Afternoon => "the afternoon",
            TimeBlock::Evening => "the evening",
        }
    }

    fn index(&self) -> usize {
        match self {
            TimeBlock::Morning => 0,
            TimeBlock::Afternoon => 1,
            TimeBlock::Evening => 2,
        }
    }
}

/// Weekday display names indexed by `Datelike::weekday().num_days_from_monday()`
pub const WEEKDAY_LABELS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Mean and spread of one rating dimension over a group of sessions
#[derive(Debug, Clone, Default)]
pub struct RatingStats {
    /// Number of sessions carrying this rating
    pub samples: usize,
    /// Mean rating, absent when no session carries one
    pub mean: Option<f64>,
    /// Population variance of the ratings
    pub variance: f64,
}

impl RatingStats {
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        Self {
            samples: values.len(),
            mean: Some(stats::mean(values)),
            variance: stats::population_variance(values),
        }
    }
}

/// Focus/stress aggregates for one slice of sessions
#[derive(Debug, Clone, Default)]
pub struct SliceStats {
    /// Reflected sessions in the slice (carrying at least one rating)
    pub sessions: usize,
    /// Focus ratings in the slice
    pub focus: RatingStats,
    /// Stress ratings in the slice
    pub stress: RatingStats,
}

impl SliceStats {
    fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a CheckInRecord>,
    {
        let mut focus_values = Vec::new();
        let mut stress_values = Vec::new();
        let mut reflected = 0;

        for record in records {
            if record.is_reflected() {
                reflected += 1;
            }
            if let Some(focus) = record.focus_level {
                focus_values.push(focus);
            }
            if let Some(stress) = record.stress_level {
                stress_values.push(stress);
            }
        }

        Self {
            sessions: reflected,
            focus: RatingStats::from_values(&focus_values),
            stress: RatingStats::from_values(&stress_values),
        }
    }
}

/// A journal note with its externally scored sentiment
#[derive(Debug, Clone)]
pub struct ScoredNote {
    pub timestamp: DateTime<Utc>,
    pub title: String,
    /// Sentiment on [-1, 1]; 0.0 when the scorer failed for this note
    pub sentiment: f64,
}

/// Immutable aggregate snapshot for one generation cycle
#[derive(Debug, Clone)]
pub struct PeriodSnapshot {
    /// Start of the current window (inclusive)
    pub window_start: DateTime<Utc>,
    /// End of the current window (exclusive)
    pub window_end: DateTime<Utc>,
    /// Window length in days
    pub window_days: u32,

    // Session totals over the current window
    /// Completed sessions in the window
    pub session_count: usize,
    /// Total work hours in the window
    pub total_work_hours: f64,
    /// Sessions carrying at least one rating
    pub reflected_count: usize,
    /// Focus ratings over the window
    pub focus: RatingStats,
    /// Stress ratings over the window
    pub stress: RatingStats,
    /// Mean session length in hours
    pub avg_session_hours: Option<f64>,

    // Historical rolling averages (mean over the preceding windows)
    /// Mean work hours per preceding window; absent when none of them
    /// contain a session
    pub historical_work_hours: Option<f64>,

    // Schedule counts
    /// Sessions ending at or after the configured late-night hour
    pub late_night_count: usize,
    /// Sessions starting on Saturday or Sunday
    pub weekend_count: usize,

    // Slices
    /// Per-workplace aggregates, keyed by workplace name
    pub by_workplace: BTreeMap<String, SliceStats>,
    /// Per-weekday aggregates, Monday first
    pub weekday_slices: [SliceStats; 7],
    /// Per-time-block aggregates (morning, afternoon, evening)
    pub time_block_slices: [SliceStats; 3],
    /// Sessions at or above the long-session cutoff
    pub long_sessions: SliceStats,
    /// Sessions at or below the short-session cutoff
    pub short_sessions: SliceStats,
    /// Sessions on days with at least one breathing completion
    pub breathing_day_sessions: SliceStats,
    /// Sessions on days without a breathing completion
    pub non_breathing_day_sessions: SliceStats,

    // Breathing aggregates
    /// Completions in the current window
    pub breathing_count: usize,
    /// Total breathing minutes in the current window
    pub breathing_minutes: f64,
    /// Completions in the immediately preceding window
    pub previous_breathing_count: usize,

    // Daily series over the current window, chronological
    /// Calendar date of each day in the window
    pub daily_dates: Vec<NaiveDate>,
    /// Work hours per day (zero for days without sessions)
    pub daily_work_hours: Vec<f64>,
    /// Mean stress per day, for days carrying at least one stress rating
    pub daily_mean_stress: Vec<f64>,
    /// Mean focus per day, for days carrying at least one focus rating
    pub daily_mean_focus: Vec<f64>,

    /// Journal notes in the window with their sentiment scores
    pub scored_notes: Vec<ScoredNote>,
}

impl PeriodSnapshot {
    /// Build the snapshot for the window ending at `reference`.
    ///
    /// `check_ins` and `breathing` may span the full historical lookback;
    /// filtering happens here. `scored_notes` must already be restricted to
    /// the current window.
    pub fn build(
        check_ins: &[CheckInRecord],
        breathing: &[BreathingRecord],
        scored_notes: Vec<ScoredNote>,
        reference: DateTime<Utc>,
        window_days: u32,
        config: &EngineConfig,
    ) -> Self {
        let window = Duration::days(i64::from(window_days));
        let window_start = reference - window;
        let window_end = reference;

        let current = check_ins_in_window(check_ins, window_start, window_end);
        let current_breathing = breathing_in_window(breathing, window_start, window_end);
        let previous_breathing =
            breathing_in_window(breathing, window_start - window, window_start);

        let total_work_hours: f64 = current.iter().map(CheckInRecord::duration_hours).sum();
        let overall = SliceStats::from_records(&current);
        let avg_session_hours = if current.is_empty() {
            None
        } else {
            Some(total_work_hours / current.len() as f64)
        };

        let historical_work_hours =
            historical_hours(check_ins, window_start, window, config.historical_periods);

        let late_night_count = current
            .iter()
            .filter(|r| r.ended_at.hour() >= config.late_night_hour)
            .count();
        let weekend_count = current
            .iter()
            .filter(|r| r.started_at.weekday().num_days_from_monday() >= 5)
            .count();

        // Workplace slices
        let mut workplace_groups: BTreeMap<String, Vec<&CheckInRecord>> = BTreeMap::new();
        for record in &current {
            if let Some(name) = &record.workplace_name {
                workplace_groups.entry(name.clone()).or_default().push(record);
            }
        }
        let by_workplace = workplace_groups
            .into_iter()
            .map(|(name, group)| (name, SliceStats::from_records(group)))
            .collect();

        // Weekday slices, Monday first
        let weekday_slices = std::array::from_fn(|day| {
            SliceStats::from_records(
                current
                    .iter()
                    .filter(|r| r.started_at.weekday().num_days_from_monday() as usize == day),
            )
        });

        // Time-of-day slices by session start hour
        let time_block_slices = std::array::from_fn(|block| {
            SliceStats::from_records(
                current
                    .iter()
                    .filter(|r| TimeBlock::of_hour(r.started_at.hour(), config).index() == block),
            )
        });

        // Duration buckets
        let long_sessions = SliceStats::from_records(
            current
                .iter()
                .filter(|r| r.duration_hours() >= config.long_session_min_hours),
        );
        let short_sessions = SliceStats::from_records(
            current
                .iter()
                .filter(|r| r.duration_hours() <= config.short_session_max_hours),
        );

        // Breathing-day overlap by calendar date
        let breathing_days: BTreeSet<NaiveDate> = current_breathing
            .iter()
            .map(|b| b.completed_at.date_naive())
            .collect();
        let breathing_day_sessions = SliceStats::from_records(
            current
                .iter()
                .filter(|r| breathing_days.contains(&r.started_at.date_naive())),
        );
        let non_breathing_day_sessions = SliceStats::from_records(
            current
                .iter()
                .filter(|r| !breathing_days.contains(&r.started_at.date_naive())),
        );

        let breathing_minutes: f64 = current_breathing
            .iter()
            .map(|b| f64::from(b.duration_sec) / 60.0)
            .sum();

        // Daily series
        let mut daily_dates = Vec::with_capacity(window_days as usize);
        let mut daily_work_hours = Vec::with_capacity(window_days as usize);
        let mut daily_mean_stress = Vec::new();
        let mut daily_mean_focus = Vec::new();
        for day in 0..window_days {
            let date = (window_start + Duration::days(i64::from(day))).date_naive();
            let day_records: Vec<&CheckInRecord> = current
                .iter()
                .filter(|r| r.started_at.date_naive() == date)
                .collect();

            daily_dates.push(date);
            daily_work_hours.push(
                day_records
                    .iter()
                    .map(|r| r.duration_hours())
                    .sum::<f64>(),
            );

            let stress_values: Vec<f64> =
                day_records.iter().filter_map(|r| r.stress_level).collect();
            if !stress_values.is_empty() {
                daily_mean_stress.push(stats::mean(&stress_values));
            }
            let focus_values: Vec<f64> =
                day_records.iter().filter_map(|r| r.focus_level).collect();
            if !focus_values.is_empty() {
                daily_mean_focus.push(stats::mean(&focus_values));
            }
        }

        Self {
            window_start,
            window_end,
            window_days,
            session_count: current.len(),
            total_work_hours,
            reflected_count: overall.sessions,
            focus: overall.focus,
            stress: overall.stress,
            avg_session_hours,
            historical_work_hours,
            late_night_count,
            weekend_count,
            by_workplace,
            weekday_slices,
            time_block_slices,
            long_sessions,
            short_sessions,
            breathing_day_sessions,
            non_breathing_day_sessions,
            breathing_count: current_breathing.len(),
            breathing_minutes,
            previous_breathing_count: previous_breathing.len(),
            daily_dates,
            daily_work_hours,
            daily_mean_stress,
            daily_mean_focus,
            scored_notes,
        }
    }
}

/// Mean work hours over the preceding windows; `None` when none of them
/// contain a session
fn historical_hours(
    check_ins: &[CheckInRecord],
    window_start: DateTime<Utc>,
    window: Duration,
    periods: u32,
) -> Option<f64> {
    if periods == 0 {
        return None;
    }

    let mut totals = Vec::with_capacity(periods as usize);
    let mut any_sessions = false;
    for k in 0..periods {
        let end = window_start - window * k as i32;
        let start = end - window;
        let sessions = check_ins_in_window(check_ins, start, end);
        if !sessions.is_empty() {
            any_sessions = true;
        }
        totals.push(sessions.iter().map(CheckInRecord::duration_hours).sum::<f64>());
    }

    any_sessions.then(|| stats::mean(&totals))
}
