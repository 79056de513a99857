//! Record normalization
//!
//! Converts heterogeneous storage-layer records into the three canonical,
//! immutable record shapes. All rating scales are converted to a single
//! continuous [0,1] representation here; every downstream computation assumes
//! that scale. Incomplete entries (no end time, no timestamp, negative
//! duration) are dropped record-by-record, never aborting the cycle.
//!
//! Timestamps are interpreted in the user's local frame; callers convert to
//! that frame before handing records in.

use crate::types::{
    BreathingRecord, CheckInRecord, JournalRecord, RawBreathingLog, RawCheckIn, RawJournalEntry,
};
use chrono::{DateTime, Utc};

/// Normalizer for storage-layer records
pub struct RecordNormalizer;

impl RecordNormalizer {
    /// Normalize raw check-ins, dropping entries without a valid end time
    pub fn normalize_check_ins(raw: &[RawCheckIn]) -> Vec<CheckInRecord> {
        let mut records = Vec::with_capacity(raw.len());
        for entry in raw {
            let Some(ended_at) = entry.ended_at else {
                log::debug!("skipping check-in without end time at {}", entry.started_at);
                continue;
            };
            if ended_at <= entry.started_at {
                log::warn!(
                    "skipping check-in with non-positive duration ({} -> {})",
                    entry.started_at,
                    ended_at
                );
                continue;
            }

            let duration_sec = (ended_at - entry.started_at).num_seconds() as u32;
            records.push(CheckInRecord {
                started_at: entry.started_at,
                ended_at,
                session_duration_sec: duration_sec,
                stress_level: entry.stress_rating.map(normalize_rating),
                focus_level: entry.focus_rating.map(normalize_rating),
                workplace_name: entry.workplace_name.clone(),
                session_note: entry.session_note.clone(),
            });
        }
        records
    }

    /// Normalize raw breathing logs, dropping entries without a completion time
    pub fn normalize_breathing_logs(raw: &[RawBreathingLog]) -> Vec<BreathingRecord> {
        raw.iter()
            .filter_map(|entry| {
                let completed_at = entry.completed_at?;
                Some(BreathingRecord {
                    completed_at,
                    duration_sec: entry.duration_sec,
                    exercise_type: entry
                        .exercise_type
                        .clone()
                        .unwrap_or_else(|| "unknown".to_string()),
                })
            })
            .collect()
    }

    /// Normalize raw journal entries, dropping entries without a timestamp
    pub fn normalize_journal_entries(raw: &[RawJournalEntry]) -> Vec<JournalRecord> {
        raw.iter()
            .filter_map(|entry| {
                let timestamp = entry.timestamp?;
                Some(JournalRecord {
                    timestamp,
                    title: entry.title.clone(),
                    text: entry.text.clone(),
                    stress_level: entry.stress_rating.map(normalize_rating),
                    focus_score: entry.focus_rating.map(normalize_rating),
                })
            })
            .collect()
    }
}

/// Convert a discrete 1-5 rating to the continuous [0,1] scale
pub fn normalize_rating(rating: f64) -> f64 {
    ((rating - 1.0) / 4.0).clamp(0.0, 1.0)
}

/// Keep check-ins whose start falls inside `[start, end)`
pub fn check_ins_in_window(
    records: &[CheckInRecord],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<CheckInRecord> {
    records
        .iter()
        .filter(|r| r.started_at >= start && r.started_at < end)
        .cloned()
        .collect()
}

/// Keep breathing records completed inside `[start, end)`
pub fn breathing_in_window(
    records: &[BreathingRecord],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<BreathingRecord> {
    records
        .iter()
        .filter(|r| r.completed_at >= start && r.completed_at < end)
        .cloned()
        .collect()
}

/// Keep journal records timestamped inside `[start, end)`
pub fn journal_in_window(
    records: &[JournalRecord],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<JournalRecord> {
    records
        .iter()
        .filter(|r| r.timestamp >= start && r.timestamp < end)
        .cloned()
        .collect()
}
