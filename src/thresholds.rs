//! Adaptive threshold management
//!
//! Maintains a small set of named, self-adjusting decision boundaries that
//! drift toward a user's own recent behavior via bounded exponential moving
//! average. The store is loaded from a snapshot at the start of a generation
//! cycle, updated exactly once per metric from current-period aggregates, and
//! handed back to the caller for persistence. The engine never touches
//! storage itself.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// Maximum retained samples per threshold
pub const MAX_THRESHOLD_HISTORY: usize = 50;

/// Exponential-moving-average learning rate
pub const DEFAULT_LEARNING_RATE: f64 = 0.1;

/// Well-known threshold names used by the rule catalog
pub mod names {
    /// Work hours per window before the workload rules engage
    pub const MAX_WEEKLY_HOURS: &str = "maxWeeklyHours";
    /// Average stress level considered high, on the normalized [0,1] scale
    pub const HIGH_STRESS: &str = "highStress";
    /// Average focus level considered low, on the normalized [0,1] scale
    pub const LOW_FOCUS: &str = "lowFocus";
    /// Typical session duration in hours
    pub const SESSION_DURATION: &str = "sessionDuration";
}

/// Static registration for one adaptive threshold
#[derive(Debug, Clone, Copy)]
pub struct ThresholdDefinition {
    pub name: &'static str,
    pub baseline: f64,
    pub min: f64,
    pub max: f64,
}

/// Thresholds registered at construction. Each has its own band and baseline.
pub const THRESHOLD_DEFINITIONS: &[ThresholdDefinition] = &[
    ThresholdDefinition {
        name: names::MAX_WEEKLY_HOURS,
        baseline: 50.0,
        min: 30.0,
        max: 70.0,
    },
    ThresholdDefinition {
        name: names::HIGH_STRESS,
        baseline: 0.70,
        min: 0.50,
        max: 0.90,
    },
    ThresholdDefinition {
        name: names::LOW_FOCUS,
        baseline: 0.40,
        min: 0.20,
        max: 0.60,
    },
    ThresholdDefinition {
        name: names::SESSION_DURATION,
        baseline: 1.5,
        min: 0.5,
        max: 4.0,
    },
];

/// Persisted state for one adaptive threshold
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaptiveThresholdState {
    /// Current decision boundary, always inside [min_value, max_value]
    pub current_value: f64,
    /// Cold-start value
    pub baseline_value: f64,
    /// Lower bound of the drift band
    pub min_value: f64,
    /// Upper bound of the drift band
    pub max_value: f64,
    /// EMA learning rate
    pub learning_rate: f64,
    /// Bounded FIFO of recent samples, newest last
    pub history: VecDeque<f64>,
}

impl AdaptiveThresholdState {
    fn from_definition(def: &ThresholdDefinition) -> Self {
        Self {
            current_value: def.baseline,
            baseline_value: def.baseline,
            min_value: def.min,
            max_value: def.max,
            learning_rate: DEFAULT_LEARNING_RATE,
            history: VecDeque::with_capacity(MAX_THRESHOLD_HISTORY),
        }
    }

    /// Re-establish invariants on state loaded from an external snapshot
    fn sanitize(&mut self) {
        if self.max_value < self.min_value {
            std::mem::swap(&mut self.min_value, &mut self.max_value);
        }
        self.current_value = self.current_value.clamp(self.min_value, self.max_value);
        if !(0.0..=1.0).contains(&self.learning_rate) {
            self.learning_rate = DEFAULT_LEARNING_RATE;
        }
        while self.history.len() > MAX_THRESHOLD_HISTORY {
            self.history.pop_front();
        }
    }
}

/// Snapshot handed across the persistence boundary, keyed by threshold name.
///
/// `BTreeMap` keeps serialization order reproducible.
pub type ThresholdSnapshot = BTreeMap<String, AdaptiveThresholdState>;

/// Store of named adaptive thresholds for one user
#[derive(Debug, Clone)]
pub struct AdaptiveThresholdStore {
    thresholds: BTreeMap<String, AdaptiveThresholdState>,
}

impl Default for AdaptiveThresholdStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AdaptiveThresholdStore {
    /// Create a store with every registered threshold at its baseline
    pub fn new() -> Self {
        let thresholds = THRESHOLD_DEFINITIONS
            .iter()
            .map(|def| (def.name.to_string(), AdaptiveThresholdState::from_definition(def)))
            .collect();
        Self { thresholds }
    }

    /// Restore a store from a persisted snapshot.
    ///
    /// Registered thresholds missing from the snapshot start cold at their
    /// baseline. Snapshot entries are sanitized so a hand-edited or stale
    /// snapshot cannot violate the band invariant.
    pub fn from_snapshot(snapshot: ThresholdSnapshot) -> Self {
        let mut store = Self::new();
        for (name, mut state) in snapshot {
            state.sanitize();
            store.thresholds.insert(name, state);
        }
        store
    }

    /// Current value for `name`; falls back to the registered baseline when
    /// the store has no entry for it
    pub fn get(&self, name: &str) -> f64 {
        if let Some(state) = self.thresholds.get(name) {
            return state.current_value;
        }
        let baseline = THRESHOLD_DEFINITIONS
            .iter()
            .find(|def| def.name == name)
            .map(|def| def.baseline)
            .unwrap_or(0.0);
        log::warn!("unknown threshold '{name}', returning baseline {baseline}");
        baseline
    }

    /// Feed one period-aggregate sample into `name`.
    ///
    /// `current = clamp((1 - a) * current + a * sample, min, max)`; the raw
    /// sample is appended to history with the oldest entry evicted past the
    /// 50-sample cap. Must run exactly once per metric per cycle, before any
    /// rule reads the value.
    pub fn update(&mut self, name: &str, sample: f64) {
        let Some(state) = self.thresholds.get_mut(name) else {
            log::warn!("update for unknown threshold '{name}' ignored");
            return;
        };

        let blended =
            (1.0 - state.learning_rate) * state.current_value + state.learning_rate * sample;
        state.current_value = blended.clamp(state.min_value, state.max_value);

        state.history.push_back(sample);
        while state.history.len() > MAX_THRESHOLD_HISTORY {
            state.history.pop_front();
        }
    }

    /// Sample standard deviation (n-1 denominator) over the retained history;
    /// 0.0 when fewer than two samples exist
    pub fn std_dev(&self, name: &str) -> f64 {
        let Some(state) = self.thresholds.get(name) else {
            return 0.0;
        };
        let n = state.history.len();
        if n <= 1 {
            return 0.0;
        }

        let mean: f64 = state.history.iter().sum::<f64>() / n as f64;
        let sum_sq: f64 = state.history.iter().map(|v| (v - mean).powi(2)).sum();
        (sum_sq / (n - 1) as f64).sqrt()
    }

    /// Number of history samples retained for `name`
    pub fn history_len(&self, name: &str) -> usize {
        self.thresholds.get(name).map_or(0, |s| s.history.len())
    }

    /// Export the store for persistence by the caller
    pub fn snapshot(&self) -> ThresholdSnapshot {
        self.thresholds.clone()
    }

    /// Serialize the snapshot to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.thresholds)
    }

    /// Restore a store from snapshot JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let snapshot: ThresholdSnapshot = serde_json::from_str(json)?;
        Ok(Self::from_snapshot(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cold_start_at_baselines() {
        let store = AdaptiveThresholdStore::new();
        assert_eq!(store.get(names::MAX_WEEKLY_HOURS), 50.0);
        assert_eq!(store.get(names::HIGH_STRESS), 0.70);
        assert_eq!(store.get(names::LOW_FOCUS), 0.40);
        assert_eq!(store.get(names::SESSION_DURATION), 1.5);
    }

    #[test]
    fn test_unknown_name_falls_back_to_zero() {
        let store = AdaptiveThresholdStore::new();
        assert_eq!(store.get("noSuchThreshold"), 0.0);
    }

    #[test]
    fn test_ema_update() {
        let mut store = AdaptiveThresholdStore::new();
        store.update(names::MAX_WEEKLY_HOURS, 55.0);

        // 0.9 * 50 + 0.1 * 55 = 50.5
        assert!((store.get(names::MAX_WEEKLY_HOURS) - 50.5).abs() < 0.001);
    }

    #[test]
    fn test_update_converges_to_band_max_without_exceeding() {
        let mut store = AdaptiveThresholdStore::new();
        let max = 70.0;

        for _ in 0..500 {
            store.update(names::MAX_WEEKLY_HOURS, max + 10.0);
            assert!(store.get(names::MAX_WEEKLY_HOURS) <= max);
        }

        // Asymptotic convergence toward the band ceiling
        assert!(store.get(names::MAX_WEEKLY_HOURS) > max - 0.01);
    }

    #[test]
    fn test_history_capped_at_fifty() {
        let mut store = AdaptiveThresholdStore::new();
        for i in 0..80 {
            store.update(names::SESSION_DURATION, 1.0 + f64::from(i) * 0.01);
        }

        assert_eq!(store.history_len(names::SESSION_DURATION), MAX_THRESHOLD_HISTORY);
    }

    #[test]
    fn test_std_dev_requires_two_samples() {
        let mut store = AdaptiveThresholdStore::new();
        assert_eq!(store.std_dev(names::HIGH_STRESS), 0.0);

        store.update(names::HIGH_STRESS, 0.6);
        assert_eq!(store.std_dev(names::HIGH_STRESS), 0.0);

        store.update(names::HIGH_STRESS, 0.8);
        // Sample std of [0.6, 0.8] with n-1 denominator
        let expected = (((0.1f64).powi(2) * 2.0) / 1.0).sqrt();
        assert!((store.std_dev(names::HIGH_STRESS) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut store = AdaptiveThresholdStore::new();
        store.update(names::MAX_WEEKLY_HOURS, 58.0);
        store.update(names::LOW_FOCUS, 0.35);

        let json = store.to_json().unwrap();
        let restored = AdaptiveThresholdStore::from_json(&json).unwrap();

        assert_eq!(
            restored.get(names::MAX_WEEKLY_HOURS),
            store.get(names::MAX_WEEKLY_HOURS)
        );
        assert_eq!(restored.history_len(names::MAX_WEEKLY_HOURS), 1);
    }

    #[test]
    fn test_snapshot_missing_entry_is_cold_start() {
        let mut snapshot = ThresholdSnapshot::new();
        snapshot.insert(
            names::HIGH_STRESS.to_string(),
            AdaptiveThresholdState {
                current_value: 0.8,
                baseline_value: 0.7,
                min_value: 0.5,
                max_value: 0.9,
                learning_rate: 0.1,
                history: VecDeque::from(vec![0.8]),
            },
        );

        let store = AdaptiveThresholdStore::from_snapshot(snapshot);
        assert!((store.get(names::HIGH_STRESS) - 0.8).abs() < f64::EPSILON);
        // Absent entries come back at their registered baseline
        assert_eq!(store.get(names::MAX_WEEKLY_HOURS), 50.0);
    }

    #[test]
    fn test_sanitize_clamps_out_of_band_snapshot() {
        let mut snapshot = ThresholdSnapshot::new();
        snapshot.insert(
            names::MAX_WEEKLY_HOURS.to_string(),
            AdaptiveThresholdState {
                current_value: 120.0,
                baseline_value: 50.0,
                min_value: 30.0,
                max_value: 70.0,
                learning_rate: 0.1,
                history: VecDeque::from(vec![1.0; 90]),
            },
        );

        let store = AdaptiveThresholdStore::from_snapshot(snapshot);
        assert_eq!(store.get(names::MAX_WEEKLY_HOURS), 70.0);
        assert_eq!(store.history_len(names::MAX_WEEKLY_HOURS), MAX_THRESHOLD_HISTORY);
    }
}
