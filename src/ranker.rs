//! Insight ranking and deduplication
//!
//! Merges statistical and rule-engine candidates, drops insights the user
//! has previously dismissed, and orders the rest deterministically: priority
//! descending, ties broken by emission order via stable sort. Truncation
//! only happens when the caller asks for it.

use crate::types::Insight;
use std::cmp::Reverse;
use std::collections::HashSet;

/// Filter dismissed insights and sort the remainder
pub fn rank(
    mut insights: Vec<Insight>,
    dismissed: &HashSet<String>,
    max_count: Option<usize>,
) -> Vec<Insight> {
    let before = insights.len();
    insights.retain(|insight| !dismissed.contains(&insight.id));
    if insights.len() < before {
        log::debug!("filtered {} dismissed insight(s)", before - insights.len());
    }

    insights.sort_by_key(|insight| Reverse(insight.priority));

    if let Some(max) = max_count {
        insights.truncate(max);
    }
    insights
}
