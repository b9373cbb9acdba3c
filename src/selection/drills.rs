//! Remedial queues: overdue reviews, micro-drills and confusion drills.
//!
//! Cooldowns count questions, not wall-clock time.

use crate::params::{ConfusionDrillParams, MicroDrillParams};
use crate::store::ItemStore;
use crate::tracking::confusion::recurring_confusion;
use crate::types::ItemRecord;

fn cooldown_elapsed(last: Option<u32>, question: u32, cooldown: u32) -> bool {
    last.map_or(true, |q| question.saturating_sub(q) >= cooldown)
}

/// Fires when the item failed at least `failure_count` times within its
/// last `window_size` answers and its cooldown has passed. Marks the
/// cooldown when it fires.
pub fn should_micro_drill(
    rec: &mut ItemRecord,
    question: u32,
    p: &MicroDrillParams,
    cooldown: u32,
) -> bool {
    if rec.hist.len() < p.failure_count {
        return false;
    }
    if !cooldown_elapsed(rec.last_micro_drill, question, cooldown) {
        return false;
    }
    let failures = rec
        .hist
        .iter()
        .rev()
        .take(p.window_size)
        .filter(|ok| !**ok)
        .count();
    if failures < p.failure_count {
        return false;
    }
    rec.last_micro_drill = Some(question);
    true
}

/// Keys past their due date, most overdue first.
pub fn build_overdue_queue(store: &ItemStore, now_ms: i64, max: usize) -> Vec<String> {
    let mut due: Vec<(&str, i64)> = store
        .items()
        .iter()
        .filter(|(_, r)| r.due > 0 && r.due < now_ms)
        .map(|(k, r)| (k.as_str(), r.due))
        .collect();
    due.sort_by_key(|(_, d)| *d);
    due.into_iter()
        .take(max)
        .map(|(k, _)| k.to_string())
        .collect()
}

/// The recurring mis-detected value to drill against, if the last answer
/// was wrong and the cooldown has passed. The caller marks the cooldown
/// once a drill is actually built.
pub fn confusion_drill_value(
    rec: &ItemRecord,
    question: u32,
    p: &ConfusionDrillParams,
    cooldown: u32,
) -> Option<String> {
    if !cooldown_elapsed(rec.last_confusion_drill, question, cooldown) {
        return None;
    }
    if rec.hist.back() != Some(&false) {
        return None;
    }
    recurring_confusion(rec, p.min_occurrences)
}

/// `[original, confused, original, confused]`
pub fn confusion_sequence<T: Clone>(original: &T, confused: &T) -> Vec<T> {
    vec![
        original.clone(),
        confused.clone(),
        original.clone(),
        confused.clone(),
    ]
}
