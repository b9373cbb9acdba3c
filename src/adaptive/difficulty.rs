//! Feature-level difficulty: how much more often the learner misses items
//! carrying a given feature value than items overall.

use std::collections::BTreeMap;

use crate::stats;
use crate::types::FeatureTally;

/// Pooled feature observations required before ratios are reported.
pub const MIN_GLOBAL_OBSERVATIONS: u32 = 50;

pub fn feature_key(name: &str, value: &str) -> String {
    format!("{name}_{value}")
}

pub fn record_features(
    rates: &mut BTreeMap<String, FeatureTally>,
    features: &[(String, String)],
    ok: bool,
) {
    for (name, value) in features {
        let tally = rates.entry(feature_key(name, value)).or_default();
        tally.total += 1;
        if ok {
            tally.correct += 1;
        }
    }
}

fn error_rate(t: &FeatureTally) -> Option<f64> {
    (t.total > 0).then(|| (t.total - t.correct.min(t.total)) as f64 / t.total as f64)
}

/// Mean of `feature error rate / global error rate` over the item's
/// features with data. None without enough evidence or any global errors.
pub fn feature_difficulty(
    rates: &BTreeMap<String, FeatureTally>,
    features: &[(String, String)],
) -> Option<f64> {
    let global = rates.values().fold(FeatureTally::default(), |acc, t| FeatureTally {
        correct: acc.correct + t.correct,
        total: acc.total + t.total,
    });
    if global.total < MIN_GLOBAL_OBSERVATIONS {
        return None;
    }
    let global_rate = error_rate(&global)?;
    if global_rate == 0.0 {
        return None;
    }
    stats::mean(
        features
            .iter()
            .filter_map(|(n, v)| rates.get(&feature_key(n, v)))
            .filter_map(error_rate)
            .map(|r| r / global_rate),
    )
}
