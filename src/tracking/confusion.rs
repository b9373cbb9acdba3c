use crate::params::CONSTANTS;
use crate::sanitize::trim_front;
use crate::store::ItemStore;
use crate::types::{ConfusionEntry, ItemRecord};

/// How many recent items the confusion boost looks back over.
pub const BOOST_LOOKBACK: usize = 3;

pub fn record_confusion(rec: &mut ItemRecord, detected: &str, ts: i64) {
    rec.confusions.push_back(ConfusionEntry {
        detected: detected.to_string(),
        ts,
    });
    trim_front(&mut rec.confusions, CONSTANTS.history.max_confusions);
}

/// Detected value -> count, in order of first occurrence.
pub fn confusion_counts(rec: &ItemRecord) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for entry in &rec.confusions {
        match counts.iter_mut().find(|(v, _)| *v == entry.detected) {
            Some((_, n)) => *n += 1,
            None => counts.push((entry.detected.clone(), 1)),
        }
    }
    counts
}

/// First value (by first occurrence) logged at least `min_occurrences` times.
pub fn recurring_confusion(rec: &ItemRecord, min_occurrences: usize) -> Option<String> {
    confusion_counts(rec)
        .into_iter()
        .find(|(_, n)| *n >= min_occurrences)
        .map(|(v, _)| v)
}

/// Most frequent detected value; earliest wins ties.
pub fn top_confusion(rec: &ItemRecord) -> Option<(String, usize)> {
    confusion_counts(rec)
        .into_iter()
        .fold(None, |best, (v, n)| match best {
            Some((_, b)) if b >= n => best,
            _ => Some((v, n)),
        })
}

/// Times `key` shows up in the confusion logs of the last few presented items.
pub fn recent_confusion_hits(store: &ItemStore, key: &str) -> usize {
    store
        .recent()
        .iter()
        .rev()
        .take(BOOST_LOOKBACK)
        .filter_map(|k| store.get(k))
        .map(|rec| rec.confusions.iter().filter(|c| c.detected == key).count())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::TransferParams;

    fn rec_with(values: &[&str]) -> ItemRecord {
        let mut rec = ItemRecord::new("k", vec![]);
        for (i, v) in values.iter().enumerate() {
            record_confusion(&mut rec, v, i as i64);
        }
        rec
    }

    #[test]
    fn test_counts_keep_first_occurrence_order() {
        let rec = rec_with(&["E", "F", "E", "G", "F", "F"]);
        assert_eq!(
            confusion_counts(&rec),
            vec![("E".to_string(), 2), ("F".to_string(), 3), ("G".to_string(), 1)]
        );
        assert_eq!(recurring_confusion(&rec, 2), Some("E".to_string()));
        assert_eq!(recurring_confusion(&rec, 4), None);
        assert_eq!(top_confusion(&rec), Some(("F".to_string(), 3)));
    }

    #[test]
    fn test_log_capped() {
        let values: Vec<String> = (0..15).map(|i| format!("v{i}")).collect();
        let refs: Vec<&str> = values.iter().map(String::as_str).collect();
        let rec = rec_with(&refs);
        assert_eq!(rec.confusions.len(), 10);
        assert_eq!(rec.confusions.front().map(|c| c.detected.as_str()), Some("v5"));
    }

    #[test]
    fn test_recent_hits_only_last_three() {
        let mut store = ItemStore::new();
        let t = TransferParams::default();
        for key in ["a", "b", "c", "d"] {
            let rec = store.ensure_item(key, Vec::new, &t);
            record_confusion(rec, "x", 0);
            store.track_recent(key);
        }
        assert_eq!(recent_confusion_hits(&store, "x"), 3);
        assert_eq!(recent_confusion_hits(&store, "y"), 0);
    }
}
