//! Item/Cluster Store
//!
//! Owns every learner record, the per-cluster counters and the recency
//! buffer consulted by the scorer.

use std::collections::{BTreeMap, VecDeque};

use crate::params::{TransferParams, CONSTANTS};
use crate::sanitize::trim_front;
use crate::stats;
use crate::types::{ClusterStats, ItemRecord};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemStore {
    items: BTreeMap<String, ItemRecord>,
    clusters: BTreeMap<String, ClusterStats>,
    recent: VecDeque<String>,
}

impl ItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a store from decoded parts, restoring each record's key.
    pub fn from_parts(
        mut items: BTreeMap<String, ItemRecord>,
        clusters: BTreeMap<String, ClusterStats>,
        recent: impl IntoIterator<Item = String>,
    ) -> Self {
        for (key, rec) in items.iter_mut() {
            rec.key.clone_from(key);
        }
        let mut recent: VecDeque<String> = recent.into_iter().collect();
        trim_front(&mut recent, CONSTANTS.history.max_recent);
        Self {
            items,
            clusters,
            recent,
        }
    }

    pub fn items(&self) -> &BTreeMap<String, ItemRecord> {
        &self.items
    }

    pub fn clusters(&self) -> &BTreeMap<String, ClusterStats> {
        &self.clusters
    }

    pub fn recent(&self) -> &VecDeque<String> {
        &self.recent
    }

    pub fn get(&self, key: &str) -> Option<&ItemRecord> {
        self.items.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut ItemRecord> {
        self.items.get_mut(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn cluster(&self, id: &str) -> Option<&ClusterStats> {
        self.clusters.get(id)
    }

    /// Returns the record for `key`, creating it on first encounter.
    ///
    /// `clusters` is only evaluated for a new record, whose `pL` starts
    /// at the transfer prior of those clusters.
    pub fn ensure_item(
        &mut self,
        key: &str,
        clusters: impl FnOnce() -> Vec<String>,
        transfer: &TransferParams,
    ) -> &mut ItemRecord {
        let cluster_stats = &self.clusters;
        self.items.entry(key.to_string()).or_insert_with(|| {
            let mut rec = ItemRecord::new(key, clusters());
            rec.p_l = transfer_prior(cluster_stats, &rec.clusters, transfer);
            rec
        })
    }

    pub fn ensure_cluster(&mut self, id: &str) -> &mut ClusterStats {
        self.clusters.entry(id.to_string()).or_default()
    }

    pub fn record_clusters(&mut self, ids: &[String], ok: bool) {
        for id in ids {
            self.ensure_cluster(id).record(ok);
        }
    }

    pub fn track_recent(&mut self, key: &str) {
        self.recent.push_back(key.to_string());
        trim_front(&mut self.recent, CONSTANTS.history.max_recent);
    }

    /// The cluster of `ids` with the lowest accuracy among those with at
    /// least `min_attempts` graded attempts.
    pub fn weakest_cluster<'a>(&self, ids: &'a [String], min_attempts: u32) -> Option<&'a str> {
        ids.iter()
            .filter_map(|id| {
                self.clusters
                    .get(id)
                    .filter(|c| c.total >= min_attempts)
                    .map(|c| (id.as_str(), c.accuracy()))
            })
            .fold(None, |best: Option<(&str, f64)>, (id, acc)| match best {
                Some((_, b)) if b <= acc => best,
                _ => Some((id, acc)),
            })
            .map(|(id, _)| id)
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.clusters.clear();
        self.recent.clear();
    }
}

/// Starting `pL` for a new record: the mean accuracy of its well-sampled
/// clusters, capped. 0 when no cluster qualifies.
pub fn transfer_prior(
    clusters: &BTreeMap<String, ClusterStats>,
    ids: &[String],
    p: &TransferParams,
) -> f64 {
    let accs = ids
        .iter()
        .filter_map(|id| clusters.get(id))
        .filter(|c| c.total >= p.cluster_min_attempts)
        .map(ClusterStats::accuracy);
    stats::mean(accs).map_or(0.0, |m| m.min(p.cap))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_ensure_item_creates_once() {
        let mut store = ItemStore::new();
        let t = TransferParams::default();
        store.ensure_item("a", || ids(&["c1"]), &t).attempts = 3;
        let rec = store.ensure_item("a", || panic!("clusters recomputed"), &t);
        assert_eq!(rec.attempts, 3);
        assert_eq!(rec.clusters, ids(&["c1"]));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_transfer_prior_from_clusters() {
        let mut store = ItemStore::new();
        let t = TransferParams::default();
        for ok in [true, true, false, true] {
            store.ensure_cluster("c1").record(ok);
        }
        store.ensure_cluster("c2").record(true);
        let rec = store.ensure_item("new", || ids(&["c1", "c2"]), &t);
        // c2 has too few attempts; c1 accuracy .75 capped at .3
        assert_eq!(rec.p_l, 0.3);

        let rec = store.ensure_item("other", || ids(&["c2"]), &t);
        assert_eq!(rec.p_l, 0.0);
    }

    #[test]
    fn test_recent_buffer_capped() {
        let mut store = ItemStore::new();
        for i in 0..8 {
            store.track_recent(&format!("k{i}"));
        }
        assert_eq!(store.recent().len(), 5);
        assert_eq!(store.recent().front().map(String::as_str), Some("k3"));
    }

    #[test]
    fn test_weakest_cluster() {
        let mut store = ItemStore::new();
        for _ in 0..3 {
            store.ensure_cluster("strong").record(true);
            store.ensure_cluster("weak").record(false);
        }
        store.ensure_cluster("sparse").record(false);
        let list = ids(&["strong", "sparse", "weak"]);
        assert_eq!(store.weakest_cluster(&list, 3), Some("weak"));
        assert_eq!(store.weakest_cluster(&ids(&["sparse"]), 3), None);
    }

    #[test]
    fn test_from_parts_restores_keys() {
        let mut items = BTreeMap::new();
        items.insert("x".to_string(), ItemRecord::default());
        let store = ItemStore::from_parts(items, BTreeMap::new(), Vec::new());
        assert_eq!(store.get("x").map(|r| r.key.as_str()), Some("x"));
    }
}
