//! Item configs: the contract between the engine and an exercise family.
//!
//! The engine never looks inside an item. Everything it needs (keys,
//! difficulty, cluster tags, generation) goes through [`ItemConfig`].

pub mod grid;
pub mod unified;

pub use grid::{GridConfig, GridItem, GridSettings};
pub use unified::{DifficultyBand, FamilySpec, UnifiedConfig, UnifiedItem};

use std::collections::BTreeMap;
use std::fmt::Debug;

use crate::params::Params;
use crate::types::ItemRecord;

/// Engine state visible to item generation.
#[derive(Clone, Copy)]
pub struct SelectionContext<'a> {
    pub theta: f64,
    pub items: &'a BTreeMap<String, ItemRecord>,
    pub params: &'a Params,
}

/// One item family offered during cold start.
#[derive(Debug, Clone, PartialEq)]
pub struct Family {
    pub id: String,
    pub base_difficulty: f64,
}

pub trait ItemConfig {
    type Item: Clone + Debug;

    /// Stable identity of an item; the record key.
    fn item_key(&self, item: &Self::Item) -> String;

    /// Difficulty in [0, 1].
    fn item_difficulty(&self, _item: &Self::Item) -> f64 {
        0.5
    }

    fn item_clusters(&self, item: &Self::Item) -> Vec<String>;

    /// Picks up newly resolved parameters. The engine calls this at
    /// construction and after every re-resolve.
    fn apply_params(&mut self, _params: &Params) {}

    /// Rebuilds an item from its key. None drops the candidate, e.g. when
    /// its family no longer exists.
    fn item_from_key(&self, key: &str) -> Option<Self::Item>;

    fn gen_random(&mut self, last: Option<&Self::Item>, ctx: &SelectionContext<'_>) -> Self::Item;

    /// An item carrying `cluster`, or None if this config cannot produce one.
    fn gen_from_cluster(
        &mut self,
        cluster: &str,
        last: Option<&Self::Item>,
        ctx: &SelectionContext<'_>,
    ) -> Option<Self::Item>;

    /// Easier neighbours to rehearse after repeated failures.
    fn micro_drill(&mut self, failed: &Self::Item) -> Vec<Self::Item>;

    fn pick_scaffold(&mut self, item: &Self::Item, weak_cluster: Option<&str>) -> Vec<Self::Item>;

    /// Families walked once each during cold start. Empty for single-family
    /// configs.
    fn families(&self, _ctx: &SelectionContext<'_>) -> Vec<Family> {
        Vec::new()
    }

    fn gen_from_family(
        &mut self,
        _family: &str,
        last: Option<&Self::Item>,
        ctx: &SelectionContext<'_>,
    ) -> Self::Item {
        self.gen_random(last, ctx)
    }

    /// `(feature, value)` pairs for feature-level error tracking.
    fn item_features(&self, _item: &Self::Item) -> Option<Vec<(String, String)>> {
        None
    }

    /// The item the learner mistook `original` for, given the value they
    /// produced instead.
    fn item_for_confusion(
        &mut self,
        original: &Self::Item,
        detected: &str,
        ctx: &SelectionContext<'_>,
    ) -> Option<Self::Item> {
        self.gen_from_cluster(&format!("note_{detected}"), Some(original), ctx)
    }
}
