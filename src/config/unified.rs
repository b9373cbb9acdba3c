//! Multi-family dispatcher.
//!
//! Wraps several configs that share an item type behind one
//! [`ItemConfig`]. Items are tagged with their family id; keys are
//! `family:innerKey`, with a `|R` suffix for recall variants.

use std::fmt::Debug;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use super::{Family, ItemConfig, SelectionContext};
use crate::error::ConfigError;
use crate::params::{Params, UnifiedParams};

const RECALL_SUFFIX: &str = "|R";
const RECALL_CLUSTER: &str = "recall";
const TYPE_PREFIX: &str = "type_";
/// Inner draws tried when cold start looks for an item under the
/// family's difficulty ceiling.
const FAMILY_DRAW_ATTEMPTS: usize = 5;
/// Theta distance over which a family's ceiling opens fully.
const FAMILY_PROGRESS_SPAN: f64 = 2.0;

/// Where a family sits on the global difficulty scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifficultyBand {
    pub base: f64,
    pub span: f64,
}

impl DifficultyBand {
    pub fn new(base: f64, span: f64) -> Self {
        Self { base, span }
    }

    pub fn top(&self) -> f64 {
        self.base + self.span
    }
}

pub struct FamilySpec<I> {
    pub id: String,
    pub name: String,
    pub band: DifficultyBand,
    pub enabled: bool,
    pub config: Box<dyn ItemConfig<Item = I> + Send>,
}

impl<I: 'static> FamilySpec<I> {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        band: DifficultyBand,
        config: impl ItemConfig<Item = I> + Send + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            band,
            enabled: true,
            config: Box::new(config),
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

impl<I> Debug for FamilySpec<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FamilySpec")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("band", &self.band)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnifiedItem<I> {
    pub family: String,
    pub inner: I,
    pub recall: bool,
}

impl<I> UnifiedItem<I> {
    pub fn new(family: impl Into<String>, inner: I) -> Self {
        Self {
            family: family.into(),
            inner,
            recall: false,
        }
    }

    pub fn as_recall(mut self) -> Self {
        self.recall = true;
        self
    }
}

pub struct UnifiedConfig<I> {
    families: Vec<FamilySpec<I>>,
    recall_boost: f64,
    rng: ChaCha8Rng,
}

impl<I: Clone + Debug + 'static> UnifiedConfig<I> {
    pub fn new(families: Vec<FamilySpec<I>>) -> Result<Self, ConfigError> {
        let seed = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42);
        Self::with_seed(families, seed)
    }

    pub fn with_seed(families: Vec<FamilySpec<I>>, seed: u64) -> Result<Self, ConfigError> {
        if families.is_empty() {
            return Err(ConfigError::NoFamilies);
        }
        for (i, f) in families.iter().enumerate() {
            if f.id.is_empty() || f.id.contains(':') || f.id.contains('|') {
                return Err(ConfigError::InvalidFamilyId(f.id.clone()));
            }
            if families[..i].iter().any(|g| g.id == f.id) {
                return Err(ConfigError::DuplicateFamily(f.id.clone()));
            }
        }
        Ok(Self {
            families,
            recall_boost: UnifiedParams::default().recall_difficulty_boost,
            rng: ChaCha8Rng::seed_from_u64(seed),
        })
    }

    pub fn family(&self, id: &str) -> Option<&FamilySpec<I>> {
        self.families.iter().find(|f| f.id == id)
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.families.iter().position(|f| f.id == id)
    }

    /// Returns false if no family has this id.
    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> bool {
        match self.families.iter_mut().find(|f| f.id == id) {
            Some(f) => {
                f.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn enabled_ids(&self) -> Vec<&str> {
        self.families
            .iter()
            .filter(|f| f.enabled)
            .map(|f| f.id.as_str())
            .collect()
    }

    /// Selection weight per family, in table order.
    ///
    /// A family's weight is the share of the theta window
    /// `[theta - w, theta + w]` its band overlaps, boosted where the
    /// learner is weak and floored at `min_type_weight`. Disabled families
    /// and families gated above theta get zero.
    pub fn family_weights(&self, ctx: &SelectionContext<'_>) -> Vec<(String, f64)> {
        let u = &ctx.params.unified;
        let lo = ctx.theta - u.theta_window;
        let hi = ctx.theta + u.theta_window;

        self.families
            .iter()
            .map(|f| {
                if !f.enabled || ctx.theta < f.band.base - u.family_gate {
                    return (f.id.clone(), 0.0);
                }
                let overlap = (hi.min(f.band.top()) - lo.max(f.band.base)).max(0.0);
                let mut w = if u.theta_window > 0.0 {
                    overlap / (2.0 * u.theta_window)
                } else {
                    0.0
                };

                let prefix = format!("{}:", f.id);
                let pls: Vec<f64> = ctx
                    .items
                    .iter()
                    .filter(|(k, _)| k.starts_with(&prefix))
                    .map(|(_, r)| r.p_l)
                    .collect();
                if !pls.is_empty() {
                    let family_pl = pls.iter().sum::<f64>() / pls.len() as f64;
                    w *= (1.0 - family_pl) * u.weakness_boost_scale + 0.5;
                }

                if w > 0.0 && w < u.min_type_weight {
                    w = u.min_type_weight;
                }
                (f.id.clone(), w)
            })
            .collect()
    }

    /// Roulette pick over positive weights; with none, the first enabled
    /// family, else the first family.
    fn weighted_pick(&mut self, weights: &[(String, f64)]) -> usize {
        let positive: Vec<(usize, f64)> = weights
            .iter()
            .enumerate()
            .filter(|(_, (_, w))| *w > 0.0)
            .map(|(i, (_, w))| (i, *w))
            .collect();
        if positive.is_empty() {
            return self.families.iter().position(|f| f.enabled).unwrap_or(0);
        }
        let total: f64 = positive.iter().map(|(_, w)| w).sum();
        let mut r = self.rng.gen::<f64>() * total;
        for (i, w) in &positive {
            r -= w;
            if r <= 0.0 {
                return *i;
            }
        }
        positive[positive.len() - 1].0
    }

    fn recognition_key(&self, item: &UnifiedItem<I>) -> String {
        match self.family(&item.family) {
            Some(f) => format!("{}:{}", item.family, f.config.item_key(&item.inner)),
            None => format!("{}:", item.family),
        }
    }

    /// Promotes to the recall variant once the recognition item is known
    /// well enough, half the time by default.
    fn maybe_recall(&mut self, item: UnifiedItem<I>, ctx: &SelectionContext<'_>) -> UnifiedItem<I> {
        if item.recall {
            return item;
        }
        let u = &ctx.params.unified;
        let known = ctx
            .items
            .get(&self.recognition_key(&item))
            .is_some_and(|r| r.p_l >= u.recall_pl_threshold);
        if known && self.rng.gen::<f64>() < u.recall_chance {
            return item.as_recall();
        }
        item
    }

    fn wrap_all(family: &str, inner: Vec<I>) -> Vec<UnifiedItem<I>> {
        inner.into_iter().map(|i| UnifiedItem::new(family, i)).collect()
    }
}

fn inner_last<'a, I>(last: Option<&'a UnifiedItem<I>>, family: &str) -> Option<&'a I> {
    last.filter(|l| l.family == family).map(|l| &l.inner)
}

impl<I: Clone + Debug + 'static> ItemConfig for UnifiedConfig<I> {
    type Item = UnifiedItem<I>;

    fn item_key(&self, item: &UnifiedItem<I>) -> String {
        let base = self.recognition_key(item);
        if item.recall {
            format!("{base}{RECALL_SUFFIX}")
        } else {
            base
        }
    }

    /// `base + inner * span`, plus the recall boost, capped at 1.
    fn item_difficulty(&self, item: &UnifiedItem<I>) -> f64 {
        let Some(f) = self.family(&item.family) else {
            return 0.5;
        };
        let d = f.band.base + f.config.item_difficulty(&item.inner) * f.band.span;
        if item.recall {
            (d + self.recall_boost).min(1.0)
        } else {
            d
        }
    }

    fn apply_params(&mut self, params: &Params) {
        self.recall_boost = params.unified.recall_difficulty_boost;
        for f in &mut self.families {
            f.config.apply_params(params);
        }
    }

    fn item_clusters(&self, item: &UnifiedItem<I>) -> Vec<String> {
        let mut clusters = vec![format!("{TYPE_PREFIX}{}", item.family)];
        if let Some(f) = self.family(&item.family) {
            clusters.extend(f.config.item_clusters(&item.inner));
        }
        if item.recall {
            clusters.push(RECALL_CLUSTER.to_string());
        }
        clusters
    }

    fn item_from_key(&self, key: &str) -> Option<UnifiedItem<I>> {
        let (clean, recall) = match key.strip_suffix(RECALL_SUFFIX) {
            Some(k) => (k, true),
            None => (key, false),
        };
        let (family, inner_key) = clean.split_once(':')?;
        let f = self.family(family)?;
        let inner = f.config.item_from_key(inner_key)?;
        let item = UnifiedItem::new(family, inner);
        Some(if recall { item.as_recall() } else { item })
    }

    fn gen_random(&mut self, last: Option<&UnifiedItem<I>>, ctx: &SelectionContext<'_>) -> UnifiedItem<I> {
        let weights = self.family_weights(ctx);
        let idx = self.weighted_pick(&weights);
        let f = &mut self.families[idx];
        let inner = f.config.gen_random(inner_last(last, &f.id), ctx);
        let item = UnifiedItem::new(f.id.clone(), inner);
        self.maybe_recall(item, ctx)
    }

    /// `type_<id>` draws from that family; any other cluster goes to the
    /// first enabled family that can produce it.
    fn gen_from_cluster(
        &mut self,
        cluster: &str,
        last: Option<&UnifiedItem<I>>,
        ctx: &SelectionContext<'_>,
    ) -> Option<UnifiedItem<I>> {
        if let Some(id) = cluster.strip_prefix(TYPE_PREFIX) {
            if let Some(idx) = self.index_of(id) {
                let f = &mut self.families[idx];
                let inner = f.config.gen_random(inner_last(last, &f.id), ctx);
                return Some(UnifiedItem::new(f.id.clone(), inner));
            }
        }
        for f in self.families.iter_mut().filter(|f| f.enabled) {
            if let Some(inner) = f.config.gen_from_cluster(cluster, inner_last(last, &f.id), ctx) {
                return Some(UnifiedItem::new(f.id.clone(), inner));
            }
        }
        None
    }

    fn micro_drill(&mut self, failed: &UnifiedItem<I>) -> Vec<UnifiedItem<I>> {
        match self.index_of(&failed.family) {
            Some(idx) => Self::wrap_all(&failed.family, self.families[idx].config.micro_drill(&failed.inner)),
            None => Vec::new(),
        }
    }

    fn pick_scaffold(&mut self, item: &UnifiedItem<I>, weak_cluster: Option<&str>) -> Vec<UnifiedItem<I>> {
        match self.index_of(&item.family) {
            Some(idx) => Self::wrap_all(
                &item.family,
                self.families[idx].config.pick_scaffold(&item.inner, weak_cluster),
            ),
            None => Vec::new(),
        }
    }

    /// Enabled families theta has reached, easiest first.
    fn families(&self, ctx: &SelectionContext<'_>) -> Vec<Family> {
        let gate = ctx.params.unified.family_gate;
        let mut out: Vec<Family> = self
            .families
            .iter()
            .filter(|f| f.enabled && ctx.theta >= f.band.base - gate)
            .map(|f| Family {
                id: f.id.clone(),
                base_difficulty: f.band.base,
            })
            .collect();
        out.sort_by(|a, b| a.base_difficulty.total_cmp(&b.base_difficulty));
        out
    }

    /// Draws up to a few inner items looking for one under the family's
    /// current ceiling, which opens as theta climbs past the band base.
    fn gen_from_family(
        &mut self,
        family: &str,
        last: Option<&UnifiedItem<I>>,
        ctx: &SelectionContext<'_>,
    ) -> UnifiedItem<I> {
        let Some(idx) = self.index_of(family) else {
            return self.gen_random(last, ctx);
        };
        let f = &mut self.families[idx];
        let progress = ((ctx.theta - f.band.base) / FAMILY_PROGRESS_SPAN).clamp(0.0, 1.0);
        let max_difficulty = f.band.base + progress * FAMILY_PROGRESS_SPAN;
        let prev = inner_last(last, &f.id);

        let mut inner = f.config.gen_random(prev, ctx);
        for _ in 1..FAMILY_DRAW_ATTEMPTS {
            let d = f.band.base + f.config.item_difficulty(&inner) * f.band.span;
            if d <= max_difficulty {
                break;
            }
            inner = f.config.gen_random(prev, ctx);
        }
        let item = UnifiedItem::new(f.id.clone(), inner);
        self.maybe_recall(item, ctx)
    }

    /// Inner features plus the family tag.
    fn item_features(&self, item: &UnifiedItem<I>) -> Option<Vec<(String, String)>> {
        let f = self.family(&item.family)?;
        let mut features = f.config.item_features(&item.inner).unwrap_or_default();
        features.push(("family".to_string(), item.family.clone()));
        Some(features)
    }

    /// Confused items come from the original's own family.
    fn item_for_confusion(
        &mut self,
        original: &UnifiedItem<I>,
        detected: &str,
        ctx: &SelectionContext<'_>,
    ) -> Option<UnifiedItem<I>> {
        let idx = self.index_of(&original.family)?;
        let f = &mut self.families[idx];
        let inner = f.config.item_for_confusion(&original.inner, detected, ctx)?;
        Some(UnifiedItem::new(f.id.clone(), inner))
    }
}
