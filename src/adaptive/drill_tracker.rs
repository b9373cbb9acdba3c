use std::collections::BTreeMap;

use crate::types::{DrillEffectiveness, DrillKind, ItemRecord};

/// Post-drill reports collected before a drill is judged.
pub const POST_DRILL_ATTEMPTS: usize = 3;
/// Completed evaluations required before a ratio is trusted.
pub const MIN_EVALUATIONS: u32 = 3;

const EFFECTIVE_RATIO: f64 = 0.6;
const INEFFECTIVE_RATIO: f64 = 0.3;
const EFFECTIVE_SCALE: f64 = 0.75;
const INEFFECTIVE_SCALE: f64 = 1.5;

#[derive(Debug, Clone, PartialEq)]
struct PendingDrill {
    kind: DrillKind,
    pre_accuracy: f64,
    outcomes: Vec<bool>,
}

/// Watches drilled items and scores whether each drill helped.
#[derive(Debug, Clone, Default)]
pub struct DrillTracker {
    pending: BTreeMap<String, PendingDrill>,
}

impl DrillTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshots the item's accuracy as a drill fires. A newer drill on
    /// the same item replaces the older one.
    pub fn start(&mut self, kind: DrillKind, rec: &ItemRecord) {
        self.pending.insert(
            rec.key.clone(),
            PendingDrill {
                kind,
                pre_accuracy: rec.recent_accuracy(),
                outcomes: Vec::with_capacity(POST_DRILL_ATTEMPTS),
            },
        );
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.pending.contains_key(key)
    }

    /// Feeds one report. Returns whether the drill helped once it is judged.
    pub fn observe(&mut self, key: &str, ok: bool, eff: &mut DrillEffectiveness) -> Option<bool> {
        let pending = self.pending.get_mut(key)?;
        pending.outcomes.push(ok);
        if pending.outcomes.len() < POST_DRILL_ATTEMPTS {
            return None;
        }
        let done = self.pending.remove(key)?;
        let post = done.outcomes.iter().filter(|o| **o).count() as f64 / done.outcomes.len() as f64;
        let improved = post > done.pre_accuracy;
        let stats = eff.get_mut(done.kind);
        stats.total += 1;
        if improved {
            stats.helped += 1;
        }
        tracing::debug!(
            kind = done.kind.as_str(),
            pre = done.pre_accuracy,
            post,
            improved,
            "drill evaluated"
        );
        Some(improved)
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

/// helped / total once enough drills have been judged.
pub fn effectiveness(eff: &DrillEffectiveness, kind: DrillKind) -> Option<f64> {
    let stats = eff.get(kind);
    (stats.total >= MIN_EVALUATIONS).then(|| stats.helped as f64 / stats.total as f64)
}

/// Shortens the cooldown of drills that work and stretches the ones that don't.
pub fn adjust_cooldown(base: u32, eff: &DrillEffectiveness, kind: DrillKind) -> u32 {
    match effectiveness(eff, kind) {
        Some(r) if r > EFFECTIVE_RATIO => (base as f64 * EFFECTIVE_SCALE).round() as u32,
        Some(r) if r < INEFFECTIVE_RATIO => (base as f64 * INEFFECTIVE_SCALE).round() as u32,
        _ => base,
    }
}
