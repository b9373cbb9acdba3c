//! Engine orchestrator.
//!
//! [`LearningEngine`] owns one learner's state for one exercise and
//! sequences the models into two calls: [`LearningEngine::next`] picks the
//! item to present and [`LearningEngine::report`] records the outcome.
//!
//! Persistence is best effort. Storage and decode failures are logged and
//! the session continues in memory.

mod views;

pub use views::{
    AdaptiveSummary, ClusterSummary, ItemStats, MasteryReport, OverallStats, TopConfusion,
};

use std::collections::VecDeque;
use std::sync::Arc;

use crate::adaptive::{
    adjust_cooldown, apply_estimates, feature_difficulty, record_features, run_estimators,
    DrillTracker,
};
use crate::config::{ItemConfig, SelectionContext};
use crate::error::ParamError;
use crate::knowledge::{
    adaptive_offset, adaptive_sigma, check_plateau, grade_from_response, reconcile, update_bkt,
    update_fsrs, update_theta,
};
use crate::params::{resolve, ParamOverrides, Params, CONSTANTS};
use crate::persistence::{deserialize, serialize, MemoryStorage, SavedState, StorageAdapter};
use crate::sanitize::{sanitize_record, trim_front};
use crate::selection::{
    build_overdue_queue, confusion_drill_value, confusion_sequence, score_known, score_new,
    should_micro_drill, ScoringContext,
};
use crate::stats;
use crate::store::ItemStore;
use crate::tracking::confusion::record_confusion;
use crate::tracking::{coverage_matrix, FatigueMonitor};
use crate::types::{AdaptiveState, DrillKind, SessionEntry, ThetaSnapshot};

/// Graded attempts a cluster needs before it can be named the weakest.
const SCAFFOLD_MIN_CLUSTER_ATTEMPTS: u32 = 3;

pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Optional context for [`LearningEngine::report`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportMeta {
    /// The learner skipped rather than answered.
    pub skipped: bool,
    /// What the learner produced instead of the target, on a miss.
    pub detected: Option<String>,
}

impl ReportMeta {
    pub fn skipped() -> Self {
        Self {
            skipped: true,
            detected: None,
        }
    }

    pub fn detected(value: impl Into<String>) -> Self {
        Self {
            skipped: false,
            detected: Some(value.into()),
        }
    }
}

fn selection_ctx<'a>(theta: f64, store: &'a ItemStore, params: &'a Params) -> SelectionContext<'a> {
    SelectionContext {
        theta,
        items: store.items(),
        params,
    }
}

pub struct LearningEngine<C: ItemConfig> {
    config: C,
    exercise_id: Option<String>,
    storage: Box<dyn StorageAdapter>,
    overrides: ParamOverrides,
    params: Arc<Params>,

    store: ItemStore,
    question_number: u32,
    total_attempts: u32,
    theta: f64,
    all_correct_times: VecDeque<f64>,
    theta_history: Vec<ThetaSnapshot>,
    plateau: bool,
    fatigue: FatigueMonitor,
    adaptive: AdaptiveState,
    drill_tracker: DrillTracker,

    // ==================== transient ====================
    last_item: Option<C::Item>,
    micro_drill_queue: VecDeque<C::Item>,
    confusion_drill_queue: VecDeque<C::Item>,
    overdue_queue: VecDeque<String>,
    cold_start_visited: Vec<String>,
}

impl<C: ItemConfig> LearningEngine<C> {
    /// Builds an engine and loads any state saved under `exercise_id`.
    /// Without an id nothing is loaded or saved.
    ///
    /// Only invalid `overrides` fail; unreadable saves start fresh.
    pub fn new(
        config: C,
        exercise_id: Option<&str>,
        storage: Box<dyn StorageAdapter>,
        overrides: ParamOverrides,
    ) -> Result<Self, ParamError> {
        let params = resolve(&overrides, &ParamOverrides::new())?;
        let mut engine = Self::assemble(config, exercise_id, storage, overrides, params);
        engine.load();
        Ok(engine)
    }

    /// An unpersisted engine with default parameters.
    pub fn in_memory(config: C) -> Self {
        Self::assemble(
            config,
            None,
            Box::new(MemoryStorage::new()),
            ParamOverrides::new(),
            Arc::new(Params::default()),
        )
    }

    fn assemble(
        mut config: C,
        exercise_id: Option<&str>,
        storage: Box<dyn StorageAdapter>,
        overrides: ParamOverrides,
        params: Arc<Params>,
    ) -> Self {
        config.apply_params(&params);
        Self {
            config,
            exercise_id: exercise_id.map(str::to_string),
            storage,
            overrides,
            theta: params.theta.initial,
            params,
            store: ItemStore::new(),
            question_number: 0,
            total_attempts: 0,
            all_correct_times: VecDeque::new(),
            theta_history: Vec::new(),
            plateau: false,
            fatigue: FatigueMonitor::new(),
            adaptive: AdaptiveState::default(),
            drill_tracker: DrillTracker::new(),
            last_item: None,
            micro_drill_queue: VecDeque::new(),
            confusion_drill_queue: VecDeque::new(),
            overdue_queue: VecDeque::new(),
            cold_start_visited: Vec::new(),
        }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut C {
        &mut self.config
    }

    pub fn store(&self) -> &ItemStore {
        &self.store
    }

    pub fn theta(&self) -> f64 {
        self.theta
    }

    pub fn question_number(&self) -> u32 {
        self.question_number
    }

    pub fn total_attempts(&self) -> u32 {
        self.total_attempts
    }

    pub fn is_fatigued(&self) -> bool {
        self.fatigue.is_fatigued()
    }

    pub fn plateau_detected(&self) -> bool {
        self.plateau
    }

    pub fn adaptive(&self) -> &AdaptiveState {
        &self.adaptive
    }

    pub fn all_correct_times(&self) -> &VecDeque<f64> {
        &self.all_correct_times
    }

    pub fn theta_history(&self) -> &[ThetaSnapshot] {
        &self.theta_history
    }

    pub fn last_item(&self) -> Option<&C::Item> {
        self.last_item.as_ref()
    }

    // ==================== selection ====================

    pub fn next(&mut self) -> C::Item {
        self.next_at(now_ms())
    }

    /// Picks the next item. Branches in strict precedence: cold start,
    /// overdue reviews, micro-drills, confusion drills, scored pool.
    pub fn next_at(&mut self, now_ms: i64) -> C::Item {
        self.question_number += 1;

        if let Some(item) = self.cold_start_pick() {
            return self.present(item);
        }
        if let Some(item) = self.overdue_pick(now_ms) {
            return self.present(item);
        }
        if let Some(item) = self.micro_drill_pick() {
            return self.present(item);
        }
        if let Some(item) = self.confusion_drill_pick() {
            return self.present(item);
        }
        let item = self.scored_pick(now_ms);
        self.present(item)
    }

    fn present(&mut self, item: C::Item) -> C::Item {
        let key = self.ensure_record(&item);
        self.store.track_recent(&key);
        self.last_item = Some(item.clone());
        item
    }

    fn ensure_record(&mut self, item: &C::Item) -> String {
        let key = self.config.item_key(item);
        let config = &self.config;
        self.store
            .ensure_item(&key, || config.item_clusters(item), &self.params.transfer);
        key
    }

    /// One item per open family, easiest unvisited first, then random
    /// generation until the window closes.
    fn cold_start_pick(&mut self) -> Option<C::Item> {
        let q = self.question_number as usize;
        let ctx = selection_ctx(self.theta, &self.store, &self.params);
        let families = self.config.families(&ctx);
        let window = (self.params.cold_start.min_questions as usize).max(families.len());
        if q > window {
            return None;
        }

        let last = self.last_item.as_ref();
        let unvisited = families
            .into_iter()
            .find(|f| !self.cold_start_visited.contains(&f.id));
        if let Some(family) = unvisited {
            tracing::debug!(question = q, family = %family.id, "cold start family pick");
            let item = self.config.gen_from_family(&family.id, last, &ctx);
            self.cold_start_visited.push(family.id);
            return Some(item);
        }
        tracing::debug!(question = q, "cold start random pick");
        Some(self.config.gen_random(last, &ctx))
    }

    fn overdue_pick(&mut self, now_ms: i64) -> Option<C::Item> {
        if self.overdue_queue.is_empty() {
            self.overdue_queue =
                build_overdue_queue(&self.store, now_ms, self.params.drills.overdue_max).into();
        }
        while let Some(key) = self.overdue_queue.pop_front() {
            match self.config.item_from_key(&key) {
                Some(item) => {
                    tracing::debug!(key = %key, "overdue review");
                    return Some(item);
                }
                None => tracing::debug!(key = %key, "dropping overdue key without an item"),
            }
        }
        None
    }

    fn micro_drill_pick(&mut self) -> Option<C::Item> {
        if let Some(item) = self.micro_drill_queue.pop_front() {
            return Some(item);
        }
        let last = self.last_item.clone()?;
        let last_key = self.config.item_key(&last);
        let cooldown = adjust_cooldown(
            self.params.drills.micro_drill.cooldown,
            &self.adaptive.drill_effectiveness,
            DrillKind::MicroDrill,
        );
        let rec = self.store.get_mut(&last_key)?;
        if !should_micro_drill(rec, self.question_number, &self.params.drills.micro_drill, cooldown) {
            return None;
        }

        let mut drills = self.config.micro_drill(&last);
        if drills.is_empty() {
            let weak = self.store.get(&last_key).and_then(|r| {
                self.store
                    .weakest_cluster(&r.clusters, SCAFFOLD_MIN_CLUSTER_ATTEMPTS)
                    .map(str::to_string)
            });
            drills = self.config.pick_scaffold(&last, weak.as_deref());
        }
        if drills.is_empty() {
            return None;
        }

        if let Some(rec) = self.store.get(&last_key) {
            self.drill_tracker.start(DrillKind::MicroDrill, rec);
        }
        tracing::debug!(key = %last_key, len = drills.len(), "micro-drill fired");
        let mut queue: VecDeque<C::Item> = drills.into();
        let first = queue.pop_front();
        self.micro_drill_queue = queue;
        first
    }

    fn confusion_drill_pick(&mut self) -> Option<C::Item> {
        if let Some(item) = self.confusion_drill_queue.pop_front() {
            return Some(item);
        }
        let last = self.last_item.clone()?;
        let last_key = self.config.item_key(&last);
        let cooldown = adjust_cooldown(
            self.params.drills.confusion_drill.cooldown,
            &self.adaptive.drill_effectiveness,
            DrillKind::ConfusionDrill,
        );
        let rec = self.store.get(&last_key)?;
        let value = confusion_drill_value(
            rec,
            self.question_number,
            &self.params.drills.confusion_drill,
            cooldown,
        )?;

        let ctx = selection_ctx(self.theta, &self.store, &self.params);
        let confused = self.config.item_for_confusion(&last, &value, &ctx)?;

        if let Some(rec) = self.store.get_mut(&last_key) {
            rec.last_confusion_drill = Some(self.question_number);
            self.drill_tracker.start(DrillKind::ConfusionDrill, rec);
        }
        tracing::debug!(key = %last_key, confused_with = %value, "confusion drill fired");
        let mut queue: VecDeque<C::Item> = confusion_sequence(&last, &confused).into();
        let first = queue.pop_front();
        self.confusion_drill_queue = queue;
        first
    }

    /// Argmax over every known item plus a few fresh candidates. The first
    /// maximum wins; known items come first, in key order.
    fn scored_pick(&mut self, now_ms: i64) -> C::Item {
        let coverage = coverage_matrix(
            self.store.items().values(),
            &self.params.scoring.coverage_bonus,
        );
        let recent = self.fatigue.outcomes();
        let scoring = ScoringContext {
            params: &self.params,
            store: &self.store,
            coverage: &coverage,
            theta: self.theta,
            total_attempts: self.total_attempts,
            plateau: self.plateau,
            fatigued: self.fatigue.is_fatigued(),
            sigma: adaptive_sigma(self.total_attempts, &recent, &self.params.sigma),
            offset: adaptive_offset(
                self.total_attempts,
                &recent,
                &self.params.sigma,
                &self.params.offset,
            ),
            now_ms,
        };
        let ctx = selection_ctx(self.theta, &self.store, &self.params);
        let last = self.last_item.as_ref();

        let mut best: Option<(C::Item, f64)> = None;
        let mut consider = |item: C::Item, score: f64| {
            if best.as_ref().map_or(true, |(_, b)| score > *b) {
                best = Some((item, score));
            }
        };

        for (key, rec) in self.store.items() {
            let Some(item) = self.config.item_from_key(key) else {
                continue;
            };
            let d = self.config.item_difficulty(&item);
            consider(item, score_known(rec, d, &scoring));
        }
        for _ in 0..self.params.selection.fresh_candidates {
            let item = self.config.gen_random(last, &ctx);
            if self.store.contains(&self.config.item_key(&item)) {
                continue;
            }
            let d = self.config.item_difficulty(&item);
            consider(item, score_new(d, &scoring));
        }

        match best {
            Some((item, score)) => {
                tracing::debug!(score, "scored pick");
                item
            }
            None => {
                tracing::debug!("no candidates; random pick");
                self.config.gen_random(last, &ctx)
            }
        }
    }

    // ==================== reporting ====================

    pub fn report(&mut self, item: &C::Item, ok: bool, time_ms: Option<f64>, meta: &ReportMeta) {
        self.report_at(item, ok, time_ms, meta, now_ms());
    }

    /// Records one outcome through every model, then saves.
    pub fn report_at(
        &mut self,
        item: &C::Item,
        ok: bool,
        time_ms: Option<f64>,
        meta: &ReportMeta,
        now_ms: i64,
    ) {
        let caps = CONSTANTS.history;
        let key = self.ensure_record(item);
        let time = time_ms.filter(|t| t.is_finite() && *t > 0.0);
        self.total_attempts += 1;

        let Some(rec) = self.store.get_mut(&key) else {
            return;
        };
        rec.attempts += 1;
        if ok {
            rec.correct += 1;
        }
        rec.hist.push_back(ok);
        trim_front(&mut rec.hist, caps.max_hist);
        rec.streak = if ok { rec.streak + 1 } else { 0 };

        if let Some(t) = time {
            rec.times.push_back(t);
            trim_front(&mut rec.times, caps.max_times);
            rec.avg_time = stats::mean_or_zero(rec.times.iter().copied());
            if ok {
                self.all_correct_times.push_back(t);
                trim_front(&mut self.all_correct_times, caps.max_correct_times);
            }
        }

        rec.last_seen = self.question_number;
        rec.last_seen_ts = now_ms;

        if !ok {
            if let Some(detected) = meta.detected.as_deref() {
                record_confusion(rec, detected, now_ms);
            }
        }

        let median = stats::median(self.all_correct_times.iter().copied());
        let grade = grade_from_response(ok, time, median, &self.params.fsrs.grade_thresholds);
        update_fsrs(rec, grade, now_ms, self.params.fsrs.desired_retention);
        update_bkt(rec, ok, time, median, &self.params.bkt);
        reconcile(rec, &self.params.reconcile);
        sanitize_record(rec);

        let clusters = rec.clusters.clone();
        self.store.record_clusters(&clusters, ok);

        let difficulty = self.config.item_difficulty(item);
        let lr = if meta.skipped {
            self.params.theta.skip_lr
        } else {
            self.params.theta.lr
        };
        self.theta = update_theta(self.theta, difficulty, ok, lr, self.params.theta.alpha);

        if self.total_attempts % CONSTANTS.cadence.theta_snapshot_every == 0 {
            self.theta_history.push(ThetaSnapshot {
                ts: now_ms,
                theta: self.theta,
            });
            let excess = self.theta_history.len().saturating_sub(caps.max_theta_history);
            self.theta_history.drain(..excess);
        }
        self.plateau = check_plateau(&self.theta_history, &self.params.plateau);

        self.fatigue.push(
            SessionEntry {
                ok,
                time_ms: time.unwrap_or(0.0),
            },
            &self.params.fatigue,
        );

        self.drill_tracker
            .observe(&key, ok, &mut self.adaptive.drill_effectiveness);

        if let Some(features) = self.config.item_features(item) {
            record_features(&mut self.adaptive.feature_error_rates, &features, ok);
        }

        if self.total_attempts % CONSTANTS.cadence.adaptive_every == 0 {
            self.update_adaptive_estimates();
        }

        self.save_at(now_ms);
    }

    /// Re-estimates pG/pS/pT and re-resolves parameters if any moved.
    fn update_adaptive_estimates(&mut self) {
        let estimates = run_estimators(self.store.items().values(), &self.params);
        if !apply_estimates(&mut self.adaptive, &estimates) {
            return;
        }
        self.reresolve_params();
        tracing::info!(
            p_g = ?self.adaptive.p_g,
            p_s = ?self.adaptive.p_s,
            p_t = ?self.adaptive.p_t,
            "adaptive BKT estimates updated"
        );
    }

    fn reresolve_params(&mut self) {
        let adaptive = ParamOverrides::from_adaptive(&self.adaptive);
        match resolve(&self.overrides, &adaptive) {
            Ok(params) => {
                self.config.apply_params(&params);
                self.params = params;
            }
            Err(err) => tracing::warn!(error = %err, "Failed to apply adaptive overrides"),
        }
    }

    /// Mean feature-to-global error ratio for `item`, once enough feature
    /// data exists.
    pub fn feature_difficulty(&self, item: &C::Item) -> Option<f64> {
        let features = self.config.item_features(item)?;
        feature_difficulty(&self.adaptive.feature_error_rates, &features)
    }

    // ==================== persistence ====================

    /// The persisted envelope for the current state.
    pub fn snapshot(&self, now_ms: i64) -> SavedState {
        SavedState {
            ts: now_ms,
            question_number: self.question_number,
            total_attempts: self.total_attempts,
            all_correct_times: self.all_correct_times.clone(),
            items: self.store.items().clone(),
            clusters: self.store.clusters().clone(),
            recent_keys: self.store.recent().iter().cloned().collect(),
            theta: self.theta,
            theta_history: self.theta_history.clone(),
            adaptive: self.adaptive.clone(),
            ..SavedState::default()
        }
    }

    pub fn save(&self) {
        self.save_at(now_ms());
    }

    fn save_at(&self, now_ms: i64) {
        let Some(id) = self.exercise_id.as_deref() else {
            return;
        };
        let raw = match serialize(&self.snapshot(now_ms)) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(error = %err, key = id, "Failed to encode learning state");
                return;
            }
        };
        if let Err(err) = self.storage.set_item(id, &raw) {
            tracing::warn!(error = %err, key = id, "Failed to save learning state");
        }
    }

    fn load(&mut self) {
        let Some(id) = self.exercise_id.clone() else {
            return;
        };
        let raw = match self.storage.get_item(&id) {
            Ok(Some(raw)) => raw,
            Ok(None) => return,
            Err(err) => {
                tracing::warn!(error = %err, key = %id, "Failed to read saved state");
                return;
            }
        };
        let decoded = match deserialize(&raw) {
            Ok(decoded) => decoded,
            Err(err) => {
                tracing::warn!(error = %err, key = %id, "Discarding unusable saved state");
                return;
            }
        };

        let migrated = decoded.was_migrated();
        let from_version = decoded.from_version;
        let s = decoded.state;
        self.store = ItemStore::from_parts(s.items, s.clusters, s.recent_keys);
        self.question_number = s.question_number;
        self.total_attempts = s.total_attempts;
        self.all_correct_times = s.all_correct_times;
        self.theta = s.theta;
        self.theta_history = s.theta_history;
        self.adaptive = s.adaptive;
        self.plateau = check_plateau(&self.theta_history, &self.params.plateau);

        if self.adaptive.has_bkt_estimates() {
            self.reresolve_params();
        }
        if migrated {
            tracing::info!(key = %id, from_version, "re-saving migrated state");
            self.save();
        }
    }

    /// Forgets everything, in memory and in storage.
    pub fn reset(&mut self) {
        if let Some(id) = self.exercise_id.as_deref() {
            if let Err(err) = self.storage.remove_item(id) {
                tracing::warn!(error = %err, key = id, "Failed to remove saved state");
            }
        }
        self.store.clear();
        self.question_number = 0;
        self.total_attempts = 0;
        self.theta = self.params.theta.initial;
        self.all_correct_times.clear();
        self.theta_history.clear();
        self.plateau = false;
        self.fatigue.reset();
        self.adaptive = AdaptiveState::default();
        self.drill_tracker.clear();
        self.last_item = None;
        self.micro_drill_queue.clear();
        self.confusion_drill_queue.clear();
        self.overdue_queue.clear();
        self.cold_start_visited.clear();
        self.reresolve_params();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GridConfig, GridItem, GridSettings};

    const T0: i64 = 1_700_000_000_000;

    fn engine() -> LearningEngine<GridConfig> {
        LearningEngine::in_memory(GridConfig::with_seed(GridSettings::full_neck(), 3))
    }

    #[test]
    fn test_next_creates_record_and_tracks_recent() {
        let mut e = engine();
        let item = e.next_at(T0);
        let key = e.config().item_key(&item);
        assert!(e.store().contains(&key));
        assert_eq!(e.store().recent().back(), Some(&key));
        assert_eq!(e.question_number(), 1);
        assert_eq!(e.last_item(), Some(&item));
    }

    #[test]
    fn test_report_updates_counters_and_buffers() {
        let mut e = engine();
        let item = GridItem::new(0, 3);
        for i in 0..12 {
            e.report_at(&item, i % 3 != 0, Some(900.0 + i as f64), &ReportMeta::default(), T0 + i);
        }
        let rec = e.store().get("s0f3").unwrap();
        assert_eq!(rec.attempts, 12);
        assert_eq!(rec.correct, 8);
        assert_eq!(rec.hist.len(), 5);
        assert_eq!(rec.times.len(), 10);
        assert_eq!(e.all_correct_times().len(), 8);
        assert!(rec.stability > 0.0);
        assert!((0.0..=1.0).contains(&rec.p_l));
        assert_eq!(e.store().cluster("str_0").unwrap().total, 12);
    }

    #[test]
    fn test_missing_time_skips_time_buffers() {
        let mut e = engine();
        let item = GridItem::new(1, 2);
        e.report_at(&item, true, None, &ReportMeta::default(), T0);
        e.report_at(&item, true, Some(0.0), &ReportMeta::default(), T0);
        let rec = e.store().get("s1f2").unwrap();
        assert!(rec.times.is_empty());
        assert_eq!(rec.avg_time, 0.0);
        assert!(e.all_correct_times().is_empty());
    }

    #[test]
    fn test_confusions_only_logged_on_misses() {
        let mut e = engine();
        let item = GridItem::new(0, 3);
        e.report_at(&item, true, None, &ReportMeta::detected("A"), T0);
        e.report_at(&item, false, None, &ReportMeta::detected("A"), T0);
        assert_eq!(e.store().get("s0f3").unwrap().confusions.len(), 1);
    }

    #[test]
    fn test_skip_uses_larger_learning_rate() {
        let mut a = engine();
        let mut b = engine();
        let item = GridItem::new(0, 12);
        a.report_at(&item, false, None, &ReportMeta::default(), T0);
        b.report_at(&item, false, None, &ReportMeta::skipped(), T0);
        assert!(b.theta() < a.theta());
    }

    #[test]
    fn test_theta_snapshot_every_twenty_attempts() {
        let mut e = engine();
        let item = GridItem::new(2, 2);
        for i in 0..41 {
            e.report_at(&item, true, None, &ReportMeta::default(), T0 + i);
        }
        assert_eq!(e.theta_history().len(), 2);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut e = engine();
        let item = e.next_at(T0);
        e.report_at(&item, false, Some(1000.0), &ReportMeta::default(), T0);
        e.reset();
        assert!(e.store().is_empty());
        assert_eq!(e.question_number(), 0);
        assert_eq!(e.total_attempts(), 0);
        assert_eq!(e.theta(), 0.05);
        assert!(e.last_item().is_none());
    }

    #[test]
    fn test_feature_difficulty_needs_evidence() {
        let mut e = engine();
        let hard = GridItem::new(1, 1);
        let easy = GridItem::new(0, 0);
        assert_eq!(e.feature_difficulty(&hard), None);
        for i in 0..10 {
            e.report_at(&hard, false, None, &ReportMeta::default(), T0 + i);
            e.report_at(&easy, true, None, &ReportMeta::default(), T0 + i);
        }
        // 20 reports x 3 features clears the pooled minimum
        let d = e.feature_difficulty(&hard).unwrap();
        assert!(d > 1.0);
    }
}
