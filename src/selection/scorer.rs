//! Candidate scoring for the adaptive pick.

use serde::Serialize;

use crate::knowledge::fsrs::retrievability_at;
use crate::params::{MasteryParams, Params};
use crate::stats;
use crate::store::ItemStore;
use crate::tracking::confusion::recent_confusion_hits;
use crate::tracking::coverage::{coverage_bonus, CoverageMatrix};
use crate::types::ItemRecord;

/// Recent items checked for cluster overlap.
const INTERLEAVE_LOOKBACK: usize = 2;
/// Confusion-log hits needed for the confusion boost.
const CONFUSION_MIN_HITS: usize = 2;
const TARGET_TIME_MIN_SAMPLES: usize = 5;
const TARGET_TIME_PERCENTILE: f64 = 0.75;
const TARGET_TIME_PL_DISCOUNT: f64 = 0.4;

/// Everything the scorer reads besides the candidate itself.
pub struct ScoringContext<'a> {
    pub params: &'a Params,
    pub store: &'a ItemStore,
    pub coverage: &'a CoverageMatrix,
    pub theta: f64,
    pub total_attempts: u32,
    pub plateau: bool,
    pub fatigued: bool,
    /// Adaptive width of the target-difficulty Gaussian
    pub sigma: f64,
    /// Adaptive shift of the target difficulty above theta
    pub offset: f64,
    pub now_ms: i64,
}

/// Per-term score of a known candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub exploitation: f64,
    pub exploration: f64,
    pub review_urgency: f64,
    pub confusion_boost: f64,
    pub difficulty_match: f64,
    pub interleave_penalty: f64,
    pub fatigue_bias: f64,
    pub coverage_bonus: f64,
    pub stuck_penalty: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        self.exploitation
            + self.exploration
            + self.review_urgency
            + self.confusion_boost
            + self.difficulty_match
            + self.interleave_penalty
            + self.fatigue_bias
            + self.coverage_bonus
            + self.stuck_penalty
    }
}

fn gaussian(x: f64, mu: f64, sigma: f64) -> f64 {
    if sigma <= 0.0 {
        return if x == mu { 1.0 } else { 0.0 };
    }
    (-(x - mu).powi(2) / (2.0 * sigma * sigma)).exp()
}

/// A never-seen candidate: difficulty match against theta + offset only.
pub fn score_new(difficulty: f64, ctx: &ScoringContext<'_>) -> f64 {
    gaussian(difficulty, ctx.theta + ctx.offset, ctx.sigma)
}

pub fn score_known(rec: &ItemRecord, difficulty: f64, ctx: &ScoringContext<'_>) -> f64 {
    breakdown(rec, difficulty, ctx).total()
}

pub fn breakdown(rec: &ItemRecord, difficulty: f64, ctx: &ScoringContext<'_>) -> ScoreBreakdown {
    let sp = &ctx.params.scoring;
    let boost = if ctx.plateau {
        ctx.params.plateau.exploration_multiplier
    } else {
        1.0
    };

    let exploitation = (1.0 - rec.p_l).min(sp.exploitation_cap);

    let exploration = sp.exploration_c
        * boost
        * (((ctx.total_attempts as f64) + 1.0).ln() / (rec.attempts.max(1) as f64)).sqrt();

    let review_urgency = if rec.has_review_state() {
        let weight = if is_mastered(rec, &ctx.params.mastery) {
            sp.review_urgency.mastered
        } else {
            sp.review_urgency.unmastered
        };
        (1.0 - retrievability_at(rec, ctx.now_ms)) * weight
    } else {
        0.0
    };

    let confusion_boost = if recent_confusion_hits(ctx.store, &rec.key) >= CONFUSION_MIN_HITS {
        sp.confusion_boost
    } else {
        0.0
    };

    let difficulty_match =
        sp.difficulty_match_weight * gaussian(difficulty, ctx.theta, ctx.sigma * boost);

    let interleave_penalty = if shares_cluster_with_recent(rec, ctx.store) {
        sp.interleave_penalty
    } else {
        0.0
    };

    let fatigue_bias = if ctx.fatigued {
        rec.p_l * sp.fatigue_bias
    } else {
        0.0
    };

    let coverage_bonus = coverage_bonus(&rec.clusters, ctx.coverage, &sp.coverage_bonus);

    ScoreBreakdown {
        exploitation,
        exploration,
        review_urgency,
        confusion_boost,
        difficulty_match,
        interleave_penalty,
        fatigue_bias,
        coverage_bonus,
        stuck_penalty: stuck_penalty(rec, ctx),
    }
}

fn shares_cluster_with_recent(rec: &ItemRecord, store: &ItemStore) -> bool {
    store
        .recent()
        .iter()
        .rev()
        .take(INTERLEAVE_LOOKBACK)
        .filter_map(|k| store.get(k))
        .any(|prev| rec.shares_cluster_with(prev))
}

fn stuck_penalty(rec: &ItemRecord, ctx: &ScoringContext<'_>) -> f64 {
    let sp = &ctx.params.scoring;
    let th = &sp.stuck_thresholds;
    let repeats = ctx.store.recent().iter().filter(|k| **k == rec.key).count();
    if repeats >= th.repeats && rec.p_l < th.p_l {
        sp.stuck_penalty
    } else if repeats >= th.alt_repeats && rec.p_l < th.alt_pl && rec.attempts >= th.alt_min_attempts {
        th.alt_penalty
    } else {
        0.0
    }
}

pub fn is_mastered(rec: &ItemRecord, p: &MasteryParams) -> bool {
    rec.p_l >= p.p_l_threshold && rec.attempts >= p.min_attempts
}

/// Fluency target: the learner's 75th-percentile correct time, tightened
/// as mastery grows. Needs a handful of samples.
pub fn target_time<'a>(correct_times: impl IntoIterator<Item = &'a f64>, p_l: f64) -> Option<f64> {
    let times: Vec<f64> = correct_times.into_iter().copied().collect();
    if times.len() < TARGET_TIME_MIN_SAMPLES {
        return None;
    }
    stats::percentile(times, TARGET_TIME_PERCENTILE).map(|p75| p75 * (1.0 - TARGET_TIME_PL_DISCOUNT * p_l))
}
