//! Data Sanitization
//!
//! Numerical guards applied to learner records after every update and to
//! anything read back from storage.

use crate::params::CONSTANTS;
use crate::types::ItemRecord;

pub const MIN_DIFFICULTY: f64 = 1.0;
pub const MAX_DIFFICULTY: f64 = 10.0;
pub const MIN_STABILITY: f64 = 0.01;

pub fn is_valid(x: f64) -> bool {
    x.is_finite()
}

/// Clamps `x` into [lo, hi]; NaN and infinities collapse to `fallback`.
pub fn clamp_or(x: f64, lo: f64, hi: f64, fallback: f64) -> f64 {
    if is_valid(x) {
        x.clamp(lo, hi)
    } else {
        fallback
    }
}

pub fn clamp_unit(x: f64) -> f64 {
    clamp_or(x, 0.0, 1.0, 0.0)
}

/// Restores the per-record invariants: `pL` in [0,1], `S >= 0`,
/// `D` in [1,10], non-negative timestamps, and every buffer within its cap.
pub fn sanitize_record(rec: &mut ItemRecord) {
    let caps = CONSTANTS.history;
    rec.p_l = clamp_unit(rec.p_l);
    rec.stability = if is_valid(rec.stability) {
        rec.stability.max(0.0)
    } else {
        0.0
    };
    rec.difficulty = clamp_or(rec.difficulty, MIN_DIFFICULTY, MAX_DIFFICULTY, 5.0);
    if !is_valid(rec.avg_time) || rec.avg_time < 0.0 {
        rec.avg_time = 0.0;
    }
    rec.last_review_ts = rec.last_review_ts.max(0);
    rec.due = rec.due.max(0);
    rec.last_seen_ts = rec.last_seen_ts.max(0);
    rec.times.retain(|t| is_valid(*t) && *t > 0.0);
    trim_front(&mut rec.hist, caps.max_hist);
    trim_front(&mut rec.times, caps.max_times);
    trim_front(&mut rec.confusions, caps.max_confusions);
    if rec.correct > rec.attempts {
        rec.correct = rec.attempts;
    }
}

/// Drops the oldest entries until `buf.len() <= cap`.
pub fn trim_front<T>(buf: &mut std::collections::VecDeque<T>, cap: usize) {
    while buf.len() > cap {
        buf.pop_front();
    }
}

/// Invariant check used by tests and debug assertions.
pub fn record_is_sane(rec: &ItemRecord) -> bool {
    let caps = CONSTANTS.history;
    (0.0..=1.0).contains(&rec.p_l)
        && rec.stability >= 0.0
        && (MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&rec.difficulty)
        && rec.hist.len() <= caps.max_hist
        && rec.times.len() <= caps.max_times
        && rec.confusions.len() <= caps.max_confusions
        && rec.last_review_ts >= 0
        && rec.due >= 0
        && rec.last_seen_ts >= 0
}
