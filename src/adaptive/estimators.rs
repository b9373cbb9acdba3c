//! Per-learner BKT rate estimation from pooled record evidence.

use crate::params::Params;
use crate::types::ItemRecord;

pub const PG_RANGE: (f64, f64) = (0.01, 0.20);
pub const PS_RANGE: (f64, f64) = (0.02, 0.30);
pub const PT_RANGE: (f64, f64) = (0.05, 0.40);

const PG_MAX_PL: f64 = 0.1;
const PG_MIN_ATTEMPTS: u32 = 20;
const PS_MIN_PL: f64 = 0.9;
const PS_MIN_ITEM_ATTEMPTS: u32 = 5;
const PS_MIN_ITEMS: usize = 5;
/// Mean attempts on mastered items below which learning counts as fast
const PT_FAST_ATTEMPTS: f64 = 5.0;
/// Mean attempts on mastered items above which learning counts as slow
const PT_SLOW_ATTEMPTS: f64 = 12.0;
const PT_FAST_SCALE: f64 = 1.3;
const PT_SLOW_SCALE: f64 = 0.7;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Estimates {
    pub p_g: Option<f64>,
    pub p_s: Option<f64>,
    pub p_t: Option<f64>,
}

/// Guess rate: pooled accuracy on items the learner has not learned.
pub fn estimate_pg<'a>(items: impl IntoIterator<Item = &'a ItemRecord>) -> Option<f64> {
    let (correct, attempts) = items
        .into_iter()
        .filter(|r| r.p_l < PG_MAX_PL)
        .fold((0u32, 0u32), |(c, a), r| (c + r.correct, a + r.attempts));
    if attempts < PG_MIN_ATTEMPTS {
        return None;
    }
    Some((correct as f64 / attempts as f64).clamp(PG_RANGE.0, PG_RANGE.1))
}

/// Slip rate: pooled error rate on well-practised mastered items.
pub fn estimate_ps<'a>(items: impl IntoIterator<Item = &'a ItemRecord>) -> Option<f64> {
    let mastered: Vec<&ItemRecord> = items
        .into_iter()
        .filter(|r| r.p_l > PS_MIN_PL && r.attempts >= PS_MIN_ITEM_ATTEMPTS)
        .collect();
    if mastered.len() < PS_MIN_ITEMS {
        return None;
    }
    let (errors, attempts) = mastered.iter().fold((0u32, 0u32), |(e, a), r| {
        (e + r.attempts.saturating_sub(r.correct), a + r.attempts)
    });
    Some((errors as f64 / attempts as f64).clamp(PS_RANGE.0, PS_RANGE.1))
}

/// Transition-rate adjustment from how many attempts mastered items took.
/// None when learning speed looks ordinary.
pub fn estimate_pt<'a>(
    items: impl IntoIterator<Item = &'a ItemRecord>,
    current_pt: f64,
    mastery_threshold: f64,
) -> Option<f64> {
    let attempts: Vec<f64> = items
        .into_iter()
        .filter(|r| r.p_l >= mastery_threshold && r.attempts > 0)
        .map(|r| r.attempts as f64)
        .collect();
    let avg = crate::stats::mean(attempts)?;
    let scale = if avg < PT_FAST_ATTEMPTS {
        PT_FAST_SCALE
    } else if avg > PT_SLOW_ATTEMPTS {
        PT_SLOW_SCALE
    } else {
        return None;
    };
    Some((current_pt * scale).clamp(PT_RANGE.0, PT_RANGE.1))
}

pub fn run_estimators<'a, I>(items: I, params: &Params) -> Estimates
where
    I: IntoIterator<Item = &'a ItemRecord> + Clone,
{
    Estimates {
        p_g: estimate_pg(items.clone()),
        p_s: estimate_ps(items.clone()),
        p_t: estimate_pt(items, params.bkt.p_t, params.mastery.p_l_threshold),
    }
}
