use crate::params::{constants::FsrsConstants, GradeThresholds, CONSTANTS};
use crate::sanitize::{MAX_DIFFICULTY, MIN_DIFFICULTY, MIN_STABILITY};
use crate::types::{Grade, ItemRecord};

const FSRS: FsrsConstants = CONSTANTS.fsrs;

/// Maps correctness and speed against the learner's median correct time
/// onto an FSRS grade. Without a time or a median, a correct answer is
/// `Good`.
pub fn grade_from_response(
    ok: bool,
    time_ms: Option<f64>,
    median_ms: Option<f64>,
    thresholds: &GradeThresholds,
) -> Grade {
    if !ok {
        return Grade::Fail;
    }
    match (time_ms, median_ms) {
        (Some(t), Some(m)) if t > 0.0 && m > 0.0 => {
            if t <= thresholds.fast * m {
                Grade::Easy
            } else if t <= thresholds.on_time * m {
                Grade::Good
            } else {
                Grade::Hard
            }
        }
        _ => Grade::Good,
    }
}

pub fn retrievability(stability: f64, elapsed_days: f64) -> f64 {
    if stability <= 0.0 {
        return 0.0;
    }
    let safe_elapsed = elapsed_days.max(0.0);
    (1.0 + FSRS.factor * safe_elapsed / stability).powf(FSRS.decay)
}

pub fn elapsed_days(from_ms: i64, to_ms: i64) -> f64 {
    to_ms.saturating_sub(from_ms).max(0) as f64 / FSRS.ms_per_day
}

/// Current recall probability of a reviewed item, 0 before any review.
pub fn retrievability_at(rec: &ItemRecord, now_ms: i64) -> f64 {
    if !rec.has_review_state() {
        return 0.0;
    }
    retrievability(rec.stability, elapsed_days(rec.last_review_ts, now_ms))
}

/// Days until retrievability decays to `desired_retention`.
pub fn next_interval(stability: f64, desired_retention: f64) -> f64 {
    let safe_retention = desired_retention.clamp(0.0001, 0.9999);
    let interval = stability / FSRS.factor * (safe_retention.powf(1.0 / FSRS.decay) - 1.0);
    interval.clamp(0.0, 36500.0)
}

/// Applies one review to the record's S/D/due.
pub fn update_fsrs(rec: &mut ItemRecord, grade: Grade, now_ms: i64, desired_retention: f64) {
    let w = &FSRS.w;
    let g = grade.value();

    let (stability, difficulty) = if rec.stability <= 0.0 {
        (initial_stability(w, g), initial_difficulty(w, g))
    } else {
        let elapsed = elapsed_days(rec.last_review_ts, now_ms);
        let r = retrievability(rec.stability, elapsed);
        let d = next_difficulty(w, rec.difficulty, g);
        let s = if elapsed < 1.0 {
            short_term_stability(w, rec.stability, g)
        } else if grade == Grade::Fail {
            next_forget_stability(w, rec.difficulty, rec.stability, r)
        } else {
            next_recall_stability(w, rec.difficulty, rec.stability, r, g)
        };
        (s, d)
    };

    rec.stability = stability.max(MIN_STABILITY);
    rec.difficulty = difficulty.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY);
    rec.last_review_ts = now_ms;
    let interval = next_interval(rec.stability, desired_retention);
    rec.due = now_ms + (interval * FSRS.ms_per_day).round() as i64;
}

fn initial_stability(w: &[f64; 19], grade: i32) -> f64 {
    w[(grade - 1) as usize].max(MIN_STABILITY)
}

fn initial_difficulty(w: &[f64; 19], grade: i32) -> f64 {
    let d = w[4] - (w[5] * (grade - 1) as f64).exp() + 1.0;
    d.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
}

fn next_difficulty(w: &[f64; 19], d: f64, grade: i32) -> f64 {
    let delta = -w[6] * (grade - 3) as f64;
    let damped = d + delta * (MAX_DIFFICULTY - d) / 9.0;
    let reverted = w[7] * initial_difficulty(w, Grade::Easy.value()) + (1.0 - w[7]) * damped;
    reverted.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
}

fn short_term_stability(w: &[f64; 19], s: f64, grade: i32) -> f64 {
    s * (w[17] * ((grade - 3) as f64 + w[18])).exp()
}

fn next_recall_stability(w: &[f64; 19], d: f64, s: f64, r: f64, grade: i32) -> f64 {
    let hard_penalty = if grade == Grade::Hard.value() { w[15] } else { 1.0 };
    let easy_bonus = if grade == Grade::Easy.value() { w[16] } else { 1.0 };

    s * (1.0
        + w[8].exp()
            * (11.0 - d)
            * s.powf(-w[9])
            * ((1.0 - r) * w[10]).exp_m1()
            * hard_penalty
            * easy_bonus)
}

fn next_forget_stability(w: &[f64; 19], d: f64, s: f64, r: f64) -> f64 {
    let new_s =
        w[11] * d.powf(-w[12]) * ((s + 1.0).powf(w[13]) - 1.0) * ((1.0 - r) * w[14]).exp();
    new_s.min(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: i64 = 86_400_000;
    const T0: i64 = 1_700_000_000_000;

    fn thresholds() -> GradeThresholds {
        GradeThresholds {
            fast: 0.6,
            on_time: 1.0,
        }
    }

    #[test]
    fn test_grade_from_response() {
        let th = thresholds();
        assert_eq!(grade_from_response(false, Some(100.0), Some(1000.0), &th), Grade::Fail);
        assert_eq!(grade_from_response(true, Some(600.0), Some(1000.0), &th), Grade::Easy);
        assert_eq!(grade_from_response(true, Some(900.0), Some(1000.0), &th), Grade::Good);
        assert_eq!(grade_from_response(true, Some(1500.0), Some(1000.0), &th), Grade::Hard);
        assert_eq!(grade_from_response(true, None, Some(1000.0), &th), Grade::Good);
        assert_eq!(grade_from_response(true, Some(500.0), None, &th), Grade::Good);
    }

    #[test]
    fn test_retrievability_decay() {
        let r_0 = retrievability(10.0, 0.0);
        let r_5 = retrievability(10.0, 5.0);
        let r_10 = retrievability(10.0, 10.0);
        assert!((r_0 - 1.0).abs() < 1e-12);
        assert!(r_0 > r_5);
        assert!(r_5 > r_10);
        assert_eq!(retrievability(0.0, 3.0), 0.0);
    }

    #[test]
    fn test_elapsed_days_saturates_on_extreme_timestamps() {
        assert_eq!(elapsed_days(T0, T0 - DAY), 0.0);
        assert_eq!(elapsed_days(i64::MAX, T0), 0.0);
        let far = elapsed_days(i64::MIN, T0);
        assert!(far.is_finite() && far > 0.0);
    }

    #[test]
    fn test_retrievability_at_stability_is_ninety_percent() {
        let r = retrievability(7.0, 7.0);
        assert!((r - 0.9).abs() < 1e-3);
    }

    #[test]
    fn test_interval_matches_stability_at_default_retention() {
        assert!((next_interval(4.0, 0.9) - 4.0).abs() < 0.01);
        assert!(next_interval(4.0, 0.95) < next_interval(4.0, 0.8));
    }

    #[test]
    fn test_first_review_initializes_state() {
        let mut rec = ItemRecord::new("a", vec![]);
        update_fsrs(&mut rec, Grade::Good, T0, 0.9);
        assert!((rec.stability - 3.173).abs() < 1e-9);
        assert!(rec.difficulty > 5.0 && rec.difficulty < 5.5);
        assert_eq!(rec.last_review_ts, T0);
        assert!(rec.due > T0 + 3 * DAY && rec.due < T0 + 4 * DAY);

        let mut failed = ItemRecord::new("b", vec![]);
        update_fsrs(&mut failed, Grade::Fail, T0, 0.9);
        assert!((failed.stability - 0.4026).abs() < 1e-9);
        assert!(failed.difficulty > rec.difficulty);
    }

    #[test]
    fn test_success_after_gap_grows_stability() {
        let mut rec = ItemRecord::new("a", vec![]);
        update_fsrs(&mut rec, Grade::Good, T0, 0.9);
        let s1 = rec.stability;
        update_fsrs(&mut rec, Grade::Good, T0 + 3 * DAY, 0.9);
        assert!(rec.stability > s1);
    }

    #[test]
    fn test_failure_never_raises_stability() {
        let mut rec = ItemRecord::new("a", vec![]);
        update_fsrs(&mut rec, Grade::Easy, T0, 0.9);
        let s1 = rec.stability;
        let d1 = rec.difficulty;
        update_fsrs(&mut rec, Grade::Fail, T0 + 10 * DAY, 0.9);
        assert!(rec.stability <= s1);
        assert!(rec.difficulty > d1);
    }

    #[test]
    fn test_same_day_review_is_damped() {
        let mut rec = ItemRecord::new("a", vec![]);
        update_fsrs(&mut rec, Grade::Good, T0, 0.9);
        let s1 = rec.stability;
        update_fsrs(&mut rec, Grade::Good, T0 + 60_000, 0.9);
        // e^(w17 * w18) growth only
        let expected = s1 * (0.517_f64 * 0.662).exp();
        assert!((rec.stability - expected).abs() < 1e-9);
    }

    #[test]
    fn test_difficulty_stays_in_range() {
        let mut rec = ItemRecord::new("a", vec![]);
        let mut now = T0;
        for _ in 0..40 {
            update_fsrs(&mut rec, Grade::Fail, now, 0.9);
            now += 2 * DAY;
        }
        assert!(rec.difficulty <= 10.0);
        for _ in 0..40 {
            update_fsrs(&mut rec, Grade::Easy, now, 0.9);
            now += 2 * DAY;
        }
        assert!(rec.difficulty >= 1.0);
        assert!(rec.stability >= MIN_STABILITY);
    }
}
