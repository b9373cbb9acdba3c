use crate::params::BktParams;
use crate::sanitize::clamp_unit;
use crate::types::ItemRecord;

/// Upper bound on the guess rate after slow-answer scaling.
const MAX_SLOW_GUESS: f64 = 0.5;

/// Guess rate for this observation. A correct answer far slower than the
/// learner's median is weaker evidence of mastery.
pub fn effective_guess(ok: bool, time_ms: Option<f64>, median_ms: Option<f64>, p: &BktParams) -> f64 {
    match (ok, time_ms, median_ms) {
        (true, Some(t), Some(m)) if m > 0.0 && t > p.slow_ratio * m => {
            (p.p_g * p.slow_guess_scale).min(MAX_SLOW_GUESS)
        }
        _ => p.p_g,
    }
}

/// Bayes posterior of mastery given one observation.
pub fn posterior(p_l: f64, ok: bool, p_g: f64, p_s: f64) -> f64 {
    let (num, den) = if ok {
        let num = p_l * (1.0 - p_s);
        (num, num + (1.0 - p_l) * p_g)
    } else {
        let num = p_l * p_s;
        (num, num + (1.0 - p_l) * (1.0 - p_g))
    };
    if den <= 0.0 {
        p_l
    } else {
        num / den
    }
}

pub fn update_bkt(
    rec: &mut ItemRecord,
    ok: bool,
    time_ms: Option<f64>,
    median_ms: Option<f64>,
    p: &BktParams,
) {
    let p_g = effective_guess(ok, time_ms, median_ms, p);
    let post = posterior(rec.p_l, ok, p_g, p.p_s);
    rec.p_l = clamp_unit(post + (1.0 - post) * p.p_t);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> BktParams {
        BktParams::default()
    }

    #[test]
    fn test_correct_raises_mastery() {
        let mut rec = ItemRecord::new("a", vec![]);
        rec.p_l = 0.3;
        update_bkt(&mut rec, true, None, None, &params());
        // post = .255 / (.255 + .035) = .8793, then + .1207 * .2
        assert!((rec.p_l - 0.9034).abs() < 1e-3);
    }

    #[test]
    fn test_wrong_lowers_mastery() {
        let mut rec = ItemRecord::new("a", vec![]);
        rec.p_l = 0.8;
        update_bkt(&mut rec, false, None, None, &params());
        assert!(rec.p_l < 0.8);
    }

    #[test]
    fn test_from_zero_only_transition_applies() {
        let mut rec = ItemRecord::new("a", vec![]);
        update_bkt(&mut rec, false, None, None, &params());
        assert!((rec.p_l - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_slow_correct_is_weaker_evidence() {
        let p = params();
        let mut fast = ItemRecord::new("a", vec![]);
        fast.p_l = 0.3;
        let mut slow = fast.clone();
        update_bkt(&mut fast, true, Some(900.0), Some(1000.0), &p);
        update_bkt(&mut slow, true, Some(2500.0), Some(1000.0), &p);
        assert!(slow.p_l < fast.p_l);
        assert_eq!(effective_guess(true, Some(2500.0), Some(1000.0), &p), 0.1);
        assert_eq!(effective_guess(false, Some(2500.0), Some(1000.0), &p), 0.05);
    }

    #[test]
    fn test_posterior_degenerate_denominator() {
        assert_eq!(posterior(0.0, true, 0.0, 0.1), 0.0);
        assert_eq!(posterior(1.0, false, 0.1, 0.0), 1.0);
    }
}
