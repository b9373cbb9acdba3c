use crate::params::{OffsetParams, PlateauParams, SigmaParams};
use crate::types::ThetaSnapshot;

/// Minimum attempts (and recent-window size) before sigma/offset adapt.
const MIN_ADAPT_SAMPLES: usize = 10;
const RECENT_WINDOW: usize = 20;

pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Logistic ability update against an item of `difficulty`, clamped to [0,1].
pub fn update_theta(theta: f64, difficulty: f64, ok: bool, lr: f64, alpha: f64) -> f64 {
    let expected = sigmoid(alpha * (theta - difficulty));
    let next = if ok {
        theta + lr * (1.0 - expected)
    } else {
        theta - lr * expected
    };
    next.clamp(0.0, 1.0)
}

/// True iff the spread of the last `window_size` snapshots is below the
/// threshold. Needs a full window.
pub fn check_plateau(history: &[ThetaSnapshot], p: &PlateauParams) -> bool {
    if p.window_size == 0 || history.len() < p.window_size {
        return false;
    }
    let recent = &history[history.len() - p.window_size..];
    let (lo, hi) = recent
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
            (lo.min(s.theta), hi.max(s.theta))
        });
    hi - lo < p.threshold
}

fn recent_accuracy(total_attempts: u32, recent: &[bool]) -> Option<f64> {
    if (total_attempts as usize) < MIN_ADAPT_SAMPLES {
        return None;
    }
    let slice = &recent[recent.len().saturating_sub(RECENT_WINDOW)..];
    if slice.len() < MIN_ADAPT_SAMPLES {
        return None;
    }
    Some(slice.iter().filter(|ok| **ok).count() as f64 / slice.len() as f64)
}

/// Width of the target-difficulty Gaussian given recent accuracy.
pub fn adaptive_sigma(total_attempts: u32, recent: &[bool], p: &SigmaParams) -> f64 {
    match recent_accuracy(total_attempts, recent) {
        Some(acc) if acc > p.acc_high_threshold => {
            (p.high_acc_range[0] + (acc - p.acc_high_threshold)).min(p.high_acc_range[1])
        }
        Some(acc) if acc < p.acc_low_threshold => {
            (p.low_acc_range[0] + acc * 0.05).min(p.low_acc_range[1])
        }
        _ => p.base,
    }
}

/// Shift of the target difficulty above theta given recent accuracy.
pub fn adaptive_offset(
    total_attempts: u32,
    recent: &[bool],
    sigma: &SigmaParams,
    p: &OffsetParams,
) -> f64 {
    match recent_accuracy(total_attempts, recent) {
        Some(acc) if acc > sigma.acc_high_threshold => p.high_acc_value,
        Some(acc) if acc < sigma.acc_low_threshold => p.low_acc_value,
        _ => p.base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snaps(values: &[f64]) -> Vec<ThetaSnapshot> {
        values
            .iter()
            .enumerate()
            .map(|(i, &theta)| ThetaSnapshot { ts: i as i64, theta })
            .collect()
    }

    #[test]
    fn test_theta_update_reference_value() {
        let next = update_theta(0.05, 0.5, true, 0.04, 10.0);
        let expected = sigmoid(-4.5);
        assert!((expected - 0.0110).abs() < 1e-4);
        assert!((next - 0.0896).abs() < 1e-4);
    }

    #[test]
    fn test_theta_clamped() {
        assert_eq!(update_theta(0.0, 0.0, false, 0.5, 10.0), 0.0);
        assert_eq!(update_theta(1.0, 0.0, true, 5.0, 10.0), 1.0);
    }

    #[test]
    fn test_plateau() {
        let p = PlateauParams::default();
        assert!(!check_plateau(&snaps(&[0.4, 0.41, 0.4, 0.41]), &p));
        assert!(check_plateau(&snaps(&[0.1, 0.4, 0.41, 0.4, 0.41, 0.42]), &p));
        assert!(!check_plateau(&snaps(&[0.4, 0.41, 0.5, 0.41, 0.42]), &p));
    }

    #[test]
    fn test_sigma_and_offset_need_evidence() {
        let s = SigmaParams::default();
        let o = OffsetParams::default();
        let all_ok = vec![true; 20];
        assert_eq!(adaptive_sigma(5, &all_ok, &s), s.base);
        assert_eq!(adaptive_sigma(30, &all_ok[..8], &s), s.base);
        assert_eq!(adaptive_offset(5, &all_ok, &s, &o), o.base);
    }

    #[test]
    fn test_sigma_widens_on_high_accuracy() {
        let s = SigmaParams::default();
        let o = OffsetParams::default();
        let all_ok = vec![true; 20];
        assert!((adaptive_sigma(40, &all_ok, &s) - 0.25).abs() < 1e-12);
        assert_eq!(adaptive_offset(40, &all_ok, &s, &o), 0.05);
    }

    #[test]
    fn test_sigma_narrows_on_low_accuracy() {
        let s = SigmaParams::default();
        let o = OffsetParams::default();
        let half: Vec<bool> = (0..20).map(|i| i % 2 == 0).collect();
        assert!((adaptive_sigma(40, &half, &s) - 0.085).abs() < 1e-12);
        assert_eq!(adaptive_offset(40, &half, &s, &o), -0.02);
    }
}
