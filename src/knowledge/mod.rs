//! Knowledge models: BKT mastery, FSRS memory and the theta ability
//! estimate, plus the step that keeps BKT and FSRS consistent.

pub mod bkt;
pub mod fsrs;
pub mod theta;

pub use bkt::update_bkt;
pub use fsrs::{grade_from_response, retrievability, retrievability_at, update_fsrs};
pub use theta::{adaptive_offset, adaptive_sigma, check_plateau, update_theta};

use crate::params::ReconcileParams;
use crate::sanitize::clamp_unit;
use crate::types::ItemRecord;

/// Caps the gap between `pL` and the FSRS retrievability expected
/// `horizon_days` after the latest review. Only `pL` moves.
pub fn reconcile(rec: &mut ItemRecord, p: &ReconcileParams) {
    if rec.stability <= 0.0 {
        return;
    }
    let target = retrievability(rec.stability, p.horizon_days);
    let gap = rec.p_l - target;
    if gap > p.max_gap {
        rec.p_l = target + p.max_gap;
    } else if gap < -p.max_gap {
        rec.p_l = target - p.max_gap;
    }
    rec.p_l = clamp_unit(rec.p_l);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconcile_caps_divergence() {
        let p = ReconcileParams::default();
        let mut rec = ItemRecord::new("a", vec![]);
        rec.stability = 0.4026;
        rec.p_l = 0.95;
        let target = retrievability(rec.stability, 7.0);
        reconcile(&mut rec, &p);
        assert!((rec.p_l - (target + 0.5)).abs() < 1e-12);
        assert_eq!(rec.stability, 0.4026);
    }

    #[test]
    fn test_reconcile_leaves_close_values() {
        let p = ReconcileParams::default();
        let mut rec = ItemRecord::new("a", vec![]);
        rec.stability = 20.0;
        let target = retrievability(20.0, 7.0);
        rec.p_l = target - 0.2;
        reconcile(&mut rec, &p);
        assert!((rec.p_l - (target - 0.2)).abs() < 1e-12);
    }

    #[test]
    fn test_reconcile_raises_low_pl_for_stable_memory() {
        let p = ReconcileParams::default();
        let mut rec = ItemRecord::new("a", vec![]);
        rec.stability = 100.0;
        rec.p_l = 0.0;
        reconcile(&mut rec, &p);
        assert!(rec.p_l > 0.4 && rec.p_l <= 1.0);
    }

    #[test]
    fn test_reconcile_skips_unreviewed() {
        let mut rec = ItemRecord::new("a", vec![]);
        rec.p_l = 0.9;
        reconcile(&mut rec, &ReconcileParams::default());
        assert_eq!(rec.p_l, 0.9);
    }
}
