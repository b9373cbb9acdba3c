//! Adaptive layer: BKT rate estimation, drill effectiveness and
//! feature-level difficulty, all persisted in [`AdaptiveState`].
//!
//! [`AdaptiveState`]: crate::types::AdaptiveState

pub mod difficulty;
pub mod drill_tracker;
pub mod estimators;

pub use difficulty::{feature_difficulty, record_features};
pub use drill_tracker::{adjust_cooldown, effectiveness, DrillTracker};
pub use estimators::{estimate_pg, estimate_ps, estimate_pt, run_estimators, Estimates};

use crate::types::AdaptiveState;

/// Folds fresh estimates into the state. Returns true if any value changed.
pub fn apply_estimates(state: &mut AdaptiveState, est: &Estimates) -> bool {
    let mut changed = false;
    for (slot, value) in [
        (&mut state.p_g, est.p_g),
        (&mut state.p_s, est.p_s),
        (&mut state.p_t, est.p_t),
    ] {
        if let Some(v) = value {
            if *slot != Some(v) {
                *slot = Some(v);
                changed = true;
            }
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_estimates_keeps_missing_values() {
        let mut state = AdaptiveState {
            p_t: Some(0.25),
            ..Default::default()
        };
        let est = Estimates {
            p_g: Some(0.1),
            p_s: None,
            p_t: None,
        };
        assert!(apply_estimates(&mut state, &est));
        assert_eq!(state.p_g, Some(0.1));
        assert_eq!(state.p_t, Some(0.25));
        assert!(!apply_estimates(&mut state, &est));
    }
}
