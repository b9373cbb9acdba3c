//! Engine parameters.
//!
//! Three tiers, lowest to highest priority:
//! - [`constants`] - fixed, never overridable
//! - [`Params::default`] - safe general defaults (tier 2)
//! - per-exercise and per-learner overrides merged by [`resolve`] (tier 3)

pub mod constants;
mod resolve;

pub use constants::{Constants, CONSTANTS};
pub use resolve::{resolve, ParamOverrides, OVERRIDES_ENV};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BktParams {
    #[serde(rename = "pG")]
    pub p_g: f64,
    #[serde(rename = "pS")]
    pub p_s: f64,
    #[serde(rename = "pT")]
    pub p_t: f64,
    /// Correct answers slower than `slow_ratio` x median count as weaker evidence
    pub slow_ratio: f64,
    pub slow_guess_scale: f64,
}

impl Default for BktParams {
    fn default() -> Self {
        Self {
            p_g: 0.05,
            p_s: 0.15,
            p_t: 0.20,
            slow_ratio: 2.0,
            slow_guess_scale: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThetaParams {
    pub initial: f64,
    pub alpha: f64,
    pub lr: f64,
    pub skip_lr: f64,
}

impl Default for ThetaParams {
    fn default() -> Self {
        Self {
            initial: 0.05,
            alpha: 10.0,
            lr: 0.04,
            skip_lr: 0.12,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlateauParams {
    pub window_size: usize,
    pub threshold: f64,
    pub exploration_multiplier: f64,
}

impl Default for PlateauParams {
    fn default() -> Self {
        Self {
            window_size: 5,
            threshold: 0.03,
            exploration_multiplier: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigmaParams {
    pub base: f64,
    pub high_acc_range: [f64; 2],
    pub low_acc_range: [f64; 2],
    pub acc_high_threshold: f64,
    pub acc_low_threshold: f64,
}

impl Default for SigmaParams {
    fn default() -> Self {
        Self {
            base: 0.12,
            high_acc_range: [0.15, 0.25],
            low_acc_range: [0.06, 0.10],
            acc_high_threshold: 0.90,
            acc_low_threshold: 0.80,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OffsetParams {
    pub base: f64,
    pub high_acc_value: f64,
    pub low_acc_value: f64,
}

impl Default for OffsetParams {
    fn default() -> Self {
        Self {
            base: 0.02,
            high_acc_value: 0.05,
            low_acc_value: -0.02,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewUrgencyWeights {
    pub mastered: f64,
    pub unmastered: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageBonusParams {
    pub sparse: f64,
    #[serde(rename = "lowPL")]
    pub low_pl: f64,
    pub min_cell_items: usize,
    #[serde(rename = "lowPLThreshold")]
    pub low_pl_threshold: f64,
    /// Cluster prefix naming the row axis of the coverage grid
    pub row_prefix: String,
    /// Cluster prefix naming the column axis of the coverage grid
    pub column_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StuckThresholds {
    pub repeats: usize,
    #[serde(rename = "pL")]
    pub p_l: f64,
    pub alt_repeats: usize,
    #[serde(rename = "altPL")]
    pub alt_pl: f64,
    pub alt_min_attempts: u32,
    pub alt_penalty: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringParams {
    pub exploitation_cap: f64,
    #[serde(rename = "explorationC")]
    pub exploration_c: f64,
    pub review_urgency: ReviewUrgencyWeights,
    pub confusion_boost: f64,
    pub difficulty_match_weight: f64,
    pub interleave_penalty: f64,
    pub fatigue_bias: f64,
    pub coverage_bonus: CoverageBonusParams,
    pub stuck_penalty: f64,
    pub stuck_thresholds: StuckThresholds,
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self {
            exploitation_cap: 0.6,
            exploration_c: 1.2,
            review_urgency: ReviewUrgencyWeights {
                mastered: 0.3,
                unmastered: 0.5,
            },
            confusion_boost: 0.3,
            difficulty_match_weight: 0.3,
            interleave_penalty: -0.3,
            fatigue_bias: 0.3,
            coverage_bonus: CoverageBonusParams {
                sparse: 0.2,
                low_pl: 0.15,
                min_cell_items: 3,
                low_pl_threshold: 0.3,
                row_prefix: "str_".to_string(),
                column_prefix: "zone_".to_string(),
            },
            stuck_penalty: -1.5,
            stuck_thresholds: StuckThresholds {
                repeats: 2,
                p_l: 0.5,
                alt_repeats: 1,
                alt_pl: 0.3,
                alt_min_attempts: 10,
                alt_penalty: -0.8,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryParams {
    #[serde(rename = "pLThreshold")]
    pub p_l_threshold: f64,
    pub min_attempts: u32,
}

impl Default for MasteryParams {
    fn default() -> Self {
        Self {
            p_l_threshold: 0.80,
            min_attempts: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeThresholds {
    /// Correct within `fast` x median time grades easy
    pub fast: f64,
    /// Correct within `on_time` x median time grades good
    pub on_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FsrsParams {
    pub desired_retention: f64,
    pub grade_thresholds: GradeThresholds,
}

impl Default for FsrsParams {
    fn default() -> Self {
        Self {
            desired_retention: 0.90,
            grade_thresholds: GradeThresholds {
                fast: 0.6,
                on_time: 1.0,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileParams {
    /// Horizon (days) at which FSRS retrievability is compared with pL
    pub horizon_days: f64,
    /// Largest tolerated |pL - R(horizon)|
    pub max_gap: f64,
}

impl Default for ReconcileParams {
    fn default() -> Self {
        Self {
            horizon_days: 7.0,
            max_gap: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MicroDrillParams {
    pub failure_count: usize,
    pub window_size: usize,
    pub cooldown: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfusionDrillParams {
    pub min_occurrences: usize,
    pub cooldown: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrillParams {
    pub micro_drill: MicroDrillParams,
    pub confusion_drill: ConfusionDrillParams,
    pub overdue_max: usize,
}

impl Default for DrillParams {
    fn default() -> Self {
        Self {
            micro_drill: MicroDrillParams {
                failure_count: 3,
                window_size: 5,
                cooldown: 8,
            },
            confusion_drill: ConfusionDrillParams {
                min_occurrences: 2,
                cooldown: 10,
            },
            overdue_max: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FatigueParams {
    pub session_window: usize,
    pub acc_drop_threshold: f64,
    pub rt_increase_threshold: f64,
    pub recovery_threshold: f64,
}

impl Default for FatigueParams {
    fn default() -> Self {
        Self {
            session_window: 20,
            acc_drop_threshold: 0.20,
            rt_increase_threshold: 0.40,
            recovery_threshold: 0.90,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColdStartParams {
    pub min_questions: u32,
}

impl Default for ColdStartParams {
    fn default() -> Self {
        Self { min_questions: 7 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionParams {
    /// Fresh random candidates sampled per scored pick
    pub fresh_candidates: usize,
}

impl Default for SelectionParams {
    fn default() -> Self {
        Self {
            fresh_candidates: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferParams {
    pub cap: f64,
    pub cluster_min_attempts: u32,
}

impl Default for TransferParams {
    fn default() -> Self {
        Self {
            cap: 0.3,
            cluster_min_attempts: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedParams {
    #[serde(rename = "recallPLThreshold")]
    pub recall_pl_threshold: f64,
    pub recall_difficulty_boost: f64,
    pub theta_window: f64,
    pub weakness_boost_scale: f64,
    pub min_type_weight: f64,
    /// Families stay closed while theta < base - family_gate
    pub family_gate: f64,
    pub recall_chance: f64,
}

impl Default for UnifiedParams {
    fn default() -> Self {
        Self {
            recall_pl_threshold: 0.7,
            recall_difficulty_boost: 0.2,
            theta_window: 0.15,
            weakness_boost_scale: 0.5,
            min_type_weight: 0.05,
            family_gate: 0.15,
            recall_chance: 0.5,
        }
    }
}

/// The resolved tier-2/tier-3 parameter bundle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Params {
    pub bkt: BktParams,
    pub theta: ThetaParams,
    pub plateau: PlateauParams,
    pub sigma: SigmaParams,
    pub offset: OffsetParams,
    pub scoring: ScoringParams,
    pub mastery: MasteryParams,
    pub fsrs: FsrsParams,
    pub reconcile: ReconcileParams,
    pub drills: DrillParams,
    pub fatigue: FatigueParams,
    pub cold_start: ColdStartParams,
    pub selection: SelectionParams,
    pub transfer: TransferParams,
    pub unified: UnifiedParams,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_subsystem_keys() {
        let json = serde_json::to_value(Params::default()).unwrap();
        let obj = json.as_object().unwrap();
        for key in [
            "bkt", "theta", "plateau", "sigma", "offset", "scoring", "mastery", "fsrs",
            "reconcile", "drills", "fatigue", "coldStart", "selection", "transfer", "unified",
        ] {
            assert!(obj.contains_key(key), "missing subsystem {key}");
        }
    }

    #[test]
    fn test_default_values() {
        let p = Params::default();
        assert_eq!(p.bkt.p_g, 0.05);
        assert_eq!(p.bkt.p_s, 0.15);
        assert_eq!(p.bkt.p_t, 0.20);
        assert_eq!(p.theta.skip_lr, 0.12);
        assert_eq!(p.scoring.stuck_thresholds.alt_min_attempts, 10);
        assert_eq!(p.drills.micro_drill.cooldown, 8);
        assert_eq!(p.drills.confusion_drill.cooldown, 10);
        assert_eq!(p.cold_start.min_questions, 7);
        assert_eq!(p.sigma.high_acc_range, [0.15, 0.25]);
    }

    #[test]
    fn test_wire_names_follow_saved_config_format() {
        let json = serde_json::to_value(Params::default()).unwrap();
        assert_eq!(json["bkt"]["pG"], 0.05);
        assert_eq!(json["scoring"]["explorationC"], 1.2);
        assert_eq!(json["scoring"]["coverageBonus"]["lowPL"], 0.15);
        assert_eq!(json["mastery"]["pLThreshold"], 0.8);
        assert_eq!(json["unified"]["recallPLThreshold"], 0.7);
    }

    #[test]
    fn test_fsrs_weight_vector_length() {
        assert_eq!(CONSTANTS.fsrs.w.len(), 19);
        assert!((CONSTANTS.fsrs.factor - 19.0 / 81.0).abs() < 1e-15);
    }
}
