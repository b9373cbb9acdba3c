//! Common Types
//!
//! Records and counters shared across the knowledge, selection and
//! persistence modules. Field names on the wire follow the saved-state
//! format (`S`, `D`, `pL`, camelCase elsewhere).

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

// ==================== Item Records ====================

/// One mis-detected value logged against an item after a failed attempt.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConfusionEntry {
    /// The value the learner actually produced
    pub detected: String,
    /// Wall-clock timestamp (ms)
    pub ts: i64,
}

/// Per-item learning record, created on first encounter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemRecord {
    /// Map key; restored from the owning map on load
    #[serde(skip)]
    pub key: String,
    /// FSRS stability (days), 0 before the first review
    #[serde(rename = "S")]
    pub stability: f64,
    /// FSRS difficulty [1, 10]
    #[serde(rename = "D")]
    pub difficulty: f64,
    pub last_review_ts: i64,
    pub due: i64,
    /// BKT mastery probability [0, 1]
    #[serde(rename = "pL")]
    pub p_l: f64,
    pub attempts: u32,
    pub correct: u32,
    pub times: VecDeque<f64>,
    pub avg_time: f64,
    /// Question index of the last report
    pub last_seen: u32,
    pub last_seen_ts: i64,
    pub hist: VecDeque<bool>,
    pub streak: u32,
    pub clusters: Vec<String>,
    pub confusions: VecDeque<ConfusionEntry>,
    pub cents_history: Vec<f64>,
    pub avg_cents: Option<f64>,
    pub technique_scores: Vec<serde_json::Value>,
    /// Question index of the last micro-drill; session-local
    #[serde(skip)]
    pub last_micro_drill: Option<u32>,
    /// Question index of the last confusion drill; session-local
    #[serde(skip)]
    pub last_confusion_drill: Option<u32>,
}

impl Default for ItemRecord {
    fn default() -> Self {
        Self {
            key: String::new(),
            stability: 0.0,
            difficulty: 5.0,
            last_review_ts: 0,
            due: 0,
            p_l: 0.0,
            attempts: 0,
            correct: 0,
            times: VecDeque::new(),
            avg_time: 0.0,
            last_seen: 0,
            last_seen_ts: 0,
            hist: VecDeque::new(),
            streak: 0,
            clusters: Vec::new(),
            confusions: VecDeque::new(),
            cents_history: Vec::new(),
            avg_cents: None,
            technique_scores: Vec::new(),
            last_micro_drill: None,
            last_confusion_drill: None,
        }
    }
}

impl ItemRecord {
    pub fn new(key: impl Into<String>, clusters: Vec<String>) -> Self {
        Self {
            key: key.into(),
            clusters,
            ..Default::default()
        }
    }

    /// True once the item has been through at least one FSRS review.
    pub fn has_review_state(&self) -> bool {
        self.stability > 0.0 && self.last_review_ts > 0
    }

    /// Fraction of correct answers in the recent history window.
    pub fn recent_accuracy(&self) -> f64 {
        if self.hist.is_empty() {
            return 0.0;
        }
        self.hist.iter().filter(|ok| **ok).count() as f64 / self.hist.len() as f64
    }

    pub fn shares_cluster_with(&self, other: &ItemRecord) -> bool {
        self.clusters.iter().any(|c| other.clusters.contains(c))
    }
}

/// Aggregate counters for one cluster tag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterStats {
    pub correct: u32,
    pub total: u32,
}

impl ClusterStats {
    pub fn record(&mut self, ok: bool) {
        if ok {
            self.correct += 1;
        }
        self.total += 1;
    }

    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }
}

// ==================== Engine State ====================

/// Theta snapshot taken every few attempts for plateau detection.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThetaSnapshot {
    pub ts: i64,
    pub theta: f64,
}

/// One entry of the in-session fatigue window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionEntry {
    pub ok: bool,
    /// Response time in ms, 0 when unknown
    pub time_ms: f64,
}

/// FSRS review grade derived from correctness and speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    Fail = 1,
    Hard = 2,
    Good = 3,
    Easy = 4,
}

impl Grade {
    pub fn value(self) -> i32 {
        self as i32
    }

    pub fn is_pass(self) -> bool {
        self != Grade::Fail
    }
}

// ==================== Adaptive State ====================

/// Remedial drill families tracked for effectiveness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DrillKind {
    MicroDrill,
    ConfusionDrill,
}

impl DrillKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MicroDrill => "microDrill",
            Self::ConfusionDrill => "confusionDrill",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrillStats {
    pub helped: u32,
    pub total: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DrillEffectiveness {
    pub micro_drill: DrillStats,
    pub confusion_drill: DrillStats,
}

impl DrillEffectiveness {
    pub fn get(&self, kind: DrillKind) -> &DrillStats {
        match kind {
            DrillKind::MicroDrill => &self.micro_drill,
            DrillKind::ConfusionDrill => &self.confusion_drill,
        }
    }

    pub fn get_mut(&mut self, kind: DrillKind) -> &mut DrillStats {
        match kind {
            DrillKind::MicroDrill => &mut self.micro_drill,
            DrillKind::ConfusionDrill => &mut self.confusion_drill,
        }
    }
}

/// Correct/total tally for one `feature_value` key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureTally {
    pub correct: u32,
    pub total: u32,
}

/// Audio calibration placeholders carried in the saved state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AudioFeatures {
    pub calibrated_noise_floor: Option<f64>,
    pub avg_onset_strength: Option<f64>,
}

/// Per-learner estimates, persisted with the engine state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdaptiveState {
    #[serde(rename = "pG")]
    pub p_g: Option<f64>,
    #[serde(rename = "pS")]
    pub p_s: Option<f64>,
    #[serde(rename = "pT")]
    pub p_t: Option<f64>,
    pub drill_effectiveness: DrillEffectiveness,
    pub feature_error_rates: BTreeMap<String, FeatureTally>,
    pub audio_features: AudioFeatures,
}

impl AdaptiveState {
    pub fn has_bkt_estimates(&self) -> bool {
        self.p_g.is_some() || self.p_s.is_some() || self.p_t.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_pass() {
        assert!(!Grade::Fail.is_pass());
        assert!(Grade::Hard.is_pass());
        assert_eq!(Grade::Easy.value(), 4);
    }

    #[test]
    fn test_record_defaults() {
        let rec = ItemRecord::new("a", vec!["c1".to_string()]);
        assert_eq!(rec.key, "a");
        assert_eq!(rec.stability, 0.0);
        assert_eq!(rec.difficulty, 5.0);
        assert!(!rec.has_review_state());
        assert_eq!(rec.recent_accuracy(), 0.0);
    }

    #[test]
    fn test_record_wire_names() {
        let mut rec = ItemRecord::new("a", vec![]);
        rec.p_l = 0.25;
        rec.stability = 2.0;
        rec.last_micro_drill = Some(4);
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["pL"], 0.25);
        assert_eq!(json["S"], 2.0);
        assert_eq!(json["D"], 5.0);
        assert!(json.get("lastReviewTs").is_some());
        assert!(json.get("key").is_none());
        assert!(json.get("lastMicroDrill").is_none());
    }

    #[test]
    fn test_adaptive_nulls_on_wire() {
        let json = serde_json::to_value(AdaptiveState::default()).unwrap();
        assert!(json["pG"].is_null());
        assert_eq!(json["drillEffectiveness"]["microDrill"]["total"], 0);
        assert!(json["audioFeatures"]["calibratedNoiseFloor"].is_null());
    }

    #[test]
    fn test_cluster_accuracy_empty_is_zero() {
        let mut cl = ClusterStats::default();
        assert_eq!(cl.accuracy(), 0.0);
        cl.record(true);
        cl.record(false);
        assert!((cl.accuracy() - 0.5).abs() < 1e-12);
    }
}
