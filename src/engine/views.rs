//! Read-only mastery views over engine state.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{now_ms, LearningEngine};
use crate::config::ItemConfig;
use crate::knowledge::retrievability_at;
use crate::selection::{is_mastered, target_time};
use crate::stats;
use crate::tracking::confusion::{confusion_counts, top_confusion};
use crate::tracking::{coverage_matrix, CoverageMatrix};
use crate::types::{DrillEffectiveness, ItemRecord};

/// Correct times averaged for the overall response time.
const RECENT_RESPONSE_WINDOW: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopConfusion {
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemStats {
    pub key: String,
    #[serde(rename = "pL")]
    pub p_l: f64,
    #[serde(rename = "S")]
    pub stability: f64,
    #[serde(rename = "D")]
    pub difficulty: f64,
    #[serde(rename = "R")]
    pub retrievability: f64,
    pub avg_time: f64,
    /// 0 until enough correct times exist
    pub target_time: f64,
    /// avg time / target time; 0 when either is missing
    pub fluency_ratio: f64,
    pub mastered: bool,
    pub attempts: u32,
    pub correct: u32,
    pub streak: u32,
    pub top_confusion: Option<TopConfusion>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSummary {
    pub id: String,
    #[serde(rename = "avgPL")]
    pub avg_pl: f64,
    pub total: u32,
    pub correct: u32,
    pub mastered_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptiveSummary {
    #[serde(rename = "pG")]
    pub p_g: Option<f64>,
    #[serde(rename = "pS")]
    pub p_s: Option<f64>,
    #[serde(rename = "pT")]
    pub p_t: Option<f64>,
    pub drill_effectiveness: DrillEffectiveness,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallStats {
    #[serde(rename = "avgPL")]
    pub avg_pl: f64,
    pub total_items: usize,
    pub mastered_count: usize,
    pub pct_mastered: f64,
    pub avg_response_time: f64,
    pub session_questions: u32,
    pub session_accuracy: f64,
    pub theta: f64,
    pub plateau_detected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryReport {
    pub items: Vec<ItemStats>,
    pub clusters: Vec<ClusterSummary>,
    pub fatigued: bool,
    pub coverage: CoverageMatrix,
    pub adaptive: AdaptiveSummary,
    pub overall: OverallStats,
}

impl<C: ItemConfig> LearningEngine<C> {
    fn stats_for(&self, rec: &ItemRecord, now_ms: i64) -> ItemStats {
        let target = target_time(&self.all_correct_times, rec.p_l).unwrap_or(0.0);
        let fluency_ratio = if target > 0.0 && rec.avg_time > 0.0 {
            rec.avg_time / target
        } else {
            0.0
        };
        ItemStats {
            key: rec.key.clone(),
            p_l: rec.p_l,
            stability: rec.stability,
            difficulty: rec.difficulty,
            retrievability: retrievability_at(rec, now_ms),
            avg_time: rec.avg_time,
            target_time: target,
            fluency_ratio,
            mastered: is_mastered(rec, &self.params.mastery),
            attempts: rec.attempts,
            correct: rec.correct,
            streak: rec.streak,
            top_confusion: top_confusion(rec).map(|(value, count)| TopConfusion { value, count }),
        }
    }

    pub fn item_stats(&self, key: &str) -> Option<ItemStats> {
        self.item_stats_at(key, now_ms())
    }

    pub fn item_stats_at(&self, key: &str, now_ms: i64) -> Option<ItemStats> {
        self.store.get(key).map(|rec| self.stats_for(rec, now_ms))
    }

    /// Detected value -> times logged for `key`. Empty for unknown keys.
    pub fn confusions(&self, key: &str) -> BTreeMap<String, usize> {
        self.store
            .get(key)
            .map(|rec| confusion_counts(rec).into_iter().collect())
            .unwrap_or_default()
    }

    pub fn coverage_matrix(&self) -> CoverageMatrix {
        coverage_matrix(
            self.store.items().values(),
            &self.params.scoring.coverage_bonus,
        )
    }

    pub fn mastery_report(&self) -> MasteryReport {
        self.mastery_report_at(now_ms())
    }

    pub fn mastery_report_at(&self, now_ms: i64) -> MasteryReport {
        let items: Vec<ItemStats> = self
            .store
            .items()
            .values()
            .map(|rec| self.stats_for(rec, now_ms))
            .collect();

        let clusters = self
            .store
            .clusters()
            .iter()
            .map(|(id, cl)| {
                let members: Vec<&ItemStats> = items
                    .iter()
                    .filter(|s| {
                        self.store
                            .get(&s.key)
                            .is_some_and(|r| r.clusters.iter().any(|c| c == id))
                    })
                    .collect();
                let mastered = members.iter().filter(|s| s.mastered).count();
                ClusterSummary {
                    id: id.clone(),
                    avg_pl: stats::mean_or_zero(members.iter().map(|s| s.p_l)),
                    total: cl.total,
                    correct: cl.correct,
                    mastered_pct: if members.is_empty() {
                        0.0
                    } else {
                        mastered as f64 / members.len() as f64
                    },
                }
            })
            .collect();

        let total_items = items.len();
        let mastered_count = items.iter().filter(|s| s.mastered).count();
        let recent_start = self
            .all_correct_times
            .len()
            .saturating_sub(RECENT_RESPONSE_WINDOW);
        let total_correct: u32 = items.iter().map(|s| s.correct).sum();
        let total_attempts: u32 = items.iter().map(|s| s.attempts).sum();

        let overall = OverallStats {
            avg_pl: stats::mean_or_zero(items.iter().map(|s| s.p_l)),
            total_items,
            mastered_count,
            pct_mastered: if total_items > 0 {
                mastered_count as f64 / total_items as f64
            } else {
                0.0
            },
            avg_response_time: stats::mean_or_zero(
                self.all_correct_times.iter().skip(recent_start).copied(),
            ),
            session_questions: self.question_number,
            session_accuracy: if total_attempts > 0 {
                total_correct as f64 / total_attempts as f64
            } else {
                0.0
            },
            theta: self.theta,
            plateau_detected: self.plateau,
        };

        MasteryReport {
            items,
            clusters,
            fatigued: self.fatigue.is_fatigued(),
            coverage: self.coverage_matrix(),
            adaptive: AdaptiveSummary {
                p_g: self.adaptive.p_g,
                p_s: self.adaptive.p_s,
                p_t: self.adaptive.p_t,
                drill_effectiveness: self.adaptive.drill_effectiveness,
            },
            overall,
        }
    }
}
