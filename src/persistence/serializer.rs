use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::migration::{migrate, CURRENT_VERSION};
use crate::error::DecodeError;
use crate::params::{ThetaParams, CONSTANTS};
use crate::sanitize::{clamp_or, sanitize_record, trim_front};
use crate::types::{AdaptiveState, ClusterStats, ItemRecord, ThetaSnapshot};

/// The persisted envelope, always written at [`CURRENT_VERSION`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SavedState {
    pub v: u64,
    pub ts: i64,
    pub question_number: u32,
    pub total_attempts: u32,
    pub all_correct_times: VecDeque<f64>,
    pub items: BTreeMap<String, ItemRecord>,
    pub clusters: BTreeMap<String, ClusterStats>,
    pub recent_keys: Vec<String>,
    pub theta: f64,
    pub theta_history: Vec<ThetaSnapshot>,
    pub adaptive: AdaptiveState,
}

impl Default for SavedState {
    fn default() -> Self {
        Self {
            v: CURRENT_VERSION,
            ts: 0,
            question_number: 0,
            total_attempts: 0,
            all_correct_times: VecDeque::new(),
            items: BTreeMap::new(),
            clusters: BTreeMap::new(),
            recent_keys: Vec::new(),
            theta: ThetaParams::default().initial,
            theta_history: Vec::new(),
            adaptive: AdaptiveState::default(),
        }
    }
}

/// A decoded save and the version it was stored at.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub state: SavedState,
    pub from_version: u64,
}

impl Decoded {
    pub fn was_migrated(&self) -> bool {
        self.from_version != CURRENT_VERSION
    }
}

pub fn serialize(state: &SavedState) -> Result<String, serde_json::Error> {
    if state.v == CURRENT_VERSION {
        serde_json::to_string(state)
    } else {
        serde_json::to_string(&SavedState {
            v: CURRENT_VERSION,
            ..state.clone()
        })
    }
}

/// Parses, migrates and validates a saved document. Any error means the
/// save is unusable as a whole.
pub fn deserialize(raw: &str) -> Result<Decoded, DecodeError> {
    let doc: Value = serde_json::from_str(raw)?;
    let (doc, from_version) = migrate(&doc)?;
    let mut state: SavedState = serde_json::from_value(normalize(doc))?;

    let caps = CONSTANTS.history;
    for (key, rec) in state.items.iter_mut() {
        rec.key.clone_from(key);
        sanitize_record(rec);
    }
    trim_front(&mut state.all_correct_times, caps.max_correct_times);
    let excess = state.recent_keys.len().saturating_sub(caps.max_recent);
    state.recent_keys.drain(..excess);
    let excess = state.theta_history.len().saturating_sub(caps.max_theta_history);
    state.theta_history.drain(..excess);
    state.theta = clamp_or(state.theta, 0.0, 1.0, ThetaParams::default().initial);

    Ok(Decoded {
        state,
        from_version,
    })
}

/// Drops nulls so absent and null fields both fall back to defaults, and
/// discards feature tallies that are not `{correct, total}` objects.
fn normalize(mut doc: Value) -> Value {
    fn drop_nulls(v: &mut Value) {
        if let Value::Object(map) = v {
            map.retain(|_, field| !field.is_null());
        }
    }

    drop_nulls(&mut doc);
    for section in ["items", "clusters"] {
        if let Some(Value::Object(entries)) = doc.get_mut(section) {
            entries.values_mut().for_each(drop_nulls);
        }
    }
    if let Some(adaptive) = doc.get_mut("adaptive") {
        drop_nulls(adaptive);
        if let Some(Value::Object(rates)) = adaptive.get_mut("featureErrorRates") {
            rates.retain(|_, tally| tally.is_object());
        }
    }
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ConfusionEntry;
    use serde_json::json;

    fn sample_state() -> SavedState {
        let mut rec = ItemRecord::new("0:3", vec!["str_0".to_string(), "zone_lo".to_string()]);
        rec.stability = 3.173;
        rec.difficulty = 5.279_615_720_808_186;
        rec.p_l = 0.1 + 0.2;
        rec.attempts = 3;
        rec.correct = 2;
        rec.times.extend([812.5, 1001.0]);
        rec.hist.extend([true, false, true]);
        rec.confusions.push_back(ConfusionEntry {
            detected: "E".to_string(),
            ts: 42,
        });
        rec.avg_cents = Some(-3.5);

        let mut state = SavedState {
            ts: 1_700_000_000_000,
            question_number: 9,
            total_attempts: 3,
            theta: 0.137,
            ..Default::default()
        };
        state.all_correct_times.extend([812.5, 1001.0]);
        state.items.insert(rec.key.clone(), rec);
        state.clusters.insert("str_0".to_string(), ClusterStats { correct: 2, total: 3 });
        state.recent_keys.push("0:3".to_string());
        state.theta_history.push(ThetaSnapshot { ts: 5, theta: 0.1 });
        state.adaptive.p_s = Some(0.1);
        state
    }

    #[test]
    fn test_round_trip_preserves_state() {
        let state = sample_state();
        let raw = serialize(&state).unwrap();
        let decoded = deserialize(&raw).unwrap();
        assert!(!decoded.was_migrated());
        assert_eq!(decoded.state, state);
    }

    #[test]
    fn test_envelope_fields() {
        let raw = serialize(&sample_state()).unwrap();
        let doc: Value = serde_json::from_str(&raw).unwrap();
        let keys: Vec<&str> = doc.as_object().unwrap().keys().map(String::as_str).collect();
        for k in [
            "v", "ts", "questionNumber", "totalAttempts", "allCorrectTimes", "items",
            "clusters", "recentKeys", "theta", "thetaHistory", "adaptive",
        ] {
            assert!(keys.contains(&k), "missing {k}");
        }
        assert_eq!(keys.len(), 11);
        assert_eq!(doc["v"], 5);
    }

    #[test]
    fn test_nulls_fall_back_to_defaults() {
        let raw = json!({
            "v": 5,
            "theta": null,
            "items": { "A": { "S": null, "D": null, "pL": 0.4, "avgCents": null } },
            "adaptive": { "pG": null, "featureErrorRates": { "note_E": 0.2, "zone_hi": { "correct": 1, "total": 2 } } }
        })
        .to_string();
        let decoded = deserialize(&raw).unwrap();
        let rec = &decoded.state.items["A"];
        assert_eq!(rec.key, "A");
        assert_eq!(rec.stability, 0.0);
        assert_eq!(rec.difficulty, 5.0);
        assert_eq!(decoded.state.theta, 0.05);
        assert_eq!(decoded.state.adaptive.feature_error_rates.len(), 1);
    }

    #[test]
    fn test_oversized_buffers_trimmed() {
        let mut state = sample_state();
        state.recent_keys = (0..9).map(|i| i.to_string()).collect();
        state.all_correct_times = (0..250).map(f64::from).collect();
        let decoded = deserialize(&serialize(&state).unwrap()).unwrap().state;
        assert_eq!(decoded.recent_keys.len(), 5);
        assert_eq!(decoded.recent_keys[0], "4");
        assert_eq!(decoded.all_correct_times.len(), 200);
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(matches!(deserialize("not json"), Err(DecodeError::Malformed(_))));
        assert!(matches!(deserialize("{\"v\": 99}"), Err(DecodeError::UnsupportedVersion(99))));
        assert!(matches!(
            deserialize("{\"v\": 5, \"items\": []}"),
            Err(DecodeError::Malformed(_))
        ));
    }
}
