//! Forward-only migrations of saved documents.
//!
//! Each step is a pure function from one version's document to the next.
//! The chain runs on copies, so a failing step leaves the caller's input
//! untouched.

use serde_json::{json, Map, Value};

use crate::error::{DecodeError, StorageError};
use crate::params::ThetaParams;
use crate::persistence::storage::StorageAdapter;

pub const CURRENT_VERSION: u64 = 5;

type Step = fn(&Value) -> Result<Value, String>;

/// `(from_version, step)` in chain order.
const STEPS: [(u64, Step); 4] = [
    (1, v1_to_v2),
    (2, v2_to_v3),
    (3, v3_to_v4),
    (4, v4_to_v5),
];

const MAX_THETA_ESTIMATE: f64 = 0.8;
const THETA_PL_WEIGHT: f64 = 0.7;
/// Correct times carried over per legacy exercise on consolidation
const LEGACY_CORRECT_TIMES: usize = 30;

pub fn default_adaptive() -> Value {
    json!({
        "pG": null,
        "pS": null,
        "pT": null,
        "drillEffectiveness": {
            "microDrill": { "helped": 0, "total": 0 },
            "confusionDrill": { "helped": 0, "total": 0 },
        },
        "featureErrorRates": {},
        "audioFeatures": default_audio_features(),
    })
}

fn default_audio_features() -> Value {
    json!({ "calibratedNoiseFloor": null, "avgOnsetStrength": null })
}

pub fn version_of(doc: &Value) -> Result<u64, DecodeError> {
    doc.get("v")
        .and_then(Value::as_u64)
        .ok_or(DecodeError::MissingVersion)
}

/// Runs every step from the document's version up to [`CURRENT_VERSION`].
/// Returns the migrated document and the version it started at.
pub fn migrate(doc: &Value) -> Result<(Value, u64), DecodeError> {
    let from = version_of(doc)?;
    if from == 0 || from > CURRENT_VERSION {
        return Err(DecodeError::UnsupportedVersion(from));
    }
    let mut current = doc.clone();
    let mut version = from;
    for (step_from, step) in STEPS {
        if step_from < version {
            continue;
        }
        current = step(&current).map_err(|reason| DecodeError::Migration {
            from: step_from,
            reason,
        })?;
        version = step_from + 1;
        if let Some(obj) = current.as_object_mut() {
            obj.insert("v".to_string(), json!(version));
        }
    }
    if version != CURRENT_VERSION {
        return Err(DecodeError::UnsupportedVersion(from));
    }
    if from != CURRENT_VERSION {
        tracing::info!(from, to = CURRENT_VERSION, "migrated saved state");
    }
    Ok((current, from))
}

fn object(doc: &Value) -> Result<Map<String, Value>, String> {
    doc.as_object()
        .cloned()
        .ok_or_else(|| "document is not an object".to_string())
}

fn for_each_item(
    doc: &mut Map<String, Value>,
    mut f: impl FnMut(&mut Map<String, Value>),
) -> Result<(), String> {
    match doc.get_mut("items") {
        None | Some(Value::Null) => Ok(()),
        Some(Value::Object(items)) => {
            for rec in items.values_mut() {
                match rec.as_object_mut() {
                    Some(rec) => f(rec),
                    None => return Err("item record is not an object".to_string()),
                }
            }
            Ok(())
        }
        Some(_) => Err("items is not an object".to_string()),
    }
}

fn truthy_f64(v: Option<&Value>) -> Option<f64> {
    v.and_then(Value::as_f64).filter(|x| *x != 0.0 && x.is_finite())
}

fn is_missing(obj: &Map<String, Value>, key: &str) -> bool {
    obj.get(key).map_or(true, Value::is_null)
}

fn set_default(obj: &mut Map<String, Value>, key: &str, value: Value) {
    if is_missing(obj, key) {
        obj.insert(key.to_string(), value);
    }
}

/// SM-2 style interval/ease become FSRS stability/difficulty.
fn v1_to_v2(doc: &Value) -> Result<Value, String> {
    let mut out = object(doc)?;
    for_each_item(&mut out, |rec| {
        let ivl = truthy_f64(rec.get("ivl")).unwrap_or(1.0);
        let ef = truthy_f64(rec.get("ef")).unwrap_or(2.5);
        let last_seen_ts = rec.get("lastSeenTs").and_then(Value::as_i64).unwrap_or(0);
        rec.insert("S".to_string(), json!(ivl.max(1.0)));
        rec.insert("D".to_string(), json!((11.0 - ef * 2.0).clamp(1.0, 10.0)));
        rec.insert("lastReviewTs".to_string(), json!(last_seen_ts));
        rec.insert("due".to_string(), json!(0));
        rec.insert("confusions".to_string(), json!([]));
        for legacy in ["ivl", "ef", "reps"] {
            rec.remove(legacy);
        }
    })?;
    out.insert("theta".to_string(), json!(ThetaParams::default().initial));
    out.insert("thetaHistory".to_string(), json!([]));
    Ok(Value::Object(out))
}

/// Renames legacy keys and estimates a missing theta from mastery.
fn v2_to_v3(doc: &Value) -> Result<Value, String> {
    let mut out = object(doc)?;
    if is_missing(&out, "questionNumber") {
        if let Some(q) = out.remove("qNum") {
            out.insert("questionNumber".to_string(), q);
        }
    }
    for_each_item(&mut out, |rec| {
        if is_missing(rec, "clusters") {
            if let Some(cls) = rec.remove("cls") {
                rec.insert("clusters".to_string(), cls);
            }
        }
    })?;
    if is_missing(&out, "theta") {
        out.insert("theta".to_string(), json!(estimate_theta(&out)));
    }
    Ok(Value::Object(out))
}

fn estimate_theta(doc: &Map<String, Value>) -> f64 {
    let pls: Vec<f64> = doc
        .get("items")
        .and_then(Value::as_object)
        .map(|items| {
            items
                .values()
                .map(|r| r.get("pL").and_then(Value::as_f64).unwrap_or(0.0))
                .collect()
        })
        .unwrap_or_default();
    match crate::stats::mean(pls) {
        Some(avg) => (avg * THETA_PL_WEIGHT + ThetaParams::default().initial).min(MAX_THETA_ESTIMATE),
        None => ThetaParams::default().initial,
    }
}

fn v3_to_v4(doc: &Value) -> Result<Value, String> {
    let mut out = object(doc)?;
    set_default(&mut out, "adaptive", default_adaptive());
    Ok(Value::Object(out))
}

/// Adds intonation/technique history and audio calibration placeholders.
fn v4_to_v5(doc: &Value) -> Result<Value, String> {
    let mut out = object(doc)?;
    for_each_item(&mut out, |rec| {
        set_default(rec, "centsHistory", json!([]));
        if !rec.contains_key("avgCents") {
            rec.insert("avgCents".to_string(), Value::Null);
        }
        set_default(rec, "techniqueScores", json!([]));
    })?;
    set_default(&mut out, "adaptive", default_adaptive());
    match out.get_mut("adaptive") {
        Some(Value::Object(adaptive)) => {
            set_default(adaptive, "audioFeatures", default_audio_features());
        }
        _ => return Err("adaptive is not an object".to_string()),
    }
    Ok(Value::Object(out))
}

/// Merges per-exercise saves written before the unified store into one
/// v3 document under `target_key`, prefixing item keys with each
/// exercise's family id. Does nothing if `target_key` already exists.
/// Returns true when a consolidated document was written.
pub fn consolidate_legacy(
    storage: &dyn StorageAdapter,
    target_key: &str,
    sources: &[(&str, &str)],
) -> Result<bool, StorageError> {
    if storage.get_item(target_key)?.is_some() {
        return Ok(false);
    }

    let mut items = Map::new();
    let mut clusters: Map<String, Value> = Map::new();
    let mut question_number = 0u64;
    let mut total_attempts = 0u64;
    let mut correct_times: Vec<Value> = Vec::new();

    for (source_key, prefix) in sources {
        let Some(raw) = storage.get_item(source_key)? else {
            continue;
        };
        let Ok(Value::Object(data)) = serde_json::from_str::<Value>(&raw) else {
            tracing::warn!(source = source_key, "skipping unreadable legacy save");
            continue;
        };
        let Some(Value::Object(src_items)) = data.get("items") else {
            continue;
        };

        let type_cluster = format!("type_{prefix}");
        for (key, rec) in src_items {
            let mut rec = rec.as_object().cloned().unwrap_or_default();
            let mut tags = vec![json!(type_cluster)];
            if let Some(Value::Array(old)) = rec.get("cls").or_else(|| rec.get("clusters")) {
                tags.extend(old.iter().cloned());
            }
            rec.remove("cls");
            rec.insert("clusters".to_string(), Value::Array(tags));
            items.insert(format!("{prefix}:{key}"), Value::Object(rec));
        }

        if let Some(Value::Object(src_clusters)) = data.get("clusters") {
            for (id, cl) in src_clusters {
                let field = |v: &Value, f: &str| v.get(f).and_then(Value::as_u64).unwrap_or(0);
                let prev = clusters.get(id).cloned().unwrap_or(Value::Null);
                clusters.insert(
                    id.clone(),
                    json!({
                        "correct": field(&prev, "correct") + field(cl, "correct"),
                        "total": field(&prev, "total") + field(cl, "total"),
                    }),
                );
            }
        }
        clusters
            .entry(type_cluster)
            .or_insert_with(|| json!({ "correct": 0, "total": 0 }));

        question_number += data.get("qNum").and_then(Value::as_u64).unwrap_or(0);
        total_attempts += data.get("totalAttempts").and_then(Value::as_u64).unwrap_or(0);
        if let Some(Value::Array(times)) = data.get("allCorrectTimes") {
            let skip = times.len().saturating_sub(LEGACY_CORRECT_TIMES);
            correct_times.extend(times.iter().skip(skip).cloned());
        }
    }

    if items.is_empty() {
        return Ok(false);
    }

    let mut merged = Map::new();
    merged.insert("v".to_string(), json!(3));
    merged.insert("ts".to_string(), json!(chrono::Utc::now().timestamp_millis()));
    merged.insert("questionNumber".to_string(), json!(question_number));
    merged.insert("totalAttempts".to_string(), json!(total_attempts));
    merged.insert("allCorrectTimes".to_string(), Value::Array(correct_times));
    merged.insert("items".to_string(), Value::Object(items));
    merged.insert("clusters".to_string(), Value::Object(clusters));
    merged.insert("recentKeys".to_string(), json!([]));
    let theta = estimate_theta(&merged);
    merged.insert("theta".to_string(), json!(theta));

    storage.set_item(target_key, &Value::Object(merged).to_string())?;
    tracing::info!(key = target_key, "consolidated legacy exercise saves");
    Ok(true)
}
