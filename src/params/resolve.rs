use std::sync::Arc;

use serde_json::{Map, Value};

use super::Params;
use crate::error::ParamError;
use crate::types::AdaptiveState;

/// Environment variable holding tier-3 overrides as JSON text.
pub const OVERRIDES_ENV: &str = "FRETWISE_PARAM_OVERRIDES";

const LEGACY_BKT_KEY: &str = "bktParams";

/// Partial parameter document keyed by subsystem name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamOverrides(Map<String, Value>);

impl ParamOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_value(value: Value) -> Result<Self, ParamError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::default()),
            _ => Err(ParamError::NotAnObject),
        }
    }

    pub fn from_json(text: &str) -> Result<Self, ParamError> {
        Self::from_value(serde_json::from_str(text)?)
    }

    /// Reads [`OVERRIDES_ENV`]; unset or blank means no overrides.
    pub fn from_env() -> Result<Self, ParamError> {
        match std::env::var(OVERRIDES_ENV) {
            Ok(text) if !text.trim().is_empty() => Self::from_json(&text),
            _ => Ok(Self::default()),
        }
    }

    /// Adaptive overrides carrying whichever BKT estimates exist.
    pub fn from_adaptive(state: &AdaptiveState) -> Self {
        let mut out = Self::default();
        if let Some(v) = state.p_g {
            out.set("bkt", "pG", v);
        }
        if let Some(v) = state.p_s {
            out.set("bkt", "pS", v);
        }
        if let Some(v) = state.p_t {
            out.set("bkt", "pT", v);
        }
        out
    }

    pub fn set(&mut self, subsystem: &str, key: &str, value: impl Into<Value>) {
        let entry = self
            .0
            .entry(subsystem.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        if let Value::Object(map) = entry {
            map.insert(key.to_string(), value.into());
        }
    }

    pub fn with(mut self, subsystem: &str, key: &str, value: impl Into<Value>) -> Self {
        self.set(subsystem, key, value);
        self
    }

    /// Replaces a whole subsystem entry.
    pub fn with_subsystem(mut self, subsystem: &str, value: Value) -> Self {
        self.0.insert(subsystem.to_string(), value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The layer for `subsystem`, honoring the legacy `bktParams` alias.
    fn layer(&self, subsystem: &str) -> Option<&Value> {
        match self.0.get(subsystem) {
            Some(v) => Some(v),
            None if subsystem == "bkt" => self.0.get(LEGACY_BKT_KEY),
            None => None,
        }
    }
}

/// Merges `overrides` then `adaptive` over the defaults, subsystem by
/// subsystem, and freezes the result.
///
/// Nested objects merge one level deep; arrays and scalars replace
/// wholesale. Keys that are not default subsystems are ignored.
pub fn resolve(
    overrides: &ParamOverrides,
    adaptive: &ParamOverrides,
) -> Result<Arc<Params>, ParamError> {
    let mut merged = match serde_json::to_value(Params::default())? {
        Value::Object(map) => map,
        _ => return Err(ParamError::NotAnObject),
    };

    let subsystems: Vec<String> = merged.keys().cloned().collect();
    for name in subsystems {
        let layers = [overrides.layer(&name), adaptive.layer(&name)];
        if layers.iter().all(Option::is_none) {
            continue;
        }
        if let Some(slot) = merged.get_mut(&name) {
            for layer in layers.into_iter().flatten() {
                merge_subsystem(slot, layer);
            }
        }
        // Validate here so the error names the offending subsystem.
        if let Err(source) = serde_json::from_value::<Params>(Value::Object(merged.clone())) {
            return Err(ParamError::InvalidSubsystem {
                subsystem: name,
                source,
            });
        }
    }

    let params: Params = serde_json::from_value(Value::Object(merged))?;
    Ok(Arc::new(params))
}

fn merge_subsystem(base: &mut Value, layer: &Value) {
    match (base, layer) {
        (Value::Object(base), Value::Object(layer)) => {
            for (key, value) in layer {
                match (base.get_mut(key), value) {
                    (Some(Value::Object(inner)), Value::Object(patch)) => {
                        for (k, v) in patch {
                            inner.insert(k.clone(), v.clone());
                        }
                    }
                    _ => {
                        base.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, layer) => *base = layer.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn none() -> ParamOverrides {
        ParamOverrides::new()
    }

    #[test]
    fn test_no_overrides_yields_defaults() {
        let p = resolve(&none(), &none()).unwrap();
        assert_eq!(*p, Params::default());
    }

    #[test]
    fn test_single_value_override_keeps_siblings() {
        let o = none().with("bkt", "pG", 0.12);
        let p = resolve(&o, &none()).unwrap();
        assert_eq!(p.bkt.p_g, 0.12);
        assert_eq!(p.bkt.p_s, 0.15);
        assert_eq!(p.bkt.p_t, 0.20);
    }

    #[test]
    fn test_nested_object_merges_one_level() {
        let o = none().with("scoring", "reviewUrgency", json!({ "mastered": 0.1 }));
        let p = resolve(&o, &none()).unwrap();
        assert_eq!(p.scoring.review_urgency.mastered, 0.1);
        assert_eq!(p.scoring.review_urgency.unmastered, 0.5);
        assert_eq!(p.scoring.exploration_c, 1.2);
    }

    #[test]
    fn test_adaptive_beats_override_beats_default() {
        let o = none().with("bkt", "pG", 0.12).with("bkt", "pS", 0.2);
        let a = none().with("bkt", "pG", 0.08);
        let p = resolve(&o, &a).unwrap();
        assert_eq!(p.bkt.p_g, 0.08);
        assert_eq!(p.bkt.p_s, 0.2);
        assert_eq!(p.bkt.p_t, 0.20);
    }

    #[test]
    fn test_legacy_bkt_alias() {
        let o = none().with_subsystem("bktParams", json!({ "pT": 0.3 }));
        let p = resolve(&o, &none()).unwrap();
        assert_eq!(p.bkt.p_t, 0.3);

        let both = o.with("bkt", "pG", 0.07);
        let p = resolve(&both, &none()).unwrap();
        assert_eq!(p.bkt.p_g, 0.07);
        assert_eq!(p.bkt.p_t, 0.20);
    }

    #[test]
    fn test_arrays_replace_wholesale() {
        let o = none().with("sigma", "highAccRange", json!([0.2, 0.3]));
        let p = resolve(&o, &none()).unwrap();
        assert_eq!(p.sigma.high_acc_range, [0.2, 0.3]);
    }

    #[test]
    fn test_unknown_subsystem_ignored() {
        let o = none().with("pitch", "tolerance", 30);
        let p = resolve(&o, &none()).unwrap();
        assert_eq!(*p, Params::default());
    }

    #[test]
    fn test_wrong_type_names_subsystem() {
        let o = none().with("drills", "overdueMax", "ten");
        match resolve(&o, &none()) {
            Err(ParamError::InvalidSubsystem { subsystem, .. }) => assert_eq!(subsystem, "drills"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        assert!(matches!(
            ParamOverrides::from_json("[1, 2]"),
            Err(ParamError::NotAnObject)
        ));
        assert!(matches!(
            ParamOverrides::from_json("{ nope"),
            Err(ParamError::Json(_))
        ));
        let o = ParamOverrides::from_json(r#"{"theta": {"lr": 0.05}}"#).unwrap();
        assert_eq!(resolve(&o, &none()).unwrap().theta.lr, 0.05);
    }

    #[test]
    fn test_from_adaptive_only_sets_known_estimates() {
        let state = AdaptiveState {
            p_s: Some(0.1),
            ..Default::default()
        };
        let a = ParamOverrides::from_adaptive(&state);
        let p = resolve(&none(), &a).unwrap();
        assert_eq!(p.bkt.p_s, 0.1);
        assert_eq!(p.bkt.p_g, 0.05);
        assert!(ParamOverrides::from_adaptive(&AdaptiveState::default()).is_empty());
    }
}
