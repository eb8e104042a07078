//! Per-extension options: a JSON object bag with shallow-merge resolution.
//!
//! Extensions declare defaults; a registry-time override replaces keys one
//! level deep. Nested objects are replaced wholesale, never deep-merged —
//! predictable for callers, cheap to reason about.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options(Map<String, Value>);

impl Options {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Build a bag from any JSON value; non-objects yield an empty bag.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            Value::Null => Self::new(),
            other => {
                log::warn!("options must be a JSON object, got {other}; ignoring");
                Self::new()
            }
        }
    }

    /// Build a bag from a serializable struct (the typed-mirror bridge).
    pub fn from_serialize<T: Serialize>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(v) => Self::from_value(v),
            Err(e) => {
                log::warn!("options failed to serialize: {e}; using empty bag");
                Self::new()
            }
        }
    }

    /// Read the bag back into a typed struct.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.0.clone()))
    }

    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn str_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.str(key).unwrap_or(default)
    }

    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        self.0.get(key).and_then(Value::as_bool).unwrap_or(default)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Shallow merge: start from `defaults`, then let `overrides` replace
    /// matching keys one level deep.
    pub fn resolve(defaults: &Options, overrides: &Options) -> Options {
        let mut out = defaults.clone();
        for (k, v) in overrides.iter() {
            out.0.insert(k.clone(), v.clone());
        }
        out
    }
}

impl FromIterator<(String, Value)> for Options {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
