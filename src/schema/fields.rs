//! Typed field access over one raw JSON record.

use super::SchemaError;
use serde_json::{Map, Value};

/// A raw record checked against the keys its kind accepts.
/// `null` values read as absent, so they take the kind's default.
pub(crate) struct Fields<'a> {
    context: String,
    map: &'a Map<String, Value>,
}

impl<'a> Fields<'a> {
    /// Fails when `value` is not an object or carries a key outside `accepted`.
    pub fn new(
        context: impl Into<String>,
        value: &'a Value,
        accepted: &[&str],
    ) -> Result<Self, SchemaError> {
        let context = context.into();
        let map = match value {
            Value::Object(m) => m,
            _ => return Err(SchemaError::NotAnObject { context }),
        };
        let unexpected: Vec<String> = map
            .keys()
            .filter(|k| !accepted.contains(&k.as_str()))
            .cloned()
            .collect();
        if !unexpected.is_empty() {
            return Err(SchemaError::TooManyFields {
                context,
                unexpected,
            });
        }
        Ok(Self { context, map })
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    /// Context for a nested record under `key`.
    pub fn child_context(&self, key: &str) -> String {
        format!("{}.{}", self.context, key)
    }

    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|v| !v.is_null())
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Fails when both alias keys are present.
    pub fn exclusive(&self, first: &str, second: &str) -> Result<(), SchemaError> {
        if self.has(first) && self.has(second) {
            return Err(SchemaError::ConflictingFields {
                context: self.context.clone(),
                first: first.to_string(),
                second: second.to_string(),
            });
        }
        Ok(())
    }

    pub fn opt_f64(&self, key: &str) -> Result<Option<f64>, SchemaError> {
        match self.get(key) {
            None => Ok(None),
            Some(v) => v
                .as_f64()
                .map(Some)
                .ok_or_else(|| self.invalid(key, "a number")),
        }
    }

    pub fn f64_or(&self, key: &str, default: f64) -> Result<f64, SchemaError> {
        Ok(self.opt_f64(key)?.unwrap_or(default))
    }

    pub fn opt_bool(&self, key: &str) -> Result<Option<bool>, SchemaError> {
        match self.get(key) {
            None => Ok(None),
            Some(v) => v
                .as_bool()
                .map(Some)
                .ok_or_else(|| self.invalid(key, "a boolean")),
        }
    }

    pub fn bool_or(&self, key: &str, default: bool) -> Result<bool, SchemaError> {
        Ok(self.opt_bool(key)?.unwrap_or(default))
    }

    /// Integer field; floats are coerced by truncation.
    pub fn int_or(&self, key: &str, default: i64) -> Result<i64, SchemaError> {
        match self.get(key) {
            None => Ok(default),
            Some(v) => v
                .as_i64()
                .or_else(|| v.as_f64().filter(|x| x.is_finite()).map(|x| x.trunc() as i64))
                .ok_or_else(|| self.invalid(key, "an integer")),
        }
    }

    pub fn opt_str(&self, key: &str) -> Result<Option<&'a str>, SchemaError> {
        match self.get(key) {
            None => Ok(None),
            Some(v) => v
                .as_str()
                .map(Some)
                .ok_or_else(|| self.invalid(key, "a string")),
        }
    }

    pub fn invalid(&self, key: &str, expected: &'static str) -> SchemaError {
        SchemaError::InvalidType {
            context: self.context.clone(),
            field: key.to_string(),
            expected,
        }
    }
}
