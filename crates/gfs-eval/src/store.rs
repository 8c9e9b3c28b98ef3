//! Attribute stores and dotted-path resolution.
//!
//! Paths are dot-separated keys into nested objects:
//! `attributes.strength.value`. Empty paths and empty segments (`a..b`,
//! `.a`, `a.`) are rejected.

use serde_json::{Map, Number, Value};

use crate::error::{EvalError, EvalResult};

/// Host-owned character state, addressed by dotted paths.
pub trait AttributeStore {
    /// Read the number at `path`.
    fn get(&self, path: &str) -> EvalResult<f64>;

    /// Write `value` at `path`, replacing whatever was there.
    fn set(&mut self, path: &str, value: f64) -> EvalResult<()>;

    /// Append `value` to the list at `path`, creating the list if absent.
    fn push(&mut self, path: &str, value: f64) -> EvalResult<()>;
}

/// Split a path into its parent segments and leaf key.
fn split_path(path: &str) -> Option<(Vec<&str>, &str)> {
    let mut segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return None;
    }
    let leaf = segments.pop()?;
    Some((segments, leaf))
}

// ══════════════════════════════════════════════════════════════════════════════
// JsonStore
// ══════════════════════════════════════════════════════════════════════════════

/// An [`AttributeStore`] over a JSON object.
///
/// `set` and `push` create missing intermediate objects. Writing through an
/// existing value that is not an object is an [`EvalError::InvalidTarget`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonStore {
    root: Map<String, Value>,
}

impl JsonStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a JSON value; the root must be an object.
    pub fn from_value(value: Value) -> EvalResult<Self> {
        match value {
            Value::Object(root) => Ok(Self { root }),
            other => Err(EvalError::Malformed(format!(
                "attribute store must be a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn from_json(text: &str) -> EvalResult<Self> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| EvalError::Malformed(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.root)
    }

    /// Walk to the object holding the leaf, creating missing objects.
    fn parent_mut(&mut self, path: &str, parents: &[&str]) -> EvalResult<&mut Map<String, Value>> {
        let mut current = &mut self.root;
        for segment in parents {
            let entry = current
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            current = match entry {
                Value::Object(map) => map,
                other => {
                    return Err(EvalError::invalid_target(
                        path,
                        format!("'{segment}' is {}, not an object", json_kind(other)),
                    ))
                }
            };
        }
        Ok(current)
    }
}

impl AttributeStore for JsonStore {
    fn get(&self, path: &str) -> EvalResult<f64> {
        let (parents, leaf) =
            split_path(path).ok_or_else(|| EvalError::unresolved(path, "empty path segment"))?;

        let mut current = &self.root;
        for segment in parents {
            current = match current.get(segment) {
                Some(Value::Object(map)) => map,
                Some(other) => {
                    return Err(EvalError::unresolved(
                        path,
                        format!("'{segment}' is {}, not an object", json_kind(other)),
                    ))
                }
                None => return Err(EvalError::unresolved(path, format!("'{segment}' is missing"))),
            };
        }

        match current.get(leaf) {
            Some(value) => value.as_f64().ok_or_else(|| {
                EvalError::unresolved(path, format!("'{leaf}' is {}, not a number", json_kind(value)))
            }),
            None => Err(EvalError::unresolved(path, format!("'{leaf}' is missing"))),
        }
    }

    fn set(&mut self, path: &str, value: f64) -> EvalResult<()> {
        let number = number_value(path, value)?;
        let (parents, leaf) =
            split_path(path).ok_or_else(|| EvalError::invalid_target(path, "empty path segment"))?;
        self.parent_mut(path, &parents)?
            .insert(leaf.to_string(), number);
        Ok(())
    }

    fn push(&mut self, path: &str, value: f64) -> EvalResult<()> {
        let number = number_value(path, value)?;
        let (parents, leaf) =
            split_path(path).ok_or_else(|| EvalError::invalid_target(path, "empty path segment"))?;
        let slot = self
            .parent_mut(path, &parents)?
            .entry(leaf.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        match slot {
            Value::Array(items) => {
                items.push(number);
                Ok(())
            }
            other => Err(EvalError::invalid_target(
                path,
                format!("'{leaf}' is {}, not a list", json_kind(other)),
            )),
        }
    }
}

/// Integral values are stored as JSON integers.
fn number_value(path: &str, value: f64) -> EvalResult<Value> {
    if !value.is_finite() {
        return Err(EvalError::ArithmeticTrap(format!(
            "cannot store {value} at '{path}'"
        )));
    }
    if value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0 {
        return Ok(Value::from(value as i64));
    }
    Number::from_f64(value)
        .map(Value::Number)
        .ok_or_else(|| EvalError::ArithmeticTrap(format!("cannot store {value} at '{path}'")))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
