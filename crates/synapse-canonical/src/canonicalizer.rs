use canonical_json::to_string;
use serde::Serialize;
use serde_json::Value;

use std::fmt;

/// Error returned when canonicalization fails.
#[derive(thiserror::Error, Debug)]
pub enum CanonicalizationError {
    /// The value could not be converted to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
    /// Non-finite number (NaN/Infinity) detected.
    #[error("non-finite number detected at {0}")]
    NonFiniteNumber(String),
    /// Generic failure from the canonical encoder.
    #[error("other error: {0}")]
    Other(String),
}

/// Helper for building JSON paths in error messages.
#[derive(Debug, Clone, Default)]
struct Path {
    segments: Vec<String>,
}

impl Path {
    fn child(&self, segment: String) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            write!(f, "root")
        } else {
            write!(f, "{}", self.segments.join("."))
        }
    }
}

/// Canonicalizer that emits deterministic bytes (sorted keys, no insignificant
/// whitespace, RFC 8785 number and string encoding).
#[derive(Debug, Clone, Copy, Default)]
pub struct Canonicalizer;

impl Canonicalizer {
    /// Creates a new canonicalizer.
    pub fn new() -> Self {
        Self
    }

    /// Produces canonical UTF-8 bytes for a JSON value.
    pub fn canonicalize(&self, value: &Value) -> Result<Vec<u8>, CanonicalizationError> {
        Ok(self.canonical_string(value)?.into_bytes())
    }

    /// Produces the canonical string form of a JSON value.
    pub fn canonical_string(&self, value: &Value) -> Result<String, CanonicalizationError> {
        check_finite(value, &Path::default())?;
        to_string(value).map_err(|err| CanonicalizationError::Other(err.to_string()))
    }

    /// Serializes any `Serialize` type and canonicalizes the result.
    pub fn canonicalize_serializable<T: Serialize + ?Sized>(
        &self,
        value: &T,
    ) -> Result<String, CanonicalizationError> {
        let value = serde_json::to_value(value)
            .map_err(|e| CanonicalizationError::Serialization(e.to_string()))?;
        self.canonical_string(&value)
    }
}

/// Canonical string of any serializable value.
pub fn to_canonical_string<T: Serialize + ?Sized>(
    value: &T,
) -> Result<String, CanonicalizationError> {
    Canonicalizer::new().canonicalize_serializable(value)
}

/// Canonical bytes of any serializable value.
pub fn to_canonical_bytes<T: Serialize + ?Sized>(
    value: &T,
) -> Result<Vec<u8>, CanonicalizationError> {
    to_canonical_string(value).map(String::into_bytes)
}

fn check_finite(value: &Value, path: &Path) -> Result<(), CanonicalizationError> {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                check_finite(child, &path.child(key.clone()))?;
            }
            Ok(())
        }
        Value::Array(items) => {
            for (idx, item) in items.iter().enumerate() {
                check_finite(item, &path.child(format!("[{}]", idx)))?;
            }
            Ok(())
        }
        Value::Number(num) => match num.as_f64() {
            Some(f) if !f.is_finite() => Err(CanonicalizationError::NonFiniteNumber(path.to_string())),
            _ => Ok(()),
        },
        Value::String(_) | Value::Bool(_) | Value::Null => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_are_sorted_at_every_level() {
        let value = json!({"b": 1, "a": {"z": true, "c": [3, 1]}});
        let out = Canonicalizer::new().canonical_string(&value).unwrap();
        assert_eq!(out, r#"{"a":{"c":[3,1],"z":true},"b":1}"#);
    }

    #[test]
    fn struct_field_order_does_not_matter() {
        #[derive(Serialize)]
        struct Forward {
            alpha: u8,
            beta: &'static str,
        }
        #[derive(Serialize)]
        struct Reverse {
            beta: &'static str,
            alpha: u8,
        }
        let a = to_canonical_string(&Forward { alpha: 1, beta: "x" }).unwrap();
        let b = to_canonical_string(&Reverse { beta: "x", alpha: 1 }).unwrap();
        assert_eq!(a, b);
    }
}
