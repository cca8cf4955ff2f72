//! Analysis records

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// Backend-computed metrics for a single file.
///
/// The shape is opaque to the client: usually a flat object of snake_case
/// keys, but any JSON value is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisRecord(pub Value);

impl AnalysisRecord {
    /// Returns the top-level entries in backend order.
    ///
    /// A non-object record is exposed as a single `value` entry.
    pub fn entries(&self) -> Vec<(&str, &Value)> {
        match &self.0 {
            Value::Object(map) => map.iter().map(|(k, v)| (k.as_str(), v)).collect(),
            other => vec![("value", other)],
        }
    }

    /// Looks up a top-level field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

impl From<Value> for AnalysisRecord {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Turns a snake_case key into a title-cased label (`lines_of_code` → `Lines Of Code`).
pub fn format_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut at_word_start = true;
    for ch in key.chars() {
        if ch == '_' {
            out.push(' ');
            at_word_start = true;
        } else if ch.is_alphanumeric() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.push(ch);
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}

/// Formats an analysis value for display. Strings are shown bare.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
