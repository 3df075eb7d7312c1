//! Shared types used across all pipeline stages.
//!
//! These types are serialized to JSON between stages (resolve → probe → generate)
//! and must be identical across all three modules.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One portfolio entry.
///
/// Decoding from user data is lenient: see [`WorkRecord::from_value`]. The
/// derived `Deserialize` is only used for manifests this crate wrote itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkRecord {
    /// Display title, also used for the thumbnail alt text. May be empty.
    pub title: String,
    /// Link target. Also the base for thumbnail guesses. May be empty.
    pub url: String,
    /// Short description line under the title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    /// Explicit thumbnail location, tried before any guess.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumb: Option<String>,
}

impl WorkRecord {
    /// Decode a record from an arbitrary JSON value without rejecting anything.
    ///
    /// The only structural requirement on user data is "a JSON array"; each
    /// element becomes a record whatever its shape:
    /// - non-object elements become an empty record
    /// - missing or `null` fields become `""` / `None`
    /// - numbers and booleans are stringified
    pub fn from_value(value: &Value) -> Self {
        let field = |name: &str| value.get(name).and_then(scalar_to_string);
        Self {
            title: field("title").unwrap_or_default(),
            url: field("url").unwrap_or_default(),
            desc: field("desc"),
            thumb: field("thumb"),
        }
    }

    /// Decode a JSON array into records.
    ///
    /// Returns `None` when `value` is not an array.
    pub fn list_from_value(value: &Value) -> Option<Vec<Self>> {
        value
            .as_array()
            .map(|items| items.iter().map(Self::from_value).collect())
    }

    /// The record shown when no data source yields anything.
    pub fn sample() -> Self {
        Self {
            title: "Handwritten Type Generator".to_string(),
            url: "https://example.com/work/handwriting-typo".to_string(),
            desc: Some("Composes hand-lettered titles in SVG".to_string()),
            thumb: None,
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
