//! Format detection for raw import payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::element::FLAT_VERSION;
use crate::legacy_model::LEGACY_CASE_MARKER;
use crate::tree::NESTED_VERSION;

/// The three known payload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseFormat {
    Legacy,
    Flat,
    Nested,
}

impl CaseFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseFormat::Legacy => "legacy",
            CaseFormat::Flat => "flat",
            CaseFormat::Nested => "nested",
        }
    }

    /// The version tag this format carries, if any.
    pub fn version_tag(&self) -> Option<&'static str> {
        match self {
            CaseFormat::Legacy => None,
            CaseFormat::Flat => Some(FLAT_VERSION),
            CaseFormat::Nested => Some(NESTED_VERSION),
        }
    }
}

impl fmt::Display for CaseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CaseFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy" => Ok(CaseFormat::Legacy),
            "flat" => Ok(CaseFormat::Flat),
            "nested" => Ok(CaseFormat::Nested),
            other => Err(format!(
                "unknown format '{other}' (expected legacy, flat, or nested)"
            )),
        }
    }
}

/// Classification result; `None` means no known shape matched.
pub type Detection = Option<CaseFormat>;

/// Classify a parsed payload. Checks run nested, flat, legacy.
pub fn detect_format(value: &Value) -> Detection {
    let object = value.as_object()?;
    let version = object.get("version").and_then(Value::as_str);

    let tree_has_children = object
        .get("tree")
        .and_then(Value::as_object)
        .and_then(|tree| tree.get("children"))
        .is_some_and(Value::is_array);
    if version == Some(NESTED_VERSION) || tree_has_children {
        return Some(CaseFormat::Nested);
    }

    let elements_array = object.get("elements").is_some_and(Value::is_array);
    if version == Some(FLAT_VERSION) || (elements_array && object.contains_key("evidenceLinks")) {
        return Some(CaseFormat::Flat);
    }

    let goals_array = object.get("goals").is_some_and(Value::is_array);
    let marker = object.get("type").and_then(Value::as_str) == Some(LEGACY_CASE_MARKER);
    if goals_array || marker {
        return Some(CaseFormat::Legacy);
    }

    None
}
