//! Legacy nested export shape (no version tag).
//!
//! Goals own contexts, strategies, and property claims; claims own nested
//! claims and evidence. Text is split into `short_description` and
//! `long_description`, and keys are per-kind integers or arbitrary strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Marker value some legacy exports carry under `type`.
pub const LEGACY_CASE_MARKER: &str = "AssuranceCase";

/// A legacy primary key: an integer row id or an arbitrary string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LegacyKey {
    Int(i64),
    Text(String),
}

impl fmt::Display for LegacyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LegacyKey::Int(value) => write!(f, "{value}"),
            LegacyKey::Text(value) => f.write_str(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyComment {
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default, alias = "created_date")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyContext {
    #[serde(default)]
    pub id: Option<LegacyKey>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub long_description: Option<String>,
    #[serde(default)]
    pub comments: Vec<LegacyComment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyEvidence {
    #[serde(default)]
    pub id: Option<LegacyKey>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub long_description: Option<String>,
    #[serde(default, rename = "URL", alias = "url")]
    pub url: Option<String>,
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(default)]
    pub comments: Vec<LegacyComment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyPropertyClaim {
    #[serde(default)]
    pub id: Option<LegacyKey>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub long_description: Option<String>,
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(default)]
    pub claim_type: Option<String>,
    #[serde(default)]
    pub level: Option<u32>,
    #[serde(default)]
    pub assumption: Option<String>,
    #[serde(default)]
    pub justification: Option<String>,
    #[serde(default)]
    pub in_sandbox: Option<bool>,
    #[serde(default)]
    pub property_claims: Vec<LegacyPropertyClaim>,
    #[serde(default)]
    pub evidence: Vec<LegacyEvidence>,
    #[serde(default)]
    pub comments: Vec<LegacyComment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyStrategy {
    #[serde(default)]
    pub id: Option<LegacyKey>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub long_description: Option<String>,
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(default)]
    pub assumption: Option<String>,
    #[serde(default)]
    pub justification: Option<String>,
    #[serde(default)]
    pub in_sandbox: Option<bool>,
    #[serde(default)]
    pub property_claims: Vec<LegacyPropertyClaim>,
    #[serde(default)]
    pub comments: Vec<LegacyComment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyGoal {
    #[serde(default)]
    pub id: Option<LegacyKey>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub long_description: Option<String>,
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(default)]
    pub assumption: Option<String>,
    #[serde(default)]
    pub in_sandbox: Option<bool>,
    #[serde(default)]
    pub context: Vec<LegacyContext>,
    #[serde(default)]
    pub strategies: Vec<LegacyStrategy>,
    #[serde(default)]
    pub property_claims: Vec<LegacyPropertyClaim>,
    #[serde(default)]
    pub comments: Vec<LegacyComment>,
}

/// The legacy case envelope.
///
/// Ownership and group fields are parsed only so they can be reported as
/// ignored; they never reach the flat output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyCase {
    #[serde(default)]
    pub id: Option<LegacyKey>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "type")]
    pub marker: Option<String>,
    pub goals: Vec<LegacyGoal>,
    #[serde(default)]
    pub owner: Option<Value>,
    #[serde(default)]
    pub view_groups: Option<Vec<Value>>,
    #[serde(default)]
    pub edit_groups: Option<Vec<Value>>,
    #[serde(default)]
    pub review_groups: Option<Vec<Value>>,
    #[serde(default)]
    pub permissions: Option<Value>,
    #[serde(default)]
    pub color_profile: Option<String>,
}
