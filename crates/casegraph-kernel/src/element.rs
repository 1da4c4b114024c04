//! Flat element representation: the internal (`version: "2.0"`) shape.
//!
//! One row per graph node, linked to its parent by `parentId`. Evidence never
//! carries a parent; it is attached to claims through [`EvidenceLink`] rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const FLAT_VERSION: &str = "2.0";

/// Role marker carried by the root goal.
pub const ROLE_TOP_LEVEL: &str = "TOP_LEVEL";

/// Element type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ElementType {
    Goal,
    Strategy,
    PropertyClaim,
    Evidence,
    /// Only produced from legacy imports; nested trees fold these into
    /// free-text context strings.
    Context,
}

impl ElementType {
    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Goal => "GOAL",
            ElementType::Strategy => "STRATEGY",
            ElementType::PropertyClaim => "PROPERTY_CLAIM",
            ElementType::Evidence => "EVIDENCE",
            ElementType::Context => "CONTEXT",
        }
    }

    /// Parse the wire representation.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "GOAL" => Some(ElementType::Goal),
            "STRATEGY" => Some(ElementType::Strategy),
            "PROPERTY_CLAIM" => Some(ElementType::PropertyClaim),
            "EVIDENCE" => Some(ElementType::Evidence),
            "CONTEXT" => Some(ElementType::Context),
            _ => None,
        }
    }

    pub const ALL: [ElementType; 5] = [
        ElementType::Goal,
        ElementType::Strategy,
        ElementType::PropertyClaim,
        ElementType::Evidence,
        ElementType::Context,
    ];
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A comment attached to any element. Order is preserved by every transform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub author: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Case-level envelope shared by the flat and nested formats.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_profile: Option<String>,
}

/// One graph node in flat form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: String,
    pub element_type: ElementType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assumption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub justification: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_sandbox: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_pattern: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_from_pattern: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<Comment>,
}

impl Element {
    /// A bare element with every optional attribute unset.
    pub fn new(id: impl Into<String>, element_type: ElementType, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            element_type,
            role: None,
            parent_id: None,
            name: name.into(),
            description: String::new(),
            assumption: None,
            justification: None,
            context: None,
            url: None,
            level: None,
            in_sandbox: None,
            from_pattern: None,
            modified_from_pattern: None,
            comments: Vec::new(),
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Whether this element is the case's root goal.
    pub fn is_root_goal(&self) -> bool {
        self.element_type == ElementType::Goal && self.parent_id.is_none()
    }
}

/// Many-to-many association between an evidence element and a claim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceLink {
    pub evidence_id: String,
    pub claim_id: String,
}

impl EvidenceLink {
    pub fn new(evidence_id: impl Into<String>, claim_id: impl Into<String>) -> Self {
        Self {
            evidence_id: evidence_id.into(),
            claim_id: claim_id.into(),
        }
    }
}

fn default_flat_version() -> String {
    FLAT_VERSION.to_string()
}

fn default_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// The flat case envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatCase {
    #[serde(default = "default_flat_version")]
    pub version: String,
    #[serde(default = "default_timestamp")]
    pub exported_at: DateTime<Utc>,
    #[serde(default)]
    pub case: CaseInfo,
    pub elements: Vec<Element>,
    #[serde(default)]
    pub evidence_links: Vec<EvidenceLink>,
}

impl FlatCase {
    pub fn new(case: CaseInfo, exported_at: DateTime<Utc>) -> Self {
        Self {
            version: FLAT_VERSION.to_string(),
            exported_at,
            case,
            elements: Vec::new(),
            evidence_links: Vec::new(),
        }
    }

    /// Lookup one element by id.
    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|element| element.id == id)
    }

    /// Elements of one type, in list order.
    pub fn elements_of(&self, element_type: ElementType) -> impl Iterator<Item = &Element> {
        self.elements
            .iter()
            .filter(move |element| element.element_type == element_type)
    }

    /// Links pointing at `claim_id`, in list order.
    pub fn links_for_claim<'a>(
        &'a self,
        claim_id: &'a str,
    ) -> impl Iterator<Item = &'a EvidenceLink> + 'a {
        self.evidence_links
            .iter()
            .filter(move |link| link.claim_id == claim_id)
    }
}
