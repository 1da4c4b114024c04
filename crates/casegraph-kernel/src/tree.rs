//! Nested tree representation: the current export shape (`version: "1.0"`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::element::{CaseInfo, Comment, Element, ElementType};

pub const NESTED_VERSION: &str = "1.0";

/// One node of the nested tree, owning its children by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: ElementType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
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
    #[serde(default)]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn new(id: impl Into<String>, node_type: ElementType, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type,
            role: None,
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
            children: Vec::new(),
        }
    }

    /// Tree node carrying the scalars of a flat element, without children.
    pub fn from_element(element: &Element) -> Self {
        Self {
            id: element.id.clone(),
            node_type: element.element_type,
            role: element.role.clone(),
            name: element.name.clone(),
            description: element.description.clone(),
            assumption: element.assumption.clone(),
            justification: element.justification.clone(),
            context: element.context.clone(),
            url: element.url.clone(),
            level: element.level,
            in_sandbox: element.in_sandbox,
            from_pattern: element.from_pattern,
            modified_from_pattern: element.modified_from_pattern,
            comments: element.comments.clone(),
            children: Vec::new(),
        }
    }

    /// Flat element carrying this node's scalars under `parent_id`.
    ///
    /// `context` is left to the caller, which merges CONTEXT children in.
    pub fn to_element(&self, parent_id: Option<&str>) -> Element {
        Element {
            id: self.id.clone(),
            element_type: self.node_type,
            role: self.role.clone(),
            parent_id: parent_id.map(str::to_string),
            name: self.name.clone(),
            description: self.description.clone(),
            assumption: self.assumption.clone(),
            justification: self.justification.clone(),
            context: self.context.clone(),
            url: self.url.clone(),
            level: self.level,
            in_sandbox: self.in_sandbox,
            from_pattern: self.from_pattern,
            modified_from_pattern: self.modified_from_pattern,
            comments: self.comments.clone(),
        }
    }

    pub fn with_child(mut self, child: TreeNode) -> Self {
        self.children.push(child);
        self
    }

    /// Total node count, this node included.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(TreeNode::node_count).sum::<usize>()
    }

    /// Depth-first pre-order traversal.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a TreeNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

fn default_nested_version() -> String {
    NESTED_VERSION.to_string()
}

fn default_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// The nested export envelope served by the read API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NestedCaseExport {
    #[serde(default = "default_nested_version")]
    pub version: String,
    #[serde(default = "default_timestamp")]
    pub exported_at: DateTime<Utc>,
    #[serde(default)]
    pub case: CaseInfo,
    pub tree: TreeNode,
}

impl NestedCaseExport {
    pub fn new(case: CaseInfo, exported_at: DateTime<Utc>, tree: TreeNode) -> Self {
        Self {
            version: NESTED_VERSION.to_string(),
            exported_at,
            case,
            tree,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_node_reads_type_key_and_defaults_children() {
        let raw = r#"{"id":"g","type":"GOAL","name":"G1","description":"top"}"#;
        let node: TreeNode = serde_json::from_str(raw).expect("must parse tree node");
        assert_eq!(node.node_type, ElementType::Goal);
        assert!(node.children.is_empty());

        let value = serde_json::to_value(&node).expect("serialize");
        assert_eq!(value["type"], "GOAL");
        assert!(value["children"].as_array().is_some());
    }

    #[test]
    fn element_conversion_keeps_scalars() {
        let mut element = Element::new("c-1", ElementType::PropertyClaim, "P1").with_parent("g");
        element.level = Some(2);
        element.assumption = Some("stable load".to_string());

        let node = TreeNode::from_element(&element);
        let back = node.to_element(Some("g"));
        assert_eq!(back, element);
    }

    #[test]
    fn node_count_includes_descendants() {
        let tree = TreeNode::new("g", ElementType::Goal, "G1").with_child(
            TreeNode::new("c", ElementType::PropertyClaim, "P1")
                .with_child(TreeNode::new("e", ElementType::Evidence, "E1")),
        );
        assert_eq!(tree.node_count(), 3);

        let mut ids = Vec::new();
        tree.walk(&mut |node| ids.push(node.id.as_str()));
        assert_eq!(ids, vec!["g", "c", "e"]);
    }
}
