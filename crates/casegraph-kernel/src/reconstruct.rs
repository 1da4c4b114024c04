//! Flat rows → nested tree, the shape served by the read API.
//!
//! The unique root goal holds its contexts, strategies, and direct property
//! claims. Each property claim holds its nested claims and its evidence,
//! merged from parent-linked rows and evidence links and deduplicated by id.

use std::collections::{HashMap, HashSet};
use tracing::warn;

use crate::element::{Element, ElementType, FlatCase};
use crate::error::IntegrityError;
use crate::options::TransformOptions;
use crate::tree::{NestedCaseExport, TreeNode};

/// Rebuild the nested export for one stored case.
pub fn reconstruct_nested(
    flat: &FlatCase,
    options: &TransformOptions,
) -> Result<NestedCaseExport, IntegrityError> {
    let result = rebuild(flat);
    if let Err(error) = &result {
        warn!(case = ?flat.case.id, %error, "case failed reconstruction");
    }
    let tree = result?;
    Ok(NestedCaseExport::new(flat.case.clone(), options.now, tree))
}

fn rebuild(flat: &FlatCase) -> Result<TreeNode, IntegrityError> {
    let root = root_goal(&flat.elements)?;

    let mut by_id: HashMap<&str, &Element> = HashMap::new();
    let mut children: HashMap<&str, Vec<&Element>> = HashMap::new();
    for element in &flat.elements {
        by_id.entry(element.id.as_str()).or_insert(element);
        if let Some(parent) = element.parent_id.as_deref() {
            children.entry(parent).or_default().push(element);
        }
    }

    let mut linked: HashMap<&str, Vec<&Element>> = HashMap::new();
    for link in &flat.evidence_links {
        let dangling = || IntegrityError::DanglingEvidenceLink {
            evidence_id: link.evidence_id.clone(),
            claim_id: link.claim_id.clone(),
        };
        let evidence = by_id
            .get(link.evidence_id.as_str())
            .copied()
            .ok_or_else(dangling)?;
        let claim = by_id
            .get(link.claim_id.as_str())
            .copied()
            .ok_or_else(dangling)?;
        expect_type(evidence, ElementType::Evidence)?;
        expect_type(claim, ElementType::PropertyClaim)?;
        linked.entry(claim.id.as_str()).or_default().push(evidence);
    }

    let mut builder = TreeBuilder {
        children,
        linked,
        visited: HashSet::new(),
    };
    let tree = builder.goal(root);

    let unreachable = flat
        .elements
        .iter()
        .filter(|e| e.element_type != ElementType::Evidence)
        .filter(|e| !builder.visited.contains(e.id.as_str()))
        .count();
    if unreachable > 0 {
        warn!(
            unreachable,
            "elements not reachable from the root goal were omitted"
        );
    }
    Ok(tree)
}

fn root_goal(elements: &[Element]) -> Result<&Element, IntegrityError> {
    let roots: Vec<&Element> = elements.iter().filter(|e| e.is_root_goal()).collect();
    match roots.as_slice() {
        [root] => Ok(*root),
        [] => Err(IntegrityError::MissingRootGoal),
        many => Err(IntegrityError::MultipleRootGoals {
            ids: many.iter().map(|e| e.id.clone()).collect(),
        }),
    }
}

fn expect_type(element: &Element, expected: ElementType) -> Result<(), IntegrityError> {
    if element.element_type == expected {
        Ok(())
    } else {
        Err(IntegrityError::EvidenceLinkTypeMismatch {
            id: element.id.clone(),
            expected,
            actual: element.element_type,
        })
    }
}

struct TreeBuilder<'a> {
    children: HashMap<&'a str, Vec<&'a Element>>,
    linked: HashMap<&'a str, Vec<&'a Element>>,
    visited: HashSet<&'a str>,
}

impl<'a> TreeBuilder<'a> {
    fn children_of(&self, id: &str, element_type: ElementType) -> Vec<&'a Element> {
        self.children
            .get(id)
            .map(|kids| {
                kids.iter()
                    .copied()
                    .filter(|kid| kid.element_type == element_type)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Mark `element` visited; false if it was already placed (a cycle).
    fn enter(&mut self, element: &'a Element) -> bool {
        self.visited.insert(element.id.as_str())
    }

    fn goal(&mut self, goal: &'a Element) -> TreeNode {
        self.enter(goal);
        let mut node = TreeNode::from_element(goal);

        for context in self.children_of(&goal.id, ElementType::Context) {
            if self.enter(context) {
                node.children.push(TreeNode::from_element(context));
            }
        }
        for strategy in self.children_of(&goal.id, ElementType::Strategy) {
            if let Some(child) = self.strategy(strategy) {
                node.children.push(child);
            }
        }
        for claim in self.children_of(&goal.id, ElementType::PropertyClaim) {
            if let Some(child) = self.claim(claim) {
                node.children.push(child);
            }
        }
        node
    }

    fn strategy(&mut self, strategy: &'a Element) -> Option<TreeNode> {
        if !self.enter(strategy) {
            return None;
        }
        let mut node = TreeNode::from_element(strategy);
        for claim in self.children_of(&strategy.id, ElementType::PropertyClaim) {
            if let Some(child) = self.claim(claim) {
                node.children.push(child);
            }
        }
        Some(node)
    }

    fn claim(&mut self, claim: &'a Element) -> Option<TreeNode> {
        if !self.enter(claim) {
            return None;
        }
        let mut node = TreeNode::from_element(claim);
        for nested in self.children_of(&claim.id, ElementType::PropertyClaim) {
            if let Some(child) = self.claim(nested) {
                node.children.push(child);
            }
        }

        let structural = self.children_of(&claim.id, ElementType::Evidence);
        let via_links = self
            .linked
            .get(claim.id.as_str())
            .cloned()
            .unwrap_or_default();
        let mut placed: HashSet<&str> = HashSet::new();
        for evidence in structural.into_iter().chain(via_links) {
            if placed.insert(evidence.id.as_str()) {
                self.visited.insert(evidence.id.as_str());
                node.children.push(TreeNode::from_element(evidence));
            }
        }
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{CaseInfo, EvidenceLink};
    use chrono::{TimeZone, Utc};

    fn options() -> TransformOptions {
        TransformOptions::at(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap())
    }

    fn el(id: &str, element_type: ElementType, parent: Option<&str>) -> Element {
        let element = Element::new(id, element_type, id.to_uppercase());
        match parent {
            Some(parent) => element.with_parent(parent),
            None => element,
        }
    }

    fn flat(elements: Vec<Element>, links: Vec<EvidenceLink>) -> FlatCase {
        let mut flat = FlatCase::new(CaseInfo::default(), options().now);
        flat.elements = elements;
        flat.evidence_links = links;
        flat
    }

    fn child_ids(node: &TreeNode) -> Vec<&str> {
        node.children.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn root_children_are_grouped_by_type() {
        let case = flat(
            vec![
                el("p1", ElementType::PropertyClaim, Some("g")),
                el("g", ElementType::Goal, None),
                el("s1", ElementType::Strategy, Some("g")),
                el("c1", ElementType::Context, Some("g")),
                el("p2", ElementType::PropertyClaim, Some("s1")),
            ],
            vec![],
        );
        let export = reconstruct_nested(&case, &options()).expect("reconstruct");
        assert_eq!(export.version, "1.0");
        assert_eq!(child_ids(&export.tree), vec!["c1", "s1", "p1"]);
        assert_eq!(child_ids(&export.tree.children[1]), vec!["p2"]);
    }

    #[test]
    fn evidence_merges_structural_and_linked_without_duplicates() {
        let case = flat(
            vec![
                el("g", ElementType::Goal, None),
                el("p1", ElementType::PropertyClaim, Some("g")),
                el("p1a", ElementType::PropertyClaim, Some("p1")),
                el("e-struct", ElementType::Evidence, Some("p1")),
                el("e-shared", ElementType::Evidence, None),
            ],
            vec![
                EvidenceLink::new("e-struct", "p1"),
                EvidenceLink::new("e-shared", "p1"),
                EvidenceLink::new("e-shared", "p1a"),
            ],
        );
        let export = reconstruct_nested(&case, &options()).expect("reconstruct");
        let p1 = &export.tree.children[0];
        assert_eq!(child_ids(p1), vec!["p1a", "e-struct", "e-shared"]);
        assert_eq!(child_ids(&p1.children[0]), vec!["e-shared"]);
    }

    #[test]
    fn missing_root_goal_is_an_integrity_error() {
        let case = flat(vec![el("p", ElementType::PropertyClaim, None)], vec![]);
        assert_eq!(
            reconstruct_nested(&case, &options()),
            Err(IntegrityError::MissingRootGoal)
        );
    }

    #[test]
    fn multiple_root_goals_are_an_integrity_error() {
        let case = flat(
            vec![el("g1", ElementType::Goal, None), el("g2", ElementType::Goal, None)],
            vec![],
        );
        assert_eq!(
            reconstruct_nested(&case, &options()),
            Err(IntegrityError::MultipleRootGoals {
                ids: vec!["g1".to_string(), "g2".to_string()]
            })
        );
    }

    #[test]
    fn dangling_link_is_an_integrity_error() {
        let case = flat(
            vec![
                el("g", ElementType::Goal, None),
                el("p", ElementType::PropertyClaim, Some("g")),
            ],
            vec![EvidenceLink::new("gone", "p")],
        );
        assert_eq!(
            reconstruct_nested(&case, &options()),
            Err(IntegrityError::DanglingEvidenceLink {
                evidence_id: "gone".to_string(),
                claim_id: "p".to_string()
            })
        );
    }

    #[test]
    fn mistyped_link_is_an_integrity_error() {
        let case = flat(
            vec![
                el("g", ElementType::Goal, None),
                el("e", ElementType::Evidence, None),
            ],
            vec![EvidenceLink::new("e", "g")],
        );
        let err = reconstruct_nested(&case, &options()).expect_err("must fail");
        assert!(matches!(
            err,
            IntegrityError::EvidenceLinkTypeMismatch {
                expected: ElementType::PropertyClaim,
                actual: ElementType::Goal,
                ..
            }
        ));
    }

    #[test]
    fn cycles_below_the_root_do_not_loop() {
        let case = flat(
            vec![
                el("g", ElementType::Goal, None),
                el("a", ElementType::PropertyClaim, Some("b")),
                el("b", ElementType::PropertyClaim, Some("a")),
                el("p", ElementType::PropertyClaim, Some("g")),
            ],
            vec![],
        );
        let export = reconstruct_nested(&case, &options()).expect("reconstruct");
        assert_eq!(export.tree.node_count(), 2);
    }
}
