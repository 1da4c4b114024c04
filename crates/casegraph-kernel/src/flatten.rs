//! Nested tree → flat element list.
//!
//! Evidence nodes are deduplicated by `name|url`: the first occurrence
//! registers the element, every occurrence under a property claim links it
//! to that claim. CONTEXT
//! children are folded into their parent's free-text `context` list instead
//! of becoming elements.

use std::collections::HashMap;
use tracing::debug;

use crate::element::{ElementType, EvidenceLink, FlatCase};
use crate::options::TransformOptions;
use crate::tree::{NestedCaseExport, TreeNode};

/// Flatten a validated nested export.
pub fn flatten_nested(export: &NestedCaseExport, options: &TransformOptions) -> FlatCase {
    let mut acc = FlattenAcc {
        flat: FlatCase::new(export.case.clone(), options.now),
        evidence_by_key: HashMap::new(),
    };
    acc.visit(&export.tree, None);

    debug!(
        elements = acc.flat.elements.len(),
        evidence_links = acc.flat.evidence_links.len(),
        evidence = acc.evidence_by_key.len(),
        "nested tree flattened"
    );
    acc.flat
}

/// Dedup key for an evidence node.
pub fn evidence_key(node: &TreeNode) -> String {
    format!("{}|{}", node.name, node.url.as_deref().unwrap_or(""))
}

/// Free-text rendering of a CONTEXT node, if it has any text.
fn context_text(node: &TreeNode) -> Option<String> {
    let description = node.description.trim();
    let text = if description.is_empty() {
        node.name.trim()
    } else {
        description
    };
    (!text.is_empty()).then(|| text.to_string())
}

struct FlattenAcc {
    flat: FlatCase,
    /// Evidence dedup key → id of the registered element.
    evidence_by_key: HashMap<String, String>,
}

impl FlattenAcc {
    fn visit(&mut self, node: &TreeNode, parent: Option<&TreeNode>) {
        if node.node_type == ElementType::Evidence {
            self.visit_evidence(node, parent);
            return;
        }

        let (contexts, rest): (Vec<&TreeNode>, Vec<&TreeNode>) = node
            .children
            .iter()
            .partition(|child| child.node_type == ElementType::Context);

        let mut element = node.to_element(parent.map(|p| p.id.as_str()));
        let mut context: Vec<String> = node.context.clone().unwrap_or_default();
        context.extend(contexts.into_iter().filter_map(context_text));
        element.context = (!context.is_empty()).then_some(context);
        self.flat.elements.push(element);

        for child in rest {
            self.visit(child, Some(node));
        }
    }

    fn visit_evidence(&mut self, node: &TreeNode, parent: Option<&TreeNode>) {
        let key = evidence_key(node);
        let evidence_id = match self.evidence_by_key.get(&key) {
            Some(existing) => existing.clone(),
            None => {
                self.flat.elements.push(node.to_element(None));
                self.evidence_by_key.insert(key, node.id.clone());
                node.id.clone()
            }
        };
        match parent {
            Some(claim) if claim.node_type == ElementType::PropertyClaim => {
                self.flat
                    .evidence_links
                    .push(EvidenceLink::new(evidence_id, claim.id.as_str()));
            }
            Some(other) => debug!(
                evidence = %evidence_id,
                parent = %other.id,
                "evidence outside a claim left unlinked"
            ),
            None => {}
        }
    }
}
