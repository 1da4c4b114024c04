//! Integration tests: run whole payloads from tests/fixtures/ through the
//! import pipeline and back out through reconstruction.

use casegraph_kernel::{
    CaseFormat, ElementType, EvidenceLink, ImportError, NestedCaseExport, TransformOptions,
    TreeNode, detect_format, evidence_key, flatten_nested, import_case, is_stable_id,
    reconstruct_nested, sort_by_dependency,
};
use chrono::{TimeZone, Utc};
use serde_json::Value;
use std::collections::HashSet;
use std::path::PathBuf;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_fixture(name: &str) -> Value {
    let path = fixtures_dir().join(format!("{name}.json"));
    let raw = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()));
    serde_json::from_str(&raw).unwrap_or_else(|e| panic!("failed to parse {}: {e}", path.display()))
}

fn options() -> TransformOptions {
    TransformOptions::at(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap())
}

/// Same tree with evidence moved last, sorted by dedup key, ids dropped.
fn normalize(node: &TreeNode) -> TreeNode {
    let mut out = node.clone();
    let (mut evidence, rest): (Vec<TreeNode>, Vec<TreeNode>) = node
        .children
        .iter()
        .map(normalize)
        .partition(|child| child.node_type == ElementType::Evidence);
    for item in &mut evidence {
        item.id.clear();
    }
    evidence.sort_by_key(evidence_key);
    out.children = rest;
    out.children.extend(evidence);
    out
}

#[test]
fn legacy_case_imports_with_warnings() {
    let payload = load_fixture("legacy_owner_keywords");
    assert_eq!(detect_format(&payload), Some(CaseFormat::Legacy));

    let outcome = import_case(&payload, &options()).expect("legacy fixture must import");
    assert_eq!(outcome.format, CaseFormat::Legacy);

    insta::assert_json_snapshot!(outcome.warnings, @r#"
    [
      {
        "path": "owner",
        "message": "owner is ignored; the importing user becomes the owner",
        "code": "owner_ignored"
      },
      {
        "path": "goals.0.property_claims.0.property_claims.0.keywords",
        "message": "keywords are deprecated and were ignored",
        "code": "keywords_deprecated"
      }
    ]
    "#);

    let flat_json = serde_json::to_value(&outcome.flat).expect("serialize flat case");
    assert!(flat_json.get("owner").is_none());
    assert!(flat_json["case"].get("owner").is_none());
    assert_eq!(flat_json["version"], "2.0");
    assert_eq!(outcome.flat.case.name, "Autonomous shuttle safety");
    assert_eq!(outcome.flat.case.color_profile.as_deref(), Some("default"));

    // Parentless evidence sorts as a root, right behind the goal.
    let names: Vec<&str> = outcome.flat.elements.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["G1", "Brake test log", "C1", "P1", "P1.1"]);

    let goal = &outcome.flat.elements[0];
    assert!(goal.is_root_goal());
    assert_eq!(
        goal.description,
        "The shuttle is acceptably safe\n\nThe shuttle is acceptably safe within its operating domain"
    );
    assert_eq!(outcome.flat.elements[2].description, "Campus roads only");
    assert_eq!(outcome.flat.elements[4].description, "Braking distance is bounded");
    assert_eq!(outcome.flat.elements[4].level, Some(2));

    for element in &outcome.flat.elements {
        assert!(is_stable_id(&element.id), "{} is not a UUID", element.id);
    }

    let evidence = &outcome.flat.elements[1];
    assert_eq!(evidence.element_type, ElementType::Evidence);
    assert!(evidence.parent_id.is_none());
    assert_eq!(evidence.url.as_deref(), Some("http://x/brakes.csv"));
    assert_eq!(evidence.comments.len(), 1);
    assert_eq!(
        outcome.flat.evidence_links,
        vec![EvidenceLink::new(
            evidence.id.clone(),
            outcome.flat.elements[4].id.clone()
        )]
    );
}

#[test]
fn shared_evidence_becomes_one_element_with_two_links() {
    let payload = load_fixture("shared_evidence");
    let outcome = import_case(&payload, &options()).expect("nested fixture must import");
    assert_eq!(outcome.format, CaseFormat::Nested);
    assert!(outcome.warnings.is_empty());

    let evidence: Vec<_> = outcome.flat.elements_of(ElementType::Evidence).collect();
    assert_eq!(evidence.len(), 1);
    assert_eq!(evidence[0].id, "e1");

    let claims: HashSet<&str> = outcome
        .flat
        .evidence_links
        .iter()
        .map(|link| link.claim_id.as_str())
        .collect();
    assert_eq!(outcome.flat.evidence_links.len(), 2);
    assert_eq!(claims, HashSet::from(["p1", "p2"]));

    let rebuilt = reconstruct_nested(&outcome.flat, &options()).expect("reconstruct");
    for claim in &rebuilt.tree.children {
        let ids: Vec<&str> = claim.children.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["e1"], "claim {}", claim.id);
    }
}

#[test]
fn nested_round_trip_preserves_the_tree() {
    let payload = load_fixture("round_trip");
    let original: NestedCaseExport =
        serde_json::from_value(payload.clone()).expect("fixture is a nested export");

    let outcome = import_case(&payload, &options()).expect("nested fixture must import");
    let rebuilt = reconstruct_nested(&outcome.flat, &options()).expect("reconstruct");

    assert_eq!(rebuilt.version, "1.0");
    assert_eq!(rebuilt.case, original.case);
    assert_eq!(rebuilt.exported_at, options().now);
    assert_eq!(normalize(&rebuilt.tree), normalize(&original.tree));
    assert_eq!(rebuilt.tree.comments.len(), 2);
    assert_eq!(rebuilt.tree.comments[0].author, "ana");

    // The repeated audit node collapses onto the first occurrence's id.
    let nested_claim = &rebuilt.tree.children[1].children[0];
    assert_eq!(nested_claim.children[0].id, "e1");
}

#[test]
fn sorting_an_imported_case_again_changes_nothing() {
    let payload = load_fixture("round_trip");
    let outcome = import_case(&payload, &options()).expect("import");

    let mut reversed = outcome.flat.elements.clone();
    reversed.reverse();
    let resorted = sort_by_dependency(reversed);

    let mut seen = HashSet::new();
    for element in &resorted {
        if let Some(parent) = element.parent_id.as_deref() {
            assert!(seen.contains(parent), "{} came before {parent}", element.id);
        }
        seen.insert(element.id.as_str());
    }
    assert_eq!(resorted.len(), outcome.flat.elements.len());

    let again = sort_by_dependency(outcome.flat.elements.clone());
    assert_eq!(again, outcome.flat.elements);
}

#[test]
fn flatten_is_deterministic_for_a_fixed_clock() {
    let export: NestedCaseExport =
        serde_json::from_value(load_fixture("round_trip")).expect("nested export");
    let first = flatten_nested(&export, &options());
    let second = flatten_nested(&export, &options());
    assert_eq!(first, second);
    assert_eq!(first.elements_of(ElementType::Evidence).count(), 2);
    assert_eq!(first.evidence_links.len(), 3);
}

#[test]
fn evidence_id_reused_for_a_different_item_is_refused() {
    let mut payload = load_fixture("shared_evidence");
    let second = &mut payload["tree"]["children"][1]["children"][0];
    second["id"] = Value::from("e1");
    second["name"] = Value::from("Another report");

    let err = import_case(&payload, &options()).expect_err("clashing evidence id must fail");
    let ImportError::Validation(errors) = err;
    assert_eq!(errors.codes(), vec!["duplicate_id"]);
    assert_eq!(errors.issues[0].path, "tree.children.1.children.0.id");
}
