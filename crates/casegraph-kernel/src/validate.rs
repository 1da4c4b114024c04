//! Payload validation against the three known formats.
//!
//! Validation walks the raw JSON first and records every problem with a
//! dot-joined path, then parses the typed payload. All issues surface at
//! once; nothing short-circuits after the first error.

use chrono::DateTime;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::detect::{CaseFormat, Detection};
use crate::element::{ElementType, FLAT_VERSION, FlatCase};
use crate::error::{
    CODE_DANGLING_REFERENCE, CODE_DUPLICATE_ID, CODE_INVALID_STRUCTURE, CODE_INVALID_TYPE,
    CODE_INVALID_VALUE, CODE_REQUIRED, CODE_UNRECOGNIZED_FORMAT, ValidationErrors,
    ValidationIssue,
};
use crate::legacy::legacy_warnings;
use crate::legacy_model::LegacyCase;
use crate::tree::{NESTED_VERSION, NestedCaseExport};

pub const UNRECOGNIZED_FORMAT_MESSAGE: &str = "payload could not be parsed as any known case format; expected a nested export ({version: \"1.0\", case, tree}), a flat case ({version: \"2.0\", elements, evidenceLinks}), or a legacy case ({goals, name, description})";

/// A typed payload, one variant per format.
#[derive(Debug, Clone, PartialEq)]
pub enum CasePayload {
    Legacy(LegacyCase),
    Flat(FlatCase),
    Nested(NestedCaseExport),
}

impl CasePayload {
    pub fn format(&self) -> CaseFormat {
        match self {
            CasePayload::Legacy(_) => CaseFormat::Legacy,
            CasePayload::Flat(_) => CaseFormat::Flat,
            CasePayload::Nested(_) => CaseFormat::Nested,
        }
    }
}

/// Successful validation: the typed payload plus non-fatal warnings.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedCase {
    pub payload: CasePayload,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidatedCase {
    pub fn format(&self) -> CaseFormat {
        self.payload.format()
    }
}

/// Validate `value` as the detected format, or try every format in turn.
///
/// With no detection the order is nested, flat, legacy; the first shape that
/// validates wins. If none does, a single root error names all three.
pub fn validate_case(value: &Value, target: Detection) -> Result<ValidatedCase, ValidationErrors> {
    if let Some(format) = target {
        return validate_as(value, format);
    }

    for format in [CaseFormat::Nested, CaseFormat::Flat, CaseFormat::Legacy] {
        if let Ok(validated) = validate_as(value, format) {
            debug!(format = %format, "undetected payload validated by fallback");
            return Ok(validated);
        }
    }

    Err(ValidationErrors::new(vec![ValidationIssue::at_root(
        CODE_UNRECOGNIZED_FORMAT,
        UNRECOGNIZED_FORMAT_MESSAGE,
    )]))
}

/// Validate `value` strictly as `format`.
pub fn validate_as(value: &Value, format: CaseFormat) -> Result<ValidatedCase, ValidationErrors> {
    let mut checker = Checker::default();
    match format {
        CaseFormat::Nested => {
            checker.check_nested(value);
            let export: NestedCaseExport = checker.finish_typed(value, format)?;
            Ok(ValidatedCase {
                payload: CasePayload::Nested(export),
                warnings: checker.warnings,
            })
        }
        CaseFormat::Flat => {
            checker.check_flat(value);
            let flat: FlatCase = checker.finish_typed(value, format)?;
            Ok(ValidatedCase {
                payload: CasePayload::Flat(flat),
                warnings: checker.warnings,
            })
        }
        CaseFormat::Legacy => {
            checker.check_legacy(value);
            let legacy: LegacyCase = checker.finish_typed(value, format)?;
            let mut warnings = checker.warnings;
            warnings.extend(legacy_warnings(&legacy));
            Ok(ValidatedCase {
                payload: CasePayload::Legacy(legacy),
                warnings,
            })
        }
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn index(path: &str, idx: usize) -> String {
    join(path, &idx.to_string())
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Ids seen in one nested tree.
///
/// Evidence may repeat an id only for the same `name|url` item, the key the
/// flattener collapses on. Evidence and non-evidence ids never overlap.
#[derive(Debug, Default)]
struct TreeIds {
    nodes: HashSet<String>,
    evidence: HashMap<String, String>,
}

impl TreeIds {
    /// Record `id`; the message describes a clash with an earlier node.
    fn record(&mut self, id: &str, evidence: bool, node: &Map<String, Value>) -> Option<String> {
        if !evidence {
            if self.evidence.contains_key(id) {
                return Some(format!("node id '{id}' is already used by an evidence node"));
            }
            if !self.nodes.insert(id.to_string()) {
                return Some(format!("duplicate node id '{id}'"));
            }
            return None;
        }

        if self.nodes.contains(id) {
            return Some(format!("evidence id '{id}' is already used by a non-evidence node"));
        }
        let text = |key: &str| node.get(key).and_then(Value::as_str).unwrap_or("");
        let key = format!("{}|{}", text("name"), text("url"));
        match self.evidence.entry(id.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(key);
                None
            }
            Entry::Occupied(first) if *first.get() != key => Some(format!(
                "evidence id '{id}' names '{key}' here but '{}' earlier",
                first.get()
            )),
            Entry::Occupied(_) => None,
        }
    }
}

#[derive(Debug, Default)]
struct Checker {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

impl Checker {
    fn error(&mut self, path: String, code: &str, message: impl Into<String>) {
        self.errors.push(ValidationIssue::new(path, code, message));
    }

    fn warn(&mut self, path: String, code: &str, message: impl Into<String>) {
        self.warnings.push(ValidationIssue::new(path, code, message));
    }

    fn type_error(&mut self, path: String, expected: &str, actual: &Value) {
        self.error(
            path,
            CODE_INVALID_TYPE,
            format!("expected {expected}, got {}", value_kind(actual)),
        );
    }

    fn finish_typed<T: DeserializeOwned>(
        &mut self,
        value: &Value,
        format: CaseFormat,
    ) -> Result<T, ValidationErrors> {
        if !self.errors.is_empty() {
            return Err(ValidationErrors::new(std::mem::take(&mut self.errors)));
        }
        serde_json::from_value(value.clone()).map_err(|e| {
            ValidationErrors::new(vec![ValidationIssue::at_root(
                CODE_INVALID_VALUE,
                format!("payload does not match the {format} shape: {e}"),
            )])
        })
    }

    fn object<'v>(&mut self, value: &'v Value, path: &str) -> Option<&'v Map<String, Value>> {
        match value.as_object() {
            Some(object) => Some(object),
            None => {
                self.type_error(path.to_string(), "an object", value);
                None
            }
        }
    }

    fn required_string<'v>(
        &mut self,
        object: &'v Map<String, Value>,
        key: &str,
        path: &str,
    ) -> Option<&'v str> {
        match object.get(key) {
            None | Some(Value::Null) => {
                self.error(join(path, key), CODE_REQUIRED, format!("{key} is required"));
                None
            }
            Some(Value::String(text)) => Some(text.as_str()),
            Some(other) => {
                self.type_error(join(path, key), "a string", other);
                None
            }
        }
    }

    fn required_id<'v>(
        &mut self,
        object: &'v Map<String, Value>,
        key: &str,
        path: &str,
    ) -> Option<&'v str> {
        let id = self.required_string(object, key, path)?;
        if id.trim().is_empty() {
            self.error(
                join(path, key),
                CODE_INVALID_VALUE,
                format!("{key} must be a non-empty string"),
            );
            return None;
        }
        Some(id)
    }

    /// Optional string; `null` counts as absent.
    fn optional_string<'v>(
        &mut self,
        object: &'v Map<String, Value>,
        key: &str,
        path: &str,
    ) -> Option<&'v str> {
        match object.get(key) {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) => Some(text.as_str()),
            Some(other) => {
                self.type_error(join(path, key), "a string", other);
                None
            }
        }
    }

    /// Optional string that defaults to empty; `null` is rejected.
    fn optional_text(&mut self, object: &Map<String, Value>, key: &str, path: &str) {
        match object.get(key) {
            None | Some(Value::String(_)) => {}
            Some(other) => self.type_error(join(path, key), "a string", other),
        }
    }

    fn optional_bool(&mut self, object: &Map<String, Value>, key: &str, path: &str) {
        match object.get(key) {
            None | Some(Value::Null) | Some(Value::Bool(_)) => {}
            Some(other) => self.type_error(join(path, key), "a boolean", other),
        }
    }

    fn optional_level(&mut self, object: &Map<String, Value>, key: &str, path: &str) {
        match object.get(key) {
            None | Some(Value::Null) => {}
            Some(Value::Number(number)) => {
                let in_range = number.as_u64().is_some_and(|n| n <= u64::from(u32::MAX));
                if !in_range {
                    self.error(
                        join(path, key),
                        CODE_INVALID_VALUE,
                        format!("{key} must be a non-negative integer"),
                    );
                }
            }
            Some(other) => self.type_error(join(path, key), "an integer", other),
        }
    }

    fn optional_timestamp(&mut self, object: &Map<String, Value>, key: &str, path: &str) {
        if let Some(text) = self.optional_string(object, key, path) {
            self.timestamp(text, join(path, key));
        }
    }

    fn timestamp(&mut self, text: &str, path: String) {
        if DateTime::parse_from_rfc3339(text).is_err() {
            self.error(
                path,
                CODE_INVALID_VALUE,
                format!("'{text}' is not an RFC 3339 timestamp"),
            );
        }
    }

    fn optional_string_list(&mut self, object: &Map<String, Value>, key: &str, path: &str) {
        let items = self.optional_array(object, key, path);
        let list_path = join(path, key);
        for (idx, item) in items.iter().enumerate() {
            if !item.is_string() {
                self.type_error(index(&list_path, idx), "a string", item);
            }
        }
    }

    /// Optional array; missing or `null` yields an empty slice.
    fn optional_array<'v>(
        &mut self,
        object: &'v Map<String, Value>,
        key: &str,
        path: &str,
    ) -> &'v [Value] {
        match object.get(key) {
            None | Some(Value::Null) => &[],
            Some(Value::Array(items)) => items.as_slice(),
            Some(other) => {
                self.type_error(join(path, key), "an array", other);
                &[]
            }
        }
    }

    fn required_array<'v>(
        &mut self,
        object: &'v Map<String, Value>,
        key: &str,
        path: &str,
    ) -> Option<&'v [Value]> {
        match object.get(key) {
            None | Some(Value::Null) => {
                self.error(join(path, key), CODE_REQUIRED, format!("{key} is required"));
                None
            }
            Some(Value::Array(items)) => Some(items.as_slice()),
            Some(other) => {
                self.type_error(join(path, key), "an array", other);
                None
            }
        }
    }

    fn element_type(
        &mut self,
        object: &Map<String, Value>,
        key: &str,
        path: &str,
    ) -> Option<ElementType> {
        let raw = self.required_string(object, key, path)?;
        match ElementType::parse(raw) {
            Some(element_type) => Some(element_type),
            None => {
                self.error(
                    join(path, key),
                    CODE_INVALID_VALUE,
                    format!(
                        "unknown element type '{raw}' (expected GOAL, STRATEGY, PROPERTY_CLAIM, EVIDENCE, or CONTEXT)"
                    ),
                );
                None
            }
        }
    }

    fn version(&mut self, root: &Map<String, Value>, expected: &str) {
        match root.get("version") {
            None | Some(Value::Null) => {}
            Some(Value::String(tag)) if tag == expected => {}
            Some(other) => self.error(
                "version".to_string(),
                CODE_INVALID_VALUE,
                format!("expected version \"{expected}\", got {other}"),
            ),
        }
    }

    fn case_info(&mut self, root: &Map<String, Value>) {
        let Some(value) = root.get("case") else {
            return;
        };
        let Some(case) = self.object(value, "case") else {
            return;
        };
        self.optional_string(case, "id", "case");
        self.optional_text(case, "name", "case");
        self.optional_text(case, "description", "case");
        self.optional_string(case, "colorProfile", "case");
    }

    fn comments(&mut self, object: &Map<String, Value>, path: &str) {
        let items = self.optional_array(object, "comments", path);
        let list_path = join(path, "comments");
        for (idx, item) in items.iter().enumerate() {
            let item_path = index(&list_path, idx);
            let Some(comment) = self.object(item, &item_path) else {
                continue;
            };
            self.required_string(comment, "author", &item_path);
            self.required_string(comment, "content", &item_path);
            if let Some(created) = self.required_string(comment, "createdAt", &item_path) {
                self.timestamp(created, join(&item_path, "createdAt"));
            }
        }
    }

    /// Scalars shared by tree nodes and flat elements.
    fn node_scalars(&mut self, object: &Map<String, Value>, path: &str) {
        self.required_string(object, "name", path);
        self.optional_text(object, "description", path);
        for key in ["role", "assumption", "justification", "url"] {
            self.optional_string(object, key, path);
        }
        self.optional_string_list(object, "context", path);
        self.optional_level(object, "level", path);
        for key in ["inSandbox", "fromPattern", "modifiedFromPattern"] {
            self.optional_bool(object, key, path);
        }
        self.comments(object, path);
    }

    // ── Nested ──

    fn check_nested(&mut self, value: &Value) {
        let Some(root) = self.object(value, "") else {
            return;
        };
        self.version(root, NESTED_VERSION);
        self.optional_timestamp(root, "exportedAt", "");
        self.case_info(root);

        match root.get("tree") {
            None | Some(Value::Null) => {
                self.error("tree".to_string(), CODE_REQUIRED, "tree is required");
            }
            Some(tree) => {
                let mut ids = TreeIds::default();
                self.check_tree_node(tree, "tree", None, &mut ids);
            }
        }
    }

    fn check_tree_node(
        &mut self,
        value: &Value,
        path: &str,
        parent: Option<Option<ElementType>>,
        ids: &mut TreeIds,
    ) {
        let Some(node) = self.object(value, path) else {
            return;
        };
        let id = self.required_id(node, "id", path);
        let node_type = self.element_type(node, "type", path);
        self.node_scalars(node, path);
        let children = self.optional_array(node, "children", path);

        match (parent, node_type) {
            (None, Some(root_type)) if root_type != ElementType::Goal => self.error(
                join(path, "type"),
                CODE_INVALID_STRUCTURE,
                format!("root node must be a GOAL, got {root_type}"),
            ),
            (Some(_), Some(ElementType::Goal)) => self.error(
                join(path, "type"),
                CODE_INVALID_STRUCTURE,
                "GOAL nodes may only appear at the root",
            ),
            (Some(Some(parent_type)), Some(ElementType::Evidence))
                if parent_type != ElementType::PropertyClaim =>
            {
                self.error(
                    path.to_string(),
                    CODE_INVALID_STRUCTURE,
                    format!(
                        "evidence must sit beneath a PROPERTY_CLAIM, found under a {parent_type}"
                    ),
                )
            }
            _ => {}
        }

        let leaf = match node_type {
            Some(ElementType::Evidence) => Some("evidence"),
            Some(ElementType::Context) => Some("context"),
            _ => None,
        };
        if let Some(kind) = leaf
            && !children.is_empty()
        {
            self.error(
                join(path, "children"),
                CODE_INVALID_STRUCTURE,
                format!("{kind} nodes cannot have children"),
            );
        }

        if let Some(id) = id {
            let evidence = node_type == Some(ElementType::Evidence);
            if let Some(message) = ids.record(id, evidence, node) {
                self.error(join(path, "id"), CODE_DUPLICATE_ID, message);
            }
        }

        let children_path = join(path, "children");
        for (idx, child) in children.iter().enumerate() {
            self.check_tree_node(child, &index(&children_path, idx), Some(node_type), ids);
        }
    }

    // ── Flat ──

    fn check_flat(&mut self, value: &Value) {
        let Some(root) = self.object(value, "") else {
            return;
        };
        self.version(root, FLAT_VERSION);
        self.optional_timestamp(root, "exportedAt", "");
        self.case_info(root);

        let elements = self.required_array(root, "elements", "").unwrap_or_default();
        let links = self.optional_array(root, "evidenceLinks", "");

        let mut types: HashMap<&str, ElementType> = HashMap::new();
        let mut roots: Vec<&str> = Vec::new();
        for (idx, item) in elements.iter().enumerate() {
            let path = index("elements", idx);
            let Some(element) = self.object(item, &path) else {
                continue;
            };
            let id = self.required_id(element, "id", &path);
            let element_type = self.element_type(element, "elementType", &path);
            let parent_id = self.optional_string(element, "parentId", &path);
            self.node_scalars(element, &path);

            let (Some(id), Some(element_type)) = (id, element_type) else {
                continue;
            };
            if types.insert(id, element_type).is_some() {
                self.error(
                    join(&path, "id"),
                    CODE_DUPLICATE_ID,
                    format!("duplicate element id '{id}'"),
                );
            }
            if element_type == ElementType::Goal && parent_id.is_none() {
                roots.push(id);
            }
            if element_type == ElementType::Evidence && parent_id.is_some() {
                self.error(
                    join(&path, "parentId"),
                    CODE_INVALID_STRUCTURE,
                    "evidence must not carry a parentId; attach it with an evidence link",
                );
            }
        }

        match roots.len() {
            1 => {}
            0 => self.error(
                "elements".to_string(),
                CODE_INVALID_STRUCTURE,
                "case must contain exactly one GOAL without a parentId, found none",
            ),
            n => self.error(
                "elements".to_string(),
                CODE_INVALID_STRUCTURE,
                format!(
                    "case must contain exactly one GOAL without a parentId, found {n}: {}",
                    roots.join(", ")
                ),
            ),
        }

        for (idx, item) in links.iter().enumerate() {
            let path = index("evidenceLinks", idx);
            let Some(link) = self.object(item, &path) else {
                continue;
            };
            let endpoints = [
                ("evidenceId", ElementType::Evidence),
                ("claimId", ElementType::PropertyClaim),
            ];
            for (key, expected) in endpoints {
                let Some(target) = self.required_id(link, key, &path) else {
                    continue;
                };
                match types.get(target) {
                    Some(actual) if *actual == expected => {}
                    Some(actual) => self.error(
                        join(&path, key),
                        CODE_DANGLING_REFERENCE,
                        format!("'{target}' is a {actual}, expected {expected}"),
                    ),
                    None => self.error(
                        join(&path, key),
                        CODE_DANGLING_REFERENCE,
                        format!("'{target}' does not reference an element in this case"),
                    ),
                }
            }
        }
    }

    // ── Legacy ──

    fn check_legacy(&mut self, value: &Value) {
        let Some(root) = self.object(value, "") else {
            return;
        };
        self.legacy_key(root, "");
        self.optional_text(root, "name", "");
        self.optional_text(root, "description", "");
        self.optional_string(root, "type", "");
        self.optional_string(root, "color_profile", "");
        for key in ["view_groups", "edit_groups", "review_groups"] {
            self.optional_array(root, key, "");
        }

        let Some(goals) = self.required_array(root, "goals", "") else {
            return;
        };
        if goals.len() != 1 {
            self.error(
                "goals".to_string(),
                CODE_INVALID_STRUCTURE,
                format!(
                    "legacy case must contain exactly one goal, found {}",
                    goals.len()
                ),
            );
        }
        for (idx, goal) in goals.iter().enumerate() {
            self.check_legacy_goal(goal, &index("goals", idx));
        }
    }

    fn legacy_key(&mut self, object: &Map<String, Value>, path: &str) {
        match object.get("id") {
            None | Some(Value::Null) | Some(Value::String(_)) => {}
            Some(Value::Number(number)) if number.is_i64() => {}
            Some(other) => self.type_error(join(path, "id"), "an integer or string id", other),
        }
    }

    fn legacy_common(&mut self, object: &Map<String, Value>, path: &str) {
        self.legacy_key(object, path);
        self.required_string(object, "name", path);
        for key in ["short_description", "long_description", "keywords"] {
            self.optional_string(object, key, path);
        }

        let items = self.optional_array(object, "comments", path);
        let list_path = join(path, "comments");
        for (idx, item) in items.iter().enumerate() {
            let item_path = index(&list_path, idx);
            let Some(comment) = self.object(item, &item_path) else {
                continue;
            };
            self.optional_string(comment, "author", &item_path);
            self.optional_text(comment, "content", &item_path);
            for key in ["created_at", "created_date"] {
                self.optional_timestamp(comment, key, &item_path);
            }
        }
    }

    fn check_legacy_goal(&mut self, value: &Value, path: &str) {
        let Some(goal) = self.object(value, path) else {
            return;
        };
        self.legacy_common(goal, path);
        self.optional_string(goal, "assumption", path);
        self.optional_bool(goal, "in_sandbox", path);

        let context_path = join(path, "context");
        for (idx, item) in self.optional_array(goal, "context", path).iter().enumerate() {
            let item_path = index(&context_path, idx);
            if let Some(context) = self.object(item, &item_path) {
                self.legacy_common(context, &item_path);
            }
        }

        let strategies_path = join(path, "strategies");
        for (idx, item) in self.optional_array(goal, "strategies", path).iter().enumerate() {
            self.check_legacy_strategy(item, &index(&strategies_path, idx));
        }

        let claims_path = join(path, "property_claims");
        for (idx, item) in self
            .optional_array(goal, "property_claims", path)
            .iter()
            .enumerate()
        {
            self.check_legacy_claim(item, &index(&claims_path, idx));
        }
    }

    fn check_legacy_strategy(&mut self, value: &Value, path: &str) {
        let Some(strategy) = self.object(value, path) else {
            return;
        };
        self.legacy_common(strategy, path);
        self.optional_string(strategy, "assumption", path);
        self.optional_string(strategy, "justification", path);
        self.optional_bool(strategy, "in_sandbox", path);

        let claims_path = join(path, "property_claims");
        for (idx, item) in self
            .optional_array(strategy, "property_claims", path)
            .iter()
            .enumerate()
        {
            self.check_legacy_claim(item, &index(&claims_path, idx));
        }
    }

    fn check_legacy_claim(&mut self, value: &Value, path: &str) {
        let Some(claim) = self.object(value, path) else {
            return;
        };
        self.legacy_common(claim, path);
        for key in ["claim_type", "assumption", "justification"] {
            self.optional_string(claim, key, path);
        }
        self.optional_level(claim, "level", path);
        self.optional_bool(claim, "in_sandbox", path);

        let claims_path = join(path, "property_claims");
        for (idx, item) in self
            .optional_array(claim, "property_claims", path)
            .iter()
            .enumerate()
        {
            self.check_legacy_claim(item, &index(&claims_path, idx));
        }

        let evidence_path = join(path, "evidence");
        for (idx, item) in self.optional_array(claim, "evidence", path).iter().enumerate() {
            let item_path = index(&evidence_path, idx);
            if let Some(evidence) = self.object(item, &item_path) {
                self.legacy_common(evidence, &item_path);
                self.optional_string(evidence, "URL", &item_path);
                self.optional_string(evidence, "url", &item_path);
            }
        }
    }
}
