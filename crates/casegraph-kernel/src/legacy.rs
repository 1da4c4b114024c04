//! Legacy nested export → flat element list.
//!
//! A depth-first walk over goal → contexts, strategies, and property claims.
//! Legacy keys are mapped to stable ids through run-scoped [`IdTable`]s, one
//! per legacy kind, since legacy integer keys are only unique within a kind.
//! An id one kind already emitted is re-minted for any other kind.
//! Evidence is deduplicated by its original key; every occurrence adds a link.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tracing::debug;

use crate::describe::{is_placeholder, merge_descriptions};
use crate::element::{
    CaseInfo, Comment, Element, ElementType, EvidenceLink, FlatCase, ROLE_TOP_LEVEL,
};
use crate::error::{
    ValidationIssue, WARNING_CLAIM_TYPE_DROPPED, WARNING_GROUPS_IGNORED,
    WARNING_KEYWORDS_DEPRECATED, WARNING_OWNER_IGNORED, WARNING_PERMISSIONS_IGNORED,
};
use crate::identity::{IdTable, get_or_create_id, mint_id};
use crate::legacy_model::{
    LegacyCase, LegacyComment, LegacyContext, LegacyEvidence, LegacyGoal, LegacyKey,
    LegacyPropertyClaim, LegacyStrategy,
};
use crate::options::TransformOptions;

/// Author recorded for legacy comments that carry none.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// Result of a legacy transform: the flat case plus informational warnings.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyTransform {
    pub flat: FlatCase,
    pub warnings: Vec<ValidationIssue>,
}

/// Flatten a validated legacy case.
pub fn legacy_to_flat(case: &LegacyCase, options: &TransformOptions) -> LegacyTransform {
    let info = CaseInfo {
        id: None,
        name: case.name.trim().to_string(),
        description: case.description.trim().to_string(),
        color_profile: case.color_profile.clone(),
    };
    let mut walk = LegacyWalk {
        options,
        ids: LegacyIdTables::default(),
        emitted: HashMap::new(),
        flat: FlatCase::new(info, options.now),
    };
    for goal in &case.goals {
        walk.goal(goal);
    }

    debug!(
        elements = walk.flat.elements.len(),
        evidence_links = walk.flat.evidence_links.len(),
        minted = walk.ids.minted(),
        "legacy case flattened"
    );

    LegacyTransform {
        flat: walk.flat,
        warnings: legacy_warnings(case),
    }
}

/// Informational warnings for legacy-only fields that are dropped on import.
pub fn legacy_warnings(case: &LegacyCase) -> Vec<ValidationIssue> {
    let mut warnings = Vec::new();

    if case.owner.is_some() {
        warnings.push(ValidationIssue::new(
            "owner",
            WARNING_OWNER_IGNORED,
            "owner is ignored; the importing user becomes the owner",
        ));
    }
    let groups = [
        ("view_groups", &case.view_groups),
        ("edit_groups", &case.edit_groups),
        ("review_groups", &case.review_groups),
    ];
    for (key, group) in groups {
        if group.is_some() {
            warnings.push(ValidationIssue::new(
                key,
                WARNING_GROUPS_IGNORED,
                format!("{key} is ignored; group access is not imported"),
            ));
        }
    }
    if case.permissions.is_some() {
        warnings.push(ValidationIssue::new(
            "permissions",
            WARNING_PERMISSIONS_IGNORED,
            "permissions are ignored; access is granted to the importing user",
        ));
    }

    let mut claim_types = 0usize;
    for (idx, goal) in case.goals.iter().enumerate() {
        let path = format!("goals.{idx}");
        keyword_warning(goal.keywords.as_deref(), &path, &mut warnings);
        for (s_idx, strategy) in goal.strategies.iter().enumerate() {
            let strategy_path = format!("{path}.strategies.{s_idx}");
            keyword_warning(strategy.keywords.as_deref(), &strategy_path, &mut warnings);
            claim_warnings(
                &strategy.property_claims,
                &strategy_path,
                &mut warnings,
                &mut claim_types,
            );
        }
        claim_warnings(&goal.property_claims, &path, &mut warnings, &mut claim_types);
    }
    if claim_types > 0 {
        warnings.push(ValidationIssue::at_root(
            WARNING_CLAIM_TYPE_DROPPED,
            format!("claim_type is no longer supported and was dropped from {claim_types} claim(s)"),
        ));
    }

    warnings
}

fn keyword_warning(keywords: Option<&str>, path: &str, warnings: &mut Vec<ValidationIssue>) {
    if keywords.is_some_and(|text| !is_placeholder(text)) {
        warnings.push(ValidationIssue::new(
            format!("{path}.keywords"),
            WARNING_KEYWORDS_DEPRECATED,
            "keywords are deprecated and were ignored",
        ));
    }
}

fn claim_warnings(
    claims: &[LegacyPropertyClaim],
    parent_path: &str,
    warnings: &mut Vec<ValidationIssue>,
    claim_types: &mut usize,
) {
    for (idx, claim) in claims.iter().enumerate() {
        let path = format!("{parent_path}.property_claims.{idx}");
        keyword_warning(claim.keywords.as_deref(), &path, warnings);
        if claim.claim_type.as_deref().is_some_and(|t| !is_placeholder(t)) {
            *claim_types += 1;
        }
        for (e_idx, evidence) in claim.evidence.iter().enumerate() {
            keyword_warning(
                evidence.keywords.as_deref(),
                &format!("{path}.evidence.{e_idx}"),
                warnings,
            );
        }
        claim_warnings(&claim.property_claims, &path, warnings, claim_types);
    }
}

#[derive(Debug, Default)]
struct LegacyIdTables {
    goals: IdTable,
    contexts: IdTable,
    strategies: IdTable,
    claims: IdTable,
    evidence: IdTable,
}

impl LegacyIdTables {
    fn table(&mut self, kind: ElementType) -> &mut IdTable {
        match kind {
            ElementType::Goal => &mut self.goals,
            ElementType::Context => &mut self.contexts,
            ElementType::Strategy => &mut self.strategies,
            ElementType::PropertyClaim => &mut self.claims,
            ElementType::Evidence => &mut self.evidence,
        }
    }

    fn minted(&self) -> usize {
        [
            &self.goals,
            &self.contexts,
            &self.strategies,
            &self.claims,
            &self.evidence,
        ]
        .iter()
        .map(|table| table.minted())
        .sum()
    }
}

fn text_field(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !is_placeholder(text))
        .map(str::to_string)
}

struct LegacyWalk<'o> {
    options: &'o TransformOptions,
    ids: LegacyIdTables,
    /// Emitted ids and the kind that claimed each.
    emitted: HashMap<String, ElementType>,
    flat: FlatCase,
}

impl LegacyWalk<'_> {
    fn comments(&self, comments: &[LegacyComment]) -> Vec<Comment> {
        comments
            .iter()
            .map(|comment| Comment {
                author: comment
                    .author
                    .as_deref()
                    .map(str::trim)
                    .filter(|author| !author.is_empty())
                    .unwrap_or(UNKNOWN_AUTHOR)
                    .to_string(),
                content: comment.content.clone(),
                created_at: comment.created_at.unwrap_or(self.options.now),
            })
            .collect()
    }

    /// Stable id for a legacy `key` of `kind`. Missing keys always mint.
    fn stable_id(&mut self, key: Option<String>, kind: ElementType) -> String {
        let Some(key) = key else {
            return mint_id();
        };
        let table = self.ids.table(kind);
        let id = get_or_create_id(&key, table);
        match self.emitted.get(&id) {
            Some(owner) if *owner != kind => {
                debug!(%id, %kind, %owner, "legacy id taken by another kind, re-minted");
                table.reissue(&key)
            }
            _ => id,
        }
    }

    /// Record `element` unless its id was already emitted this run.
    fn emit(&mut self, element: Element) -> bool {
        match self.emitted.entry(element.id.clone()) {
            Entry::Occupied(_) => {
                debug!(id = %element.id, "repeated legacy key collapsed");
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(element.element_type);
                self.flat.elements.push(element);
                true
            }
        }
    }

    fn base(
        id: String,
        element_type: ElementType,
        name: &str,
        short: Option<&str>,
        long: Option<&str>,
    ) -> Element {
        let mut element = Element::new(id, element_type, name.trim());
        element.description = merge_descriptions(short, long);
        element
    }

    fn goal(&mut self, goal: &LegacyGoal) {
        let id = self.stable_id(legacy_key(goal.id.as_ref()), ElementType::Goal);
        let mut element = Self::base(
            id.clone(),
            ElementType::Goal,
            &goal.name,
            goal.short_description.as_deref(),
            goal.long_description.as_deref(),
        );
        element.role = Some(ROLE_TOP_LEVEL.to_string());
        element.assumption = text_field(goal.assumption.as_deref());
        element.in_sandbox = goal.in_sandbox;
        element.comments = self.comments(&goal.comments);
        if !self.emit(element) {
            return;
        }

        for context in &goal.context {
            self.context(context, &id);
        }
        for strategy in &goal.strategies {
            self.strategy(strategy, &id);
        }
        for claim in &goal.property_claims {
            self.claim(claim, &id, 0);
        }
    }

    fn context(&mut self, context: &LegacyContext, goal_id: &str) {
        let id = self.stable_id(legacy_key(context.id.as_ref()), ElementType::Context);
        let mut element = Self::base(
            id,
            ElementType::Context,
            &context.name,
            context.short_description.as_deref(),
            context.long_description.as_deref(),
        )
        .with_parent(goal_id);
        element.comments = self.comments(&context.comments);
        self.emit(element);
    }

    fn strategy(&mut self, strategy: &LegacyStrategy, goal_id: &str) {
        let id = self.stable_id(legacy_key(strategy.id.as_ref()), ElementType::Strategy);
        let mut element = Self::base(
            id.clone(),
            ElementType::Strategy,
            &strategy.name,
            strategy.short_description.as_deref(),
            strategy.long_description.as_deref(),
        )
        .with_parent(goal_id);
        element.assumption = text_field(strategy.assumption.as_deref());
        element.justification = text_field(strategy.justification.as_deref());
        element.in_sandbox = strategy.in_sandbox;
        element.comments = self.comments(&strategy.comments);
        if !self.emit(element) {
            return;
        }

        for claim in &strategy.property_claims {
            self.claim(claim, &id, 0);
        }
    }

    fn claim(&mut self, claim: &LegacyPropertyClaim, parent_id: &str, parent_level: u32) {
        let id = self.stable_id(legacy_key(claim.id.as_ref()), ElementType::PropertyClaim);
        let level = claim.level.unwrap_or(parent_level.saturating_add(1));
        let mut element = Self::base(
            id.clone(),
            ElementType::PropertyClaim,
            &claim.name,
            claim.short_description.as_deref(),
            claim.long_description.as_deref(),
        )
        .with_parent(parent_id);
        element.level = Some(level);
        element.assumption = text_field(claim.assumption.as_deref());
        element.justification = text_field(claim.justification.as_deref());
        element.in_sandbox = claim.in_sandbox;
        element.comments = self.comments(&claim.comments);
        if !self.emit(element) {
            return;
        }

        for nested in &claim.property_claims {
            self.claim(nested, &id, level);
        }
        for evidence in &claim.evidence {
            self.evidence(evidence, &id);
        }
    }

    fn evidence(&mut self, evidence: &LegacyEvidence, claim_id: &str) {
        let key = match &evidence.id {
            Some(key) => key.to_string(),
            None => format!("name:{}", evidence.name.trim()),
        };
        let id = self.stable_id(Some(key), ElementType::Evidence);

        if !self.emitted.contains_key(&id) {
            let mut element = Self::base(
                id.clone(),
                ElementType::Evidence,
                &evidence.name,
                evidence.short_description.as_deref(),
                evidence.long_description.as_deref(),
            );
            element.url = text_field(evidence.url.as_deref());
            element.comments = self.comments(&evidence.comments);
            self.emit(element);
        }
        self.flat
            .evidence_links
            .push(EvidenceLink::new(id, claim_id.to_string()));
    }
}

fn legacy_key(key: Option<&LegacyKey>) -> Option<String> {
    key.map(LegacyKey::to_string)
}
