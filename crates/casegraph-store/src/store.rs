//! Directory of case files, one `<case-id>.jsonl` per case.
//!
//! Writes check live references first (parents exist, evidence is top-level,
//! links join EVIDENCE to PROPERTY_CLAIM) so a rejected case never reaches
//! disk. Reads hand back flat rows or the reconstructed nested tree.

use crate::jsonl::{JsonlError, read_case_file, write_case_file};
use casegraph_kernel::{
    ElementType, FlatCase, IntegrityError, NestedCaseExport, TransformOptions, reconstruct_nested,
};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CASE_FILE_EXTENSION: &str = "jsonl";

/// Errors raised while reading or writing stored cases.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Jsonl(#[from] JsonlError),

    #[error("case not found: {0}")]
    CaseNotFound(String),

    #[error("invalid case id: {0:?}")]
    InvalidCaseId(String),

    #[error("element {id} references unknown parent {parent_id}")]
    UnknownParent { id: String, parent_id: String },

    #[error("evidence {id} must not have a parent (found {parent_id})")]
    EvidenceWithParent { id: String, parent_id: String },

    #[error("evidence link {evidence_id} -> {claim_id} references a missing element")]
    DanglingLink {
        evidence_id: String,
        claim_id: String,
    },

    #[error("evidence link endpoint {id} must be {expected}, found {actual}")]
    LinkTypeMismatch {
        id: String,
        expected: ElementType,
        actual: ElementType,
    },

    #[error("duplicate element id: {0}")]
    DuplicateElementId(String),

    #[error(transparent)]
    Integrity(#[from] IntegrityError),
}

/// Case files under one root directory.
#[derive(Debug, Clone)]
pub struct JsonlCaseStore {
    root: PathBuf,
}

impl JsonlCaseStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file backing `case_id`.
    pub fn case_path(&self, case_id: &str) -> Result<PathBuf, StoreError> {
        check_case_id(case_id)?;
        Ok(self.root.join(format!("{case_id}.{CASE_FILE_EXTENSION}")))
    }

    /// Persist `flat` as the full contents of `case_id`, replacing any
    /// earlier version.
    pub fn write_case(&self, case_id: &str, flat: &FlatCase) -> Result<PathBuf, StoreError> {
        let path = self.case_path(case_id)?;
        check_references(flat)?;

        let mut stored = flat.clone();
        stored.case.id = Some(case_id.to_string());
        write_case_file(&path, &stored)?;

        debug!(
            case = case_id,
            elements = stored.elements.len(),
            evidence_links = stored.evidence_links.len(),
            path = %path.display(),
            "case written"
        );
        Ok(path)
    }

    /// Flat rows of `case_id`, with every element and evidence link.
    pub fn read_case(&self, case_id: &str) -> Result<FlatCase, StoreError> {
        let path = self.case_path(case_id)?;
        if !path.is_file() {
            return Err(StoreError::CaseNotFound(case_id.to_string()));
        }
        let flat = read_case_file(&path)?;
        debug!(
            case = case_id,
            elements = flat.elements.len(),
            evidence_links = flat.evidence_links.len(),
            "case read"
        );
        Ok(flat)
    }

    /// `case_id` rebuilt into the nested export shape.
    pub fn read_nested(
        &self,
        case_id: &str,
        options: &TransformOptions,
    ) -> Result<NestedCaseExport, StoreError> {
        let flat = self.read_case(case_id)?;
        Ok(reconstruct_nested(&flat, options)?)
    }

    /// Ids of all stored cases, sorted. A missing root holds no cases.
    pub fn list_cases(&self) -> Result<Vec<String>, StoreError> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        let unreadable = |e| JsonlError::io(&self.root, e);
        let entries = fs::read_dir(&self.root).map_err(unreadable)?;

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(unreadable)?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(CASE_FILE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str())
                && check_case_id(stem).is_ok()
            {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }
}

fn check_case_id(case_id: &str) -> Result<(), StoreError> {
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.');
    if case_id.is_empty() || case_id.starts_with('.') || !case_id.chars().all(allowed) {
        return Err(StoreError::InvalidCaseId(case_id.to_string()));
    }
    Ok(())
}

/// Reject rows whose references would not resolve once stored.
pub fn check_references(flat: &FlatCase) -> Result<(), StoreError> {
    let mut types: HashMap<&str, ElementType> = HashMap::new();
    for element in &flat.elements {
        if types
            .insert(element.id.as_str(), element.element_type)
            .is_some()
        {
            return Err(StoreError::DuplicateElementId(element.id.clone()));
        }
    }

    for element in &flat.elements {
        let Some(parent_id) = element.parent_id.as_deref() else {
            continue;
        };
        if element.element_type == ElementType::Evidence {
            return Err(StoreError::EvidenceWithParent {
                id: element.id.clone(),
                parent_id: parent_id.to_string(),
            });
        }
        if !types.contains_key(parent_id) {
            return Err(StoreError::UnknownParent {
                id: element.id.clone(),
                parent_id: parent_id.to_string(),
            });
        }
    }

    for link in &flat.evidence_links {
        let endpoints = [
            (link.evidence_id.as_str(), ElementType::Evidence),
            (link.claim_id.as_str(), ElementType::PropertyClaim),
        ];
        for (id, expected) in endpoints {
            let actual = types.get(id).copied().ok_or_else(|| StoreError::DanglingLink {
                evidence_id: link.evidence_id.clone(),
                claim_id: link.claim_id.clone(),
            })?;
            if actual != expected {
                return Err(StoreError::LinkTypeMismatch {
                    id: id.to_string(),
                    expected,
                    actual,
                });
            }
        }
    }
    Ok(())
}
