//! Error types for casegraph kernel operations.
//!
//! Two families are kept apart: [`ValidationErrors`] describe a bad import
//! file, [`IntegrityError`] describes stored data that breaks the graph
//! invariants.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::element::ElementType;

/// Path used for issues that are not tied to one field.
pub const ROOT_PATH: &str = "root";

pub const CODE_INVALID_TYPE: &str = "invalid_type";
pub const CODE_REQUIRED: &str = "required";
pub const CODE_INVALID_VALUE: &str = "invalid_value";
pub const CODE_DUPLICATE_ID: &str = "duplicate_id";
pub const CODE_DANGLING_REFERENCE: &str = "dangling_reference";
pub const CODE_INVALID_STRUCTURE: &str = "invalid_structure";
pub const CODE_UNRECOGNIZED_FORMAT: &str = "unrecognized_format";

pub const WARNING_OWNER_IGNORED: &str = "owner_ignored";
pub const WARNING_GROUPS_IGNORED: &str = "groups_ignored";
pub const WARNING_PERMISSIONS_IGNORED: &str = "permissions_ignored";
pub const WARNING_KEYWORDS_DEPRECATED: &str = "keywords_deprecated";
pub const WARNING_CLAIM_TYPE_DROPPED: &str = "claim_type_dropped";

/// One validation finding: an error or an informational warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Dot-joined field path, or `"root"`.
    pub path: String,
    pub message: String,
    pub code: String,
}

impl ValidationIssue {
    pub fn new(path: impl Into<String>, code: &str, message: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            path: if path.is_empty() {
                ROOT_PATH.to_string()
            } else {
                path
            },
            message: message.into(),
            code: code.to_string(),
        }
    }

    pub fn at_root(code: &str, message: impl Into<String>) -> Self {
        Self::new(ROOT_PATH, code, message)
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.path, self.code, self.message)
    }
}

/// Every problem found in one payload, reported together.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("validation failed with {} issue(s)", issues.len())]
pub struct ValidationErrors {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationErrors {
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }

    pub fn codes(&self) -> Vec<&str> {
        self.issues.iter().map(|issue| issue.code.as_str()).collect()
    }
}

/// Stored data violates a graph invariant; fatal for that case only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntegrityError {
    #[error("case has no root goal")]
    MissingRootGoal,

    #[error("case has {} root goals: {}", ids.len(), ids.join(", "))]
    MultipleRootGoals { ids: Vec<String> },

    #[error("evidence link {evidence_id} -> {claim_id} references a missing element")]
    DanglingEvidenceLink {
        evidence_id: String,
        claim_id: String,
    },

    #[error("element {id} is {actual} but an evidence link expects {expected}")]
    EvidenceLinkTypeMismatch {
        id: String,
        expected: ElementType,
        actual: ElementType,
    },
}

/// Failure of the import pipeline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImportError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_path_becomes_root() {
        let issue = ValidationIssue::new("", CODE_REQUIRED, "missing");
        assert_eq!(issue.path, ROOT_PATH);
        assert_eq!(issue.to_string(), "root [required]: missing");
    }

    #[test]
    fn multiple_root_goals_lists_ids() {
        let err = IntegrityError::MultipleRootGoals {
            ids: vec!["g1".to_string(), "g2".to_string()],
        };
        assert_eq!(err.to_string(), "case has 2 root goals: g1, g2");
    }
}
