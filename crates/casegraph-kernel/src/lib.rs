//! # casegraph-kernel
//!
//! Format detection, validation, and structure transforms for assurance-case
//! argument graphs.
//!
//! Three wire shapes describe the same graph:
//!
//! ```text
//! legacy   { goals: [...] }                       nested goals/strategies/claims
//! flat     { version: "2.0", elements, evidenceLinks }   one row per node
//! nested   { version: "1.0", tree }               one rooted tree
//! ```
//!
//! Import runs detect → validate → (legacy | nested) → flat → dependency
//! sort. The read path rebuilds the nested tree from flat rows. Every
//! transform is synchronous and pure; run-scoped tables (stable ids, evidence
//! dedup) are created fresh per call.

pub mod describe;
pub mod detect;
pub mod element;
pub mod error;
pub mod flatten;
pub mod identity;
pub mod import;
pub mod legacy;
pub mod legacy_model;
pub mod options;
pub mod reconstruct;
pub mod sort;
pub mod tree;
pub mod validate;

pub use describe::{is_placeholder, merge_descriptions};
pub use detect::{CaseFormat, Detection, detect_format};
pub use element::{
    CaseInfo, Comment, Element, ElementType, EvidenceLink, FLAT_VERSION, FlatCase, ROLE_TOP_LEVEL,
};
pub use error::{ImportError, IntegrityError, ValidationErrors, ValidationIssue};
pub use flatten::{evidence_key, flatten_nested};
pub use identity::{IdTable, get_or_create_id, is_stable_id, mint_id};
pub use import::{ImportOutcome, import_case};
pub use legacy::{LegacyTransform, UNKNOWN_AUTHOR, legacy_to_flat, legacy_warnings};
pub use legacy_model::LegacyCase;
pub use options::TransformOptions;
pub use reconstruct::reconstruct_nested;
pub use sort::sort_by_dependency;
pub use tree::{NESTED_VERSION, NestedCaseExport, TreeNode};
pub use validate::{CasePayload, ValidatedCase, validate_as, validate_case};
