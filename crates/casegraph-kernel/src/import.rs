//! Import pipeline: detect → validate → transform → sort.

use serde_json::Value;
use tracing::debug;

use crate::detect::{CaseFormat, detect_format};
use crate::element::FlatCase;
use crate::error::{ImportError, ValidationIssue};
use crate::flatten::flatten_nested;
use crate::legacy::legacy_to_flat;
use crate::options::TransformOptions;
use crate::sort::sort_by_dependency;
use crate::validate::{CasePayload, validate_case};

/// A successfully imported case, ready for persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportOutcome {
    /// Format the payload validated as.
    pub format: CaseFormat,
    /// Flat rows with elements in parent-before-child order.
    pub flat: FlatCase,
    pub warnings: Vec<ValidationIssue>,
}

/// Run one raw payload through the whole import pipeline.
pub fn import_case(value: &Value, options: &TransformOptions) -> Result<ImportOutcome, ImportError> {
    let detected = detect_format(value);
    let validated = validate_case(value, detected)?;
    let format = validated.format();

    // Legacy warnings were already collected during validation.
    let mut flat = match validated.payload {
        CasePayload::Legacy(legacy) => legacy_to_flat(&legacy, options).flat,
        CasePayload::Nested(export) => flatten_nested(&export, options),
        CasePayload::Flat(flat) => flat,
    };
    flat.elements = sort_by_dependency(std::mem::take(&mut flat.elements));
    let warnings = validated.warnings;

    debug!(
        format = %format,
        detected = detected.is_some(),
        elements = flat.elements.len(),
        evidence_links = flat.evidence_links.len(),
        warnings = warnings.len(),
        "case imported"
    );
    Ok(ImportOutcome {
        format,
        flat,
        warnings,
    })
}
