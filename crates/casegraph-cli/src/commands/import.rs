use crate::config::Config;
use crate::support::{
    exit_with_issues, open_store, print_issue_block, print_json_or_exit, read_payload_or_exit,
};
use casegraph_kernel::{ImportError, TransformOptions, import_case, mint_id};
use serde_json::json;
use tracing::info;

pub fn run(
    config: &Config,
    file: String,
    case_id: Option<String>,
    store: Option<String>,
    json_output: bool,
) {
    let payload = read_payload_or_exit(&file);
    let outcome = import_case(&payload, &TransformOptions::new()).unwrap_or_else(|err| {
        let ImportError::Validation(errors) = err;
        exit_with_issues(&file, &errors.issues)
    });

    let case_id = case_id
        .or_else(|| outcome.flat.case.id.clone())
        .unwrap_or_else(mint_id);
    let store = open_store(config, store.as_deref());
    let path = store.write_case(&case_id, &outcome.flat).unwrap_or_else(|e| {
        eprintln!("error: failed to store case {case_id}: {e}");
        std::process::exit(1);
    });
    info!(
        case = %case_id,
        format = %outcome.format,
        elements = outcome.flat.elements.len(),
        "case imported"
    );

    if json_output {
        print_json_or_exit(&json!({
            "caseId": case_id,
            "path": path.display().to_string(),
            "format": outcome.format,
            "elementCount": outcome.flat.elements.len(),
            "evidenceLinkCount": outcome.flat.evidence_links.len(),
            "warnings": outcome.warnings,
        }));
        return;
    }

    println!("casegraph import {file}");
    println!("  Case: {case_id}");
    println!("  Format: {}", outcome.format);
    println!("  Stored: {}", path.display());
    println!("  Elements: {}", outcome.flat.elements.len());
    println!("  Evidence links: {}", outcome.flat.evidence_links.len());
    print_issue_block("Warnings", &outcome.warnings);
}
