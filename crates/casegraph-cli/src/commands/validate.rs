use crate::support::{
    exit_with_issues, parse_format_or_exit, print_issue_block, print_json_or_exit,
    read_payload_or_exit,
};
use casegraph_kernel::{ValidationIssue, detect_format, validate_as, validate_case};
use serde_json::json;

pub fn run(file: String, format: Option<String>, json_output: bool) {
    let payload = read_payload_or_exit(&file);
    let result = match format.as_deref() {
        Some(raw) => validate_as(&payload, parse_format_or_exit(raw)),
        None => validate_case(&payload, detect_format(&payload)),
    };

    match result {
        Ok(validated) => {
            if json_output {
                print_json_or_exit(&json!({
                    "file": file,
                    "valid": true,
                    "format": validated.format(),
                    "errors": Vec::<ValidationIssue>::new(),
                    "warnings": validated.warnings,
                }));
                return;
            }
            println!("casegraph validate");
            println!("  File: {file}");
            println!("  Format: {}", validated.format());
            println!("  Valid: yes");
            print_issue_block("Warnings", &validated.warnings);
        }
        Err(errors) => {
            if json_output {
                print_json_or_exit(&json!({
                    "file": file,
                    "valid": false,
                    "format": null,
                    "errors": errors.issues,
                    "warnings": Vec::<ValidationIssue>::new(),
                }));
                std::process::exit(1);
            }
            exit_with_issues(&file, &errors.issues);
        }
    }
}
