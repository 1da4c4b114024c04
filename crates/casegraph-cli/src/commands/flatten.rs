use crate::support::{exit_with_issues, print_issue_block, print_json_or_exit, read_payload_or_exit};
use casegraph_kernel::{ElementType, ImportError, TransformOptions, import_case};

pub fn run(file: String, json_output: bool) {
    let payload = read_payload_or_exit(&file);
    let outcome = import_case(&payload, &TransformOptions::new()).unwrap_or_else(|err| {
        let ImportError::Validation(errors) = err;
        exit_with_issues(&file, &errors.issues)
    });

    if json_output {
        print_json_or_exit(&outcome.flat);
        return;
    }

    println!("casegraph flatten");
    println!("  File: {file}");
    println!("  Format: {}", outcome.format);
    println!("  Elements: {}", outcome.flat.elements.len());
    for element_type in ElementType::ALL {
        let count = outcome.flat.elements_of(element_type).count();
        if count > 0 {
            println!("    {element_type}: {count}");
        }
    }
    println!("  Evidence links: {}", outcome.flat.evidence_links.len());
    print_issue_block("Warnings", &outcome.warnings);
}
