use crate::support::{print_json_or_exit, read_payload_or_exit};
use casegraph_kernel::detect_format;
use serde_json::json;

pub fn run(file: String, json_output: bool) {
    let payload = read_payload_or_exit(&file);
    let detected = detect_format(&payload);

    if json_output {
        print_json_or_exit(&json!({
            "file": file,
            "recognized": detected.is_some(),
            "format": detected,
            "version": detected.and_then(|format| format.version_tag()),
        }));
    } else {
        println!("casegraph detect");
        println!("  File: {file}");
        println!(
            "  Format: {}",
            detected.map_or("unrecognized", |format| format.as_str())
        );
    }

    if detected.is_none() {
        std::process::exit(1);
    }
}
