use crate::config::Config;
use crate::support::{open_store, print_json_or_exit};
use serde_json::json;

pub fn run(config: &Config, store: Option<String>, json_output: bool) {
    let store = open_store(config, store.as_deref());
    let ids = store.list_cases().unwrap_or_else(|e| {
        eprintln!("error: failed to list {}: {e}", store.root().display());
        std::process::exit(1);
    });

    if json_output {
        print_json_or_exit(&json!({
            "root": store.root().display().to_string(),
            "cases": ids,
        }));
        return;
    }

    println!("casegraph list");
    println!("  Root: {}", store.root().display());
    println!("  Cases: {}", ids.len());
    for id in ids {
        println!("    - {id}");
    }
}
