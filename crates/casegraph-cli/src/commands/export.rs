use crate::config::Config;
use crate::support::{open_store, print_json_or_exit, render_json_or_exit};
use casegraph_kernel::{TransformOptions, TreeNode};
use std::fs;

pub fn run(
    config: &Config,
    case_id: String,
    store: Option<String>,
    output: Option<String>,
    json_output: bool,
) {
    let store = open_store(config, store.as_deref());
    let export = store
        .read_nested(&case_id, &TransformOptions::new())
        .unwrap_or_else(|e| {
            eprintln!("error: failed to export case {case_id}: {e}");
            std::process::exit(1);
        });

    if let Some(output) = output.as_deref() {
        let rendered = render_json_or_exit(&export);
        fs::write(output, format!("{rendered}\n")).unwrap_or_else(|e| {
            eprintln!("error: failed to write {output}: {e}");
            std::process::exit(1);
        });
    }

    if json_output {
        print_json_or_exit(&export);
        return;
    }

    println!("casegraph export {case_id}");
    if let Some(output) = output {
        println!("  Written: {output}");
    }
    println!("  Nodes: {}", export.tree.node_count());
    print_outline(&export.tree, 1);
}

fn print_outline(node: &TreeNode, depth: usize) {
    println!(
        "{}{} {} [{}]",
        "  ".repeat(depth),
        node.node_type,
        node.name,
        node.id
    );
    for child in &node.children {
        print_outline(child, depth + 1);
    }
}
