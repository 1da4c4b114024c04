use crate::config::Config;
use casegraph_kernel::{CaseFormat, ValidationIssue};
use casegraph_store::JsonlCaseStore;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::io::Read;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub const STDIN_ARG: &str = "-";

/// Log to stderr; `RUST_LOG` wins over the configured filter.
pub fn init_tracing(filter: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();
}

pub fn load_config_or_exit(path: Option<&str>) -> Config {
    Config::load(path).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(1);
    })
}

pub fn open_store(config: &Config, store_flag: Option<&str>) -> JsonlCaseStore {
    JsonlCaseStore::new(config.store_root(store_flag))
}

/// Parse the JSON payload at `file`, or stdin for `-`.
pub fn read_payload_or_exit(file: &str) -> Value {
    let text = if file == STDIN_ARG {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).unwrap_or_else(|e| {
            eprintln!("error: failed to read stdin: {e}");
            std::process::exit(1);
        });
        buf
    } else {
        fs::read_to_string(file).unwrap_or_else(|e| {
            eprintln!("error: failed to read {file}: {e}");
            std::process::exit(1);
        })
    };
    serde_json::from_str(&text).unwrap_or_else(|e| {
        eprintln!("error: failed to parse {file} as json: {e}");
        std::process::exit(1);
    })
}

pub fn parse_format_or_exit(raw: &str) -> CaseFormat {
    raw.parse().unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(1);
    })
}

pub fn render_json_or_exit(value: &impl Serialize) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| {
        eprintln!("error: failed to render json: {e}");
        std::process::exit(1);
    })
}

pub fn print_json_or_exit(value: &impl Serialize) {
    println!("{}", render_json_or_exit(value));
}

pub fn print_issue_block(label: &str, issues: &[ValidationIssue]) {
    if issues.is_empty() {
        return;
    }
    println!("  {label} ({}):", issues.len());
    for issue in issues {
        println!("    - {issue}");
    }
}

/// Print every validation error to stderr, then exit 1.
pub fn exit_with_issues(file: &str, issues: &[ValidationIssue]) -> ! {
    eprintln!("error: {file} failed validation with {} issue(s)", issues.len());
    for issue in issues {
        eprintln!("  - {issue}");
    }
    std::process::exit(1);
}
