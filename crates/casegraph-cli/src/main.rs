//! Casegraph CLI: the `casegraph` command.

mod cli;
mod commands;
mod config;
mod support;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    let config = support::load_config_or_exit(cli.config.as_deref());
    let filter = if cli.verbose {
        "debug"
    } else {
        config.log.filter.as_str()
    };
    support::init_tracing(filter);

    match cli.command {
        Commands::Detect { file, json } => commands::detect::run(file, json),

        Commands::Validate { file, format, json } => commands::validate::run(file, format, json),

        Commands::Flatten { file, json } => commands::flatten::run(file, json),

        Commands::Import {
            file,
            case_id,
            store,
            json,
        } => commands::import::run(&config, file, case_id, store, json),

        Commands::Export {
            case_id,
            store,
            output,
            json,
        } => commands::export::run(&config, case_id, store, output, json),

        Commands::List { store, json } => commands::list::run(&config, store, json),
    }
}
