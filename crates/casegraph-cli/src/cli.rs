use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "casegraph",
    about = "Casegraph: detect, validate, and convert assurance-case files",
    version
)]
pub struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Log at debug level (RUST_LOG still wins when set)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Report which format a case file is in
    Detect {
        /// Case file (`-` for stdin)
        file: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a case file, collecting every problem
    Validate {
        /// Case file (`-` for stdin)
        file: String,

        /// Validate as this format instead of detecting: legacy, flat, or nested
        #[arg(long)]
        format: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Convert a case file to flat rows without storing it
    Flatten {
        /// Case file (`-` for stdin)
        file: String,

        /// Print the flat case document instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Import a case file into the case store
    Import {
        /// Case file (`-` for stdin)
        file: String,

        /// Id to store the case under (defaults to the file's case id, else a new UUID)
        #[arg(long)]
        case_id: Option<String>,

        /// Case store directory (overrides config)
        #[arg(long)]
        store: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export a stored case as a nested tree
    Export {
        /// Stored case id
        case_id: String,

        /// Case store directory (overrides config)
        #[arg(long)]
        store: Option<String>,

        /// Write the nested export to this file
        #[arg(long)]
        output: Option<String>,

        /// Print the nested export document instead of an outline
        #[arg(long)]
        json: bool,
    },

    /// List stored case ids
    List {
        /// Case store directory (overrides config)
        #[arg(long)]
        store: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
