use clap::{Parser, Subcommand};

/// Validate hotel collection documents against an XML Schema and convert them to JSON
#[derive(Parser, Debug)]
#[command(name = "hotels-xml")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Defaults to `check` when omitted
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a document against a schema and print every diagnostic
    Validate {
        /// Document path or http(s) URL
        document: String,
        /// Schema path or http(s) URL
        schema: String,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Convert a hotel collection document to JSON
    Convert {
        /// Document path or http(s) URL
        document: String,
        /// Print on a single line
        #[arg(long)]
        compact: bool,
    },

    /// Validate the configured good and error documents, then convert the good one
    Check {
        #[arg(long)]
        document: Option<String>,
        #[arg(long)]
        error_document: Option<String>,
        #[arg(long)]
        schema: Option<String>,
    },

    /// Inspect or update persisted settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the current settings and where they are stored
    Show,
    /// Change one or more settings
    Set {
        #[arg(long)]
        document: Option<String>,
        #[arg(long)]
        error_document: Option<String>,
        #[arg(long)]
        schema: Option<String>,
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
}
