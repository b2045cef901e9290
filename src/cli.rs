use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Search remote logs with filter predicates and a time range
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the query service (overrides the config file)
    #[arg(long, global = true, env = "LOGSEARCH_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(short = 'F', long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Also write the output to this file
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// When to use colors
    #[arg(long, global = true, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only print results and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Filters and date range shared by the commands that build a query
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Filter term, e.g. "level=ERROR", "message~timeout",
    /// "timestamp=2024-01-01T00:00:00Z..2024-01-02T00:00:00Z". Repeatable.
    #[arg(short = 'w', long = "where", value_name = "FILTER")]
    pub filters: Vec<String>,

    /// Start of the global date range
    #[arg(long, value_name = "TIMESTAMP")]
    pub from: Option<String>,

    /// End of the global date range
    #[arg(long, value_name = "TIMESTAMP")]
    pub to: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a search and print the matching records
    Search {
        #[command(flatten)]
        filters: FilterArgs,

        /// Complete filters required before the search is sent
        #[arg(long)]
        min_filters: Option<usize>,

        /// Print the query instead of sending it
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the query that a search with these filters would send
    Query {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Interactive console: edit filters row by row and search repeatedly
    Console {
        /// Complete filters required before a search is sent
        #[arg(long)]
        min_filters: Option<usize>,
    },
    /// List searchable fields and operators
    Fields,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

pub fn cli_parse() -> Cli {
    Cli::parse()
}
