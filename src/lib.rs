pub mod cli;
pub mod client;
pub mod config;
pub mod console;
pub mod display;
pub mod filter;
pub mod logging;
pub mod query;
pub mod session;

use crate::cli::FilterArgs;
use crate::client::HttpQueryService;
use crate::config::ConsoleConfig;
use crate::display::{
    format_fields, format_query_json, format_records_json, format_records_text, format_validation,
};
use crate::filter::{
    FilterExpression, FilterParseError, FilterSet, format_timestamp, parse_timestamp,
};
use indicatif::ProgressBar;
use std::io::IsTerminal;
use std::time::Duration;
use tracing::{debug, warn};

pub use cli::{ColorMode, Commands, OutputFormat, cli_parse};
pub use client::{QueryError, QueryService};
pub use filter::{FilterRow, LogField, Operator, RowValue, TimeRange};
pub use query::{LogRecord, Predicate, PredicateValue, QueryRequest};
pub use session::{SearchOutcome, SearchSession, SubmitError};

/// Build a FilterSet from the --where terms and --from/--to
pub fn build_filter_set(args: &FilterArgs) -> Result<FilterSet, FilterParseError> {
    let mut rows = Vec::new();
    for expr in &args.filters {
        rows.extend(FilterExpression::parse(expr)?.rows);
    }

    let mut set = FilterSet::from_rows(rows);
    let start = args.from.as_deref().map(parse_timestamp).transpose()?;
    let end = args.to.as_deref().map(parse_timestamp).transpose()?;
    if let Some((from, to)) = start.zip(end).filter(|(from, to)| from > to) {
        return Err(FilterParseError::InvalidRange(format!(
            "{}..{}",
            format_timestamp(&from),
            format_timestamp(&to)
        )));
    }
    if start.is_some() != end.is_some() {
        warn!("date range needs both --from and --to; it will not be sent");
    }
    set.set_date_range(start, end);
    Ok(set)
}

fn build_service(config: &ConsoleConfig) -> Result<HttpQueryService, Box<dyn std::error::Error>> {
    let api_url = config
        .api_url
        .as_deref()
        .ok_or("No query service configured; set --api-url, LOGSEARCH_API_URL or api_url in the config file")?;
    Ok(HttpQueryService::new(
        api_url,
        &config.query_path,
        config.timeout(),
    )?)
}

fn write_output_file(
    path: &std::path::Path,
    content: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::write(path, content)
        .map_err(|e| format!("Failed to write output file '{}': {}", path.display(), e).into())
}

fn emit(text: &str, output: Option<&std::path::Path>) -> Result<(), Box<dyn std::error::Error>> {
    print!("{text}");
    if !text.ends_with('\n') {
        println!();
    }
    if let Some(path) = output {
        write_output_file(path, text)?;
    }
    Ok(())
}

fn search_spinner(enabled: bool) -> Option<ProgressBar> {
    if !enabled || !std::io::stderr().is_terminal() {
        return None;
    }
    let spinner = ProgressBar::new_spinner();
    spinner.set_message("Searching...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    Some(spinner)
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = cli_parse();
    logging::init_logging(cli.verbose, cli.quiet);

    match cli.color {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Auto => {}
    }

    let mut config = config::load_config(cli.config.as_deref())
        .map_err(|e| format!("Failed to load config: {}", e))?;
    if let Some(api_url) = &cli.api_url {
        config.api_url = Some(api_url.clone());
    }
    debug!(?config, "configuration loaded");

    let output = cli.output.as_deref();

    match &cli.command {
        Commands::Search {
            filters,
            min_filters,
            dry_run,
        } => {
            let filter_set = build_filter_set(filters)?;
            let min = min_filters.unwrap_or(config.min_complete_filters);
            let mut session = SearchSession::with_filters(filter_set, min);

            if *dry_run {
                if let Err(report) = session.filters().validate(min) {
                    return Err(format!("Search rejected:\n{}", format_validation(&report)).into());
                }
                return emit(&format_query_json(&session.filters().build_query()), output);
            }

            let service = build_service(&config)?;
            let spinner = search_spinner(cli.format == OutputFormat::Text && !cli.quiet);
            let result = session.search(&service);
            if let Some(spinner) = spinner {
                spinner.finish_and_clear();
            }

            match result {
                Ok(_) => {}
                Err(SubmitError::Invalid(report)) => {
                    return Err(format!("Search rejected:\n{}", format_validation(&report)).into());
                }
                Err(err) => return Err(format!("Search failed: {}", err).into()),
            }

            let text = match cli.format {
                OutputFormat::Text => format_records_text(session.records(), config.message_width),
                OutputFormat::Json => format_records_json(session.records()),
            };
            emit(&text, output)?;
        }
        Commands::Query { filters } => {
            let filter_set = build_filter_set(filters)?;
            emit(&format_query_json(&filter_set.build_query()), output)?;
        }
        Commands::Console { min_filters } => {
            let service = match config.api_url {
                Some(_) => Some(build_service(&config)?),
                None => {
                    warn!("no query service configured; 'search' is unavailable");
                    None
                }
            };
            let session =
                SearchSession::new(min_filters.unwrap_or(config.min_complete_filters));
            let mut console = console::Console::new(
                session,
                service.as_ref().map(|s| s as &dyn QueryService),
                config.message_width,
            );

            if !cli.quiet {
                println!("logsearch console. Type 'help' for commands.");
            }
            let stdin = std::io::stdin();
            let mut stdout = std::io::stdout();
            console.run(stdin.lock(), &mut stdout)?;
        }
        Commands::Fields => emit(&format_fields(), output)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_set_from_args() {
        let args = FilterArgs {
            filters: vec!["level=ERROR message~timeout".to_string(), "commit=abc".to_string()],
            from: Some("2024-01-01T00:00:00Z".to_string()),
            to: Some("2024-01-02T00:00:00Z".to_string()),
        };
        let set = build_filter_set(&args).unwrap();
        assert_eq!(set.len(), 3);
        assert!(set.date_range().is_bounded());
    }

    #[test]
    fn test_build_filter_set_without_terms_has_blank_row() {
        let set = build_filter_set(&FilterArgs::default()).unwrap();
        assert_eq!(set, FilterSet::new());
    }

    #[test]
    fn test_build_filter_set_rejects_bad_timestamp() {
        let args = FilterArgs {
            from: Some("soon".to_string()),
            ..Default::default()
        };
        assert!(build_filter_set(&args).is_err());
    }

    #[test]
    fn test_build_filter_set_rejects_inverted_dates() {
        let args = FilterArgs {
            from: Some("2024-01-02T00:00:00Z".to_string()),
            to: Some("2024-01-01T00:00:00Z".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            build_filter_set(&args),
            Err(FilterParseError::InvalidRange(_))
        ));
    }
}
