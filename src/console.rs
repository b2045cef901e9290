//! Line-oriented console over a [`SearchSession`]
//!
//! Every command edits the session in place; errors are reported and the
//! session carries on, so nothing typed is ever lost to a mistake.

use crate::client::QueryService;
use crate::display::{format_filter_set, format_query_json, format_records_text, format_validation};
use crate::filter::{
    FilterError, FilterParseError, LogField, Operator, RowValue, TimeRange, parse_filter_row, unquote,
};
use crate::session::{SearchOutcome, SearchSession, SubmitError};
use std::io::{self, BufRead, Write};
use thiserror::Error;

const HELP: &str = "\
Commands:
  show                      list filter rows and the date range
  add [FILTER]              append a row, optionally filled from FILTER (e.g. level=ERROR)
  set N FILTER              replace row N with FILTER
  field N NAME              set the field of row N
  op N OPERATOR             set the operator of row N (=, !=, ~, !~)
  value N VALUE             set the value of row N (START..END for timestamp rows, \"\" clears)
  rm N                      remove row N (the last row always stays)
  range START..END          set the global date range ('range clear' removes it)
  min N                     require N complete filters before searching
  reset                     back to one blank row and no date range
  query                     print the query a search would send
  search                    send the query and show the results
  results                   show the results of the last search again
  help                      this text
  quit                      leave the console
";

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error(transparent)]
    Parse(#[from] FilterParseError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Unknown command '{0}'. Type 'help' for the list of commands")]
    UnknownCommand(String),

    #[error("No query service configured; set --api-url or LOGSEARCH_API_URL")]
    NoService,
}

/// Whether the loop keeps reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Console<'a> {
    session: SearchSession,
    service: Option<&'a dyn QueryService>,
    message_width: usize,
}

impl<'a> Console<'a> {
    pub fn new(
        session: SearchSession,
        service: Option<&'a dyn QueryService>,
        message_width: usize,
    ) -> Self {
        Self {
            session,
            service,
            message_width,
        }
    }

    pub fn session(&self) -> &SearchSession {
        &self.session
    }

    /// Read commands until `quit` or end of input
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> io::Result<()> {
        write!(out, "> ")?;
        out.flush()?;

        for line in input.lines() {
            let line = line?;
            match self.execute(&line, out) {
                Ok(Flow::Quit) => return Ok(()),
                Ok(Flow::Continue) => {}
                Err(err) => writeln!(out, "error: {err}")?,
            }
            write!(out, "> ")?;
            out.flush()?;
        }

        writeln!(out)?;
        Ok(())
    }

    /// Run one command line against the session
    pub fn execute<W: Write>(&mut self, line: &str, out: &mut W) -> Result<Flow, ConsoleError> {
        let line = line.trim();
        let (command, rest) = line
            .split_once(char::is_whitespace)
            .map(|(c, r)| (c, r.trim()))
            .unwrap_or((line, ""));

        match command {
            "" => {}
            "help" | "?" => write_out(out, HELP),
            "show" | "ls" => write_out(out, &format_filter_set(self.session.filters())),
            "add" => {
                let row = if rest.is_empty() {
                    None
                } else {
                    Some(parse_filter_row(rest)?)
                };
                let filters = self.session.filters_mut();
                let index = filters.add_row();
                if let Some(row) = row {
                    *filters.row_mut(index)? = row;
                }
                write_out(out, &format!("added row {index}\n"));
            }
            "set" => {
                let (index, term) = indexed(rest, "set N FILTER")?;
                let row = parse_filter_row(term)?;
                *self.session.filters_mut().row_mut(index)? = row;
            }
            "field" => {
                let (index, name) = indexed(rest, "field N NAME")?;
                let field: LogField = name.parse()?;
                self.session.filters_mut().row_mut(index)?.set_field(field);
            }
            "op" => {
                let (index, symbol) = indexed(rest, "op N OPERATOR")?;
                let operator: Operator = symbol.parse()?;
                self.session.filters_mut().row_mut(index)?.set_operator(operator);
            }
            "value" => {
                let (index, raw) = indexed(rest, "value N VALUE")?;
                let raw = unquote(raw);
                let row = self.session.filters_mut().row_mut(index)?;
                let value = if row.field().is_some_and(|f| f.takes_range()) {
                    RowValue::Range(TimeRange::parse(raw)?)
                } else {
                    RowValue::Scalar(raw.to_string())
                };
                row.set_value(value)?;
            }
            "rm" | "remove" => {
                let index = parse_index(rest, "rm N")?;
                let removed = self.session.filters_mut().remove_row(index)?;
                write_out(out, &format!("removed row {index}: {removed}\n"));
            }
            "range" => {
                if rest == "clear" || rest.is_empty() {
                    self.session.filters_mut().clear_date_range();
                } else {
                    let range = TimeRange::parse(rest)?;
                    self.session
                        .filters_mut()
                        .set_date_range(range.start, range.end);
                }
            }
            "min" => {
                let min = parse_index(rest, "min N")?;
                self.session.set_min_complete_filters(min);
            }
            "reset" => {
                self.session.reset_filters();
                write_out(out, "filters reset\n");
            }
            "query" => {
                let query = self.session.filters().build_query();
                write_out(out, &format!("{}\n", format_query_json(&query)));
            }
            "search" => self.search(out)?,
            "results" => write_out(
                out,
                &format_records_text(self.session.records(), self.message_width),
            ),
            "quit" | "exit" | "q" => return Ok(Flow::Quit),
            other => return Err(ConsoleError::UnknownCommand(other.to_string())),
        }

        Ok(Flow::Continue)
    }

    fn search<W: Write>(&mut self, out: &mut W) -> Result<(), ConsoleError> {
        let service = self.service.ok_or(ConsoleError::NoService)?;
        match self.session.search(service) {
            Ok(SearchOutcome::Applied { .. }) => write_out(
                out,
                &format_records_text(self.session.records(), self.message_width),
            ),
            Ok(SearchOutcome::Stale) => write_out(out, "search superseded\n"),
            Err(SubmitError::Invalid(report)) => {
                write_out(out, "Search rejected:\n");
                write_out(out, &format_validation(&report));
            }
            Err(err) => write_out(
                out,
                &format!("Search failed: {err}\nFilters are unchanged; fix the problem and search again.\n"),
            ),
        }
        Ok(())
    }
}

/// Console output is best effort; a closed stdout ends the loop on the next prompt
fn write_out<W: Write>(out: &mut W, text: &str) {
    let _ = out.write_all(text.as_bytes());
}

fn parse_index(s: &str, usage: &'static str) -> Result<usize, ConsoleError> {
    s.trim().parse().map_err(|_| ConsoleError::Usage(usage))
}

fn indexed<'s>(rest: &'s str, usage: &'static str) -> Result<(usize, &'s str), ConsoleError> {
    let (index, tail) = rest
        .split_once(char::is_whitespace)
        .ok_or(ConsoleError::Usage(usage))?;
    Ok((parse_index(index, usage)?, tail.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::QueryError;
    use crate::filter::FilterSet;
    use crate::query::{LogRecord, QueryRequest};
    use std::cell::RefCell;

    struct RecordingService {
        requests: RefCell<Vec<QueryRequest>>,
        records: Vec<LogRecord>,
    }

    impl QueryService for RecordingService {
        fn query(&self, request: &QueryRequest) -> Result<Vec<LogRecord>, QueryError> {
            self.requests.borrow_mut().push(request.clone());
            Ok(self.records.clone())
        }
    }

    fn run_script(console: &mut Console<'_>, script: &str) -> String {
        let mut out = Vec::new();
        console.run(script.as_bytes(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_build_rows_step_by_step() {
        let mut console = Console::new(SearchSession::new(1), None, 60);
        run_script(
            &mut console,
            "field 0 level\nop 0 =\nvalue 0 ERROR\nadd message~timeout\n",
        );
        let query = console.session().filters().build_query();
        assert_eq!(query.filters.len(), 2);
        assert_eq!(query.filters[0].field, LogField::Level);
        assert_eq!(query.filters[1].operator, Operator::Contains);
    }

    #[test]
    fn test_quoted_value_matches_filter_term() {
        let mut console = Console::new(SearchSession::new(1), None, 60);
        run_script(
            &mut console,
            "set 0 message~\"disk full\"\nadd\nfield 1 message\nop 1 ~\nvalue 1 \"disk full\"\n",
        );
        let rows = console.session().filters().rows();
        assert_eq!(rows[0].value(), &RowValue::Scalar("disk full".to_string()));
        assert_eq!(rows[1].value(), rows[0].value());
        let query = console.session().filters().build_query();
        assert_eq!(query.filters[0], query.filters[1]);
    }

    #[test]
    fn test_empty_quotes_clear_a_value() {
        let mut console = Console::new(SearchSession::new(1), None, 60);
        run_script(&mut console, "set 0 level=ERROR\nvalue 0 \"\"\n");
        let row = &console.session().filters().rows()[0];
        assert_eq!(row.value(), &RowValue::Scalar(String::new()));
        assert!(!row.is_complete());
    }

    #[test]
    fn test_errors_do_not_end_the_session() {
        let mut console = Console::new(SearchSession::new(1), None, 60);
        let output = run_script(
            &mut console,
            "rm 0\nfield 0 host\nrange 2024-01-02..2024-01-01\nbogus\nshow\n",
        );
        assert!(output.contains("error: The last remaining filter row cannot be removed"));
        assert!(output.contains("error: Unknown field: 'host'"));
        assert!(output.contains("error: Invalid time range: '2024-01-02..2024-01-01'"));
        assert!(console.session().filters().date_range().is_empty());
        assert!(output.contains("error: Unknown command 'bogus'"));
        assert!(output.contains("[0] <field> <op>"));
    }

    #[test]
    fn test_search_without_service() {
        let mut console = Console::new(SearchSession::new(1), None, 60);
        let output = run_script(&mut console, "set 0 level=ERROR\nsearch\n");
        assert!(output.contains("No query service configured"));
    }

    #[test]
    fn test_search_dispatches_and_shows_results() {
        let service = RecordingService {
            requests: RefCell::new(Vec::new()),
            records: vec![LogRecord {
                level: "ERROR".to_string(),
                message: "disk full".to_string(),
                ..Default::default()
            }],
        };
        let mut console = Console::new(SearchSession::new(1), Some(&service), 60);
        let output = run_script(
            &mut console,
            "set 0 level=ERROR\nrange 2024-01-01T00:00:00Z..2024-01-02T00:00:00Z\nsearch\nquit\n",
        );

        assert!(output.contains("SEARCH returned 1 record"));
        let requests = service.requests.borrow();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].start_date.as_deref(), Some("2024-01-01T00:00:00+00:00"));
        assert_eq!(console.session().records().len(), 1);
    }

    #[test]
    fn test_rejected_search_is_not_dispatched() {
        let service = RecordingService {
            requests: RefCell::new(Vec::new()),
            records: Vec::new(),
        };
        let mut console = Console::new(SearchSession::new(3), Some(&service), 60);
        let output = run_script(&mut console, "set 0 level=ERROR\nadd commit=abc\nsearch\n");

        assert!(output.contains("Search rejected:"));
        assert!(output.contains("at least 3 required"));
        assert!(service.requests.borrow().is_empty());
    }

    #[test]
    fn test_reset_restores_blank_set() {
        let mut console = Console::new(SearchSession::new(1), None, 60);
        run_script(&mut console, "set 0 level=ERROR\nadd\nadd\nrange 2024-01-01..2024-01-02\nreset\n");
        assert_eq!(console.session().filters(), &FilterSet::new());
    }
}
