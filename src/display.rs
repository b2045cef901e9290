use crate::filter::{FilterSet, LogField, Operator, ValidationReport};
use crate::query::{LogRecord, QueryRequest};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table};
use std::fmt::Write as _;

/// Table with the house style applied and `headers` set
pub fn create_styled_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers.iter().map(Cell::new));
    table
}

/// Shorten `s` to at most `max_len` characters, marking the cut with `...`
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Result table with one column per searchable field
pub fn records_table(records: &[LogRecord], message_width: usize) -> Table {
    let headers: Vec<&str> = LogField::ALL.iter().map(|f| f.label()).collect();
    let mut table = create_styled_table(&headers);

    for record in records {
        table.add_row(LogField::ALL.iter().map(|field| {
            let value = record.get(*field);
            match field {
                LogField::Message => Cell::new(truncate_string(
                    &value.replace('\n', "\\n"),
                    message_width,
                )),
                _ => Cell::new(value),
            }
        }));
    }

    table
}

pub fn format_records_text(records: &[LogRecord], message_width: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "SEARCH returned {} record{}",
        records.len(),
        if records.len() == 1 { "" } else { "s" }
    );

    if records.is_empty() {
        let _ = writeln!(out, "No matching log records found.");
        return out;
    }

    let _ = writeln!(out, "{}", records_table(records, message_width));
    out
}

pub fn format_records_json(records: &[LogRecord]) -> String {
    serde_json::to_string_pretty(records).unwrap_or_else(|_| "[]".to_string())
}

pub fn format_query_json(request: &QueryRequest) -> String {
    serde_json::to_string_pretty(request).unwrap_or_else(|_| "{}".to_string())
}

/// Rows with their index and state, then the date range
pub fn format_filter_set(set: &FilterSet) -> String {
    let mut out = String::new();
    for (index, row) in set.rows().iter().enumerate() {
        let state = if row.is_complete() {
            "ok"
        } else if row.is_blank() {
            "blank"
        } else {
            "incomplete"
        };
        let _ = writeln!(out, "[{index}] {row}  ({state})");
    }

    let range = set.date_range();
    if range.is_empty() {
        let _ = writeln!(out, "date range: (none)");
    } else {
        let suffix = if range.is_bounded() { "" } else { "  (ignored until both ends are set)" };
        let _ = writeln!(out, "date range: {range}{suffix}");
    }
    out
}

/// One line per problem: row errors first, then the form-level error
pub fn format_validation(report: &ValidationReport) -> String {
    let mut out = String::new();
    for row_error in &report.row_errors {
        let _ = writeln!(out, "  {row_error}");
    }
    if let Some(form_error) = &report.form_error {
        let _ = writeln!(out, "  {form_error}");
    }
    out
}

pub fn format_fields() -> String {
    let mut fields = create_styled_table(&["Field", "Title", "Value"]);
    for field in LogField::ALL {
        fields.add_row(vec![
            Cell::new(field.as_str()),
            Cell::new(field.label()),
            Cell::new(if field.takes_range() { "START..END" } else { "text" }),
        ]);
    }

    let mut operators = create_styled_table(&["Operator", "Name", "Title"]);
    for op in Operator::ALL {
        operators.add_row(vec![
            Cell::new(op.symbol()),
            Cell::new(op.name()),
            Cell::new(op.label()),
        ]);
    }

    format!("{fields}\n{operators}\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::parse_filter_row;

    #[test]
    fn test_truncate_string_counts_chars() {
        assert_eq!(truncate_string("short", 10), "short");
        assert_eq!(truncate_string("abcdefghij", 8), "abcde...");
        assert_eq!(truncate_string("ééééé", 4), "é...");
    }

    #[test]
    fn test_records_text_empty() {
        let text = format_records_text(&[], 40);
        assert!(text.contains("SEARCH returned 0 records"));
        assert!(text.contains("No matching log records found."));
    }

    #[test]
    fn test_records_table_has_all_columns() {
        let record = LogRecord {
            level: "ERROR".to_string(),
            message: "disk full".to_string(),
            ..Default::default()
        };
        let text = format_records_text(&[record], 40);
        assert!(text.contains("SEARCH returned 1 record\n"));
        for field in LogField::ALL {
            assert!(text.contains(field.label()), "missing column {}", field.label());
        }
        assert!(text.contains("disk full"));
    }

    #[test]
    fn test_filter_set_listing() {
        let mut set = FilterSet::from_rows(vec![parse_filter_row("level=ERROR").unwrap()]);
        set.add_row();
        let text = format_filter_set(&set);
        assert!(text.contains("[0] level = ERROR  (ok)"));
        assert!(text.contains("[1] <field> <op>   (blank)"));
        assert!(text.contains("date range: (none)"));
    }
}
