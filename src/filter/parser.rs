use super::error::FilterParseError;
use super::row::{FilterRow, LogField, Operator, RowValue};
use super::time::TimeRange;

/// Parse a single `field<op>value` term into a complete filter row.
///
/// Timestamp terms take a `START..END` range, which may be empty.
pub fn parse_filter_row(s: &str) -> Result<FilterRow, FilterParseError> {
    let s = s.trim();
    let (op_start, op_len) = find_operator(s).ok_or_else(|| {
        FilterParseError::InvalidExpression(format!(
            "Expected 'field<op>value' format, got: {}",
            s
        ))
    })?;

    let field_part = s[..op_start].trim();
    if field_part.is_empty() {
        return Err(FilterParseError::InvalidExpression(format!(
            "Missing field name in: {}",
            s
        )));
    }

    let field: LogField = field_part.parse()?;
    let operator: Operator = s[op_start..op_start + op_len].parse()?;
    let raw_value = unquote(s[op_start + op_len..].trim());

    let value = if field.takes_range() {
        RowValue::Range(TimeRange::parse(raw_value)?)
    } else if raw_value.is_empty() {
        return Err(FilterParseError::EmptyValue(field.as_str().to_string()));
    } else {
        RowValue::Scalar(raw_value.to_string())
    };

    let mut row = FilterRow::new().with_field(field).with_operator(operator);
    // The value kind was chosen from the field above
    row.set_value(value)
        .map_err(|e| FilterParseError::InvalidExpression(e.to_string()))?;
    Ok(row)
}

/// Locate the operator: the first `!`, `=` or `~`, plus an optional second symbol
fn find_operator(s: &str) -> Option<(usize, usize)> {
    let (idx, c) = s.char_indices().find(|(_, c)| matches!(c, '!' | '=' | '~'))?;
    let next = s[idx + c.len_utf8()..].chars().next();
    let len = match (c, next) {
        ('!', Some('=' | '~')) | ('=', Some('=')) => 2,
        _ => 1,
    };
    Some((idx, len))
}

/// Strip one pair of surrounding double quotes, if present
pub(crate) fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(s)
}

/// A whitespace-separated list of filter terms
#[derive(Debug, Clone)]
pub struct FilterExpression {
    pub rows: Vec<FilterRow>,
}

impl FilterExpression {
    /// Parse every term; quoted values may contain spaces.
    pub fn parse(s: &str) -> Result<Self, FilterParseError> {
        let rows = split_terms(s)
            .map(parse_filter_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rows })
    }
}

/// Terms are separated by whitespace outside double quotes
fn split_terms(s: &str) -> impl Iterator<Item = &str> {
    let mut quoted = false;
    s.split(move |c: char| {
        if c == '"' {
            quoted = !quoted;
        }
        !quoted && c.is_whitespace()
    })
    .filter(|term| !term.is_empty())
}
