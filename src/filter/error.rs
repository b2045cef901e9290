use thiserror::Error;

/// Errors that can occur when parsing filter expressions and timestamps
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterParseError {
    #[error(
        "Unknown field: '{0}'. Valid fields are: level, message, resourceId, timestamp, traceId, spanId, commit, metadata.parentResourceId"
    )]
    UnknownField(String),

    #[error("Unknown operator: '{0}'. Valid operators are: = (equals), != (not-equals), ~ (contains), !~ (not-contains)")]
    UnknownOperator(String),

    #[error("Empty filter value for field '{0}'")]
    EmptyValue(String),

    #[error("Invalid timestamp: '{0}'. Use RFC 3339 (2024-01-01T00:00:00Z), 'YYYY-MM-DD HH:MM:SS' or 'YYYY-MM-DD'")]
    InvalidTimestamp(String),

    #[error("Invalid time range: '{0}'. Use 'START..END'")]
    InvalidRange(String),

    #[error("Invalid filter expression: {0}")]
    InvalidExpression(String),
}

/// Misuse of the filter set controller
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("Row {index} does not exist (the filter set has {len} rows)")]
    RowOutOfBounds { index: usize, len: usize },

    #[error("The last remaining filter row cannot be removed")]
    LastRow,

    #[error("Field '{field}' expects a {expected} value")]
    ValueKindMismatch {
        field: String,
        expected: &'static str,
    },
}
