//! Filter rows, filter sets and the query they serialize to
//!
//! A [`FilterSet`] is the editable state of a search: an ordered list of
//! [`FilterRow`]s plus an optional global date range. Only complete rows are
//! sent; [`FilterSet::build_query`] turns the current state into a
//! [`QueryRequest`](crate::query::QueryRequest).
//!
//! # Filter syntax
//!
//! ```text
//! field=value          equals
//! field!=value         not equals
//! field~value          contains
//! field!~value         does not contain
//! timestamp=START..END time range, either end may be empty
//! ```
//!
//! # Fields
//!
//! `level`, `message`, `resourceId`, `timestamp`, `traceId`, `spanId`,
//! `commit`, `metadata.parentResourceId`
//!
//! # Examples
//!
//! ```text
//! level=ERROR                                   # Error logs only
//! level!=DEBUG message~timeout                  # Non-debug logs mentioning timeout
//! message~"connection reset"                    # Quoted values may contain spaces
//! timestamp=2024-01-01T00:00:00Z..2024-01-02T00:00:00Z
//! ```

pub mod error;
pub mod parser;
pub mod row;
pub mod set;
pub mod time;

pub use error::{FilterError, FilterParseError};
pub use parser::{FilterExpression, parse_filter_row};
pub(crate) use parser::unquote;
pub use row::{FilterRow, LogField, MissingPart, Operator, RowValue};
pub use set::{FilterSet, FormError, RowError, ValidationReport};
pub use time::{TimeRange, format_timestamp, parse_timestamp};
