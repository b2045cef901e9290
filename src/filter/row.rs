use super::error::{FilterError, FilterParseError};
use super::time::TimeRange;
use crate::query::{Predicate, PredicateValue};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Searchable attributes of a log record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogField {
    #[serde(rename = "level")]
    Level,
    #[serde(rename = "message")]
    Message,
    #[serde(rename = "resourceId")]
    ResourceId,
    #[serde(rename = "timestamp")]
    Timestamp,
    #[serde(rename = "traceId")]
    TraceId,
    #[serde(rename = "spanId")]
    SpanId,
    #[serde(rename = "commit")]
    Commit,
    /// Dotted path into the nested `metadata` object
    #[serde(rename = "metadata.parentResourceId")]
    ParentResourceId,
}

impl LogField {
    pub const ALL: [LogField; 8] = [
        LogField::Level,
        LogField::Message,
        LogField::ResourceId,
        LogField::Timestamp,
        LogField::TraceId,
        LogField::SpanId,
        LogField::Commit,
        LogField::ParentResourceId,
    ];

    /// Name used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            LogField::Level => "level",
            LogField::Message => "message",
            LogField::ResourceId => "resourceId",
            LogField::Timestamp => "timestamp",
            LogField::TraceId => "traceId",
            LogField::SpanId => "spanId",
            LogField::Commit => "commit",
            LogField::ParentResourceId => "metadata.parentResourceId",
        }
    }

    /// Human readable column title
    pub fn label(&self) -> &'static str {
        match self {
            LogField::Level => "Level",
            LogField::Message => "Message",
            LogField::ResourceId => "Resource ID",
            LogField::Timestamp => "Timestamp",
            LogField::TraceId => "Trace ID",
            LogField::SpanId => "Span ID",
            LogField::Commit => "Commit",
            LogField::ParentResourceId => "Parent Resource ID",
        }
    }

    /// Whether values for this field are time ranges rather than text
    pub fn takes_range(&self) -> bool {
        matches!(self, LogField::Timestamp)
    }
}

impl FromStr for LogField {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "level" | "lvl" | "l" => Ok(LogField::Level),
            "message" | "msg" | "m" => Ok(LogField::Message),
            "resourceid" | "resource" => Ok(LogField::ResourceId),
            "timestamp" | "time" | "ts" => Ok(LogField::Timestamp),
            "traceid" | "trace" => Ok(LogField::TraceId),
            "spanid" | "span" => Ok(LogField::SpanId),
            "commit" => Ok(LogField::Commit),
            "metadata.parentresourceid" | "parentresourceid" | "parent" => {
                Ok(LogField::ParentResourceId)
            }
            _ => Err(FilterParseError::UnknownField(s.to_string())),
        }
    }
}

impl fmt::Display for LogField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison applied between a field and a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "=")]
    Equals,
    #[serde(rename = "!=")]
    NotEquals,
    #[serde(rename = "~")]
    Contains,
    #[serde(rename = "!~")]
    NotContains,
}

impl Operator {
    pub const ALL: [Operator; 4] = [
        Operator::Equals,
        Operator::NotEquals,
        Operator::Contains,
        Operator::NotContains,
    ];

    /// Symbol used on the wire
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Equals => "=",
            Operator::NotEquals => "!=",
            Operator::Contains => "~",
            Operator::NotContains => "!~",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operator::Equals => "equals",
            Operator::NotEquals => "not-equals",
            Operator::Contains => "contains",
            Operator::NotContains => "not-contains",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Operator::Equals => "Equals",
            Operator::NotEquals => "Not Equals",
            Operator::Contains => "Contains",
            Operator::NotContains => "Does Not Contain",
        }
    }
}

impl FromStr for Operator {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "=" | "==" | "eq" | "equals" => Ok(Operator::Equals),
            "!=" | "ne" | "neq" | "not-equals" => Ok(Operator::NotEquals),
            "~" | "contains" => Ok(Operator::Contains),
            "!~" | "not-contains" => Ok(Operator::NotContains),
            _ => Err(FilterParseError::UnknownOperator(s.to_string())),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Value of a filter row; the variant follows the row's field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowValue {
    Scalar(String),
    Range(TimeRange),
}

impl Default for RowValue {
    fn default() -> Self {
        RowValue::Scalar(String::new())
    }
}

impl RowValue {
    /// Empty value of the kind expected by `field`
    pub fn blank_for(field: Option<LogField>) -> Self {
        if field.is_some_and(|f| f.takes_range()) {
            RowValue::Range(TimeRange::default())
        } else {
            RowValue::default()
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            RowValue::Scalar(s) => s.is_empty(),
            RowValue::Range(range) => range.is_empty(),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            RowValue::Scalar(_) => "text",
            RowValue::Range(_) => "time range",
        }
    }
}

impl From<&str> for RowValue {
    fn from(value: &str) -> Self {
        RowValue::Scalar(value.to_string())
    }
}

impl From<String> for RowValue {
    fn from(value: String) -> Self {
        RowValue::Scalar(value)
    }
}

impl From<TimeRange> for RowValue {
    fn from(range: TimeRange) -> Self {
        RowValue::Range(range)
    }
}

impl fmt::Display for RowValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowValue::Scalar(s) => f.write_str(s),
            RowValue::Range(range) => write!(f, "{range}"),
        }
    }
}

/// Part of a row that still has to be filled in before it can be sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingPart {
    Field,
    Operator,
    Value,
    /// A time range with only one end set
    RangeEnd,
}

impl fmt::Display for MissingPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MissingPart::Field => "Field is required",
            MissingPart::Operator => "Condition is required",
            MissingPart::Value => "Value is required",
            MissingPart::RangeEnd => "Time range needs both a start and an end",
        })
    }
}

/// A single predicate being edited
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterRow {
    field: Option<LogField>,
    operator: Option<Operator>,
    value: RowValue,
}

impl FilterRow {
    /// A row with nothing selected
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, field: LogField) -> Self {
        self.set_field(field);
        self
    }

    pub fn with_operator(mut self, operator: Operator) -> Self {
        self.set_operator(operator);
        self
    }

    pub fn with_value(mut self, value: impl Into<RowValue>) -> Result<Self, FilterError> {
        self.set_value(value.into())?;
        Ok(self)
    }

    pub fn field(&self) -> Option<LogField> {
        self.field
    }

    pub fn operator(&self) -> Option<Operator> {
        self.operator
    }

    pub fn value(&self) -> &RowValue {
        &self.value
    }

    /// Select the field, resetting the value when it switches between text and range
    pub fn set_field(&mut self, field: LogField) {
        let was_range = self.field.is_some_and(|f| f.takes_range());
        if was_range != field.takes_range() {
            self.value = RowValue::blank_for(Some(field));
        }
        self.field = Some(field);
    }

    pub fn set_operator(&mut self, operator: Operator) {
        self.operator = Some(operator);
    }

    pub fn set_value(&mut self, value: RowValue) -> Result<(), FilterError> {
        let expected = RowValue::blank_for(self.field);
        if std::mem::discriminant(&expected) != std::mem::discriminant(&value) {
            return Err(FilterError::ValueKindMismatch {
                field: self
                    .field
                    .map(|f| f.as_str().to_string())
                    .unwrap_or_else(|| "(none)".to_string()),
                expected: expected.kind(),
            });
        }
        self.value = value;
        Ok(())
    }

    /// Nothing has been entered yet
    pub fn is_blank(&self) -> bool {
        self.field.is_none() && self.operator.is_none() && self.value.is_blank()
    }

    /// Field and operator are set and the value satisfies the field
    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }

    /// What keeps this row from being complete
    pub fn missing(&self) -> Vec<MissingPart> {
        let mut missing = Vec::new();
        if self.field.is_none() {
            missing.push(MissingPart::Field);
        }
        if self.operator.is_none() {
            missing.push(MissingPart::Operator);
        }
        match &self.value {
            RowValue::Scalar(s) if s.is_empty() => missing.push(MissingPart::Value),
            RowValue::Range(range) if range.is_partial() => missing.push(MissingPart::RangeEnd),
            _ => {}
        }
        missing
    }

    /// The predicate sent for this row, or `None` while it is incomplete
    pub fn to_predicate(&self) -> Option<Predicate> {
        if !self.is_complete() {
            return None;
        }
        let value = match &self.value {
            RowValue::Scalar(s) => PredicateValue::Text(s.clone()),
            RowValue::Range(range) => match range.bounds() {
                Some((start, end)) => PredicateValue::range(&start, &end),
                None => PredicateValue::Unbounded,
            },
        };
        Some(Predicate {
            field: self.field?,
            operator: self.operator?,
            value,
        })
    }
}

impl fmt::Display for FilterRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = self.field.map(|v| v.as_str()).unwrap_or("<field>");
        let operator = self.operator.map(|v| v.symbol()).unwrap_or("<op>");
        write!(f, "{field} {operator} {}", self.value)
    }
}
