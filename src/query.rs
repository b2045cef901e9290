//! Wire types exchanged with the query service

use crate::filter::time::format_timestamp;
use crate::filter::{LogField, Operator};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Value part of a predicate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredicateValue {
    Text(String),
    /// `[start, end]`, both canonical timestamps
    Range([String; 2]),
    /// Timestamp predicate without a range, sent as `null`
    Unbounded,
}

impl PredicateValue {
    pub fn range(start: &DateTime<FixedOffset>, end: &DateTime<FixedOffset>) -> Self {
        PredicateValue::Range([format_timestamp(start), format_timestamp(end)])
    }
}

/// A single `{field, operator, value}` triple
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    pub field: LogField,
    pub operator: Operator,
    pub value: PredicateValue,
}

/// Request body posted to the query service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub filters: Vec<Predicate>,
    #[serde(rename = "startDate", default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate", default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordMetadata {
    #[serde(deserialize_with = "lenient_string")]
    pub parent_resource_id: String,
}

/// One log record returned by the query service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogRecord {
    #[serde(deserialize_with = "lenient_string")]
    pub level: String,
    #[serde(deserialize_with = "lenient_string")]
    pub message: String,
    #[serde(deserialize_with = "lenient_string")]
    pub resource_id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub timestamp: String,
    #[serde(deserialize_with = "lenient_string")]
    pub trace_id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub span_id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub commit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<RecordMetadata>,
}

impl LogRecord {
    /// Value of `field`, following the dotted path for metadata fields
    pub fn get(&self, field: LogField) -> &str {
        match field {
            LogField::Level => &self.level,
            LogField::Message => &self.message,
            LogField::ResourceId => &self.resource_id,
            LogField::Timestamp => &self.timestamp,
            LogField::TraceId => &self.trace_id,
            LogField::SpanId => &self.span_id,
            LogField::Commit => &self.commit,
            LogField::ParentResourceId => self
                .metadata
                .as_ref()
                .map(|m| m.parent_resource_id.as_str())
                .unwrap_or(""),
        }
    }
}

/// Accept strings, numbers and null alike; services are not strict about types.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}
