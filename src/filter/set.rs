use super::error::FilterError;
use super::row::{FilterRow, MissingPart};
use super::time::{TimeRange, format_timestamp};
use crate::query::QueryRequest;
use chrono::{DateTime, FixedOffset};
use std::fmt;

/// Ordered filter rows plus the optional global date range.
///
/// Always holds at least one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSet {
    rows: Vec<FilterRow>,
    date_range: TimeRange,
}

impl Default for FilterSet {
    fn default() -> Self {
        Self {
            rows: vec![FilterRow::new()],
            date_range: TimeRange::default(),
        }
    }
}

impl FilterSet {
    /// One blank row, no date range
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from existing rows; an empty list yields one blank row.
    pub fn from_rows(rows: Vec<FilterRow>) -> Self {
        if rows.is_empty() {
            return Self::new();
        }
        Self {
            rows,
            date_range: TimeRange::default(),
        }
    }

    pub fn rows(&self) -> &[FilterRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Never true: a set always holds at least one row
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_mut(&mut self, index: usize) -> Result<&mut FilterRow, FilterError> {
        let len = self.rows.len();
        self.rows
            .get_mut(index)
            .ok_or(FilterError::RowOutOfBounds { index, len })
    }

    /// Append a blank row and return its index
    pub fn add_row(&mut self) -> usize {
        self.rows.push(FilterRow::new());
        self.rows.len() - 1
    }

    /// Remove the row at `index`; the last remaining row is kept
    pub fn remove_row(&mut self, index: usize) -> Result<FilterRow, FilterError> {
        let len = self.rows.len();
        if index >= len {
            return Err(FilterError::RowOutOfBounds { index, len });
        }
        if len == 1 {
            return Err(FilterError::LastRow);
        }
        Ok(self.rows.remove(index))
    }

    pub fn date_range(&self) -> &TimeRange {
        &self.date_range
    }

    /// Set the global time window; independent from timestamp rows
    pub fn set_date_range(
        &mut self,
        start: Option<DateTime<FixedOffset>>,
        end: Option<DateTime<FixedOffset>>,
    ) {
        self.date_range = TimeRange::new(start, end);
    }

    pub fn clear_date_range(&mut self) {
        self.date_range = TimeRange::default();
    }

    /// Back to a single blank row and no date range
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn complete_count(&self) -> usize {
        self.rows.iter().filter(|row| row.is_complete()).count()
    }

    /// Serialize complete rows, in order, plus the date range when both ends are set.
    ///
    /// Incomplete rows are skipped without error.
    pub fn build_query(&self) -> QueryRequest {
        let filters = self
            .rows
            .iter()
            .filter_map(FilterRow::to_predicate)
            .collect();

        let (start_date, end_date) = match self.date_range.bounds() {
            Some((start, end)) => (Some(format_timestamp(&start)), Some(format_timestamp(&end))),
            None => (None, None),
        };

        QueryRequest {
            filters,
            start_date,
            end_date,
        }
    }

    /// Check the set before submission.
    ///
    /// Every row lacking a field, operator or value is reported
    /// individually, blank rows included. The set as a whole needs at
    /// least `min_complete` complete rows.
    pub fn validate(&self, min_complete: usize) -> Result<(), ValidationReport> {
        let row_errors: Vec<RowError> = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| !row.is_complete())
            .map(|(index, row)| RowError {
                index,
                missing: row.missing(),
            })
            .collect();

        let complete = self.complete_count();
        let form_error = (complete < min_complete).then_some(FormError::TooFewFilters {
            required: min_complete,
            complete,
        });

        if row_errors.is_empty() && form_error.is_none() {
            Ok(())
        } else {
            Err(ValidationReport {
                row_errors,
                form_error,
            })
        }
    }
}

/// Problems with one row, shown next to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    pub index: usize,
    pub missing: Vec<MissingPart>,
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.missing.iter().map(|m| m.to_string()).collect();
        write!(f, "row {}: {}", self.index, parts.join(", "))
    }
}

/// Problems with the filter set as a whole
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    TooFewFilters { required: usize, complete: usize },
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormError::TooFewFilters { required, complete } => write!(
                f,
                "Filter configuration is incomplete: {complete} complete filter(s), at least {required} required"
            ),
        }
    }
}

/// Everything that blocks a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub row_errors: Vec<RowError>,
    pub form_error: Option<FormError>,
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut messages: Vec<String> = self.row_errors.iter().map(|e| e.to_string()).collect();
        if let Some(form_error) = &self.form_error {
            messages.push(form_error.to_string());
        }
        f.write_str(&messages.join("; "))
    }
}

impl std::error::Error for ValidationReport {}
