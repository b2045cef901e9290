use super::error::FilterParseError;
use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone};
use std::fmt;

const RANGE_SEPARATOR: &str = "..";

/// Parse a user-entered timestamp.
///
/// Accepts RFC 3339 (`2024-01-01T00:00:00Z`, `2024-01-01T02:00:00+02:00`),
/// a naive `YYYY-MM-DD HH:MM:SS` / `YYYY-MM-DDTHH:MM:SS` read in local time,
/// or a bare `YYYY-MM-DD` meaning local midnight.
pub fn parse_timestamp(s: &str) -> Result<DateTime<FixedOffset>, FilterParseError> {
    let s = s.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts);
    }

    let naive = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| FilterParseError::InvalidTimestamp(s.to_string()))?;

    // Ambiguous local times (DST fold) resolve to the earlier instant
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|ts| ts.fixed_offset())
        .ok_or_else(|| FilterParseError::InvalidTimestamp(s.to_string()))
}

/// Canonical wire form: RFC 3339, second resolution, explicit offset.
pub fn format_timestamp(ts: &DateTime<FixedOffset>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// A start/end pair where either end may still be unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRange {
    pub start: Option<DateTime<FixedOffset>>,
    pub end: Option<DateTime<FixedOffset>>,
}

impl TimeRange {
    pub fn new(start: Option<DateTime<FixedOffset>>, end: Option<DateTime<FixedOffset>>) -> Self {
        Self { start, end }
    }

    pub fn between(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> Self {
        Self::new(Some(start), Some(end))
    }

    /// Neither end is set
    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Both ends are set
    pub fn is_bounded(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }

    /// Exactly one end is set
    pub fn is_partial(&self) -> bool {
        !self.is_empty() && !self.is_bounded()
    }

    /// Both ends, when set
    pub fn bounds(&self) -> Option<(DateTime<FixedOffset>, DateTime<FixedOffset>)> {
        self.start.zip(self.end)
    }

    /// Parse `START..END`; either side may be left empty, and the start
    /// may not come after the end.
    pub fn parse(s: &str) -> Result<Self, FilterParseError> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Self::default());
        }

        let (start, end) = s
            .split_once(RANGE_SEPARATOR)
            .ok_or_else(|| FilterParseError::InvalidRange(s.to_string()))?;

        let parse_end = |part: &str| -> Result<Option<DateTime<FixedOffset>>, FilterParseError> {
            let part = part.trim();
            if part.is_empty() {
                Ok(None)
            } else {
                parse_timestamp(part).map(Some)
            }
        };

        let range = Self::new(parse_end(start)?, parse_end(end)?);
        if range.bounds().is_some_and(|(start, end)| start > end) {
            return Err(FilterParseError::InvalidRange(s.to_string()));
        }
        Ok(range)
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = |ts: &Option<DateTime<FixedOffset>>| {
            ts.as_ref().map(format_timestamp).unwrap_or_default()
        };
        if self.is_empty() {
            return Ok(());
        }
        write!(f, "{}{}{}", side(&self.start), RANGE_SEPARATOR, side(&self.end))
    }
}
