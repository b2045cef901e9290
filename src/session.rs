//! The search session: the filter set being edited, the records on display
//! and the submit cycle between them.

use crate::client::{QueryError, QueryService};
use crate::filter::{FilterSet, ValidationReport};
use crate::query::{LogRecord, QueryRequest};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Search rejected: {0}")]
    Invalid(#[from] ValidationReport),

    #[error("A search is already in progress")]
    InFlight,

    #[error(transparent)]
    Dispatch(#[from] QueryError),
}

/// Ticket for a dispatched query, handed back to [`SearchSession::finish`]
#[derive(Debug)]
pub struct PendingSearch {
    generation: u64,
    request: QueryRequest,
}

impl PendingSearch {
    pub fn request(&self) -> &QueryRequest {
        &self.request
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Results replaced the displayed records
    Applied { records: usize },
    /// The search was cancelled or superseded; its result was dropped
    Stale,
}

#[derive(Debug)]
pub struct SearchSession {
    filters: FilterSet,
    records: Vec<LogRecord>,
    notice: Option<String>,
    min_complete_filters: usize,
    generation: u64,
    in_flight: Option<u64>,
}

impl SearchSession {
    pub fn new(min_complete_filters: usize) -> Self {
        Self::with_filters(FilterSet::new(), min_complete_filters)
    }

    pub fn with_filters(filters: FilterSet, min_complete_filters: usize) -> Self {
        Self {
            filters,
            records: Vec::new(),
            notice: None,
            min_complete_filters,
            generation: 0,
            in_flight: None,
        }
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn filters_mut(&mut self) -> &mut FilterSet {
        &mut self.filters
    }

    /// Records from the last successful search
    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    /// Last dispatch failure, kept until the next submission
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn min_complete_filters(&self) -> usize {
        self.min_complete_filters
    }

    pub fn set_min_complete_filters(&mut self, min: usize) {
        self.min_complete_filters = min;
    }

    pub fn is_searching(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Validate and serialize the filter set, marking a search as outstanding.
    ///
    /// Fails without dispatching when the filters are invalid or another
    /// search has not finished yet.
    pub fn begin_search(&mut self) -> Result<PendingSearch, SubmitError> {
        if self.in_flight.is_some() {
            return Err(SubmitError::InFlight);
        }

        if let Err(report) = self.filters.validate(self.min_complete_filters) {
            warn!(
                row_errors = report.row_errors.len(),
                form_error = report.form_error.is_some(),
                "search rejected by validation"
            );
            return Err(SubmitError::Invalid(report));
        }

        self.generation += 1;
        self.in_flight = Some(self.generation);
        self.notice = None;

        let request = self.filters.build_query();
        debug!(
            generation = self.generation,
            filters = request.filters.len(),
            has_date_range = request.start_date.is_some(),
            "search started"
        );

        Ok(PendingSearch {
            generation: self.generation,
            request,
        })
    }

    /// Apply the result of a dispatched search.
    ///
    /// Success replaces the displayed records wholesale; failure keeps them
    /// and records a notice. Results of cancelled searches are dropped.
    pub fn finish(
        &mut self,
        pending: PendingSearch,
        result: Result<Vec<LogRecord>, QueryError>,
    ) -> Result<SearchOutcome, QueryError> {
        if self.in_flight != Some(pending.generation) {
            debug!(
                generation = pending.generation,
                "discarding result of superseded search"
            );
            return Ok(SearchOutcome::Stale);
        }
        self.in_flight = None;

        match result {
            Ok(records) => {
                info!(records = records.len(), "search completed");
                let count = records.len();
                self.records = records;
                Ok(SearchOutcome::Applied { records: count })
            }
            Err(err) => {
                warn!(error = %err, "search failed");
                self.notice = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Abandon the outstanding search so a new one can start
    pub fn cancel(&mut self) -> bool {
        self.in_flight.take().is_some()
    }

    /// Run a full submit cycle against `service`
    pub fn search(&mut self, service: &dyn QueryService) -> Result<SearchOutcome, SubmitError> {
        let pending = self.begin_search()?;
        let result = service.query(pending.request());
        Ok(self.finish(pending, result)?)
    }

    /// Restore the filter set to a single blank row; displayed records stay
    pub fn reset_filters(&mut self) {
        self.filters.reset();
    }
}
