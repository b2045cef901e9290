use crate::query::{LogRecord, QueryRequest};
use reqwest::Url;
use reqwest::blocking::Client;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, instrument, warn};

const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Invalid query endpoint '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Failed to reach query service: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Query service responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode query response: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Executes a serialized filter set and returns the matching records
pub trait QueryService {
    fn query(&self, request: &QueryRequest) -> Result<Vec<LogRecord>, QueryError>;
}

/// Query service reached over HTTP: `POST` JSON, JSON array back
#[derive(Debug, Clone)]
pub struct HttpQueryService {
    http: Client,
    endpoint: Url,
}

impl HttpQueryService {
    /// Bind to `{api_url}{query_path}`
    pub fn new(api_url: &str, query_path: &str, timeout: Duration) -> Result<Self, QueryError> {
        let joined = format!(
            "{}/{}",
            api_url.trim_end_matches('/'),
            query_path.trim_start_matches('/')
        );
        let endpoint = Url::parse(&joined).map_err(|err| QueryError::InvalidUrl {
            url: joined.clone(),
            reason: err.to_string(),
        })?;

        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl QueryService for HttpQueryService {
    #[instrument(skip_all, fields(endpoint = %self.endpoint, filters = request.filters.len()))]
    fn query(&self, request: &QueryRequest) -> Result<Vec<LogRecord>, QueryError> {
        let started = Instant::now();
        let response = self.http.post(self.endpoint.clone()).json(request).send()?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let cut = (0..=MAX_ERROR_BODY)
                    .rev()
                    .find(|i| body.is_char_boundary(*i))
                    .unwrap_or(0);
                body.truncate(cut);
                body.push_str("...");
            }
            warn!(status = status.as_u16(), "query service returned an error");
            return Err(QueryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text()?;
        let records: Vec<LogRecord> = serde_json::from_str(&body).map_err(QueryError::Decode)?;
        debug!(
            records = records.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "query completed"
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let service = HttpQueryService::new(
            "https://logs.example.com/",
            "/.netlify/functions/query",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            service.endpoint().as_str(),
            "https://logs.example.com/.netlify/functions/query"
        );
    }

    #[test]
    fn test_invalid_api_url() {
        let result = HttpQueryService::new("not a url", "query", Duration::from_secs(5));
        assert!(matches!(result, Err(QueryError::InvalidUrl { .. })));
    }
}
