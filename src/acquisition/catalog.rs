//! Client for the remote earthquake catalog (count and query endpoints).

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use crate::config::AcquisitionConfig;
use crate::error::AcquisitionError;
use crate::models::DateRange;

/// Filter applied to every catalog request.
const BASE_QUERY: [(&str, &str); 4] = [
    ("format", "geojson"),
    ("orderby", "time"),
    ("eventtype", "earthquake"),
    ("minmagnitude", "4.5"),
];

// ---

/// Reports how many events the catalog holds for a range.
#[async_trait]
pub trait EventCounter {
    async fn count(&self, range: &DateRange) -> Result<u64, AcquisitionError>;
}

/// Fetches the raw catalog payload for a range.
#[async_trait]
pub trait EventFetcher {
    async fn fetch(&self, range: &DateRange) -> Result<String, AcquisitionError>;
}

/// One HTTP session shared by every count and query call of a run.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: Client,
    count_url: String,
    query_url: String,
}

impl CatalogClient {
    /// Build a client whose requests time out after `config.request_timeout`.
    pub fn new(config: &AcquisitionConfig) -> Result<Self, AcquisitionError> {
        // ---
        let client = Client::builder().timeout(config.request_timeout).build()?;

        Ok(Self {
            client,
            count_url: config.count_url.clone(),
            query_url: config.query_url.clone(),
        })
    }

    fn params(range: &DateRange) -> Vec<(&'static str, String)> {
        // ---
        let mut params: Vec<(&'static str, String)> = BASE_QUERY
            .iter()
            .map(|(k, v)| (*k, (*v).to_string()))
            .collect();
        params.push(("starttime", range.start_str()));
        params.push(("endtime", range.end_str()));
        params
    }
}

#[async_trait]
impl EventCounter for CatalogClient {
    async fn count(&self, range: &DateRange) -> Result<u64, AcquisitionError> {
        // ---
        let response = self
            .client
            .get(&self.count_url)
            .query(&Self::params(range))
            .send()
            .await?;

        // The catalog answers over-limit counts with an error status whose
        // body still carries the count, so the body is read before the status.
        let status = response.status();
        let url = response.url().to_string();
        let text = response.text().await?;

        match parse_count_body(&text) {
            Ok(parsed) => {
                if parsed.over_limit {
                    info!(
                        "Count for {} to {}: {} events (exceeds API limit)",
                        range.start, range.end, parsed.count
                    );
                } else {
                    info!(
                        "Count for {} to {}: {} events",
                        range.start, range.end, parsed.count
                    );
                }
                Ok(parsed.count)
            }
            Err(_) if !status.is_success() => Err(AcquisitionError::Status { url, status }),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl EventFetcher for CatalogClient {
    async fn fetch(&self, range: &DateRange) -> Result<String, AcquisitionError> {
        // ---
        let response = self
            .client
            .get(&self.query_url)
            .query(&Self::params(range))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AcquisitionError::Status {
                url: response.url().to_string(),
                status,
            });
        }

        let body = response.text().await?;
        debug!(bytes = body.len(), "Fetched {} to {}", range.start, range.end);
        Ok(body)
    }
}

// ---

/// A count decoded from either response shape of the count endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedCount {
    pub count: u64,
    /// Set when the count came from the structured over-limit body.
    pub over_limit: bool,
}

/// Decode a count endpoint body: a bare integer, or a JSON object with `count`.
pub fn parse_count_body(text: &str) -> Result<ParsedCount, AcquisitionError> {
    // ---
    let trimmed = text.trim();
    if let Ok(count) = trimmed.parse::<u64>() {
        return Ok(ParsedCount {
            count,
            over_limit: false,
        });
    }

    serde_json::from_str::<serde_json::Value>(trimmed)
        .ok()
        .and_then(|v| v.get("count").and_then(serde_json::Value::as_u64))
        .map(|count| ParsedCount {
            count,
            over_limit: true,
        })
        .ok_or_else(|| AcquisitionError::InvalidCountResponse {
            body: trimmed.chars().take(200).collect(),
        })
}
