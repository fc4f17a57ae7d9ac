//! HTTP client for a SPARQL endpoint.

use crate::error::FetchError;
use crate::models::{DwellingTypeRecord, ObservationRecord};
use crate::source::ObservationSource;
use crate::sparql::query::QueryKind;
use crate::sparql::response::{decode, QueryResults};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_ENDPOINT: &str = "https://statistics.gov.scot/sparql";
const RESULTS_JSON: &str = "application/sparql-results+json";

/// Configuration for the SPARQL client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparqlConfig {
    pub endpoint: String,
    pub timeout_seconds: u64,
}

impl Default for SparqlConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_seconds: 60,
        }
    }
}

/// Posts queries to a SPARQL endpoint and decodes the JSON results.
#[derive(Debug, Clone)]
pub struct SparqlClient {
    config: SparqlConfig,
    http_client: reqwest::Client,
}

impl SparqlClient {
    pub fn new(config: SparqlConfig) -> Result<Self, FetchError> {
        info!("Using SPARQL endpoint {}", config.endpoint);

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    /// Underlying HTTP client, shared with other loaders.
    pub fn http_client(&self) -> &reqwest::Client {
        &self.http_client
    }

    /// Run one query for an area.
    pub async fn query(&self, kind: QueryKind, area_code: &str) -> Result<QueryResults, FetchError> {
        let query = kind.render(area_code);
        debug!("Querying {} for {}", kind, area_code);

        let response = self
            .http_client
            .post(&self.config.endpoint)
            .header(ACCEPT, RESULTS_JSON)
            .form(&[("query", query.as_str())])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout(Duration::from_secs(self.config.timeout_seconds))
                } else if e.is_connect() {
                    FetchError::Transport(format!(
                        "cannot connect to {}: {}",
                        self.config.endpoint, e
                    ))
                } else {
                    FetchError::from(e)
                }
            })?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                message: body,
            });
        }

        let results = decode(kind, &body)?;
        debug!("{} {} rows for {}", results.len(), kind, area_code);
        Ok(results)
    }
}

#[async_trait]
impl ObservationSource for SparqlClient {
    async fn fetch_observations(&self, area_code: &str) -> Result<Vec<ObservationRecord>, FetchError> {
        match self.query(QueryKind::Prices, area_code).await? {
            QueryResults::Prices(rows) => Ok(rows),
            QueryResults::DwellingTypes(_) => Err(FetchError::Malformed(
                "expected price rows".to_string(),
            )),
        }
    }

    async fn fetch_dwelling_types(
        &self,
        area_code: &str,
    ) -> Result<Vec<DwellingTypeRecord>, FetchError> {
        match self.query(QueryKind::DwellingTypes, area_code).await? {
            QueryResults::DwellingTypes(rows) => Ok(rows),
            QueryResults::Prices(_) => Err(FetchError::Malformed(
                "expected dwelling type rows".to_string(),
            )),
        }
    }
}
