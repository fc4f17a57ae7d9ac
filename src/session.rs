//! Dashboard session.
//!
//! Owns the feed client and the current geography snapshot. The snapshot is
//! an `Arc` behind a lock; a reload builds a complete new tree and swaps it
//! in, so readers only ever see a finished hierarchy.

use crate::analysis::{
    aggregate, compare_wards, dwelling_totals, ComparisonOptions, WardComparison,
    YearlyAggregation,
};
use crate::error::SourceError;
use crate::geography::{load_table, ColumnLayout, GeographySource, HierarchyBuilder};
use crate::models::{BuildSummary, GeographyHierarchy};
use crate::progress::ProgressCallback;
use crate::source::ObservationSource;
use crate::sparql::SparqlClient;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

pub struct DashboardSession {
    source: Arc<dyn ObservationSource>,
    http_client: reqwest::Client,
    builder: HierarchyBuilder,
    options: ComparisonOptions,
    hierarchy: RwLock<Arc<GeographyHierarchy>>,
    last_build: RwLock<Option<BuildSummary>>,
}

impl DashboardSession {
    /// Create a session with an empty hierarchy.
    pub fn new(source: Arc<dyn ObservationSource>, http_client: reqwest::Client) -> Self {
        Self {
            source,
            http_client,
            builder: HierarchyBuilder::default(),
            options: ComparisonOptions::default(),
            hierarchy: RwLock::new(Arc::new(GeographyHierarchy::default())),
            last_build: RwLock::new(None),
        }
    }

    /// Session backed by a SPARQL endpoint, sharing its HTTP client.
    pub fn with_sparql(client: SparqlClient) -> Self {
        let http_client = client.http_client().clone();
        Self::new(Arc::new(client), http_client)
    }

    pub fn with_layout(mut self, layout: ColumnLayout) -> Self {
        self.builder = HierarchyBuilder::new(layout);
        self
    }

    pub fn with_comparison_options(mut self, options: ComparisonOptions) -> Self {
        self.options = options;
        self
    }

    pub fn comparison_options(&self) -> &ComparisonOptions {
        &self.options
    }

    /// Current hierarchy snapshot.
    pub fn hierarchy(&self) -> Arc<GeographyHierarchy> {
        Arc::clone(&self.hierarchy.read())
    }

    /// Summary of the last successful build, if any.
    pub fn last_build(&self) -> Option<BuildSummary> {
        self.last_build.read().clone()
    }

    /// Build a hierarchy from table text and make it current.
    pub fn install_table(&self, text: &str) -> BuildSummary {
        let output = self.builder.build(text);
        *self.hierarchy.write() = Arc::new(output.hierarchy);
        *self.last_build.write() = Some(output.summary.clone());
        output.summary
    }

    /// Load the lookup table and replace the hierarchy.
    ///
    /// If the table cannot be read the previous hierarchy stays current.
    pub async fn reload_geography(
        &self,
        source: &GeographySource,
    ) -> Result<BuildSummary, SourceError> {
        let text = match load_table(source, &self.http_client).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Keeping previous geography, reload failed: {}", e);
                return Err(e);
            }
        };

        let summary = self.install_table(&text);
        info!(
            "Geography loaded: {} countries, {} councils, {} wards ({} rows rejected)",
            summary.countries, summary.councils, summary.wards, summary.rejected_rows
        );
        Ok(summary)
    }

    /// Yearly price statistics for an area.
    pub async fn price_history(&self, area_code: &str) -> Result<YearlyAggregation, SourceError> {
        let records = self.source.fetch_observations(area_code).await?;
        info!("Fetched {} price observations for {}", records.len(), area_code);
        Ok(aggregate(&records))
    }

    /// Dwelling totals by type for an area.
    pub async fn dwelling_types(&self, area_code: &str) -> Result<BTreeMap<String, u64>, SourceError> {
        let records = self.source.fetch_dwelling_types(area_code).await?;
        Ok(dwelling_totals(&records))
    }

    /// Rank the wards of a council in the current hierarchy.
    ///
    /// Returns `None` when the council is not in the hierarchy.
    pub async fn compare_council(
        &self,
        country_code: &str,
        council_code: &str,
        progress: &dyn ProgressCallback,
    ) -> Option<WardComparison> {
        let hierarchy = self.hierarchy();
        let Some(council) = hierarchy.council(country_code, council_code) else {
            warn!("Council {} not found in {}", council_code, country_code);
            return None;
        };

        Some(compare_wards(council, self.source.as_ref(), &self.options, progress).await)
    }
}
