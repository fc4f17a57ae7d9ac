//! Dashboard report model and rendering.

pub mod generator;

use crate::analysis::{WardComparison, YearlyAggregation};
use crate::models::BuildSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use generator::{generate_json_report, generate_markdown_report};

/// Metadata about a report run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    pub endpoint: String,
    pub geography_source: Option<String>,
    pub area_code: Option<String>,
    pub council_code: Option<String>,
    pub duration_seconds: f64,
}

/// Everything one run of the dashboard produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardReport {
    pub metadata: ReportMetadata,
    /// Diagnostics of the hierarchy build, if a table was loaded.
    pub geography: Option<BuildSummary>,
    pub price_history: Option<YearlyAggregation>,
    #[serde(default)]
    pub dwelling_types: BTreeMap<String, u64>,
    pub ward_comparison: Option<WardComparison>,
    /// Non-fatal problems met along the way.
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl DashboardReport {
    pub fn new(metadata: ReportMetadata) -> Self {
        Self {
            metadata,
            geography: None,
            price_history: None,
            dwelling_types: BTreeMap::new(),
            ward_comparison: None,
            warnings: Vec::new(),
        }
    }
}
